//! Command output
//!
//! One JSON line per command on stdout; logs stay on stderr.

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;

pub fn write_response(data: Value) -> CliResult<()> {
    emit(&json!({ "status": "ok", "data": data }))
}

pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    emit(&json!({ "status": "error", "code": code, "message": message }))
}

fn emit(line: &Value) -> CliResult<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, line)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
