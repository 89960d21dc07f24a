//! CLI command implementations
//!
//! Commands print one JSON object on stdout and log to stderr.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;
use crate::auth::{PasswordPolicy, TenantDirectory};
use crate::config::{ServiceConfig, StorageBackend};
use crate::engine::{ImportRecord, LeadEngine};
use crate::http_server::HttpServer;
use crate::observability::{init_logging, Event};
use crate::storage::TimeWindow;

const TENANTS_DIR: &str = "tenants";

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port),
        Command::Import {
            config,
            tenant,
            file,
        } => import(&config, &tenant, &file),
        Command::Train { config, tenant } => train(&config, &tenant),
        Command::Stats { config, tenant } => stats(&config, &tenant),
    }
}

/// Writes a default configuration if none exists and creates the data
/// directory layout
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = if config_path.exists() {
        ServiceConfig::load(config_path)?
    } else {
        let mut config = ServiceConfig::default();
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
                config.data_dir = parent.join("leadscore-data");
            }
        }
        fs::write(config_path, serde_json::to_string_pretty(&config)?)?;
        config
    };

    if is_initialized(&config) {
        return Err(CliError::already_initialized());
    }

    let tenants_dir = config.data_dir.join(TENANTS_DIR);
    fs::create_dir_all(&tenants_dir).map_err(|e| {
        CliError::config_error(format!(
            "Failed to create directory {}: {}",
            tenants_dir.display(),
            e
        ))
    })?;

    write_response(json!({
        "initialized": true,
        "config": config_path.display().to_string(),
        "data_dir": config.data_dir.display().to_string(),
    }))
}

/// Start the HTTP server and serve until stopped
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    require_initialized(&config)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    let engine = Arc::new(LeadEngine::new(config));
    let directory = match engine.config().storage.backend {
        StorageBackend::File => TenantDirectory::open(engine.directory_path(), PasswordPolicy::default())
            .map_err(|e| CliError::boot_failed(e.to_string()))?,
        StorageBackend::Memory => TenantDirectory::in_memory(PasswordPolicy::default()),
    };
    let server = HttpServer::new(engine, Arc::new(directory));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Bulk-load leads from a JSON array file
pub fn import(config_path: &Path, tenant: &str, file: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    require_initialized(&config)?;

    let content = fs::read_to_string(file).map_err(|e| {
        CliError::io_error(format!("Failed to read {}: {}", file.display(), e))
    })?;
    let records: Vec<ImportRecord> = serde_json::from_str(&content)?;

    let engine = LeadEngine::new(config);
    let report = engine.import(tenant, &records)?;

    write_response(json!({
        "tenant_id": tenant,
        "imported": report.imported,
        "labeled": report.labeled,
        "model_version": report.model_version.map(|v| v.value()),
    }))
}

/// Run one training pass
pub fn train(config_path: &Path, tenant: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    require_initialized(&config)?;

    let engine = LeadEngine::new(config);
    let data = match engine.train(tenant)? {
        Some(model) => json!({
            "tenant_id": tenant,
            "trained": true,
            "version": model.version.value(),
            "metrics": model.metrics,
        }),
        None => json!({
            "tenant_id": tenant,
            "trained": false,
        }),
    };
    write_response(data)
}

/// Print the dashboard summary for a tenant
pub fn stats(config_path: &Path, tenant: &str) -> CliResult<()> {
    let config = load_config(config_path)?;
    require_initialized(&config)?;

    let engine = LeadEngine::new(config);
    let summary = engine.dashboard(tenant, &TimeWindow::default(), false)?;
    let current = match engine.current_model(tenant) {
        Ok(model) => model.map(|m| m.version.value()),
        Err(_) => None,
    };

    write_response(json!({
        "tenant_id": tenant,
        "summary": summary,
        "model_version": current,
    }))
}

fn load_config(config_path: &Path) -> CliResult<ServiceConfig> {
    let config = ServiceConfig::load(config_path)?;
    init_logging(&config.logging);
    info!(
        event = %Event::ConfigLoaded,
        path = %config_path.display(),
        backend = ?config.storage.backend,
        feedback = ?config.feedback.policy
    );
    Ok(config)
}

fn is_initialized(config: &ServiceConfig) -> bool {
    config.data_dir.join(TENANTS_DIR).is_dir()
}

fn require_initialized(config: &ServiceConfig) -> CliResult<()> {
    if config.storage.backend == StorageBackend::File && !is_initialized(config) {
        return Err(CliError::not_initialized());
    }
    Ok(())
}
