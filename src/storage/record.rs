//! Event log record format
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record including this field)
//! +------------------+
//! | Kind             | (u8: 1 = sample appended, 2 = outcome set)
//! +------------------+
//! | Body             | (length-prefixed JSON)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! The CRC32 checksum covers all bytes except the checksum itself.

use std::io;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sample::{Outcome, Sample, SampleId};

/// Smallest possible record: length + kind + body length + checksum
pub const MIN_RECORD_SIZE: usize = 4 + 1 + 4 + 4;

const KIND_SAMPLE_APPENDED: u8 = 1;
const KIND_OUTCOME_SET: u8 = 2;

/// Body of an outcome change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSet {
    pub sample_id: SampleId,
    pub outcome: Outcome,
    pub at: DateTime<Utc>,
}

/// One durable mutation of a tenant's event store
#[derive(Debug, Clone, PartialEq)]
pub enum EventRecord {
    SampleAppended(Sample),
    OutcomeSet(OutcomeSet),
}

impl EventRecord {
    fn kind(&self) -> u8 {
        match self {
            EventRecord::SampleAppended(_) => KIND_SAMPLE_APPENDED,
            EventRecord::OutcomeSet(_) => KIND_OUTCOME_SET,
        }
    }

    fn body(&self) -> io::Result<Vec<u8>> {
        let body = match self {
            EventRecord::SampleAppended(sample) => serde_json::to_vec(sample),
            EventRecord::OutcomeSet(set) => serde_json::to_vec(set),
        };
        body.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Serialize the complete record to bytes.
    pub fn serialize(&self) -> io::Result<Vec<u8>> {
        let body = self.body()?;
        let record_length = (MIN_RECORD_SIZE + body.len()) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.push(self.kind());
        record.extend_from_slice(&(body.len() as u32).to_le_bytes());
        record.extend_from_slice(&body);

        let checksum = crc32fast::hash(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        Ok(record)
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Record too short"));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }
        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_checksum = crc32fast::hash(&data[..checksum_offset]);
        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let kind = data[4];
        let body_length = u32::from_le_bytes([data[5], data[6], data[7], data[8]]) as usize;
        if 9 + body_length != checksum_offset {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Body length {} does not match record length {}",
                    body_length, record_length
                ),
            ));
        }
        let body = &data[9..checksum_offset];

        let invalid = |e: serde_json::Error| io::Error::new(io::ErrorKind::InvalidData, e);
        let record = match kind {
            KIND_SAMPLE_APPENDED => EventRecord::SampleAppended(serde_json::from_slice(body).map_err(invalid)?),
            KIND_OUTCOME_SET => EventRecord::OutcomeSet(serde_json::from_slice(body).map_err(invalid)?),
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unknown record kind: {}", other),
                ))
            }
        };

        Ok((record, record_length))
    }
}
