//! File-backed event store
//!
//! One append-only log per tenant at `<tenant_dir>/events.log`. Samples and
//! outcome changes are both appended as records; nothing is rewritten in
//! place. The log is replayed into a [`SampleTable`] on open.
//!
//! Every record is fsync'd before the in-memory table is updated. A failed
//! append is truncated away, so the log only ever holds whole records.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::error;

use super::errors::{StorageError, StorageResult};
use super::record::{EventRecord, OutcomeSet, MIN_RECORD_SIZE};
use super::sample::{Outcome, OutcomeChange, Sample, SampleId, Signals};
use super::store::EventStore;
use super::table::SampleTable;
use crate::errors::LeadResult;
use crate::observability::Event;

const LOG_FILE_NAME: &str = "events.log";

/// Durable per-tenant event store
pub struct FileEventStore {
    log_path: PathBuf,
    file: File,
    current_offset: u64,
    table: SampleTable,
    /// Set when a failed append could not be truncated away
    poisoned: bool,
    #[cfg(test)]
    short_write_at: Option<usize>,
}

impl FileEventStore {
    /// Opens or creates the tenant's event log and replays it.
    ///
    /// # Errors
    ///
    /// `LEAD_STORAGE_WRITE_FAILED` if the directory or file cannot be created,
    /// `LEAD_DATA_CORRUPTION` if any existing record fails validation.
    pub fn open(tenant_dir: &Path, tenant_id: &str) -> StorageResult<Self> {
        if !tenant_dir.exists() {
            fs::create_dir_all(tenant_dir).map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to create tenant directory: {}", tenant_dir.display()),
                    e,
                )
            })?;
        }

        let log_path = tenant_dir.join(LOG_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open event log: {}", log_path.display()),
                    e,
                )
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read event log metadata", e))?
            .len();

        let table = replay(&log_path, tenant_id)?;

        Ok(Self {
            log_path,
            file,
            current_offset,
            table,
            poisoned: false,
            #[cfg(test)]
            short_write_at: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends one record and fsyncs it.
    ///
    /// On failure the log is truncated back to the last complete record. If
    /// that also fails the store refuses further writes until reopened.
    fn write_record(&mut self, record: &EventRecord) -> StorageResult<()> {
        if self.poisoned {
            return Err(StorageError::write_failed_no_source(format!(
                "Event log {} has an unrecovered partial write; reopen the tenant",
                self.log_path.display()
            )));
        }

        let bytes = record
            .serialize()
            .map_err(|e| StorageError::write_failed("Failed to encode event record", e))?;

        if let Err(err) = self.append_bytes(&bytes) {
            self.rollback();
            return Err(err);
        }

        self.current_offset += bytes.len() as u64;
        Ok(())
    }

    fn append_bytes(&mut self, bytes: &[u8]) -> StorageResult<()> {
        #[cfg(test)]
        {
            if let Some(limit) = self.short_write_at.take() {
                let _ = self.file.write_all(&bytes[..limit.min(bytes.len())]);
                return Err(StorageError::write_failed(
                    format!("Failed to append to event log: {}", self.log_path.display()),
                    std::io::Error::new(std::io::ErrorKind::WriteZero, "short write"),
                ));
            }
        }

        self.file.write_all(bytes).map_err(|e| {
            StorageError::write_failed(
                format!("Failed to append to event log: {}", self.log_path.display()),
                e,
            )
        })?;

        self.file.sync_all().map_err(|e| {
            StorageError::write_failed(
                format!("fsync failed on event log: {}", self.log_path.display()),
                e,
            )
        })
    }

    fn rollback(&mut self) {
        let truncated = self
            .file
            .set_len(self.current_offset)
            .and_then(|_| self.file.sync_all());
        if let Err(e) = truncated {
            self.poisoned = true;
            error!(
                event = %Event::EventLogPoisoned,
                tenant_id = %self.table.tenant_id(),
                path = %self.log_path.display(),
                offset = self.current_offset,
                error = %e
            );
        }
    }

    #[cfg(test)]
    fn fail_next_write_after(&mut self, bytes: usize) {
        self.short_write_at = Some(bytes);
    }
}

impl EventStore for FileEventStore {
    fn table(&self) -> &SampleTable {
        &self.table
    }

    fn append(&mut self, signals: Signals) -> StorageResult<Sample> {
        let sample = self.table.next_sample(signals, Utc::now());
        self.write_record(&EventRecord::SampleAppended(sample.clone()))?;
        self.table.insert(sample.clone());
        Ok(sample)
    }

    fn set_outcome(&mut self, id: SampleId, outcome: Outcome) -> LeadResult<OutcomeChange> {
        let change = self.table.plan_outcome(id, outcome)?;
        if change.is_mutation() {
            let at = Utc::now();
            self.write_record(&EventRecord::OutcomeSet(OutcomeSet {
                sample_id: id,
                outcome,
                at,
            }))?;
            self.table.apply_outcome(id, outcome, at);
        }
        Ok(change)
    }
}

/// Rebuilds a sample table from the log. Any invalid record is fatal.
fn replay(log_path: &Path, tenant_id: &str) -> StorageResult<SampleTable> {
    let mut table = SampleTable::new(tenant_id);
    let mut reader = EventLogReader::open(log_path)?;

    while let Some(record) = reader.read_next()? {
        match record {
            EventRecord::SampleAppended(sample) => {
                let expected = table.len() as u64 + 1;
                if sample.id.0 != expected {
                    return Err(StorageError::data_corruption(format!(
                        "Sample id {} out of sequence, expected {}",
                        sample.id, expected
                    )));
                }
                table.insert(sample);
            }
            EventRecord::OutcomeSet(set) => {
                if table.get(set.sample_id).is_none() {
                    return Err(StorageError::data_corruption(format!(
                        "Outcome recorded for unknown sample {}",
                        set.sample_id
                    )));
                }
                table.apply_outcome(set.sample_id, set.outcome, set.at);
            }
        }
    }

    Ok(table)
}

/// Sequential reader over an event log
pub struct EventLogReader {
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl EventLogReader {
    pub fn open(log_path: &Path) -> StorageResult<Self> {
        let file = File::open(log_path).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to open event log: {}", log_path.display()),
                e,
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read event log metadata", e))?
            .len();

        Ok(Self {
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Reads the next record.
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of file
    /// - `Err(LEAD_DATA_CORRUPTION)` on framing or checksum failure
    pub fn read_next(&mut self) -> StorageResult<Option<EventRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated event log: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 || record_length > remaining {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Invalid record length {} with {} bytes remaining",
                    record_length, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (record, consumed) = EventRecord::deserialize(&record_buf)
            .map_err(|e| StorageError::corruption_at_offset(self.current_offset, e.to_string()))?;

        self.current_offset += consumed as u64;
        Ok(Some(record))
    }

    pub fn read_all(&mut self) -> StorageResult<Vec<EventRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TimeWindow;
    use tempfile::TempDir;

    fn signals(t: f64) -> Signals {
        Signals::new(t, 2, true).unwrap()
    }

    #[test]
    fn test_open_creates_tenant_directory() {
        let temp_dir = TempDir::new().unwrap();
        let tenant_dir = temp_dir.path().join("tenants").join("acme");

        let store = FileEventStore::open(&tenant_dir, "acme").unwrap();
        assert!(store.path().exists());
        assert_eq!(store.current_offset(), 0);
    }

    #[test]
    fn test_reopen_replays_samples_and_outcomes() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
            store.append(signals(5.0)).unwrap();
            store.append(signals(8.0)).unwrap();
            store.set_outcome(SampleId(2), Outcome::Converted).unwrap();
        }

        let store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
        assert_eq!(store.count(&TimeWindow::default()), 2);
        assert_eq!(store.get(SampleId(2)).unwrap().outcome, Outcome::Converted);
        assert_eq!(store.get(SampleId(1)).unwrap().outcome, Outcome::Unknown);
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
            store.append(signals(1.0)).unwrap();
        }
        let mut store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
        let sample = store.append(signals(2.0)).unwrap();
        assert_eq!(sample.id, SampleId(2));
    }

    #[test]
    fn test_unchanged_outcome_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
        store.append(signals(1.0)).unwrap();
        store.set_outcome(SampleId(1), Outcome::NotConverted).unwrap();
        let offset = store.current_offset();

        let change = store.set_outcome(SampleId(1), Outcome::NotConverted).unwrap();
        assert_eq!(change, OutcomeChange::Unchanged);
        assert_eq!(store.current_offset(), offset);
    }

    #[test]
    fn test_corrupted_log_fails_open() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
            store.append(signals(1.0)).unwrap();
        }

        let log_path = temp_dir.path().join(LOG_FILE_NAME);
        let mut contents = fs::read(&log_path).unwrap();
        let mid = contents.len() / 2;
        contents[mid] ^= 0xFF;
        fs::write(&log_path, contents).unwrap();

        let err = FileEventStore::open(temp_dir.path(), "acme").err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_reader_sees_every_mutation() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
            store.append(signals(1.0)).unwrap();
            store.set_outcome(SampleId(1), Outcome::NotConverted).unwrap();
            store.set_outcome(SampleId(1), Outcome::Converted).unwrap();
        }

        let mut reader = EventLogReader::open(&temp_dir.path().join(LOG_FILE_NAME)).unwrap();
        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], EventRecord::SampleAppended(_)));
        assert!(matches!(
            records[2],
            EventRecord::OutcomeSet(OutcomeSet {
                outcome: Outcome::Converted,
                ..
            })
        ));
    }

    #[test]
    fn test_short_write_is_rolled_back() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
            for t in 1..=4 {
                store.append(signals(t as f64)).unwrap();
            }
            let offset = store.current_offset();

            store.fail_next_write_after(49);
            let err = store.append(signals(5.0)).unwrap_err();
            assert_eq!(err.code().code(), "LEAD_STORAGE_WRITE_FAILED");
            assert_eq!(store.current_offset(), offset);
            assert_eq!(fs::metadata(store.path()).unwrap().len(), offset);

            let sample = store.append(signals(6.0)).unwrap();
            assert_eq!(sample.id, SampleId(5));
        }

        let store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
        assert_eq!(store.count(&TimeWindow::default()), 5);
        assert_eq!(store.get(SampleId(5)).unwrap().signals.time_on_site, 6.0);
    }

    #[test]
    fn test_failed_outcome_write_leaves_label_unset() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
        store.append(signals(1.0)).unwrap();

        store.fail_next_write_after(10);
        assert!(store.set_outcome(SampleId(1), Outcome::Converted).is_err());
        assert_eq!(store.get(SampleId(1)).unwrap().outcome, Outcome::Unknown);
        drop(store);

        let store = FileEventStore::open(temp_dir.path(), "acme").unwrap();
        assert_eq!(store.get(SampleId(1)).unwrap().outcome, Outcome::Unknown);
    }
}
