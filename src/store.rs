//! CSV storage for swarm records.
//!
//! Every operation reads the table from disk and, for edits, rewrites the
//! whole file. Nothing is cached between calls. There is no file locking:
//! two processes editing the same table at once can lose updates or leave a
//! malformed file. This is a single-user tool and that limitation is accepted.

use crate::error::{Result, SwarmError};
use crate::model::{COLUMN_COUNT, Field, SwarmDraft, SwarmRecord};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Operations over a table of swarm records.
///
/// Callers depend on this trait so the whole-file CSV implementation can be
/// replaced by an indexed store without touching them.
pub trait RecordStore {
    /// Create an empty table with the standard header.
    ///
    /// Returns `false` when a non-empty table already exists; it is left as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    fn initialize(&self) -> Result<bool>;

    /// Append a new swarm and return its identifier.
    ///
    /// Identifiers are not checked for uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Validation`] for a draft without week or number,
    /// and [`SwarmError::FileAbsent`] when the table does not exist.
    fn append(&self, draft: SwarmDraft) -> Result<String>;

    /// Find the first swarm with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotFound`] when no row matches.
    fn find_by_identifier(&self, id: &str) -> Result<SwarmRecord>;

    /// Replace one field of the first swarm with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotFound`] when no row matches (the file is not
    /// touched), and [`SwarmError::Validation`] for the identifier column.
    fn update_field(&self, id: &str, field: Field, value: &str) -> Result<()>;

    /// Read every swarm in source order.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidTable`] for a bad header or row width.
    fn load_all(&self) -> Result<Vec<SwarmRecord>>;
}

/// A swarm table stored as a CSV file.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

/// Rows of a table file as read, without shape validation.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub header: Vec<String>,
    /// Line number (1-based, header is line 1) and values of each row.
    pub rows: Vec<(u64, Vec<String>)>,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the table without checking its shape.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::FileAbsent`] or a CSV parse error.
    pub fn read_raw(&self) -> Result<RawTable> {
        let bytes = self.read_bytes()?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes.as_slice());

        let header = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for row in reader.records() {
            let row = row?;
            let line = row.position().map_or(0, csv::Position::line);
            rows.push((line, row.iter().map(str::to_string).collect()));
        }

        Ok(RawTable { header, rows })
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        if !self.exists() {
            return Err(SwarmError::file_absent(&self.path));
        }
        fs::read(&self.path).map_err(|e| SwarmError::path_error("read", &self.path, e))
    }

    /// Parse table bytes into header-checked raw records.
    fn parse(&self, bytes: &[u8]) -> Result<(StringRecord, Vec<StringRecord>)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);
        let header = reader.headers()?.clone();
        self.check_header(&header)?;

        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((header, rows))
    }

    fn check_header(&self, header: &StringRecord) -> Result<()> {
        if header.is_empty() {
            return Err(SwarmError::invalid_table(&self.path, "missing header row"));
        }

        let found: Vec<&str> = header
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();
        let expected = Field::header();
        if found != expected {
            return Err(SwarmError::invalid_table(
                &self.path,
                format!(
                    "header has {} columns [{}], expected {} [{}]",
                    found.len(),
                    found.join(", "),
                    COLUMN_COUNT,
                    expected.join(", ")
                ),
            ));
        }
        Ok(())
    }

    fn to_record(&self, row: &StringRecord) -> Result<SwarmRecord> {
        SwarmRecord::from_row(row.iter()).ok_or_else(|| {
            let line = row.position().map_or(0, csv::Position::line);
            SwarmError::invalid_table(
                &self.path,
                format!(
                    "line {line} has {} fields, expected {COLUMN_COUNT}",
                    row.len()
                ),
            )
        })
    }

    /// Whether the file is missing or has no bytes.
    fn is_empty_or_absent(&self) -> Result<bool> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(SwarmError::path_error("inspect", &self.path, e)),
        }
    }

    /// Whether the file's last byte is a line break.
    fn ends_with_newline(file: &mut File) -> Result<bool> {
        if file.metadata()?.len() == 0 {
            return Ok(true);
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }
}

fn row_bytes<I, T>(rows: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = T>,
    T: IntoIterator,
    T::Item: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| SwarmError::IoError(e.into_error()))
}

impl RecordStore for CsvStore {
    fn initialize(&self) -> Result<bool> {
        if !self.is_empty_or_absent()? {
            debug!(path = %self.path.display(), "Table already present");
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| SwarmError::path_error("create directory", parent, e))?;
        }

        let header = row_bytes([Field::header()])?;
        fs::write(&self.path, header)
            .map_err(|e| SwarmError::path_error("create", &self.path, e))?;
        info!(path = %self.path.display(), "Created swarm table");
        Ok(true)
    }

    fn append(&self, draft: SwarmDraft) -> Result<String> {
        let record = draft.into_record()?;

        let bytes = self.read_bytes()?;
        // Header check only; rows are not revalidated on append.
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes.as_slice());
        self.check_header(reader.headers()?)?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SwarmError::path_error("open", &self.path, e))?;

        let mut out = Vec::new();
        if !Self::ends_with_newline(&mut file)? {
            out.push(b'\n');
        }
        out.extend(row_bytes([record.to_row()])?);
        file.write_all(&out)
            .map_err(|e| SwarmError::path_error("append to", &self.path, e))?;

        info!(id = %record.id, path = %self.path.display(), "Appended swarm");
        Ok(record.id)
    }

    fn find_by_identifier(&self, id: &str) -> Result<SwarmRecord> {
        let bytes = self.read_bytes()?;
        let (_, rows) = self.parse(&bytes)?;
        debug!(id, rows = rows.len(), "Scanning for swarm");

        rows.iter()
            .find(|row| row.get(0) == Some(id))
            .map(|row| self.to_record(row))
            .unwrap_or_else(|| Err(SwarmError::swarm_not_found(id)))
    }

    fn update_field(&self, id: &str, field: Field, value: &str) -> Result<()> {
        if !field.is_editable() {
            return Err(SwarmError::validation(format!(
                "'{}' cannot be edited; identifiers are fixed when a swarm is created",
                field.header_name()
            )));
        }

        let bytes = self.read_bytes()?;
        let (header, mut rows) = self.parse(&bytes)?;

        let target = rows
            .iter()
            .position(|row| row.get(0) == Some(id))
            .ok_or_else(|| SwarmError::swarm_not_found(id))?;

        let row = &rows[target];
        self.to_record(row)?;
        let previous = row.get(field.index()).unwrap_or_default().to_string();
        let updated: StringRecord = row
            .iter()
            .enumerate()
            .map(|(idx, current)| if idx == field.index() { value } else { current })
            .collect();
        rows[target] = updated;

        let out = row_bytes(std::iter::once(&header).chain(rows.iter()))?;
        fs::write(&self.path, out)
            .map_err(|e| SwarmError::path_error("rewrite", &self.path, e))?;

        info!(
            id,
            field = field.key(),
            previous = %previous,
            value,
            "Updated swarm"
        );
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<SwarmRecord>> {
        let bytes = self.read_bytes()?;
        let (_, rows) = self.parse(&bytes)?;
        let records = rows
            .iter()
            .map(|row| self.to_record(row))
            .collect::<Result<Vec<_>>>()?;
        debug!(path = %self.path.display(), count = records.len(), "Loaded swarms");
        Ok(records)
    }
}
