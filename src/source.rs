use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::schema::{ColumnBuilder, NullTokens, SAMPLE_ROWS, infer_dtype};

/// Tokens treated as null when a scan does not name its own.
pub const DEFAULT_NULL_VALUES: [&str; 3] = ["", "NULL", "null"];

/// Root key whose array holds the records when a JSON document is an object.
pub const NESTED_RECORDS_KEY: &str = "tasks";

/// Options for delimited-text scans.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// Field separator (default: comma).
    pub delimiter: u8,
    /// Raw field texts read as null. An empty list means [`DEFAULT_NULL_VALUES`].
    pub null_values: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_values: DEFAULT_NULL_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tab-separated values.
    pub fn tsv() -> Self {
        Self::default().with_delimiter(b'\t')
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_null_values<I, S>(mut self, null_values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_values = null_values.into_iter().map(Into::into).collect();
        self
    }

    pub fn null_tokens(&self) -> NullTokens {
        if self.null_values.is_empty() {
            NullTokens::new(DEFAULT_NULL_VALUES)
        } else {
            NullTokens::new(self.null_values.iter().cloned())
        }
    }
}

/// A stream of raw text rows under a header, as produced by a file tokenizer.
pub trait RecordSource {
    fn header(&self) -> &[String];

    /// The next row of raw fields, or `None` once the input is exhausted.
    fn next_record(&mut self) -> Option<Result<Vec<String>>>;
}

/// Delimited text read through the `csv` crate; the first record is the header.
pub struct CsvSource<R: Read> {
    reader: csv::Reader<R>,
    header: Vec<String>,
}

impl CsvSource<File> {
    pub fn open(path: impl AsRef<Path>, options: &ScanOptions) -> Result<Self> {
        Self::from_reader(File::open(path)?, options)
    }
}

impl<R: Read> CsvSource<R> {
    /// # Errors
    /// Returns [`Error::EmptySource`] if the input has no header.
    pub fn from_reader(input: R, options: &ScanOptions) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            // field counts are checked against the header by `ingest`
            .flexible(true)
            .from_reader(input);
        let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if header.is_empty() {
            return Err(Error::EmptySource("csv input has no header".into()));
        }
        Ok(Self { reader, header })
    }
}

impl<R: Read> RecordSource for CsvSource<R> {
    fn header(&self) -> &[String] {
        &self.header
    }

    fn next_record(&mut self) -> Option<Result<Vec<String>>> {
        let mut record = csv::StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => Some(Ok(record.iter().map(String::from).collect())),
            Ok(false) => None,
            Err(err) => Some(Err(err.into())),
        }
    }
}

/// Rows already held in memory.
pub struct MemorySource {
    header: Vec<String>,
    rows: std::vec::IntoIter<Vec<String>>,
}

impl MemorySource {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            header,
            rows: rows.into_iter(),
        }
    }
}

impl RecordSource for MemorySource {
    fn header(&self) -> &[String] {
        &self.header
    }

    fn next_record(&mut self) -> Option<Result<Vec<String>>> {
        self.rows.next().map(Ok)
    }
}

fn check_width(record: &[String], expected: usize, row: usize) -> Result<()> {
    if record.len() != expected {
        return Err(Error::Schema {
            row,
            found: record.len(),
            expected,
        });
    }
    Ok(())
}

/// Builds a frame from a record source.
///
/// Column types are inferred from the first `sample_rows` rows only. A later row
/// that does not parse under the inferred type fails the whole ingestion with
/// [`Error::Parse`]; types are never widened after the fact. Rows are numbered
/// from 1, not counting the header.
pub fn ingest<S: RecordSource>(
    source: &mut S,
    nulls: NullTokens,
    sample_rows: usize,
) -> Result<Frame> {
    let header = source.header().to_vec();
    if header.is_empty() {
        return Err(Error::EmptySource("source has no columns".into()));
    }

    let mut sample: Vec<Vec<String>> = Vec::new();
    while sample.len() < sample_rows {
        let Some(record) = source.next_record() else {
            break;
        };
        let record = record?;
        check_width(&record, header.len(), sample.len() + 1)?;
        sample.push(record);
    }

    let nulls = Arc::new(nulls);
    let mut builders: Vec<ColumnBuilder> = (0..header.len())
        .map(|c| {
            let values: Vec<&str> = sample.iter().map(|record| record[c].as_str()).collect();
            ColumnBuilder::new(infer_dtype(&values, &nulls), Arc::clone(&nulls))
        })
        .collect();
    let schema: Vec<String> = header
        .iter()
        .zip(&builders)
        .map(|(name, builder)| format!("{name}:{}", builder.data_type()))
        .collect();
    debug!(columns = ?schema, sampled = sample.len(), "inferred schema");

    let mut row = 0;
    for record in sample {
        row += 1;
        append_row(&mut builders, &record, row)?;
    }
    while let Some(record) = source.next_record() {
        let record = record?;
        row += 1;
        check_width(&record, header.len(), row)?;
        append_row(&mut builders, &record, row)?;
    }

    Frame::new(
        builders
            .into_iter()
            .zip(header)
            .map(|(builder, name)| builder.build(name))
            .collect(),
    )
}

fn append_row(builders: &mut [ColumnBuilder], record: &[String], row: usize) -> Result<()> {
    for (builder, raw) in builders.iter_mut().zip(record) {
        builder.append(raw, row)?;
    }
    Ok(())
}

/// Reads a delimited text file into a frame.
pub fn read_csv(path: impl AsRef<Path>, options: &ScanOptions) -> Result<Frame> {
    let mut source = CsvSource::open(path, options)?;
    ingest(&mut source, options.null_tokens(), SAMPLE_ROWS)
}

/// Reads a JSON document into a frame.
///
/// Accepted roots: an array of records, an object holding a record array under
/// [`NESTED_RECORDS_KEY`], or a single object (one row). Array elements that are not
/// objects become one-field rows under the key `"value"`. Columns are the union of
/// keys in sorted order; missing keys and JSON `null` are null.
pub fn read_json(path: impl AsRef<Path>) -> Result<Frame> {
    let text = std::fs::read_to_string(path)?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<Frame> {
    let root: JsonValue = serde_json::from_str(text)?;
    let rows = json_rows(root)?;
    if rows.is_empty() {
        return Err(Error::EmptySource("json document has no rows".into()));
    }

    let header: Vec<String> = rows
        .iter()
        .flat_map(|row| row.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();
    let records = rows
        .iter()
        .map(|row| header.iter().map(|key| raw_text(row.get(key))).collect())
        .collect();

    let mut source = MemorySource::new(header, records);
    ingest(&mut source, NullTokens::new([""]), usize::MAX)
}

fn json_rows(root: JsonValue) -> Result<Vec<Map<String, JsonValue>>> {
    match root {
        JsonValue::Array(items) => Ok(items.into_iter().map(into_row).collect()),
        JsonValue::Object(mut object) => match object.remove(NESTED_RECORDS_KEY) {
            Some(JsonValue::Array(items)) => Ok(items.into_iter().map(into_row).collect()),
            Some(other) => {
                // not a record list: the key is an ordinary field of a single row
                object.insert(NESTED_RECORDS_KEY.to_string(), other);
                Ok(vec![object])
            }
            None => Ok(vec![object]),
        },
        other => Err(Error::UnsupportedJson(format!(
            "root must be an array or an object, found {other}"
        ))),
    }
}

fn into_row(item: JsonValue) -> Map<String, JsonValue> {
    match item {
        JsonValue::Object(object) => object,
        other => {
            let mut row = Map::new();
            row.insert("value".to_string(), other);
            row
        }
    }
}

fn raw_text(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
