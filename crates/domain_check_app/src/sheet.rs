//! CSV table handling: load rows for the engine and write verdicts back.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use domain_check_engine::{write_atomic, MatchStatus, PersistError, Row};
use engine_logging::engine_warn;
use thiserror::Error;

pub const EMAIL_DOMAIN: &str = "Email Domain";
pub const COMPANY_DOMAIN: &str = "Company Domain";
pub const EMAIL_MATCH: &str = "EmailMatch";
pub const RETRY_NOTE: &str = "RetryNote";

pub const PROJECTED_COLUMNS: [&str; 6] = [
    "Company Name",
    "Full Name",
    COMPANY_DOMAIN,
    EMAIL_DOMAIN,
    EMAIL_MATCH,
    RETRY_NOTE,
];

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("required column '{0}' not found")]
    MissingColumn(&'static str),
    #[error("line {line} has {found} fields but the header has {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("failed to write output: {0}")]
    Persist(#[from] PersistError),
}

/// A loaded table. Unknown columns are carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
    email_col: usize,
    company_col: usize,
    match_col: usize,
    note_col: usize,
}

impl Sheet {
    pub fn load(path: &Path) -> Result<Self, SheetError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, SheetError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let mut headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim().to_string())
            .collect();
        let width = headers.len();

        let email_col =
            column(&headers, EMAIL_DOMAIN).ok_or(SheetError::MissingColumn(EMAIL_DOMAIN))?;
        let company_col =
            column(&headers, COMPANY_DOMAIN).ok_or(SheetError::MissingColumn(COMPANY_DOMAIN))?;
        let match_col = column_or_append(&mut headers, EMAIL_MATCH);
        let note_col = column_or_append(&mut headers, RETRY_NOTE);

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() > width {
                return Err(SheetError::RaggedRow {
                    line: record.position().map_or(0, |position| position.line()),
                    expected: width,
                    found: record.len(),
                });
            }
            // Short rows are padded with blanks.
            let mut values: Vec<String> = record.iter().map(str::to_string).collect();
            values.resize(headers.len(), String::new());
            values[match_col] = normalize_match_cell(&values[match_col]);
            records.push(values);
        }

        Ok(Self {
            headers,
            records,
            email_col,
            company_col,
            match_col,
            note_col,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn value(&self, row: usize, column_name: &str) -> Option<&str> {
        let col = column(&self.headers, column_name)?;
        self.records.get(row).map(|record| record[col].as_str())
    }

    /// Engine view of every record, in file order.
    pub fn rows(&self) -> Vec<Row> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let cell = &record[self.match_col];
                let email_match = MatchStatus::parse(cell);
                if email_match == MatchStatus::Unset && !cell.is_empty() {
                    engine_warn!(
                        "row {}: unrecognised {} value '{}', treating as unchecked",
                        index + 1,
                        EMAIL_MATCH,
                        cell
                    );
                }
                Row {
                    email_url: record[self.email_col].clone(),
                    company_url: record[self.company_col].clone(),
                    email_match,
                    retry_note: record[self.note_col].clone(),
                }
            })
            .collect()
    }

    /// Copy the engine-owned fields back. Rows the engine never selected
    /// keep their note; their status is written in normalised form.
    pub fn apply_rows(&mut self, rows: &[Row]) {
        for (record, row) in self.records.iter_mut().zip(rows) {
            record[self.match_col] = row.email_match.as_str().to_string();
            record[self.note_col] = row.retry_note.clone();
        }
    }

    pub fn to_csv_bytes(&self, project: bool) -> Result<Vec<u8>, SheetError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if project {
            let picks: Vec<Option<usize>> = PROJECTED_COLUMNS
                .iter()
                .map(|name| column(&self.headers, name))
                .collect();
            writer.write_record(PROJECTED_COLUMNS)?;
            for record in &self.records {
                writer.write_record(
                    picks
                        .iter()
                        .map(|pick| pick.map_or("", |col| record[col].as_str())),
                )?;
            }
        } else {
            writer.write_record(&self.headers)?;
            for record in &self.records {
                writer.write_record(record)?;
            }
        }
        writer
            .into_inner()
            .map_err(|err| SheetError::Io(err.into_error()))
    }

    pub fn save(&self, path: &Path, project: bool) -> Result<PathBuf, SheetError> {
        let bytes = self.to_csv_bytes(project)?;
        Ok(write_atomic(path, &bytes)?)
    }
}

fn column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|header| header == name)
}

fn column_or_append(headers: &mut Vec<String>, name: &str) -> usize {
    column(headers, name).unwrap_or_else(|| {
        headers.push(name.to_string());
        headers.len() - 1
    })
}

/// Trim and capitalise a stored status; spreadsheet null markers become blank.
fn normalize_match_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("nan") || trimmed.eq_ignore_ascii_case("none") {
        return String::new();
    }
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
