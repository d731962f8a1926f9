//! Append-only JSON-lines log of generated descriptions.
//!
//! Each line is one self-contained record terminated by `\n`. A run resumes by
//! counting complete lines; an unterminated trailing fragment (left when a
//! write was interrupted) is truncated on open before anything is appended.

use crate::error::{PropevalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// One generated (or failed) description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRecord {
    pub address: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Set when the API call failed; `description` is then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DescriptionRecord {
    pub fn success(address: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            description: description.into(),
            generated_at: Some(Utc::now()),
            error: None,
        }
    }

    pub fn failure(address: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            description: String::new(),
            generated_at: Some(Utc::now()),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Open handle on a description log, positioned for appending.
#[derive(Debug)]
pub struct DescriptionJournal {
    path: PathBuf,
    file: File,
    addresses: Vec<String>,
}

impl DescriptionJournal {
    /// Open (or create) the log at `path`, dropping any partial trailing line.
    pub fn open(path: &Path) -> Result<Self> {
        let content = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let scan = scan_lines(&content, path)?;
        if scan.complete_len < content.len() {
            log::warn!(
                "Dropping {} bytes of incomplete trailing record in {}",
                content.len() - scan.complete_len,
                path.display()
            );
            OpenOptions::new()
                .write(true)
                .open(path)?
                .set_len(scan.complete_len as u64)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let addresses = scan.records.into_iter().map(|r| r.address).collect();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            addresses,
        })
    }

    /// Number of complete records already in the log.
    pub fn completed(&self) -> usize {
        self.addresses.len()
    }

    /// Addresses of the completed records, in log order.
    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line and flush it to disk.
    pub fn append(&mut self, record: &DescriptionRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        self.addresses.push(record.address.clone());
        Ok(())
    }
}

/// Read every complete record from a log; a partial trailing line is ignored.
pub fn read_journal(path: &Path) -> Result<Vec<DescriptionRecord>> {
    let content = std::fs::read(path)?;
    let scan = scan_lines(&content, path)?;
    if scan.complete_len < content.len() {
        log::warn!("Ignoring incomplete trailing record in {}", path.display());
    }
    Ok(scan.records)
}

struct LineScan {
    records: Vec<DescriptionRecord>,
    /// Byte length of the prefix made of newline-terminated lines.
    complete_len: usize,
}

fn scan_lines(content: &[u8], path: &Path) -> Result<LineScan> {
    let complete_len = content
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|pos| pos + 1)
        .unwrap_or(0);

    let mut records = Vec::new();
    for (idx, line) in content[..complete_len].split(|&b| b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let record: DescriptionRecord = serde_json::from_slice(line).map_err(|e| {
            PropevalError::Parse(format!(
                "{} line {} is not a valid description record: {}",
                path.display(),
                idx + 1,
                e
            ))
        })?;
        records.push(record);
    }

    Ok(LineScan {
        records,
        complete_len,
    })
}
