//! Incremental CSV output of scraped leads
//!
//! Rows are appended and flushed one at a time so a crash loses at most the
//! record being written. Resumed jobs append to the file they started.

use super::{OutputError, OutputResult};
use crate::model::{name_key, BusinessRecord, CSV_COLUMNS};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Appending CSV writer with a fixed header
pub struct IncrementalWriter {
    path: PathBuf,
    writer: Writer<File>,
    rows_written: usize,
}

impl IncrementalWriter {
    /// Opens the output file
    ///
    /// # Arguments
    ///
    /// * `path` - Destination CSV file; parent directories are created
    /// * `append` - Keep existing rows (resume). The existing header must match
    ///   the output columns exactly.
    ///
    /// # Returns
    ///
    /// * `Ok(IncrementalWriter)` - Ready to append rows
    /// * `Err(OutputError::SchemaMismatch)` - Appending to a file with a different header
    pub fn open(path: impl Into<PathBuf>, append: bool) -> OutputResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let existing_len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let keep_existing = append && existing_len > 0;
        if keep_existing {
            check_header(&path)?;
        }

        let file = if keep_existing {
            OpenOptions::new().append(true).open(&path)?
        } else {
            File::create(&path)?
        };

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if !keep_existing {
            writer.write_record(CSV_COLUMNS)?;
            writer.flush()?;
        }

        tracing::debug!(
            "Opened {} ({})",
            path.display(),
            if keep_existing { "appending" } else { "new file" }
        );

        Ok(Self {
            path,
            writer,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended through this writer (excludes rows from earlier runs)
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Appends one record and flushes it to disk
    pub fn append(&mut self, record: &BusinessRecord) -> OutputResult<()> {
        self.writer.write_record(record.to_csv_row())?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flushes and closes the file
    pub fn finish(mut self) -> OutputResult<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}

fn check_header(path: &Path) -> OutputResult<()> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let found = reader.headers()?.clone();

    if !found.iter().map(str::trim).eq(CSV_COLUMNS.iter().copied()) {
        return Err(OutputError::SchemaMismatch {
            path: path.to_path_buf(),
            found: found.iter().collect::<Vec<_>>().join(","),
        });
    }
    Ok(())
}

/// Reads the business names already present in an output file
///
/// Names are normalized with `name_key`; rows without a usable name are
/// skipped. A missing file yields an empty set.
pub fn existing_keys(path: &Path) -> OutputResult<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let name_col = reader
        .headers()?
        .iter()
        .position(|h| h == "name")
        .unwrap_or(0);

    let mut names = HashSet::new();
    for result in reader.records() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Skipping unreadable row in {}: {}", path.display(), e);
                continue;
            }
        };
        if let Some(key) = row.get(name_col).and_then(name_key) {
            names.insert(key);
        }
    }

    Ok(names)
}

/// Rewrites the file with rows ordered by lead score, highest first
///
/// The sort is stable, so rows with equal scores keep their scrape order.
/// The sorted copy is written next to the file and renamed over it.
///
/// # Returns
///
/// The number of data rows in the file
pub fn sort_by_score(path: &Path) -> OutputResult<usize> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let score_col = headers
        .iter()
        .position(|h| h == "lead_score")
        .ok_or_else(|| OutputError::SchemaMismatch {
            path: path.to_path_buf(),
            found: headers.iter().collect::<Vec<_>>().join(","),
        })?;

    let mut rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    rows.sort_by_key(|row| {
        std::cmp::Reverse(
            row.get(score_col)
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(0),
        )
    });

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".sorting");
    let tmp = PathBuf::from(tmp);

    let result = (|| -> OutputResult<()> {
        let mut writer = WriterBuilder::new().has_headers(false).from_path(&tmp)?;
        writer.write_record(&headers)?;
        for row in &rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map(|_| rows.len())
}
