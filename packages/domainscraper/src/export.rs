//! Export of persisted results.
//!
//! Every export row is a record joined with the name of the getter that
//! owns it. CSV keeps `meta` as JSON text in one column; JSON nests it.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use getter_engine::{JobInfo, Meta, RecordInfo};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::report::{job_rows, markdown_table};

pub const CSV_HEADER: [&str; 8] = [
    "key",
    "country",
    "category",
    "subcategory",
    "meta",
    "first_found_at",
    "last_found_at",
    "getter_name",
];

const README_PREAMBLE: &str = "# Public Sector Domains - Results

This is the *result* branch of this project. It lists every domain name of a public sector organisation that was found, together with the state of each getter that found them.
";

/// One exported record.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRecord<'a> {
    pub key: &'a str,
    pub country: &'a str,
    pub category: &'a str,
    pub subcategory: &'a str,
    pub meta: &'a Meta,
    pub first_found_at: DateTime<Utc>,
    pub last_found_at: DateTime<Utc>,
    pub getter_name: &'a str,
}

impl<'a> From<&'a RecordInfo> for ExportRecord<'a> {
    fn from(info: &'a RecordInfo) -> Self {
        Self {
            key: &info.key,
            country: &info.country,
            category: &info.category,
            subcategory: &info.subcategory,
            meta: &info.meta,
            first_found_at: info.first_found_at,
            last_found_at: info.last_found_at,
            getter_name: &info.found_by,
        }
    }
}

/* ---------------- CSV ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> std::io::Result<()> {
    let mut first = true;
    for cell in row {
        let cell = cell.as_ref();
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Write records as CSV with a header row, quoting where needed.
pub fn write_csv<W: Write>(mut w: W, records: &[RecordInfo]) -> Result<()> {
    write_row(&mut w, &CSV_HEADER)?;

    for record in records {
        let meta = serde_json::to_string(&record.meta)
            .with_context(|| format!("serializing meta of {}", record.key))?;
        write_row(
            &mut w,
            &[
                record.key.as_str(),
                record.country.as_str(),
                record.category.as_str(),
                record.subcategory.as_str(),
                meta.as_str(),
                timestamp(record.first_found_at).as_str(),
                timestamp(record.last_found_at).as_str(),
                record.found_by.as_str(),
            ],
        )?;
    }

    w.flush()?;
    Ok(())
}

/* ---------------- JSON ---------------- */

/// Write records as a single JSON array.
pub fn write_json<W: Write>(mut w: W, records: &[RecordInfo]) -> Result<()> {
    let rows: Vec<ExportRecord<'_>> = records.iter().map(ExportRecord::from).collect();
    serde_json::to_writer(&mut w, &rows).context("serializing records")?;
    w.flush()?;
    Ok(())
}

/* ---------------- README ---------------- */

/// The results README: preamble followed by a report over every getter.
pub fn readme(jobs: &[JobInfo]) -> String {
    format!(
        "{}\n\n## Report\n\n{}\n",
        README_PREAMBLE,
        markdown_table(&job_rows(jobs))
    )
}

/* ---------------- Files ---------------- */

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

pub fn export_csv(path: &Path, records: &[RecordInfo]) -> Result<()> {
    write_csv(create(path)?, records).with_context(|| format!("writing {}", path.display()))
}

pub fn export_json(path: &Path, records: &[RecordInfo]) -> Result<()> {
    write_json(create(path)?, records).with_context(|| format!("writing {}", path.display()))
}

pub fn export_readme(path: &Path, jobs: &[JobInfo]) -> Result<()> {
    std::fs::write(path, readme(jobs)).with_context(|| format!("writing {}", path.display()))
}
