//! Tabular sources.
//!
//! Registers published as xlsx or ods are read with calamine into rows keyed
//! by column header. Getters keep and rename the columns they know with
//! [`translate`], then [`rows_to_records`] turns every row into one record
//! per domain, with the remaining columns as meta.

use anyhow::{Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use getter_engine::{keep_valid, Meta, MetaValue, Record};
use std::io::Cursor;

use crate::taxonomy::{Category, Country};

/// One spreadsheet row, keyed by column header.
pub type Row = Meta;

/// Where a record's subcategory comes from.
#[derive(Debug, Clone, Copy)]
pub enum Subcategory<'a> {
    /// The same subcategory for every row
    Fixed(&'a str),
    /// The text of a column of the row itself
    Column(&'a str),
}

/// Read the first worksheet of an xlsx or ods file.
///
/// `header_row` is the zero based sheet row holding the column names.
/// Rows above it are ignored.
pub fn read_first_sheet(bytes: Vec<u8>, header_row: usize) -> Result<Vec<Row>> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).context("Failed to open workbook")?;

    let range = workbook
        .worksheet_range_at(0)
        .context("Workbook has no sheets")?
        .context("Failed to read first sheet")?;

    Ok(rows(&range, header_row))
}

/// Rows of `range` below the header, skipping rows without any value.
pub fn rows(range: &Range<Data>, header_row: usize) -> Vec<Row> {
    let first_used = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut lines = range.rows().skip(header_row.saturating_sub(first_used));

    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(|cell| cell.to_string().trim().to_string()).collect();

    lines
        .filter(|line| line.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|line| {
            header
                .iter()
                .zip(line)
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, cell)| (name.clone(), cell_value(cell)))
                .collect()
        })
        .collect()
}

/// A cell as a meta value. Whole numbers become integers.
pub fn cell_value(cell: &Data) -> MetaValue {
    match cell {
        Data::Empty | Data::Error(_) => MetaValue::Null,
        Data::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                MetaValue::Null
            } else {
                MetaValue::Text(text.to_string())
            }
        }
        Data::Int(value) => MetaValue::Integer(*value),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
            MetaValue::Integer(*value as i64)
        }
        Data::Float(value) => MetaValue::Float(*value),
        Data::Bool(value) => MetaValue::Bool(*value),
        other => MetaValue::Text(other.to_string()),
    }
}

/// Keep the columns named in `columns`, renamed to their new names.
///
/// Several source columns may map to the same name; the last one with a
/// value wins.
pub fn translate(columns: &[(&str, &str)], rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            let mut renamed = Row::new();
            for (from, to) in columns {
                match row.get(*from) {
                    Some(value) if !value.is_null() || !renamed.contains_key(*to) => {
                        renamed.insert(to.to_string(), value.clone());
                    }
                    _ => {}
                }
            }
            renamed
        })
        .collect()
}

fn text(value: &MetaValue) -> Option<String> {
    match value {
        MetaValue::Text(text) => Some(text.clone()),
        MetaValue::Integer(value) => Some(value.to_string()),
        MetaValue::Float(value) => Some(value.to_string()),
        MetaValue::Bool(value) => Some(value.to_string()),
        MetaValue::Null | MetaValue::List(_) | MetaValue::Map(_) => None,
    }
}

/// The domains in a domain cell: none, one, or a list.
fn domains(value: Option<MetaValue>) -> Vec<String> {
    let domains = match value {
        Some(MetaValue::List(items)) => items.iter().filter_map(text).collect(),
        Some(value) => text(&value).into_iter().collect(),
        None => Vec::new(),
    };
    domains.into_iter().filter(|d| !d.trim().is_empty()).collect()
}

/// Turn rows into records.
///
/// `domain_column` is removed from each row and yields zero or more
/// records. Rows without a domain are skipped; malformed domains are
/// logged and skipped. Every other column becomes meta.
pub fn rows_to_records(
    rows: Vec<Row>,
    domain_column: &str,
    country: Country,
    category: Category,
    subcategory: Subcategory<'_>,
) -> Vec<Record> {
    let candidates = rows.into_iter().flat_map(|mut row| {
        let found = domains(row.remove(domain_column));
        let subcategory = match subcategory {
            Subcategory::Fixed(name) => name.to_string(),
            Subcategory::Column(column) => row.get(column).and_then(text).unwrap_or_default(),
        };

        found.into_iter().map(move |domain| {
            Record::new(&domain, country.as_str(), category.as_str(), subcategory.clone())
                .map(|record| record.with_meta(row.clone()))
        })
    });

    keep_valid(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|row| row.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    fn row(entries: &[(&str, MetaValue)]) -> Row {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn rows_are_keyed_by_header() {
        let range = sheet(&[
            &[s("NAAM"), s(""), s("KVK")],
            &[s(" De Linde "), s("ignored"), Data::Float(12345678.0)],
            &[Data::Empty, Data::Empty, Data::Empty],
            &[s("Het Baken"), Data::Empty, Data::Float(1.5)],
        ]);

        let rows = rows(&range, 0);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["NAAM"], MetaValue::from("De Linde"));
        assert_eq!(rows[0]["KVK"], MetaValue::Integer(12345678));
        assert!(!rows[0].contains_key(""));
        assert_eq!(rows[1]["KVK"], MetaValue::Float(1.5));
    }

    #[test]
    fn header_below_title_row() {
        let range = sheet(&[
            &[s("Websiteregister Rijksoverheid"), Data::Empty],
            &[s("URL"), s("Organisatie")],
            &[s("https://www.rijksoverheid.nl"), s("AZ")],
        ]);

        let rows = rows(&range, 1);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["URL"], MetaValue::from("https://www.rijksoverheid.nl"));
        assert_eq!(rows[0]["Organisatie"], MetaValue::from("AZ"));
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        assert!(rows(&sheet(&[&[s("URL")]]), 0).is_empty());
    }

    #[test]
    fn translate_keeps_and_renames_known_columns() {
        let columns = [("INTERNET", "domain"), ("INTERNETADRES", "domain"), ("PLAATSNAAM", "plaats")];
        let rows = vec![
            row(&[
                ("INTERNET", "a.nl".into()),
                ("INTERNETADRES", MetaValue::Null),
                ("PLAATSNAAM", "Leeuwarden".into()),
                ("BRIN", "00AA".into()),
            ]),
            row(&[("INTERNETADRES", "b.nl".into())]),
        ];

        let translated = translate(&columns, rows);

        assert_eq!(
            translated[0],
            row(&[("domain", "a.nl".into()), ("plaats", "Leeuwarden".into())])
        );
        assert_eq!(translated[1], row(&[("domain", "b.nl".into())]));
    }

    #[test]
    fn domain_lists_fan_out_and_blank_domains_are_skipped() {
        let rows = vec![
            row(&[
                ("domain", MetaValue::from(vec!["https://a.nl/", "www.a.nl"])),
                ("type", "Gemeente".into()),
            ]),
            row(&[("domain", MetaValue::Null), ("type", "Provincie".into())]),
            row(&[("type", "Ministerie".into())]),
            row(&[("domain", "not a domain".into()), ("type", "Gemeente".into())]),
        ];

        let records = rows_to_records(
            rows,
            "domain",
            Country::NL,
            Category::Government,
            Subcategory::Column("type"),
        );

        let keys: Vec<&str> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a.nl", "www.a.nl"]);
        assert!(records.iter().all(|r| r.subcategory == "Gemeente"));
        assert!(records.iter().all(|r| r.country == "NL" && r.category == "Government"));
        assert_eq!(records[0].meta, row(&[("type", "Gemeente".into())]));
    }

    #[test]
    fn fixed_subcategory() {
        let rows = vec![row(&[("URL", "https://www.defensie.nl".into())])];

        let records = rows_to_records(
            rows,
            "URL",
            Country::NL,
            Category::Government,
            Subcategory::Fixed("national government"),
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "www.defensie.nl");
        assert_eq!(records[0].subcategory, "national government");
        assert!(records[0].meta.is_empty());
    }

    #[test]
    fn unreadable_workbook_is_an_error() {
        assert!(read_first_sheet(b"not a spreadsheet".to_vec(), 0).is_err());
    }
}
