//! Result tables.
//!
//! Both the run commands and the results README show one row per getter:
//! `Name | Status | Description`, rendered as a GitHub-flavoured markdown
//! table so the same text works in a terminal and on a repository page.

use getter_engine::{JobInfo, RunResult};

const HEADERS: [&str; 3] = ["Name", "Status", "Description"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub name: String,
    pub status: &'static str,
    pub description: String,
}

fn status(success: bool) -> &'static str {
    if success {
        "Success"
    } else {
        "Failed"
    }
}

impl From<&RunResult> for ReportRow {
    fn from(result: &RunResult) -> Self {
        Self {
            name: result.job_name.clone(),
            status: status(result.success()),
            description: result.description(),
        }
    }
}

impl From<&JobInfo> for ReportRow {
    fn from(info: &JobInfo) -> Self {
        Self {
            name: info.name.clone(),
            status: status(info.success),
            description: info.description(),
        }
    }
}

/// Rows for the results of a run, in run order.
pub fn result_rows(results: &[RunResult]) -> Vec<ReportRow> {
    results.iter().map(ReportRow::from).collect()
}

/// Rows for every persisted getter.
pub fn job_rows(infos: &[JobInfo]) -> Vec<ReportRow> {
    infos.iter().map(ReportRow::from).collect()
}

// Pipes would split the cell, newlines the row
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render rows as a GitHub-flavoured markdown table with aligned columns.
pub fn markdown_table(rows: &[ReportRow]) -> String {
    let cells: Vec<[String; 3]> = rows
        .iter()
        .map(|row| {
            [
                escape_cell(&row.name),
                row.status.to_string(),
                escape_cell(&row.description),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |row: [&str; 3]| {
        let padded: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let pad = width - cell.chars().count();
                format!(" {}{} ", cell, " ".repeat(pad))
            })
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut out = Vec::with_capacity(cells.len() + 2);
    out.push(line(HEADERS));
    out.push(format!(
        "|{}|",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in &cells {
        out.push(line([row[0].as_str(), row[1].as_str(), row[2].as_str()]));
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use getter_engine::testing::record;

    #[test]
    fn renders_results() {
        let results = vec![
            RunResult::succeeded("nl_a", vec![record("a.nl"), record("b.nl")]),
            RunResult::failed("nl_b", "timeout"),
        ];

        let table = markdown_table(&result_rows(&results));

        assert_eq!(
            table,
            "| Name | Status  | Description     |\n\
             |------|---------|-----------------|\n\
             | nl_a | Success | Found 2 domains |\n\
             | nl_b | Failed  | timeout         |"
        );
    }

    #[test]
    fn header_only_when_empty() {
        let table = markdown_table(&[]);
        assert_eq!(
            table,
            "| Name | Status | Description |\n|------|--------|-------------|"
        );
    }

    #[test]
    fn multiline_errors_stay_on_one_row() {
        let results = vec![RunResult::failed("nl_b", "bad | row\nsecond line")];

        let table = markdown_table(&result_rows(&results));

        assert_eq!(table.lines().count(), 3);
        assert!(table.contains("bad \\| row second line"));
    }
}
