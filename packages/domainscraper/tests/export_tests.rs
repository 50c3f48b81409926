//! Export of results persisted by a real run against the SQLite store.

use domainscraper_core::export::{readme, write_csv, write_json, CSV_HEADER};
use getter_engine::{
    testing::{record, FailingGetter, StaticGetter},
    GetterRegistry, RecordInfo, ResultStore, Runner, SqliteStore,
};

/// Helper to run one succeeding and one failing getter.
async fn setup_runner() -> Runner<SqliteStore> {
    let mut registry = GetterRegistry::new();
    registry
        .register(StaticGetter::new(
            "nl_healthcare_zorgkaart",
            vec![
                record("www.delinde.nl")
                    .with_meta_entry("name", "Huisartsenpraktijk \"De Linde\"")
                    .with_meta_entry("address", "Lindelaan 1, Utrecht"),
                record("kliniek.nl").with_meta_entry("telephone", None::<String>),
            ],
        ))
        .unwrap();
    registry
        .register(FailingGetter::new("nl_rijksoverheids_webregister", "HTTP 503 for https://example.nl"))
        .unwrap();

    let runner = Runner::new(registry, SqliteStore::in_memory().await.unwrap());
    runner.run_all().await.unwrap();
    runner
}

async fn stored_records(runner: &Runner<SqliteStore>) -> Vec<RecordInfo> {
    runner.store().records().await.unwrap()
}

#[tokio::test]
async fn test_csv_has_header_and_one_row_per_record() {
    let runner = setup_runner().await;
    let records = stored_records(&runner).await;

    let mut out = Vec::new();
    write_csv(&mut out, &records).unwrap();
    let csv = String::from_utf8(out).unwrap();

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER.join(","));
    assert!(lines[1].starts_with("kliniek.nl,NL,Healthcare,test,\"{\"\"telephone\"\":null}\","));
    assert!(lines[1].ends_with(",nl_healthcare_zorgkaart"));
    assert!(lines[2].contains("\"\"Huisartsenpraktijk \\\"\"De Linde\\\"\"\"\""));
}

#[tokio::test]
async fn test_csv_of_empty_store_is_header_only() {
    let mut out = Vec::new();
    write_csv(&mut out, &[]).unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", CSV_HEADER.join(",")));
}

#[tokio::test]
async fn test_json_nests_meta() {
    let runner = setup_runner().await;
    let records = stored_records(&runner).await;

    let mut out = Vec::new();
    write_json(&mut out, &records).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["key"], "www.delinde.nl");
    assert_eq!(rows[1]["getter_name"], "nl_healthcare_zorgkaart");
    assert_eq!(rows[1]["meta"]["address"], "Lindelaan 1, Utrecht");
    assert!(rows[0]["meta"]["telephone"].is_null());
    assert!(rows[0]["first_found_at"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_readme_reports_every_getter() {
    let runner = setup_runner().await;
    let jobs = runner.store().job_infos().await.unwrap();

    let text = readme(&jobs);

    assert!(text.starts_with("# Public Sector Domains - Results"));
    let report = text.split("## Report").nth(1).unwrap();
    assert!(report.contains("| nl_healthcare_zorgkaart       | Success | Found 2 domains"));
    assert!(report.contains("| nl_rijksoverheids_webregister | Failed  | HTTP 503 for https://example.nl"));
}
