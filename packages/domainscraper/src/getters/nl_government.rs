//! Websites of the Dutch national government.
//!
//! The government publishes an ODS register of every website it runs. The
//! file name changes over time, but it is always the one link in the intro
//! of the register page.

use anyhow::{Context, Result};
use async_trait::async_trait;
use getter_engine::{Getter, Record};
use reqwest::Url;
use scraper::{Html, Selector};
use tracing::info;

use crate::http::HttpClient;
use crate::sheet::{read_first_sheet, rows_to_records, translate, Row, Subcategory};
use crate::taxonomy::{Category, Country};

const REGISTER_PAGE: &str = "https://www.communicatierijk.nl/vakkennis/rijkswebsites/verplichte-richtlijnen/websiteregister-rijksoverheid";

/// The register has a title row above its header.
const HEADER_ROW: usize = 1;

const COLUMNS: [(&str, &str); 6] = [
    ("URL", "URL"),
    ("Organisatie", "organisation"),
    ("Suborganisatie", "suborganisation"),
    ("Afdeling", "department"),
    ("Bezoeken/mnd", "visitors/month"),
    ("Platformgebruik", "hosting platform"),
];

pub struct WebregisterGetter {
    client: HttpClient,
}

impl WebregisterGetter {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Getter for WebregisterGetter {
    fn name(&self) -> &'static str {
        "nl_rijksoverheids_webregister"
    }

    fn description(&self) -> &'static str {
        "Websites in the national government's website register"
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        let page = self
            .client
            .get_html(REGISTER_PAGE)
            .await
            .context("fetching register page")?;

        let register_url = parse_register_link(&page, REGISTER_PAGE)?;
        info!(url = %register_url, "website register found");

        let bytes = self
            .client
            .get_bytes(&register_url)
            .await
            .with_context(|| format!("downloading {}", register_url))?;

        parse_register(bytes).with_context(|| format!("reading {}", register_url))
    }
}

/// Absolute url of the register file linked from the register page.
pub fn parse_register_link(html: &str, page_url: &str) -> Result<String> {
    let selector = Selector::parse("div.intro a[href]")
        .map_err(|e| anyhow::anyhow!("invalid selector: {}", e))?;

    let href = Html::parse_document(html)
        .select(&selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
        .context("the website register page seems to have changed format")?;

    let url = Url::parse(page_url)
        .and_then(|base| base.join(&href))
        .with_context(|| format!("invalid register link {}", href))?;
    Ok(url.to_string())
}

/// Records in the downloaded register.
pub fn parse_register(bytes: Vec<u8>) -> Result<Vec<Record>> {
    Ok(records_from_rows(read_first_sheet(bytes, HEADER_ROW)?))
}

/// Records in the rows of the register.
pub fn records_from_rows(rows: Vec<Row>) -> Vec<Record> {
    rows_to_records(
        translate(&COLUMNS, rows),
        "URL",
        Country::NL,
        Category::Government,
        Subcategory::Fixed("national government"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use getter_engine::MetaValue;

    const PAGE: &str = r#"
        <html><body>
          <nav><a href="/home">Home</a></nav>
          <div class="intro">
            <p>Download het <a href="/binaries/communicatierijk/documenten/websiteregister-2024.ods">websiteregister</a>.</p>
          </div>
          <a href="/other.ods">Other</a>
        </body></html>
    "#;

    #[test]
    fn register_link_is_made_absolute() {
        let url = parse_register_link(PAGE, REGISTER_PAGE).unwrap();

        assert_eq!(
            url,
            "https://www.communicatierijk.nl/binaries/communicatierijk/documenten/websiteregister-2024.ods"
        );
    }

    #[test]
    fn page_without_intro_link_fails() {
        let err = parse_register_link("<div class=\"intro\"><p>Nothing</p></div>", REGISTER_PAGE)
            .unwrap_err();

        assert!(err.to_string().contains("changed format"));
    }

    #[test]
    fn register_rows_become_records() {
        let mut row = Row::new();
        row.insert("URL".into(), "https://www.rijksoverheid.nl".into());
        row.insert("Organisatie".into(), "AZ".into());
        row.insert("Bezoeken/mnd".into(), MetaValue::Integer(1_200_000));
        row.insert("Opmerking".into(), "intern".into());

        let mut empty = Row::new();
        empty.insert("URL".into(), MetaValue::Null);
        empty.insert("Organisatie".into(), "BZK".into());

        let records = records_from_rows(vec![row, empty]);

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.key, "www.rijksoverheid.nl");
        assert_eq!(record.category, "Government");
        assert_eq!(record.subcategory, "national government");
        assert_eq!(record.meta["organisation"], MetaValue::from("AZ"));
        assert_eq!(record.meta["visitors/month"], MetaValue::Integer(1_200_000));
        assert!(!record.meta.contains_key("Opmerking"));
        assert!(!record.meta.contains_key("URL"));
    }
}
