//! Dutch schools and institutions from DUO's open education data.
//!
//! DUO publishes one xlsx sheet per kind of institution. Every sheet is
//! downloaded, the known columns are kept under stable names and the
//! website column becomes the record key.

use anyhow::{Context, Result};
use async_trait::async_trait;
use getter_engine::{Getter, Record};
use tracing::{debug, info};

use crate::http::{flat_map_bounded, HttpClient};
use crate::sheet::{read_first_sheet, rows_to_records, translate, Row, Subcategory};
use crate::taxonomy::{Category, Country};

/// Sheet url and the subcategory of everything in it.
const SHEETS: [(&str, &str); 9] = [
    (
        "https://www.duo.nl/open_onderwijsdata/images/01.-hoofdvestigingen-basisonderwijs.xlsx",
        "primary education",
    ),
    (
        "https://www.duo.nl/open_onderwijsdata/images/02.-alle-schoolvestigingen-basisonderwijs.xlsx",
        "primary education",
    ),
    (
        "https://www.duo.nl/open_onderwijsdata/images/08.-hoofdvestigingen-sbo,-so-en-vso.xlsx",
        "speciality education",
    ),
    (
        "https://www.duo.nl/open_onderwijsdata/images/09.-alle-vestigingen-speciaal-(basis)onderwijs.xlsx",
        "speciality education",
    ),
    (
        "https://www.duo.nl/open_onderwijsdata/images/01.-hoofdvestigingen-vo.xlsx",
        "secondary education",
    ),
    (
        "https://www.duo.nl/open_onderwijsdata/images/02.-alle-vestigingen-vo.xlsx",
        "secondary education",
    ),
    (
        "https://www.duo.nl/open_onderwijsdata/images/04.-samenwerkingsverbanden-passend-onderwijs-vo.xlsx",
        "samenwerkingsverband passend onderwijs",
    ),
    (
        "https://duo.nl/open_onderwijsdata/images/01.-adressen-instellingen.xlsx",
        "trade school",
    ),
    (
        "https://duo.nl/open_onderwijsdata/images/01.-instellingen-hbo-en-wo.xlsx",
        "university",
    ),
];

/// DUO column header and the meta name it is kept under.
const COLUMNS: [(&str, &str); 17] = [
    ("INSTELLINGSNAAM", "name"),
    ("ADRES", "adres"),
    ("STRAATNAAM", "adres_straat"),
    ("HUISNUMMER-TOEVOEGING", "adres_nummer"),
    ("POSTCODE", "postcode"),
    ("PLAATSNAAM", "plaats"),
    ("CORRESPONDENTIEADRES", "correspondentieadres"),
    ("STRAATNAAM CORRESPONDENTIEADRES", "correspondentieadres_straat"),
    ("HUISNUMMER-TOEVOEGING CORRESPONDENTIEADRES", "correspondentieadres_nummer"),
    ("POSTCODE CORRESPONDENTIEADRES", "correspondentieadres_postcode"),
    ("PLAATS CORRESPONDENTIEADRES", "correspondentieadres_plaats"),
    ("PLAATSNAAM CORRESPONDENTIEADRES", "correspondentieadres_plaats"),
    ("DENOMINATIE", "denominatie"),
    ("KVK-NUMMER", "kvknummer"),
    ("TELEFOONNUMMER", "telefoonnummer"),
    ("INTERNET", "domain"),
    ("INTERNETADRES", "domain"),
];

pub struct DuoGetter {
    client: HttpClient,
    concurrency: usize,
}

impl DuoGetter {
    pub fn new(client: HttpClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency,
        }
    }

    async fn sheet(&self, url: &'static str, kind: &'static str) -> Result<Vec<Record>> {
        let bytes = self
            .client
            .get_bytes(url)
            .await
            .with_context(|| format!("downloading {}", url))?;

        let records = parse_sheet(bytes, kind).with_context(|| format!("reading {}", url))?;
        debug!(url, kind, records = records.len(), "sheet read");
        Ok(records)
    }
}

#[async_trait]
impl Getter for DuoGetter {
    fn name(&self) -> &'static str {
        "nl_onderwijs_all"
    }

    fn description(&self) -> &'static str {
        "Schools and institutions from DUO open education data"
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        let records = flat_map_bounded((0..SHEETS.len()).collect(), self.concurrency, |i: usize| {
            let (url, kind) = SHEETS[i];
            self.sheet(url, kind)
        })
        .await?;

        info!(records = records.len(), sheets = SHEETS.len(), "education sheets read");
        Ok(records)
    }
}

/// Records in one downloaded DUO workbook.
pub fn parse_sheet(bytes: Vec<u8>, kind: &str) -> Result<Vec<Record>> {
    Ok(records_from_rows(read_first_sheet(bytes, 0)?, kind))
}

/// Records in the rows of one DUO sheet, all with subcategory `kind`.
pub fn records_from_rows(rows: Vec<Row>, kind: &str) -> Vec<Record> {
    rows_to_records(
        translate(&COLUMNS, rows),
        "domain",
        Country::NL,
        Category::Education,
        Subcategory::Fixed(kind),
    )
}
