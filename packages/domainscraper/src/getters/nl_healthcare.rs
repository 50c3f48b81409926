//! Dutch healthcare providers from zorgkaartnederland.nl.
//!
//! No government register of healthcare providers exists, so the public
//! directory is scraped instead:
//!
//! 1. The organisation-type overview lists one search page per type.
//! 2. Each search is paginated (`{search}/pagina{n}`, 20 results a page)
//!    until a page comes back without results.
//! 3. Each result links to a detail page with name, type, address,
//!    telephone and website.
//!
//! Only organisations that list a website become records.

use anyhow::{Context, Result};
use async_trait::async_trait;
use getter_engine::{keep_valid, Getter, Record, RecordResult};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

use crate::http::{flat_map_bounded, map_bounded, HttpClient};
use crate::taxonomy::{Category, Country};

const BASE_URL: &str = "https://www.zorgkaartnederland.nl";
const OVERVIEW_URL: &str = "https://www.zorgkaartnederland.nl/overzicht/organisatietypes";

/// Hard stop for pagination, far beyond the directory's size.
const MAX_SEARCH_PAGES: usize = 10_000;

pub struct ZorgkaartGetter {
    client: HttpClient,
    concurrency: usize,
}

impl ZorgkaartGetter {
    pub fn new(client: HttpClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency,
        }
    }

    async fn search_links(&self, search: String) -> Result<Vec<String>> {
        let mut links = Vec::new();

        for page in 1..MAX_SEARCH_PAGES {
            let url = format!("{}/pagina{}", search, page);
            let Some(html) = self.client.try_get_html(&url).await? else {
                break;
            };

            let found = parse_search_results(&html);
            if found.is_empty() {
                break;
            }
            links.extend(found);
        }

        debug!(search = %search, links = links.len(), "search exhausted");
        Ok(links)
    }

    async fn detail(&self, url: String) -> Result<Option<RecordResult<Record>>> {
        let html = self
            .client
            .get_html(&url)
            .await
            .with_context(|| format!("fetching organisation page {}", url))?;

        Ok(parse_detail_page(&html))
    }
}

#[async_trait]
impl Getter for ZorgkaartGetter {
    fn name(&self) -> &'static str {
        "nl_healthcare_zorgkaart"
    }

    fn description(&self) -> &'static str {
        "Healthcare organisations listed on zorgkaartnederland.nl"
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        let overview = self
            .client
            .get_html(OVERVIEW_URL)
            .await
            .context("fetching organisation types")?;

        let searches = parse_organisation_types(&overview);
        if searches.is_empty() {
            anyhow::bail!("no organisation types found, the overview page format seems to have changed");
        }
        info!(searches = searches.len(), "organisation types found");

        let links = flat_map_bounded(searches, self.concurrency, |search| {
            self.search_links(search)
        })
        .await?;
        info!(pages = links.len(), "organisation pages found");

        let candidates = map_bounded(links, self.concurrency, |url| self.detail(url)).await?;

        Ok(keep_valid(candidates.into_iter().flatten()))
    }
}

/// Collapse runs of whitespace into single spaces and trim.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn absolute(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", BASE_URL, href)
    }
}

fn hrefs(html: &str, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };

    Html::parse_document(html)
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(absolute)
        .collect()
}

/// Search page URLs, one per organisation type.
pub fn parse_organisation_types(html: &str) -> Vec<String> {
    hrefs(html, "a.filter-radio[href]")
}

/// Detail page URLs on one page of search results.
pub fn parse_search_results(html: &str) -> Vec<String> {
    hrefs(html, "a.filter-result__name[href]")
}

/// The record described by an organisation detail page.
///
/// `None` when the page has no address block or lists no website.
pub fn parse_detail_page(html: &str) -> Option<RecordResult<Record>> {
    let document = Html::parse_document(html);

    let info_selector = Selector::parse(".modal-address").ok()?;
    let name_selector = Selector::parse("h2").ok()?;
    let type_selector = Selector::parse("p.mb-2").ok()?;
    let address_selector = Selector::parse("address").ok()?;
    let link_selector = Selector::parse("a[href]").ok()?;

    let info = document.select(&info_selector).next()?;
    let first_text = |selector: &Selector| {
        info.select(selector)
            .next()
            .map(element_text)
            .unwrap_or_default()
    };

    let name = first_text(&name_selector);
    let kind = first_text(&type_selector);
    let address = first_text(&address_selector);

    let mut site = None;
    let mut telephone = None;
    for href in info.select(&link_selector).filter_map(|a| a.value().attr("href")) {
        if href.starts_with("https://") || href.starts_with("http://") {
            site = Some(href.to_string());
        }
        if let Some(number) = href.strip_prefix("tel:") {
            telephone = Some(number.to_string());
        }
    }

    let site = site?;
    Some(
        Record::new(
            &site,
            Country::NL.as_str(),
            Category::Healthcare.as_str(),
            kind,
        )
        .map(|record| {
            record
                .with_meta_entry("telephone", telephone)
                .with_meta_entry("address", address)
                .with_meta_entry("name", name)
        }),
    )
}
