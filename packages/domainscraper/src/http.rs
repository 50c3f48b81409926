//! HTTP fetching for getters.
//!
//! - Uses reqwest for HTTP requests
//! - Returns raw HTML or file bytes; parsing happens in synchronous helpers so that
//!   `scraper::Html` (which is not `Send`) never lives across an await
//! - Bounded fan-out over many URLs via [`map_bounded`]

use anyhow::{Context, Result};
use futures::{stream, Future, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use tracing::debug;

use crate::config::Config;

/// Shared HTTP client for all getters.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("nl-NL,nl;q=0.9,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.http_user_agent.as_str())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Fetch raw HTML from a URL, failing on any non-success status.
    pub async fn get_html(&self, url: &str) -> Result<String> {
        self.try_get_html(url)
            .await?
            .with_context(|| format!("HTTP 404 for {}", url))
    }

    /// Fetch raw HTML from a URL, `None` if the page does not exist.
    pub async fn try_get_html(&self, url: &str) -> Result<Option<String>> {
        let Some(response) = self.send(url).await? else {
            return Ok(None);
        };

        response
            .text()
            .await
            .map(Some)
            .context("Failed to read response body")
    }

    /// Download a file, failing on any non-success status.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .send(url)
            .await?
            .with_context(|| format!("HTTP 404 for {}", url))?;

        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to download {}", url))?;
        Ok(body.to_vec())
    }

    async fn send(&self, url: &str) -> Result<Option<reqwest::Response>> {
        debug!(url, "fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {}", url))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("HTTP {} for {}", status, url);
        }

        Ok(Some(response))
    }
}

/// Apply `f` to every item with at most `concurrency` calls in flight.
///
/// Output order matches input order. The first error aborts the whole map.
pub async fn map_bounded<T, R, F, Fut>(items: Vec<T>, concurrency: usize, f: F) -> Result<Vec<R>>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    stream::iter(items.into_iter().map(f))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

/// Like [`map_bounded`], concatenating the per-item lists.
pub async fn flat_map_bounded<T, R, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    f: F,
) -> Result<Vec<R>>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<Vec<R>>>,
{
    let nested = map_bounded(items, concurrency, f).await?;
    Ok(nested.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn keeps_input_order() {
        let out = map_bounded(vec![3u64, 1, 2], 3, |n| async move {
            tokio::time::sleep(Duration::from_millis(n * 5)).await;
            Ok(n * 10)
        })
        .await
        .unwrap();

        assert_eq!(out, vec![30, 10, 20]);
    }

    #[tokio::test]
    async fn never_exceeds_concurrency() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        map_bounded((0..20).collect::<Vec<i32>>(), 4, |_| {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn first_error_fails_the_map() {
        let result = map_bounded(vec![1, 2, 3], 2, |n| async move {
            if n == 2 {
                anyhow::bail!("page {} broke", n);
            }
            Ok(n)
        })
        .await;

        assert_eq!(result.unwrap_err().to_string(), "page 2 broke");
    }

    #[tokio::test]
    async fn flattens() {
        let out = flat_map_bounded(vec![1, 2], 2, |n| async move { Ok(vec![n; n]) })
            .await
            .unwrap();

        assert_eq!(out, vec![1, 2, 2]);
    }
}
