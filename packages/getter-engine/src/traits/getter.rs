//! The unit of work: a named getter producing records.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;

use crate::types::record::Record;

/// A named, independently schedulable data-collection job.
///
/// Implementations fetch from one external source and return every record
/// they found. Errors are reported through `anyhow` and end up in the
/// persisted run result; they never abort other getters.
///
/// # Example
///
/// ```rust,ignore
/// pub struct RijksWebregister { client: HttpClient }
///
/// #[async_trait]
/// impl Getter for RijksWebregister {
///     fn name(&self) -> &'static str { "nl_rijksoverheids_webregister" }
///
///     async fn fetch(&self) -> anyhow::Result<Vec<Record>> {
///         let rows = self.client.get_text(REGISTER_URL).await?;
///         Ok(keep_valid(parse(&rows)))
///     }
/// }
/// ```
#[async_trait]
pub trait Getter: Send + Sync + 'static {
    /// Unique name, used as key in storage and on the command line
    fn name(&self) -> &'static str;

    /// Optional description shown in listings
    fn description(&self) -> &'static str {
        ""
    }

    /// Fetch every record from the source.
    async fn fetch(&self) -> anyhow::Result<Vec<Record>>;
}

type BoxedFetch = Box<
    dyn Fn() -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Record>>> + Send>> + Send + Sync,
>;

/// A getter built from a name and an async closure.
pub struct FnGetter {
    name: &'static str,
    fetch: BoxedFetch,
}

impl FnGetter {
    pub fn new<F, Fut>(name: &'static str, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Vec<Record>>> + Send + 'static,
    {
        Self {
            name,
            fetch: Box::new(move || Box::pin(fetch())),
        }
    }
}

#[async_trait]
impl Getter for FnGetter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Record>> {
        (self.fetch)().await
    }
}
