//! All getters known to the application.
//!
//! Every getter is registered here, in the order `list` and `run all` use.

pub mod nl_education;
pub mod nl_government;
pub mod nl_healthcare;

use anyhow::Result;
use getter_engine::GetterRegistry;

use crate::config::Config;
use crate::http::HttpClient;

pub use nl_education::DuoGetter;
pub use nl_government::WebregisterGetter;
pub use nl_healthcare::ZorgkaartGetter;

/// Register every getter into `registry`.
pub fn register_all(registry: &mut GetterRegistry, config: &Config) -> Result<()> {
    let client = HttpClient::new(config)?;

    registry.register(DuoGetter::new(client.clone(), config.fetch_concurrency))?;
    registry.register(WebregisterGetter::new(client.clone()))?;
    registry.register(ZorgkaartGetter::new(client, config.fetch_concurrency))?;

    Ok(())
}

/// A registry holding every getter.
pub fn build_registry(config: &Config) -> Result<GetterRegistry> {
    let mut registry = GetterRegistry::new();
    register_all(&mut registry, config)?;
    Ok(registry)
}
