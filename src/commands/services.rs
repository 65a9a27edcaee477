//! Service factory for building command dependencies.
//!
//! Services are built from configuration values but are not part of the
//! configuration itself.

use anyhow::Result;
use reqwest::Client;
use std::sync::Arc;

use crate::{http::HttpClient, runtime::RealRuntime, source::WebSource};

use super::config::Config;

/// Build the HTTP client shared by every remote call.
pub fn build_http_client() -> Result<HttpClient> {
    let client = Client::builder().user_agent("apkpull-cli").build()?;
    Ok(HttpClient::new(client))
}

/// Build the remote source from configuration.
pub fn build_source(config: &Config) -> Result<WebSource<RealRuntime>> {
    WebSource::new(Arc::new(RealRuntime), build_http_client()?, &config.source_url)
}
