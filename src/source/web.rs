//! Remote source backed by the catalog website's HTML pages.
//!
//! Search results are package links of the form `{base}/{slug}/{name.with.dots}`;
//! version pages list `ver_download_link` anchors. Downloads are plain HTTP GETs
//! written to `{name}.part` and renamed once the body has been received.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use log::{debug, warn};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::domain::model::ProgressEvent;
use crate::http::HttpClient;
use crate::pull::ARTIFACT_EXTENSIONS;
use crate::runtime::Runtime;

use super::{DownloadStream, PackageSummary, Source, VersionSummary};

/// Buffered progress events per download; extra in-progress events are dropped.
const EVENT_BUFFER: usize = 64;

const VERSION_LINK_CLASS: &str = "ver_download_link";

pub struct WebSource<R: Runtime> {
    runtime: Arc<R>,
    http: HttpClient,
    base_url: String,
    anchor: Regex,
    href: Regex,
    class: Regex,
    rating: Regex,
    published: Regex,
}

impl<R: Runtime> WebSource<R> {
    pub fn new(runtime: Arc<R>, http: HttpClient, base_url: &str) -> Result<Self> {
        Ok(Self {
            runtime,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anchor: Regex::new(r"(?is)<a\s([^>]*)>")?,
            href: Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']*)["']"#)?,
            class: Regex::new(r#"(?i)\bclass\s*=\s*["']([^"']*)["']"#)?,
            rating: Regex::new(
                r#"(?is)class\s*=\s*["'](?:[^"']*\s)?star(?:\s[^"']*)?["'][^>]*>\s*([0-9]+(?:\.[0-9]+)?)"#,
            )?,
            published: Regex::new(
                r#"(?is)class\s*=\s*["'](?:[^"']*\s)?update-on(?:\s[^"']*)?["'][^>]*>\s*([^<]*?)\s*<"#,
            )?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Package links found in a search result page, in page order.
    pub fn parse_search_results(&self, html: &str) -> Vec<PackageSummary> {
        let links = self.links(html, |url, _| self.is_package_url(url));
        let mut results: Vec<PackageSummary> = Vec::new();

        for (url, segment) in links {
            let rating = self
                .rating
                .captures(segment)
                .and_then(|c| c[1].parse::<f64>().ok());

            match results.iter_mut().find(|r| r.url == url) {
                // Listing pages often link the same package twice (icon, title).
                Some(existing) => {
                    if existing.rating.is_none() {
                        existing.rating = rating;
                    }
                }
                None => results.push(PackageSummary { url, rating }),
            }
        }
        results
    }

    /// Version download links found on a package's versions page, in page order.
    pub fn parse_versions(&self, html: &str) -> Vec<VersionSummary> {
        self.links(html, |_, attrs| {
            self.class
                .captures(attrs)
                .is_some_and(|c| c[1].split_whitespace().any(|cls| cls == VERSION_LINK_CLASS))
        })
        .into_iter()
        .filter_map(|(url, segment)| {
            let tag = version_tag_from_url(&url)?;
            let published_at = self
                .published
                .captures(segment)
                .map(|c| c[1].trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "unknown".to_string());
            Some(VersionSummary {
                url,
                tag,
                published_at,
            })
        })
        .collect()
    }

    /// Anchors accepted by `keep`, each with the HTML up to the next accepted anchor.
    fn links<'h>(
        &self,
        html: &'h str,
        keep: impl Fn(&str, &str) -> bool,
    ) -> Vec<(String, &'h str)> {
        let anchors: Vec<(usize, String)> = self
            .anchor
            .captures_iter(html)
            .filter_map(|c| {
                let start = c.get(0)?.start();
                let attrs = c.get(1)?.as_str();
                let href = self.href.captures(attrs)?.get(1)?.as_str();
                let url = self.resolve(href)?;
                keep(&url, attrs).then_some((start, url))
            })
            .collect();

        anchors
            .iter()
            .enumerate()
            .map(|(i, (start, url))| {
                let end = anchors.get(i + 1).map_or(html.len(), |(next, _)| *next);
                (url.clone(), &html[*start..end])
            })
            .collect()
    }

    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim().replace("&amp;", "&");
        if href.starts_with("https://") || href.starts_with("http://") {
            Some(href)
        } else if let Some(rest) = href.strip_prefix("//") {
            let scheme = self.base_url.split("://").next().unwrap_or("https");
            Some(format!("{}://{}", scheme, rest))
        } else if href.starts_with('/') {
            Some(format!("{}{}", self.base_url, href))
        } else {
            None
        }
    }

    fn is_package_url(&self, url: &str) -> bool {
        let Some(rest) = url.strip_prefix(&self.base_url) else {
            return false;
        };
        let Some(path) = rest.strip_prefix('/') else {
            return false;
        };
        let parts: Vec<&str> = path.split('/').collect();
        parts.len() == 2
            && !parts[0].is_empty()
            && !parts[1].starts_with('.')
            && parts[1].contains('.')
            && !parts[1].ends_with('.')
            && !parts[1].contains(['?', '#'])
    }
}

fn version_tag_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    let tag = percent_decode_str(segment).decode_utf8_lossy().trim().to_string();
    (!tag.is_empty()).then_some(tag)
}

#[async_trait]
impl<R: Runtime + 'static> Source for WebSource<R> {
    #[tracing::instrument(skip(self))]
    async fn search(&self, terms: &[String]) -> Result<Vec<PackageSummary>> {
        let search_url = format!("{}/search", self.base_url);
        let mut results: Vec<PackageSummary> = Vec::new();

        for term in terms {
            let html = self
                .http
                .get_text_with_query(&search_url, &[("q", term.as_str())])
                .await
                .with_context(|| format!("Failed to search for '{}'", term))?;

            let found = self.parse_search_results(&html);
            debug!("'{}' matched {} package(s)", term, found.len());
            for summary in found {
                if !results.iter().any(|r| r.url == summary.url) {
                    results.push(summary);
                }
            }
        }
        Ok(results)
    }

    #[tracing::instrument(skip(self))]
    async fn list_versions(&self, package_url: &str) -> Result<Vec<VersionSummary>> {
        let versions_url = format!("{}/versions", package_url.trim_end_matches('/'));
        let html = self
            .http
            .get_text(&versions_url)
            .await
            .with_context(|| format!("Failed to list versions of {}", package_url))?;
        Ok(self.parse_versions(&html))
    }

    #[tracing::instrument(skip(self))]
    async fn download(&self, version_url: &str, destination: &Path) -> Result<DownloadStream> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let runtime = Arc::clone(&self.runtime);
        let http = self.http.clone();
        let url = version_url.to_string();
        let destination = destination.to_path_buf();

        tokio::spawn(async move {
            let event = match fetch_to(runtime.as_ref(), &http, &url, &destination, &tx).await {
                Ok(path) => ProgressEvent::Completed { path: Some(path) },
                Err(e) => {
                    warn!("Download of {} failed: {:#}", url, e);
                    ProgressEvent::Canceled {
                        reason: format!("{:#}", e),
                    }
                }
            };
            let _ = tx.send(event).await;
        });

        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed())
    }
}

/// Download into `{destination}/{name}.part`, then rename to `{name}`.
async fn fetch_to<R: Runtime>(
    runtime: &R,
    http: &HttpClient,
    url: &str,
    destination: &Path,
    tx: &mpsc::Sender<ProgressEvent>,
) -> Result<PathBuf> {
    let mut target: Option<PathBuf> = None;

    http.download_file(
        url,
        |suggested| {
            let name = artifact_file_name(suggested);
            let final_path = destination.join(&name);
            let part_path = destination.join(format!("{}.part", name));
            target = Some(final_path);
            runtime.create_file(&part_path)
        },
        |received_bytes, total_bytes| {
            let _ = tx.try_send(ProgressEvent::InProgress {
                received_bytes,
                total_bytes,
            });
        },
    )
    .await?;

    let final_path = target.context("Download finished without a target file")?;
    let mut part_name = final_path.clone().into_os_string();
    part_name.push(".part");
    runtime
        .rename(Path::new(&part_name), &final_path)
        .with_context(|| format!("Failed to move download into {:?}", final_path))?;
    Ok(final_path)
}

/// `suggested`, with `.apk` appended unless it already ends in an artifact extension.
fn artifact_file_name(suggested: &str) -> String {
    let has_artifact_ext = Path::new(suggested)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ARTIFACT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if has_artifact_ext {
        suggested.to_string()
    } else {
        format!("{}.apk", suggested)
    }
}
