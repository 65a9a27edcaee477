//! HTTP client wrapper for page fetches and streaming downloads.

use anyhow::{Context, Result};
use log::debug;
use percent_encoding::percent_decode_str;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Response};
use std::io::Write;

/// HTTP client used by the remote source. Failures are returned as-is;
/// nothing here retries.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and returns the response body as text.
    #[tracing::instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.get_text_with_query(url, &[]).await
    }

    /// Performs a GET request with query parameters and returns the body as text.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_text_with_query(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        debug!("GET {} with query {:?}...", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?
            .error_for_status()
            .with_context(|| format!("Request to {} failed", url))?;

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }

    /// Downloads `url` into the writer returned by `create_writer`.
    ///
    /// `create_writer` receives the file name suggested by the response
    /// (Content-Disposition, then the final URL segment). `on_progress` is
    /// called after every chunk with the bytes received so far and the total
    /// size when the server announced one.
    #[tracing::instrument(skip(self, create_writer, on_progress))]
    pub async fn download_file<W, F, P>(
        &self,
        url: &str,
        create_writer: F,
        mut on_progress: P,
    ) -> Result<u64>
    where
        W: Write,
        F: FnOnce(&str) -> Result<W>,
        P: FnMut(u64, Option<u64>),
    {
        debug!("Downloading file from {}...", url);

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to start download request")?
            .error_for_status()
            .context("Download request failed")?;

        let total = response.content_length().filter(|len| *len > 0);
        let file_name = suggested_file_name(&response);
        let mut writer = create_writer(&file_name)?;
        let mut downloaded_bytes: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read chunk from download stream")?
        {
            writer
                .write_all(&chunk)
                .context("Failed to write chunk to file")?;
            downloaded_bytes += chunk.len() as u64;
            on_progress(downloaded_bytes, total);
        }
        writer.flush().context("Failed to flush downloaded file")?;

        debug!(
            "Downloaded {:.2} MB",
            downloaded_bytes as f64 / (1024.0 * 1024.0)
        );

        Ok(downloaded_bytes)
    }
}

/// Fallback name when neither the headers nor the URL provide one.
pub const DEFAULT_FILE_NAME: &str = "download.apk";

fn suggested_file_name(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(content_disposition_file_name)
        .or_else(|| {
            response
                .url()
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
        })
        .map(|name| sanitize_file_name(&name))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string())
}

/// Extracts `filename*=UTF-8''...` or `filename="..."` from a Content-Disposition value.
pub(crate) fn content_disposition_file_name(value: &str) -> Option<String> {
    let mut plain = None;
    for part in value.split(';').map(str::trim) {
        if let Some(encoded) = part.strip_prefix("filename*=") {
            let encoded = encoded.trim_matches('"');
            let encoded = encoded
                .split_once("''")
                .map(|(_, rest)| rest)
                .unwrap_or(encoded);
            return Some(percent_decode_str(encoded).decode_utf8_lossy().into_owned());
        }
        if let Some(name) = part.strip_prefix("filename=") {
            plain = Some(name.trim_matches('"').to_string());
        }
    }
    plain
}

fn sanitize_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_start_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_text_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/page")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let body = client.get_text(&format!("{}/page", url)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_get_text_with_query_encodes_terms() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/search?q=git+hub")
            .with_status(200)
            .with_body("results")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let body = client
            .get_text_with_query(&format!("{}/search", url), &[("q", "git hub")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, "results");
    }

    #[tokio::test]
    async fn test_get_text_not_found() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/page")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client.get_text(&format!("{}/page", url)).await;

        // Exactly one request: no retries.
        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_download_file_reports_progress_and_name() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/dl/latest")
            .with_status(200)
            .with_header("content-disposition", "attachment; filename=\"GitHub_1.2.3.apk\"")
            .with_body("test content")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let mut name = String::new();
        let mut last_progress = (0, None);
        let bytes = client
            .download_file(
                &format!("{}/dl/latest", url),
                |suggested| {
                    name = suggested.to_string();
                    Ok(std::io::sink())
                },
                |received, total| last_progress = (received, total),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, 12);
        assert_eq!(name, "GitHub_1.2.3.apk");
        assert_eq!(last_progress, (12, Some(12)));
    }

    #[tokio::test]
    async fn test_download_file_name_from_url() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _mock = server
            .mock("GET", "/files/app%20v1.xapk")
            .with_status(200)
            .with_body("x")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let mut name = String::new();
        client
            .download_file(
                &format!("{}/files/app%20v1.xapk", url),
                |suggested| {
                    name = suggested.to_string();
                    Ok(std::io::sink())
                },
                |_, _| {},
            )
            .await
            .unwrap();

        assert_eq!(name, "app v1.xapk");
    }

    #[tokio::test]
    async fn test_download_file_not_found() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.apk")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client
            .download_file(
                &format!("{}/file.apk", url),
                |_| -> Result<std::io::Sink> { panic!("writer must not be created on 404") },
                |_, _| {},
            )
            .await;

        mock.assert_async().await;
        assert!(result.is_err());
    }

    #[test]
    fn test_content_disposition_file_name() {
        assert_eq!(
            content_disposition_file_name("attachment; filename=\"a.apk\""),
            Some("a.apk".to_string())
        );
        assert_eq!(
            content_disposition_file_name(
                "attachment; filename=\"fallback.apk\"; filename*=UTF-8''n%C3%A9.xapk"
            ),
            Some("né.xapk".to_string())
        );
        assert_eq!(content_disposition_file_name("inline"), None);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(".hidden.apk"), "hidden.apk");
        assert_eq!(sanitize_file_name("C:\\x\\y.apk"), "y.apk");
    }
}
