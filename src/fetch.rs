//! Feed retrieval: HTTP(S) and webcal URLs, or a local file.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use icsdrop_core::{CalendarEvent, parse_feed};
use url::Url;

/// Where a feed is read from
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSource {
    Http(Url),
    File(std::path::PathBuf),
}

impl FeedSource {
    pub fn parse(source: &str) -> Result<Self> {
        match Url::parse(source) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(FeedSource::Http(url)),
                // webcal:// is a subscription alias for https://. set_scheme
                // cannot switch to a special scheme, so rewrite the parsed URL.
                "webcal" => {
                    let https = format!("https{}", &url.as_str()["webcal".len()..]);
                    Ok(FeedSource::Http(Url::parse(&https)?))
                }
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| anyhow::anyhow!("Invalid file URL: {}", source))?;
                    Ok(FeedSource::File(path))
                }
                // Anything else (including Windows drive letters) is a path
                _ => Ok(FeedSource::File(source.into())),
            },
            Err(_) => Ok(FeedSource::File(source.into())),
        }
    }
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(format!("icsdrop/{}", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Download the raw feed text.
pub async fn fetch_feed(source: &FeedSource) -> Result<String> {
    match source {
        FeedSource::Http(url) => {
            log::info!("Fetching {}", url);
            let response = http_client()?
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;

            if !response.status().is_success() {
                anyhow::bail!("Failed to fetch {} (HTTP {})", url, response.status());
            }

            Ok(response.text().await?)
        }
        FeedSource::File(path) => {
            log::info!("Reading {}", path.display());
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read feed file {}", path.display()))
        }
    }
}

/// Fetch and parse a feed. Floating and all-day times are read in `tz`.
pub async fn load_events(source: &str, tz: Tz) -> Result<Vec<CalendarEvent>> {
    let source = FeedSource::parse(source)?;
    let content = fetch_feed(&source).await?;
    let events = parse_feed(&content, tz)?;
    log::info!("Loaded {} events", events.len());
    Ok(events)
}
