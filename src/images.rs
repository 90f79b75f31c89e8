//! Destination pictures from an image search results page

use std::borrow::Cow;
use std::time::Duration;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::config::ImagesConfig;
use crate::trip::Season;
use crate::{Result, TravelAssistantError};

/// Image sources containing this marker are page chrome, not results
const LOGO_MARKER: &str = "googlelogo";

#[derive(Clone)]
pub struct ImageSearch {
    client: Client,
    search_url: String,
    timeout: Duration,
}

impl ImageSearch {
    #[must_use]
    pub fn new(client: Client, config: &ImagesConfig) -> Self {
        Self {
            client,
            search_url: config.search_url.clone(),
            timeout: config.timeout(),
        }
    }

    /// Image URLs for "travel <keyword> <season>", empty on any failure
    pub async fn images_for(&self, keyword: &str, season: Option<Season>) -> Vec<String> {
        match self.search(keyword, season).await {
            Ok(images) => images,
            Err(e) => {
                warn!("Image search failed: {}", e);
                Vec::new()
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str, season: Option<Season>) -> Result<Vec<String>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(TravelAssistantError::validation("Search keyword cannot be empty"));
        }

        let query = match season {
            Some(season) => format!("travel {keyword} {season}"),
            None => format!("travel {keyword}"),
        };
        let url = format!(
            "{}?q={}&tbm=isch",
            self.search_url,
            urlencoding::encode(&query)
        );
        debug!("Image search request URL: {}", url);

        let response = self.client.get(url).timeout(self.timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TravelAssistantError::transport(format!(
                "Image search returned {status}"
            )));
        }

        let html = response.text().await?;
        let images = extract_image_sources(&html);
        info!("Found {} images for '{}'", images.len(), query);
        Ok(images)
    }
}

/// Collect `src` attributes of `img` tags, skipping logo images.
///
/// HTML is scanned leniently: unmatched and unclosed tags are tolerated,
/// and scanning stops at the first point the reader cannot move past.
#[must_use]
pub fn extract_image_sources(html: &str) -> Vec<String> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut images = Vec::new();
    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(tag) | Event::Empty(tag)) => {
                if !tag.name().as_ref().eq_ignore_ascii_case(b"img") {
                    continue;
                }
                let src = tag
                    .html_attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(b"src"))
                    .map(|attr| {
                        let raw = String::from_utf8_lossy(&attr.value);
                        // unknown HTML entities such as &nbsp; keep the raw text
                        unescape(&raw)
                            .map(Cow::into_owned)
                            .unwrap_or_else(|_| raw.to_string())
                    });
                if let Some(src) = src {
                    if !src.is_empty() && !src.contains(LOGO_MARKER) {
                        images.push(src);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                if reader.buffer_position() == position {
                    debug!("Stopped scanning HTML: {}", e);
                    break;
                }
            }
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_img_sources_without_logo() {
        let html = r#"<!DOCTYPE html>
<html><head><title>travel Paris</title></head>
<body>
  <img class="logo" src="/images/branding/googlelogo/1x/googlelogo_white.png">
  <div><img src="https://example.com/a.jpg" alt="a"></div>
  <table><tr><td><img src="https://example.com/b.jpg?w=1&amp;h=2"/></td></tr></table>
  <br>
  <IMG SRC=https://example.com/c.jpg>
</body></html>"#;

        let images = extract_image_sources(html);
        assert_eq!(
            images,
            vec![
                "https://example.com/a.jpg",
                "https://example.com/b.jpg?w=1&h=2",
                "https://example.com/c.jpg",
            ]
        );
    }

    #[test]
    fn test_entities_in_src() {
        let html = r##"<img src="https://example.com/a.jpg?q=&quot;x&quot;&#39;"><img src="https://example.com/b.jpg?t=a&nbsp;b">"##;
        let images = extract_image_sources(html);
        assert_eq!(
            images,
            vec![
                "https://example.com/a.jpg?q=\"x\"'",
                "https://example.com/b.jpg?t=a&nbsp;b",
            ]
        );
    }

    #[test]
    fn test_img_without_src_is_ignored() {
        let html = r#"<p><img alt="nothing"><img src=""></p>"#;
        assert!(extract_image_sources(html).is_empty());
    }

    #[test]
    fn test_empty_document() {
        assert!(extract_image_sources("").is_empty());
    }
}
