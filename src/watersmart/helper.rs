//! Helper functions for reading WaterSmart HTML pages and host settings.
//!
//! This module provides utility functions for:
//! - Building CSS selectors with typed errors
//! - Extracting whitespace-stripped element text
//! - Normalizing the configured portal host

use crate::error::{ConfigError, ParseError};
use reqwest::Url;
use scraper::{ElementRef, Selector};

/// Creates a CSS selector from a string.
///
/// This is a wrapper around scraper's Selector::parse that converts
/// parsing errors into [`ParseError::InvalidSelector`].
pub fn html_selector(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::invalid_selector(selector, e))
}

/// Concatenates the element's text nodes with surrounding whitespace removed
/// from each node.
///
/// `<div> <h3> Main St </h3> 12-34 </div>` yields `"Main St12-34"`.
pub fn stripped_text(element: &ElementRef) -> String {
    element.text().map(str::trim).collect()
}

/// Splits the configured host into the portal subdomain and an optional
/// domain override.
///
/// The value can be one of:
/// - a bare host, i.e. `bendoregon`
/// - an FQDN, i.e. `myutility.bellevuewa.gov`
/// - an https URL, i.e. `https://myutility.bellevuewa.gov`
///
/// # Example
///
/// ```no_run
/// assert_eq!(
///     parse_hostname("https://myutility.bellevuewa.gov")?,
///     ("myutility".to_string(), Some("bellevuewa.gov".to_string()))
/// );
/// ```
pub fn parse_hostname(value: &str) -> Result<(String, Option<String>), ConfigError> {
    let value = value.trim();
    let host = if value.contains("://") {
        let url = Url::parse(value)
            .map_err(|e| ConfigError::invalid("host", format!("{}: {}", value, e)))?;
        if url.scheme() != "https" {
            return Err(ConfigError::invalid(
                "host",
                format!("only https URLs are supported, got {}", value),
            ));
        }
        url.host_str().unwrap_or_default().to_string()
    } else {
        value.to_string()
    };

    if host.is_empty() {
        return Err(ConfigError::invalid("host", "no hostname given"));
    }

    Ok(match host.split_once('.') {
        Some((hostname, domain)) => (hostname.to_string(), Some(domain.to_string())),
        None => (host, None),
    })
}
