//! Extraction of account and meter metadata from WaterSmart portal pages.
//!
//! The landing page served after login comes in two known layouts:
//! - the standard layout, with an `#account-navigation` block that labels the
//!   account number with an "Account Number" heading
//! - the multi-meter layout, with `div.account` badges and user picker links
//!   for every meter on the account
//!
//! All functions here are pure over a parsed [`Html`] document.

use crate::error::ParseError;
use crate::model::MeterInfo;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

use crate::watersmart::helper::{html_selector, stripped_text};

/// Account number formats vary between municipalities, so any run of
/// non-whitespace characters is accepted.
static ACCOUNT_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+$").expect("account number pattern is valid"));

static PICKER_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"userPicker/pick").expect("picker link pattern is valid"));

static USER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"userID=(\d+)").expect("user id pattern is valid"));

static RESIDENCE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"residenceID=(\d+)").expect("residence id pattern is valid"));

const ACCOUNT_NUMBER_LABEL: &str = "Account Number";
const UNKNOWN: &str = "Unknown";

/// Returns true when `value` is a plausible account number.
pub fn is_valid_account_number(value: &str) -> bool {
    ACCOUNT_NUMBER_RE.is_match(value)
}

/// Returns the refresh token the portal asks to be posted back, if any.
pub fn login_refresh_token(document: &Html) -> Result<Option<String>, ParseError> {
    let selector = html_selector(r#"input[name="loginRefreshToken"]"#)?;
    Ok(document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .filter(|value| !value.is_empty())
        .map(str::to_string))
}

/// Collects the non-empty messages of every `.error-message` element.
pub fn error_messages(document: &Html) -> Result<Vec<String>, ParseError> {
    let selector = html_selector(".error-message")?;
    Ok(document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|message| !message.is_empty())
        .collect())
}

/// Extracts the account number, trying the standard layout first.
///
/// # Returns
/// * `Ok(String)` - The raw account number (not yet format-validated)
/// * `Err(ParseError::UnexpectedStructure)` - If neither layout yields a value
pub fn extract_account_number(document: &Html) -> Result<String, ParseError> {
    if let Some(account_number) = account_number_from_navigation(document)? {
        return Ok(account_number);
    }

    if let Some(account_number) = account_number_from_badges(document)? {
        return Ok(account_number);
    }

    Err(ParseError::UnexpectedStructure(
        "Could not extract account number from page".to_string(),
    ))
}

/// Standard layout: the text of the label's parent without the label itself.
fn account_number_from_navigation(document: &Html) -> Result<Option<String>, ParseError> {
    let selector = html_selector("#account-navigation")?;
    let Some(navigation) = document.select(&selector).next() else {
        return Ok(None);
    };

    let label = navigation
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|element| stripped_text(element) == ACCOUNT_NUMBER_LABEL);
    let Some(label) = label else {
        tracing::debug!("#account-navigation has no account number label");
        return Ok(None);
    };
    let Some(section) = label.parent() else {
        return Ok(None);
    };

    let value = section
        .descendants()
        .filter(|node| !node.ancestors().any(|ancestor| ancestor.id() == label.id()))
        .filter(|node| node.id() != label.id())
        .filter_map(|node| node.value().as_text().map(|text| &**text))
        .collect::<String>();
    let value = value.trim();

    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Multi-meter layout: the first `div.account` that is neither the
/// "N Accounts" summary nor a bare count.
fn account_number_from_badges(document: &Html) -> Result<Option<String>, ParseError> {
    let selector = html_selector("div.account")?;
    Ok(document
        .select(&selector)
        .map(|element| stripped_text(&element))
        .filter(|text| !text.contains("Account"))
        .find(|text| is_valid_account_number(text) && !text.chars().all(|c| c.is_ascii_digit())))
}

/// Extracts the meters offered by the user picker.
///
/// Links to the combined view and links missing ids or the inline info block
/// are skipped. When nothing qualifies, a single `default` meter named after
/// the host stands in for the account.
///
/// # Arguments
/// * `document` - The parsed landing page
/// * `hostname` - Portal subdomain, used to name the fallback meter
/// * `account_number` - The account number detected on the same page
pub fn extract_meters(
    document: &Html,
    hostname: &str,
    account_number: Option<&str>,
) -> Result<Vec<MeterInfo>, ParseError> {
    let link_selector = html_selector("a[href]")?;
    let inline_selector = html_selector("div.inline")?;
    let name_selector = html_selector("h3")?;
    let account_selector = html_selector("div.account")?;

    let mut meters = Vec::new();

    for link in document.select(&link_selector) {
        let href = link.value().attr("href").unwrap_or_default();
        if !PICKER_LINK_RE.is_match(href) {
            continue;
        }

        if href.contains("combined=1") || !href.contains("combined=0") {
            continue;
        }

        let (Some(user_id), Some(residence_id)) =
            (first_capture(&USER_ID_RE, href), first_capture(&RESIDENCE_ID_RE, href))
        else {
            tracing::debug!(href, "Skipping picker link without user or residence id");
            continue;
        };

        let Some(inline) = link.select(&inline_selector).next() else {
            tracing::debug!(href, "Skipping picker link without meter details");
            continue;
        };

        let name = inline
            .select(&name_selector)
            .next()
            .map(|element| stripped_text(&element))
            .unwrap_or_else(|| UNKNOWN.to_string());
        let account = inline
            .select(&account_selector)
            .next()
            .map(|element| stripped_text(&element))
            .unwrap_or_else(|| account_number.unwrap_or(UNKNOWN).to_string());

        meters.push(MeterInfo {
            meter_id: format!("{}_{}", user_id, residence_id),
            name,
            account_number: account,
            user_id: user_id.to_string(),
            residence_id: residence_id.to_string(),
        });
    }

    if meters.is_empty() {
        meters.push(MeterInfo {
            meter_id: "default".to_string(),
            name: hostname.to_string(),
            account_number: account_number.unwrap_or(UNKNOWN).to_string(),
            user_id: String::new(),
            residence_id: String::new(),
        });
    }

    Ok(meters)
}

fn first_capture<'a>(pattern: &Regex, haystack: &'a str) -> Option<&'a str> {
    pattern
        .captures(haystack)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}
