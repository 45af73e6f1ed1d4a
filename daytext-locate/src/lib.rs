//! Locate one day's text on a downloaded page.
//!
//! The daily-text pages this crate targets group each day in a container
//! element stamped with an ISO date (`data-date="2024-08-13T00:00:00.000Z"`).
//! [`DayTextLocator`] looks that container up first and, when the page lacks
//! it, falls back to the day's heading (`<h2>Wednesday, August 13</h2>`) and
//! the marker elements that follow it.
//!
//! Everything here is synchronous and read-only over an already parsed
//! [`scraper::Html`]; nothing performs I/O. "Not found" is never an error:
//! each field simply comes back absent.
//!
//! ```
//! use chrono::NaiveDate;
//! use daytext_locate::{parse_document, DayTextLocator, MatchTier};
//!
//! let html = br#"<div class="tabContent" data-date="2024-08-13T00:00:00.000Z">
//!     <p class="themeScrp">Ps. 1:1</p><p class="sb">Happy is the man...</p></div>"#;
//! let doc = parse_document(html)?;
//! let locator = DayTextLocator::daily_text()?;
//!
//! let day = locator.locate(&doc, NaiveDate::from_ymd_opt(2024, 8, 13).unwrap());
//! assert_eq!(day.tier, Some(MatchTier::Primary));
//! assert_eq!(day.get("theme"), Some("Ps. 1:1"));
//! assert_eq!(day.get("dailyText"), Some("Happy is the man..."));
//! # Ok::<(), daytext_locate::LocateError>(())
//! ```

use scraper::{ElementRef, Html, Selector};
use std::borrow::Cow;
use thiserror::Error;

pub mod date;
pub mod listing;
pub mod locator;

pub use date::{HeadingMatch, contains_date_phrase, iso_midnight_stamp, month_day};
pub use listing::{ListingExtractor, Take};
pub use locator::{DayText, DayTextLocator, ExtractedField, FieldSpec, MatchTier};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("document is empty")]
    Empty,
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
}

/// Parse raw page bytes into a document.
///
/// Fails only when there is no page at all. Invalid UTF-8 sequences become
/// U+FFFD and any markup, however sloppy, parses.
pub fn parse_document(bytes: &[u8]) -> Result<Html, LocateError> {
    let text = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = text {
        let valid_up_to = std::str::from_utf8(bytes).err().map(|e| e.valid_up_to());
        tracing::warn!(bytes = bytes.len(), ?valid_up_to, "locate.invalid_utf8_replaced");
    }
    parse_html(&text)
}

/// Same as [`parse_document`] for already decoded text.
pub fn parse_html(text: &str) -> Result<Html, LocateError> {
    if text.trim().is_empty() {
        return Err(LocateError::Empty);
    }
    let doc = Html::parse_document(text);
    tracing::trace!(bytes = text.len(), parse_errors = doc.errors.len(), "locate.parsed");
    Ok(doc)
}

pub(crate) fn selector(raw: &str) -> Result<Selector, LocateError> {
    Selector::parse(raw).map_err(|e| LocateError::Selector {
        selector: raw.to_string(),
        message: e.to_string(),
    })
}

/// Element text with surrounding whitespace removed; `None` when nothing is left.
pub(crate) fn element_text(el: ElementRef<'_>) -> Option<String> {
    let text: String = el.text().collect();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Text fragments stripped one by one and joined with single spaces.
pub(crate) fn joined_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let doc = parse_document(b"<p>ok</p><p>Caf\xe9</p>").unwrap();
        let p = selector("p").unwrap();
        let texts: Vec<_> = doc.select(&p).filter_map(element_text).collect();
        assert_eq!(texts, ["ok", "Caf\u{fffd}"]);
    }

    #[test]
    fn invalid_bytes_alone_still_make_a_document() {
        assert!(parse_document(b"\xff\xfe").is_ok());
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(parse_document(b"").unwrap_err(), LocateError::Empty);
        assert_eq!(parse_document(b" \n\t ").unwrap_err(), LocateError::Empty);
    }

    #[test]
    fn sloppy_markup_still_parses() {
        assert!(parse_document(b"<div><p class=sb>unclosed").is_ok());
    }

    #[test]
    fn element_text_strips_but_keeps_inner_spacing() {
        let doc = Html::parse_fragment("<p class=\"sb\">\n  Happy  is <em>the</em> man\n</p>");
        let p = doc.select(&selector("p.sb").unwrap()).next().unwrap();
        assert_eq!(element_text(p).as_deref(), Some("Happy  is the man"));
    }

    #[test]
    fn whitespace_only_element_is_absent() {
        let doc = Html::parse_fragment("<p class=\"sb\">   </p>");
        let p = doc.select(&selector("p.sb").unwrap()).next().unwrap();
        assert_eq!(element_text(p), None);
    }

    #[test]
    fn joined_text_separates_fragments() {
        let doc = Html::parse_fragment("<h2>\n<strong>Wednesday,</strong>\n<span>August 13</span></h2>");
        let h2 = doc.select(&selector("h2").unwrap()).next().unwrap();
        assert_eq!(joined_text(h2), "Wednesday, August 13");
    }

    #[test]
    fn bad_selector_is_reported() {
        let err = selector("p..sb").unwrap_err();
        assert!(matches!(err, LocateError::Selector { ref selector, .. } if selector == "p..sb"));
    }
}
