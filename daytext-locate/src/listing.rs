//! Flat extraction: every element matching one selector.

use scraper::{Html, Selector};

use crate::{LocateError, element_text, selector};

/// How many matches a listing keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Take {
    #[default]
    All,
    First,
}

#[derive(Debug, Clone)]
pub struct ListingExtractor {
    selector: Selector,
    take: Take,
}

impl ListingExtractor {
    /// ```
    /// use daytext_locate::{parse_html, ListingExtractor, Take};
    ///
    /// let doc = parse_html("<ul><li class=t> a </li><li class=t>b</li></ul>")?;
    /// let all = ListingExtractor::new("li.t", Take::All)?;
    /// assert_eq!(all.extract(&doc), ["a", "b"]);
    /// let first = ListingExtractor::new("li.t", Take::First)?;
    /// assert_eq!(first.extract(&doc), ["a"]);
    /// # Ok::<(), daytext_locate::LocateError>(())
    /// ```
    pub fn new(raw_selector: &str, take: Take) -> Result<Self, LocateError> {
        Ok(Self {
            selector: selector(raw_selector)?,
            take,
        })
    }

    /// Stripped text of the matches in document order; empty matches are skipped.
    pub fn extract(&self, doc: &Html) -> Vec<String> {
        let texts = doc.select(&self.selector).filter_map(element_text);
        let out: Vec<String> = match self.take {
            Take::All => texts.collect(),
            Take::First => texts.take(1).collect(),
        };
        tracing::debug!(matches = out.len(), take = ?self.take, "listing.extracted");
        out
    }
}
