use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::date::{HeadingMatch, contains_date_phrase, iso_midnight_stamp, month_day};
use crate::{LocateError, element_text, joined_text, selector};

pub const DEFAULT_CONTAINER: &str = "div.tabContent";
pub const DEFAULT_DATE_ATTRIBUTE: &str = "data-date";
pub const DEFAULT_HEADING: &str = "h2";

/// Which lookup found the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Container stamped with the day's ISO date.
    Primary,
    /// Heading mentioning the day, fields taken from its following siblings.
    Fallback,
}

/// A named field and the selector that marks its element.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    marker: Selector,
}

impl FieldSpec {
    pub fn new(name: &str, marker: &str) -> Result<Self, LocateError> {
        Ok(Self {
            name: name.to_string(),
            marker: selector(marker)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedField {
    pub name: String,
    pub text: Option<String>,
}

/// Result of one lookup: every requested field, in profile order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayText {
    pub tier: Option<MatchTier>,
    pub fields: Vec<ExtractedField>,
}

impl DayText {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.text.as_deref())
    }

    /// True when no field produced any text.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|f| f.text.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|f| (f.name.as_str(), f.text.as_deref()))
    }
}

/// Finds a day's block on a page and pulls its fields out.
///
/// Built from selectors once; [`DayTextLocator::locate`] can then be called
/// on any number of documents.
#[derive(Debug, Clone)]
pub struct DayTextLocator {
    container: Selector,
    date_attribute: String,
    heading: Selector,
    heading_match: HeadingMatch,
    fields: Vec<FieldSpec>,
}

impl DayTextLocator {
    /// Locator with no fields yet; add them with [`DayTextLocator::with_field`].
    ///
    /// ```
    /// use daytext_locate::{DayTextLocator, HeadingMatch};
    ///
    /// let locator = DayTextLocator::new("section.day", "data-day", "h3")?
    ///     .with_field("verse", "p.verse")?
    ///     .with_heading_match(HeadingMatch::Substring);
    /// assert_eq!(locator.field_names().collect::<Vec<_>>(), ["verse"]);
    /// # Ok::<(), daytext_locate::LocateError>(())
    /// ```
    pub fn new(container: &str, date_attribute: &str, heading: &str) -> Result<Self, LocateError> {
        Ok(Self {
            container: selector(container)?,
            date_attribute: date_attribute.to_string(),
            heading: selector(heading)?,
            heading_match: HeadingMatch::default(),
            fields: Vec::new(),
        })
    }

    /// The daily-text page layout: `theme` (`p.themeScrp`) and `dailyText` (`p.sb`).
    pub fn daily_text() -> Result<Self, LocateError> {
        Self::new(DEFAULT_CONTAINER, DEFAULT_DATE_ATTRIBUTE, DEFAULT_HEADING)?
            .with_field("theme", "p.themeScrp")?
            .with_field("dailyText", "p.sb")
    }

    pub fn with_field(mut self, name: &str, marker: &str) -> Result<Self, LocateError> {
        self.fields.push(FieldSpec::new(name, marker)?);
        Ok(self)
    }

    pub fn with_heading_match(mut self, mode: HeadingMatch) -> Self {
        self.heading_match = mode;
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Look the day up: stamped container first, heading fallback second.
    pub fn locate(&self, doc: &Html, date: NaiveDate) -> DayText {
        if let Some(container) = self.find_container(doc, date) {
            tracing::debug!(%date, "locate.primary");
            return DayText {
                tier: Some(MatchTier::Primary),
                fields: self.extract_within(container),
            };
        }

        if let Some(heading) = self.find_heading(doc, date) {
            tracing::debug!(%date, heading = %joined_text(heading), "locate.fallback");
            return DayText {
                tier: Some(MatchTier::Fallback),
                fields: self.extract_after(heading),
            };
        }

        tracing::debug!(%date, "locate.not_found");
        DayText {
            tier: None,
            fields: self.absent(),
        }
    }

    /// First container, in document order, stamped with the day's midnight UTC.
    pub fn find_container<'a>(&self, doc: &'a Html, date: NaiveDate) -> Option<ElementRef<'a>> {
        let stamp = iso_midnight_stamp(date);
        doc.select(&self.container)
            .find(|el| el.value().attr(&self.date_attribute) == Some(stamp.as_str()))
    }

    /// First heading, in document order, whose text mentions the day.
    pub fn find_heading<'a>(&self, doc: &'a Html, date: NaiveDate) -> Option<ElementRef<'a>> {
        let phrase = month_day(date);
        doc.select(&self.heading)
            .find(|el| contains_date_phrase(&joined_text(*el), &phrase, self.heading_match))
    }

    /// Each field's first marker inside `container`.
    pub fn extract_within(&self, container: ElementRef<'_>) -> Vec<ExtractedField> {
        self.fields
            .iter()
            .map(|f| ExtractedField {
                name: f.name.clone(),
                text: container.select(&f.marker).next().and_then(element_text),
            })
            .collect()
    }

    /// Each field's nearest following sibling of `anchor` carrying its marker.
    pub fn extract_after(&self, anchor: ElementRef<'_>) -> Vec<ExtractedField> {
        self.fields
            .iter()
            .map(|f| ExtractedField {
                name: f.name.clone(),
                text: anchor
                    .next_siblings()
                    .filter_map(ElementRef::wrap)
                    .find(|el| f.marker.matches(el))
                    .and_then(element_text),
            })
            .collect()
    }

    fn absent(&self) -> Vec<ExtractedField> {
        self.fields
            .iter()
            .map(|f| ExtractedField {
                name: f.name.clone(),
                text: None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_html;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn locator() -> DayTextLocator {
        DayTextLocator::daily_text().unwrap()
    }

    #[test]
    fn container_lookup_ignores_other_days() {
        let doc = parse_html(
            r#"<div class="tabContent" data-date="2024-08-12T00:00:00.000Z"><p class="sb">twelve</p></div>
               <div class="tabContent" data-date="2024-08-13T00:00:00.000Z"><p class="sb">thirteen</p></div>"#,
        )
        .unwrap();
        let day = locator().locate(&doc, ymd(2024, 8, 13));
        assert_eq!(day.tier, Some(MatchTier::Primary));
        assert_eq!(day.get("dailyText"), Some("thirteen"));
        assert_eq!(day.get("theme"), None);
    }

    #[test]
    fn first_stamped_container_wins() {
        let doc = parse_html(
            r#"<div class="tabContent" data-date="2024-08-13T00:00:00.000Z"><p class="sb">first</p></div>
               <div class="tabContent" data-date="2024-08-13T00:00:00.000Z"><p class="sb">second</p></div>"#,
        )
        .unwrap();
        assert_eq!(locator().locate(&doc, ymd(2024, 8, 13)).get("dailyText"), Some("first"));
    }

    #[test]
    fn stamp_on_wrong_element_is_ignored() {
        let doc = parse_html(
            r#"<section class="tabContent" data-date="2024-08-13T00:00:00.000Z"><p class="sb">x</p></section>"#,
        )
        .unwrap();
        let day = locator().locate(&doc, ymd(2024, 8, 13));
        assert_eq!(day.tier, None);
        assert!(day.is_empty());
    }

    #[test]
    fn fallback_skips_unrelated_siblings() {
        let doc = parse_html(
            r#"<h2>Tuesday, August 13</h2>
               <div class="ad">noise</div>
               <p class="themeScrp">Ps. 1:1</p>
               <p>plain</p>
               <p class="sb">Text X</p>"#,
        )
        .unwrap();
        let day = locator().locate(&doc, ymd(2024, 8, 13));
        assert_eq!(day.tier, Some(MatchTier::Fallback));
        assert_eq!(day.get("theme"), Some("Ps. 1:1"));
        assert_eq!(day.get("dailyText"), Some("Text X"));
    }

    #[test]
    fn fallback_does_not_look_backwards() {
        let doc = parse_html(r#"<p class="sb">before</p><h2>Tuesday, August 13</h2>"#).unwrap();
        let day = locator().locate(&doc, ymd(2024, 8, 13));
        assert_eq!(day.tier, Some(MatchTier::Fallback));
        assert!(day.is_empty());
    }

    #[test]
    fn fallback_ignores_nested_markers() {
        let doc = parse_html(
            r#"<h2>Tuesday, August 13</h2><div><p class="sb">nested</p></div><p class="sb">sibling</p>"#,
        )
        .unwrap();
        assert_eq!(locator().locate(&doc, ymd(2024, 8, 13)).get("dailyText"), Some("sibling"));
    }

    #[test]
    fn boundary_mode_skips_longer_day_heading() {
        let doc = parse_html(
            r#"<h2>Tuesday, August 13</h2><p class="sb">thirteenth</p>
               <h2>Thursday, August 1</h2><p class="sb">first</p>"#,
        )
        .unwrap();
        let strict = locator().locate(&doc, ymd(2024, 8, 1));
        assert_eq!(strict.get("dailyText"), Some("first"));

        let loose = locator()
            .with_heading_match(HeadingMatch::Substring)
            .locate(&doc, ymd(2024, 8, 1));
        assert_eq!(loose.get("dailyText"), Some("thirteenth"));
    }

    #[test]
    fn fields_come_back_in_profile_order() {
        let doc = parse_html("<p>nothing</p>").unwrap();
        let day = locator().locate(&doc, ymd(2024, 8, 13));
        let names: Vec<_> = day.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["theme", "dailyText"]);
    }

    #[test]
    fn custom_attribute_and_heading() {
        let doc = parse_html(
            r#"<article data-day="2024-03-02T00:00:00.000Z"><span class="v">ok</span></article>"#,
        )
        .unwrap();
        let l = DayTextLocator::new("article", "data-day", "h3")
            .unwrap()
            .with_field("verse", "span.v")
            .unwrap();
        assert_eq!(l.locate(&doc, ymd(2024, 3, 2)).get("verse"), Some("ok"));
    }
}
