//! Renderings of a calendar date as they appear on the page.

use chrono::NaiveDate;

/// How a heading's text is compared with the month-and-day phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingMatch {
    /// The phrase must stand alone: no letter or digit right before it and
    /// no digit right after it, so `August 1` does not hit `August 13`.
    #[default]
    Boundary,
    /// Plain substring containment.
    Substring,
}

/// `2024-08-13` -> `2024-08-13T00:00:00.000Z`, the container stamp format.
///
/// ```
/// use chrono::NaiveDate;
/// use daytext_locate::iso_midnight_stamp;
///
/// let d = NaiveDate::from_ymd_opt(2024, 8, 3).unwrap();
/// assert_eq!(iso_midnight_stamp(d), "2024-08-03T00:00:00.000Z");
/// ```
pub fn iso_midnight_stamp(date: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"))
}

/// `2024-08-03` -> `August 3`, the heading phrase.
pub fn month_day(date: NaiveDate) -> String {
    date.format("%B %-d").to_string()
}

/// Whether `haystack` mentions `phrase` under the given match mode.
///
/// ```
/// use daytext_locate::{contains_date_phrase, HeadingMatch};
///
/// assert!(contains_date_phrase("Wednesday, August 13", "August 13", HeadingMatch::Boundary));
/// assert!(!contains_date_phrase("Wednesday, August 13", "August 1", HeadingMatch::Boundary));
/// assert!(contains_date_phrase("Wednesday, August 13", "August 1", HeadingMatch::Substring));
/// ```
pub fn contains_date_phrase(haystack: &str, phrase: &str, mode: HeadingMatch) -> bool {
    if phrase.is_empty() {
        return false;
    }
    match mode {
        HeadingMatch::Substring => haystack.contains(phrase),
        HeadingMatch::Boundary => haystack.match_indices(phrase).any(|(start, _)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[start + phrase.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(|c| c.is_ascii_digit())
        }),
    }
}
