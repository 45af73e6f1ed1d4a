use chrono::NaiveDate;
use daytext_locate::{DayTextLocator, MatchTier, parse_document, parse_html};

const WEEK: &str = include_str!("fixtures/wol_week.html");
const HEADINGS_ONLY: &str = include_str!("fixtures/headings_only.html");

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn locator() -> DayTextLocator {
    DayTextLocator::daily_text().expect("built-in profile")
}

#[test]
fn stamped_container_scenario() {
    let html = br#"<div class="tabContent" data-date="2024-08-13T00:00:00.000Z"><p class="themeScrp">Ps. 1:1</p><p class="sb">Happy is the man...</p></div>"#;
    let doc = parse_document(html).unwrap();

    let day = locator().locate(&doc, ymd(2024, 8, 13));
    assert_eq!(day.get("theme"), Some("Ps. 1:1"));
    assert_eq!(day.get("dailyText"), Some("Happy is the man..."));

    let other = locator().locate(&doc, ymd(2024, 8, 14));
    assert_eq!(other.tier, None);
    assert_eq!(other.get("theme"), None);
    assert_eq!(other.get("dailyText"), None);
}

#[test]
fn stray_latin1_byte_does_not_hide_the_day() {
    let mut page = br#"<div class="tabContent" data-date="2024-08-13T00:00:00.000Z"><p class="themeScrp">Ps. 1:1</p><p class="sb">Happy is the man...</p></div>"#.to_vec();
    page.extend_from_slice(b"<footer>Caf\xE9</footer>");
    let doc = parse_document(&page).unwrap();

    let day = locator().locate(&doc, ymd(2024, 8, 13));
    assert_eq!(day.tier, Some(MatchTier::Primary));
    assert_eq!(day.get("theme"), Some("Ps. 1:1"));
    assert_eq!(day.get("dailyText"), Some("Happy is the man..."));
}

#[test]
fn heading_fallback_scenario() {
    let doc = parse_document(br#"<h2>Wednesday, August 13</h2><p class="sb">Text X</p>"#).unwrap();
    let day = locator().locate(&doc, ymd(2024, 8, 13));
    assert_eq!(day.tier, Some(MatchTier::Fallback));
    assert_eq!(day.get("dailyText"), Some("Text X"));
    assert_eq!(day.get("theme"), None);
}

#[test]
fn week_page_picks_requested_day() {
    let doc = parse_html(WEEK).unwrap();
    let day = locator().locate(&doc, ymd(2024, 8, 13));
    assert_eq!(day.tier, Some(MatchTier::Primary));

    let theme = day.get("theme").unwrap();
    assert!(theme.starts_with("Happy is the man"), "{theme}");
    assert!(theme.ends_with("Ps. 1:1."), "{theme}");
    assert_eq!(day.get("dailyText"), Some("Tuesday body, first line."));
}

#[test]
fn week_page_missing_theme_only_affects_theme() {
    let doc = parse_html(WEEK).unwrap();
    let day = locator().locate(&doc, ymd(2024, 8, 14));
    assert_eq!(day.tier, Some(MatchTier::Primary));
    assert_eq!(day.get("theme"), None);
    assert_eq!(day.get("dailyText"), Some("Wednesday body."));
}

#[test]
fn removing_a_marker_changes_only_that_field() {
    let full = parse_html(WEEK).unwrap();
    let stripped = parse_html(&WEEK.replace(r#"class="themeScrp" id="p5""#, r#"class="other" id="p5""#)).unwrap();

    let before = locator().locate(&full, ymd(2024, 8, 13));
    let after = locator().locate(&stripped, ymd(2024, 8, 13));

    assert!(before.get("theme").is_some());
    assert_eq!(after.get("theme"), None);
    assert_eq!(before.get("dailyText"), after.get("dailyText"));
}

#[test]
fn headings_page_falls_back_per_day() {
    let doc = parse_html(HEADINGS_ONLY).unwrap();

    let thirteenth = locator().locate(&doc, ymd(2024, 8, 13));
    assert_eq!(thirteenth.tier, Some(MatchTier::Fallback));
    assert_eq!(thirteenth.get("theme"), Some("Theme for the thirteenth."));
    assert_eq!(thirteenth.get("dailyText"), Some("Body for the thirteenth."));

    let first = locator().locate(&doc, ymd(2024, 8, 1));
    assert_eq!(first.get("theme"), Some("Theme for the first."));
    assert_eq!(first.get("dailyText"), Some("Body for the first."));

    let fourteenth = locator().locate(&doc, ymd(2024, 8, 14));
    assert_eq!(fourteenth.get("theme"), None);
    assert_eq!(fourteenth.get("dailyText"), Some("Body for the fourteenth."));
}

#[test]
fn fallback_field_search_runs_past_the_next_heading() {
    let doc = parse_html(
        r#"<h2>Monday, August 12</h2><p class="sb">Monday body.</p><h2>Tuesday, August 13</h2><p class="themeScrp">Tuesday theme.</p>"#,
    )
    .unwrap();
    let day = locator().locate(&doc, ymd(2024, 8, 12));
    assert_eq!(day.get("dailyText"), Some("Monday body."));
    assert_eq!(day.get("theme"), Some("Tuesday theme."));
}

#[test]
fn no_container_no_heading_is_all_absent() {
    let doc = parse_html(HEADINGS_ONLY).unwrap();
    let day = locator().locate(&doc, ymd(2024, 9, 13));
    assert_eq!(day.tier, None);
    assert!(day.is_empty());
    assert_eq!(day.fields.len(), 2);
}

#[test]
fn locate_is_idempotent() {
    let doc = parse_html(WEEK).unwrap();
    let l = locator();
    for date in [ymd(2024, 8, 12), ymd(2024, 8, 13), ymd(2024, 12, 25)] {
        assert_eq!(l.locate(&doc, date), l.locate(&doc, date));
    }
}

#[test]
fn result_serializes_with_lowercase_tier() {
    let doc = parse_html(WEEK).unwrap();
    let day = locator().locate(&doc, ymd(2024, 8, 14));
    let json = serde_json::to_value(&day).unwrap();
    assert_eq!(json["tier"], "primary");
    assert_eq!(json["fields"][0]["name"], "theme");
    assert!(json["fields"][0]["text"].is_null());
}
