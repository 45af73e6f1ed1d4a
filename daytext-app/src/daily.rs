//! `daytext today`: fetch one day's page and print its fields.

use crate::wiring::{RunContext, build_locator, load_page};
use chrono::NaiveDate;
use clap::Args;
use daytext_common::{DaytextError, Result};
use daytext_locate::{DayText, parse_document};
use daytext_present::{Presenter, missing_message};
use serde_json::{Map, Value, json};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Default, Args)]
pub struct DailyArgs {
    /// Source id (default: the first enabled daily_text source)
    #[arg(long)]
    pub source: Option<String>,

    /// Day to look up instead of today (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Read the page from a local file instead of fetching it
    #[arg(long, value_name = "PATH")]
    pub from_file: Option<PathBuf>,

    /// Print one JSON object instead of plain lines
    #[arg(long)]
    pub json: bool,

    /// Speak the output even if speech is off in the config
    #[arg(long, conflicts_with = "no_speak")]
    pub speak: bool,

    /// Never speak the output
    #[arg(long)]
    pub no_speak: bool,
}

impl DailyArgs {
    pub fn speak_override(&self) -> Option<bool> {
        match (self.speak, self.no_speak) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Look up the day's fields and present them on `out`.
///
/// Retry notices are presented on `out` like the results, so they are spoken
/// too. With `--json` they go to `notices` instead, keeping `out` a single
/// JSON object.
pub async fn run_daily<W, N>(
    ctx: &RunContext<'_>,
    args: &DailyArgs,
    out: &mut Presenter<W>,
    notices: &mut Presenter<N>,
) -> Result<DayText>
where
    W: Write + Send,
    N: Write + Send,
{
    let (source, daily) = ctx
        .config
        .daily_text_source(args.source.as_deref())
        .ok_or_else(|| DaytextError::SourceNotFound(source_name(args.source.as_deref())))?;
    let locator = build_locator(daily)?;
    let date = args.date.unwrap_or(ctx.today);
    let url = daily.url_for(date);
    tracing::info!(source = %source.id, %date, %url, "daily.start");

    let from_file = args.from_file.as_deref();
    let page = if args.json {
        load_page(ctx, &url, from_file, notices).await?
    } else {
        load_page(ctx, &url, from_file, out).await?
    };
    let doc = parse_document(&page).map_err(|e| DaytextError::Input(e.to_string()))?;
    let day = locator.locate(&doc, date);
    tracing::info!(
        source = %source.id,
        tier = ?day.tier,
        found = day.fields.iter().filter(|f| f.text.is_some()).count(),
        "daily.located"
    );

    if args.json {
        out.write_raw(&render_json(&day, date).to_string())?;
        return Ok(day);
    }

    let when = if date == ctx.today {
        "today".to_string()
    } else {
        date.to_string()
    };
    for field in &daily.fields {
        match day.get(&field.name) {
            Some(text) => out.announce(text).await?,
            None => out.announce(&missing_message(field.label(), &when)).await?,
        }
    }
    Ok(day)
}

fn source_name(requested: Option<&str>) -> String {
    requested.unwrap_or("daily_text").to_string()
}

/// `{"date": ..., "tier": ..., "fields": {name: text|null}}`
pub fn render_json(day: &DayText, date: NaiveDate) -> Value {
    let fields: Map<String, Value> = day
        .iter()
        .map(|(name, text)| (name.to_string(), json!(text)))
        .collect();
    json!({
        "date": date.to_string(),
        "tier": day.tier,
        "fields": fields,
    })
}
