//! `daytext list`: print every (or the first) match of a listing source.

use crate::wiring::{RunContext, build_listing, load_page};
use clap::Args;
use daytext_common::{DaytextError, Result};
use daytext_locate::parse_document;
use daytext_present::Presenter;
use std::io::Write;
use std::path::PathBuf;

pub const NO_MATCHES: &str = "No matches found.";

#[derive(Debug, Default, Args)]
pub struct ListArgs {
    /// Source id (default: the first enabled listing source)
    #[arg(long)]
    pub source: Option<String>,

    /// Read the page from a local file instead of fetching it
    #[arg(long, value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

pub async fn run_listing<W: Write + Send>(
    ctx: &RunContext<'_>,
    args: &ListArgs,
    out: &mut Presenter<W>,
) -> Result<Vec<String>> {
    let (source, listing) = ctx
        .config
        .listing_source(args.source.as_deref())
        .ok_or_else(|| {
            DaytextError::SourceNotFound(args.source.clone().unwrap_or_else(|| "listing".into()))
        })?;
    let extractor = build_listing(listing)?;
    tracing::info!(source = %source.id, url = %listing.url, "listing.start");

    let page = load_page(ctx, &listing.url, args.from_file.as_deref(), out).await?;
    let doc = parse_document(&page).map_err(|e| DaytextError::Input(e.to_string()))?;
    let items = extractor.extract(&doc);
    tracing::info!(source = %source.id, count = items.len(), "listing.extracted");

    if items.is_empty() {
        out.announce(NO_MATCHES).await?;
    }
    for item in &items {
        out.announce(item).await?;
    }
    Ok(items)
}
