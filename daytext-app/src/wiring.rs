//! Turns loaded configuration into the runtime pieces of one run.

use chrono::NaiveDate;
use daytext_common::{DaytextError, Result};
use daytext_config::{
    DailyTextConfig, DaytextConfig, HeadingMatchMode, HttpConfig, ListingConfig, RetryConfig,
    SpeechConfig, TakeMode,
};
use daytext_http::{ClientOptions, HttpClient, HttpError, RetryObserver, RetryPolicy, retry};
use daytext_locate::{DayTextLocator, HeadingMatch, ListingExtractor, Take};
use daytext_present::{CommandSpeaker, Presenter, Speaker};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything a command needs besides its own arguments.
pub struct RunContext<'a> {
    pub config: &'a DaytextConfig,
    pub today: NaiveDate,
    pub cancel: CancellationToken,
}

pub fn client_options(http: &HttpConfig) -> ClientOptions {
    ClientOptions {
        user_agent: http.user_agent.clone(),
        accept_language: http.accept_language.clone(),
        timeout: Duration::from_secs(http.timeout_secs),
    }
}

pub fn retry_policy(retry: &RetryConfig) -> RetryPolicy {
    RetryPolicy::linear(retry.max_attempts, Duration::from_secs(retry.backoff_step_secs))
}

pub fn build_locator(daily: &DailyTextConfig) -> Result<DayTextLocator> {
    let mode = match daily.heading_match {
        HeadingMatchMode::Boundary => HeadingMatch::Boundary,
        HeadingMatchMode::Substring => HeadingMatch::Substring,
    };
    let mut locator = DayTextLocator::new(&daily.container, &daily.date_attribute, &daily.heading)
        .map_err(|e| DaytextError::Config(e.to_string()))?
        .with_heading_match(mode);
    for field in &daily.fields {
        locator = locator
            .with_field(&field.name, &field.marker)
            .map_err(|e| DaytextError::Config(e.to_string()))?;
    }
    Ok(locator)
}

pub fn build_listing(listing: &ListingConfig) -> Result<ListingExtractor> {
    let take = match listing.take {
        TakeMode::All => Take::All,
        TakeMode::First => Take::First,
    };
    ListingExtractor::new(&listing.selector, take).map_err(|e| DaytextError::Config(e.to_string()))
}

/// Speaker for this run, if speech is switched on and a program is available.
///
/// `overridden` comes from `--speak` / `--no-speak` and wins over the config.
pub fn build_speaker(speech: &SpeechConfig, overridden: Option<bool>) -> Option<Box<dyn Speaker>> {
    if !overridden.unwrap_or(speech.enabled) {
        return None;
    }
    let speaker = match &speech.command {
        Some(command) => CommandSpeaker::new(command.as_str(), speech.args.clone()),
        None => match CommandSpeaker::detect() {
            Some(found) => found,
            None => {
                tracing::info!("speech.unavailable");
                return None;
            }
        },
    };
    if !speaker.is_installed() {
        tracing::warn!(program = speaker.name(), "speech.program_missing");
        return None;
    }
    tracing::debug!(program = speaker.name(), "speech.enabled");
    Some(Box::new(speaker))
}

/// Page bytes from `from_file` when given, otherwise fetched with retries.
pub async fn load_page<W: Write + Send>(
    ctx: &RunContext<'_>,
    url: &str,
    from_file: Option<&Path>,
    notices: &mut Presenter<W>,
) -> Result<Vec<u8>> {
    match from_file {
        Some(path) => {
            tracing::debug!(path = %path.display(), "page.read_file");
            Ok(tokio::fs::read(path).await?)
        }
        None => fetch_page(ctx, url, notices).await,
    }
}

async fn fetch_page<W: Write + Send>(
    ctx: &RunContext<'_>,
    url: &str,
    notices: &mut Presenter<W>,
) -> Result<Vec<u8>> {
    let client = HttpClient::new(&client_options(&ctx.config.http))
        .map_err(|e| DaytextError::Config(e.to_string()))?;
    let policy = retry_policy(&ctx.config.retry);
    let observer: &mut dyn RetryObserver = &mut *notices;
    let outcome = retry(&policy, &ctx.cancel, observer, |_| client.fetch(url)).await;

    match outcome {
        Ok(body) => Ok(body),
        Err(HttpError::Cancelled) => Err(DaytextError::Cancelled),
        Err(HttpError::Exhausted { attempts, last }) => {
            notices
                .announce(&format!("Giving up after {attempts} attempts."))
                .await?;
            Err(DaytextError::Fetch(format!("{attempts} attempts, last: {last}")))
        }
        Err(err) => Err(DaytextError::Fetch(err.to_string())),
    }
}
