//! Presentation sink: print each line, optionally speak it too.
//!
//! Speech is an injected capability. A [`Presenter`] without a [`Speaker`]
//! only writes; a speaker that fails is logged and otherwise ignored, so
//! output never depends on it.

use async_trait::async_trait;
use daytext_http::{HttpError, RetryObserver};
use std::io::{self, Write};
use std::time::Duration;

pub mod speaker;

pub use speaker::{CommandSpeaker, Speaker};

pub struct Presenter<W> {
    out: W,
    speaker: Option<Box<dyn Speaker>>,
}

impl<W: Write + Send> Presenter<W> {
    pub fn new(out: W) -> Self {
        Self { out, speaker: None }
    }

    pub fn with_speaker(mut self, speaker: Option<Box<dyn Speaker>>) -> Self {
        self.speaker = speaker;
        self
    }

    /// Write `line`, then speak it if a speaker is attached.
    pub async fn announce(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        if let Some(speaker) = &self.speaker {
            if let Err(e) = speaker.speak(line).await {
                tracing::debug!(speaker = speaker.name(), error = %e, "present.speak_failed");
            }
        }
        Ok(())
    }

    /// Write `line` without speaking it (machine-readable output).
    pub fn write_raw(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> RetryObserver for Presenter<W> {
    async fn on_failure(&mut self, _attempt: usize, err: &HttpError) {
        if let Err(e) = self.announce(&failure_message(err)).await {
            tracing::warn!(error = %e, "present.write_failed");
        }
    }

    async fn on_backoff(&mut self, _attempt: usize, wait: Duration, remaining: usize) {
        if let Err(e) = self.announce(&retry_message(wait, remaining)).await {
            tracing::warn!(error = %e, "present.write_failed");
        }
    }
}

/// User-facing wording for a failed attempt.
pub fn failure_message(err: &HttpError) -> String {
    match err {
        HttpError::Status { .. } => err.to_string(),
        HttpError::Network(message) => format!("An error occurred: {message}"),
        other => format!("An error occurred: {other}"),
    }
}

/// `Retrying in 4s... (3 attempts left)`
pub fn retry_message(wait: Duration, remaining: usize) -> String {
    format!("Retrying in {}s... ({remaining} attempts left)", wait.as_secs())
}

/// `No daily text found for today on this page.`
pub fn missing_message(label: &str, when: &str) -> String {
    format!("No {label} found for {when} on this page.")
}
