//! Single-threaded Tokio runtime with a shared cancellation token.
//!
//! A run fetches one page at a time, so the runtime is current-thread. The
//! token is cancelled on Ctrl-C (see [`DaytextRuntime::block_on_until_ctrl_c`])
//! or on [`DaytextRuntime::shutdown`]; retry waits watch it.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio_util::sync::CancellationToken;

pub struct DaytextRuntime {
    runtime: Runtime,
    cancel: CancellationToken,
}

impl DaytextRuntime {
    /// Build the current-thread runtime used by the binary.
    ///
    /// ```
    /// use daytext_runtime::DaytextRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = DaytextRuntime::build().expect("runtime builds");
    /// let value = runtime.block_on_until_ctrl_c(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build() -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            runtime,
            cancel: CancellationToken::new(),
        })
    }

    /// Clone of the shared cancellation token.
    ///
    /// ```
    /// use daytext_runtime::DaytextRuntime;
    ///
    /// let runtime = DaytextRuntime::build().unwrap();
    /// let cancel = runtime.cancellation();
    /// assert!(!cancel.is_cancelled());
    /// cancel.cancel();
    /// assert!(runtime.cancellation().is_cancelled());
    /// ```
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `fut` while a Ctrl-C listener cancels the shared token.
    ///
    /// The future is expected to watch [`DaytextRuntime::cancellation`] and
    /// return promptly once it fires.
    ///
    /// ```
    /// use daytext_runtime::DaytextRuntime;
    ///
    /// let runtime = DaytextRuntime::build().unwrap();
    /// let out = runtime.block_on_until_ctrl_c(async { "done" });
    /// assert_eq!(out, "done");
    /// ```
    pub fn block_on_until_ctrl_c<F: Future>(&self, fut: F) -> F::Output {
        let cancel = self.cancel.clone();
        self.runtime.block_on(async move {
            let watcher = tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        res = tokio::signal::ctrl_c() => {
                            if res.is_ok() {
                                tracing::info!("runtime.ctrl_c");
                                cancel.cancel();
                            }
                        }
                    }
                }
            });
            let out = fut.await;
            watcher.abort();
            out
        })
    }

    /// Cancel outstanding work and shut the runtime down.
    pub fn shutdown(self, graceful: Duration) {
        self.cancel.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}
