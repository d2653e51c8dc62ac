//! Driver spawns and manages the telegram processing task

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::pipeline::Pipeline;
use crate::provider::TelegramProvider;
use crate::types::DecodedSample;

/// Consecutive provider failures tolerated before the driver gives up
pub const MAX_PROVIDER_ERRORS: u32 = 10;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Latest decoded sample, usable or not
    pub samples: watch::Receiver<Option<Arc<DecodedSample>>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Handle of the reader task
    pub task: JoinHandle<()>,
}

/// Driver spawns and manages the telegram processing task
///
/// A single reader task owns the provider and runs every telegram through the
/// [`Pipeline`] before reading the next one, so samples reach chrony in arrival order.
pub struct Driver;

impl Driver {
    /// Spawn the reader task for the given provider
    pub fn spawn<P>(provider: P, pipeline: Pipeline) -> DriverChannels
    where
        P: TelegramProvider,
    {
        Self::spawn_with_cancel(provider, pipeline, CancellationToken::new())
    }

    /// Spawn the reader task under an existing cancellation token
    pub fn spawn_with_cancel<P>(
        provider: P,
        pipeline: Pipeline,
        cancel: CancellationToken,
    ) -> DriverChannels
    where
        P: TelegramProvider,
    {
        let (sample_tx, sample_rx) = watch::channel(None);
        let cancel_reader = cancel.clone();

        let task = tokio::spawn(async move {
            Self::reader_task(provider, pipeline, sample_tx, cancel_reader).await;
        });

        DriverChannels { samples: sample_rx, cancel, task }
    }

    /// Reader task - pulls telegrams and pushes them through the pipeline
    async fn reader_task<P>(
        mut provider: P,
        pipeline: Pipeline,
        sample_tx: watch::Sender<Option<Arc<DecodedSample>>>,
        cancel: CancellationToken,
    ) where
        P: TelegramProvider,
    {
        info!("Telegram reader started on {}", provider.source());
        let mut telegram_count = 0u64;
        let mut error_count = 0u32;

        loop {
            // Check for cancellation between telegrams
            if cancel.is_cancelled() {
                info!("Telegram reader cancelled");
                break;
            }

            // A transmit in flight is not interrupted, only the wait for input
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Telegram reader cancelled during read");
                    break;
                }
                result = provider.next_telegram() => result,
            };

            match result {
                Ok(Some(raw)) => {
                    telegram_count += 1;
                    error_count = 0;
                    trace!("Telegram {}: {} bytes", telegram_count, raw.len());

                    let outcome = pipeline.handle(&raw).await;
                    if let Some(sample) = outcome.sample() {
                        // Receivers are optional; a dropped reporter must not stop delivery
                        sample_tx.send_replace(Some(Arc::clone(sample)));
                    }
                }
                Ok(None) => {
                    info!("Telegram source ended after {} telegrams", telegram_count);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    pipeline.stats().record_provider_error();
                    error!("Provider error ({}/{}): {}", error_count, MAX_PROVIDER_ERRORS, e);

                    if error_count >= MAX_PROVIDER_ERRORS {
                        error!("Too many provider errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        debug!("Closing sample channel");
        info!("Telegram reader ended (processed {} telegrams)", telegram_count);
    }
}
