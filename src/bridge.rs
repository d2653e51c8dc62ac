//! Running bridge: reader task, status reporter and their handle

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chrony::SampleTransmitter;
use crate::config::BridgeConfig;
use crate::driver::Driver;
use crate::pipeline::Pipeline;
use crate::provider::TelegramProvider;
use crate::providers::SerialProvider;
use crate::reporter::StatusReporter;
use crate::stats::{BridgeStats, StatsSnapshot};
use crate::telegram::TelegramDecoder;
use crate::types::DecodedSample;
use crate::Result;

/// Entry point for starting a bridge
pub struct Bridge;

impl Bridge {
    /// Open the configured serial device and start bridging.
    pub fn open(config: &BridgeConfig) -> Result<BridgeHandle> {
        config.validate()?;
        let provider = SerialProvider::open(&config.serial_port, config.baud_rate)?;
        Ok(Self::spawn(provider, config))
    }

    /// Start bridging telegrams from any provider.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<P: TelegramProvider>(provider: P, config: &BridgeConfig) -> BridgeHandle {
        info!("Starting GPSDO-Chrony SOCK bridge");
        info!(
            "Serial: {}, Socket: {}",
            provider.source(),
            config.socket_path.display()
        );

        let stats = Arc::new(BridgeStats::new());
        let transmitter =
            SampleTransmitter::new(&config.socket_path).with_timeout(config.write_timeout());
        let pipeline = Pipeline::new(
            TelegramDecoder::new(config.rollover_policy()),
            transmitter,
            Arc::clone(&stats),
        );

        let channels = Driver::spawn(provider, pipeline);
        let reporter =
            StatusReporter::new(Arc::clone(&stats), channels.samples.clone(), config.report_interval())
                .spawn(channels.cancel.clone());

        BridgeHandle {
            samples: channels.samples,
            stats,
            cancel: channels.cancel,
            tasks: vec![channels.task, reporter],
        }
    }
}

/// Handle to a running bridge
///
/// Dropping the handle stops the bridge.
pub struct BridgeHandle {
    samples: watch::Receiver<Option<Arc<DecodedSample>>>,
    stats: Arc<BridgeStats>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl BridgeHandle {
    /// Most recent decoded sample, usable or not
    pub fn latest(&self) -> Option<Arc<DecodedSample>> {
        self.samples.borrow().clone()
    }

    /// Stream of decoded samples, starting with the current one if any.
    ///
    /// Slow consumers skip intermediate samples.
    pub fn samples(&self) -> impl Stream<Item = Arc<DecodedSample>> + 'static {
        WatchStream::new(self.samples.clone()).filter_map(|opt| async move { opt })
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Wait until the telegram source ends or the bridge is stopped.
    pub async fn closed(&self) {
        let mut samples = self.samples.clone();
        while samples.changed().await.is_ok() {}
    }

    /// Ask both tasks to stop after the telegram in flight.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Stop the bridge and wait for its tasks to finish.
    pub async fn join(mut self) {
        self.cancel.cancel();
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                debug!("Bridge task ended abnormally: {}", e);
            }
        }
        info!("Bridge stopped");
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        debug!("Dropping bridge handle");
        self.cancel.cancel();
    }
}
