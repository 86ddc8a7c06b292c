use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, trace, Instrument};

use crate::{
    sensor::{event::SensorEvent, StepSensor},
    utils::clock::Clock,
};

pub struct DataCollectionModule {
    next: mpsc::Sender<SensorEvent>,
    producer: Box<dyn StepSensor>,
    shutdown: CancellationToken,
    collection_frequency: Duration,
    time_provider: Box<dyn Clock>,
}

impl DataCollectionModule {
    pub fn new(
        next: mpsc::Sender<SensorEvent>,
        producer: Box<dyn StepSensor>,
        shutdown: CancellationToken,
        collection_frequency: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            producer,
            collection_frequency,
            time_provider,
            shutdown,
        }
    }

    /// Executes the collector event loop.
    pub async fn run(mut self) -> Result<()> {
        let mut collection_point = self.time_provider.instant();
        loop {
            collection_point += self.collection_frequency;

            match self.producer.poll() {
                Ok(events) => {
                    trace!("Sensor produced {} events", events.len());
                    for event in events {
                        let span = info_span!("Forwarding sensor event");
                        debug!("Sending event {event}");
                        self.next
                            .send(event)
                            .instrument(span)
                            .await
                            .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                    }
                }
                Err(e) => {
                    error!("Encountered an error during collection {:?}", e)
                }
            }

            tokio::select! {
                // Cancelation means we stop execution of the event loop. Which means we also drop
                // the sender channel and consequently stop processing module.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(collection_point) => ()
            }
        }
    }
}
