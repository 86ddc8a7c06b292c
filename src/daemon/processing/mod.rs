use anyhow::Result;
use module::EventProcessor;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info};

use crate::sensor::event::SensorEvent;

pub mod module;
pub mod step_recorder;

/// Represents consumer of sensor events. This module is responsible for receiving events and
/// applying them through a processor.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<SensorEvent>,
    processor: Processor,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<SensorEvent>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            debug!("Processing event {event}");
            match self.processor.process_next(event).await {
                Ok(_) => {
                    info!("Processed event {event}")
                }
                Err(e) => {
                    // The write is lost, the next event starts again from the stored state.
                    error!("Error processing event {event}: {e:?}")
                }
            }
        }

        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}
