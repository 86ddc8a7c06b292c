use anyhow::Result;

use crate::sensor::event::SensorEvent;

/// Represents an event processor. Receives every sensor event the collector produced.
pub trait EventProcessor {
    fn process_next(&mut self, message: SensorEvent) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
