//! Event feed: a plain text file other programs append to. Every line is one event in the
//! format accepted by [SensorEvent]'s `FromStr`, e.g. `counter 10432` or `pulse 1`.

use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom},
    path::PathBuf,
};

use anyhow::Result;
use tracing::warn;

use super::{event::SensorEvent, StepSensor};

pub struct FeedSensor {
    path: PathBuf,
    /// Position up to which the file was consumed.
    offset: u64,
    /// Trailing bytes of a line that wasn't terminated yet.
    partial: Vec<u8>,
}

impl FeedSensor {
    /// Starts at the current end of the feed. Lines written while nobody listened are not
    /// replayed.
    pub fn new(path: PathBuf) -> Result<Self> {
        let offset = match std::fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => Err(e)?,
        };
        Ok(Self {
            path,
            offset,
            partial: Vec::new(),
        })
    }

    fn read_new_content(&mut self) -> Result<Vec<u8>> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => Err(e)?,
        };

        let len = file.metadata()?.len();
        if len < self.offset {
            warn!("Feed {:?} was truncated, reading from the start", self.path);
            self.offset = 0;
            self.partial.clear();
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let mut content = Vec::new();
        let read = file.read_to_end(&mut content)?;
        self.offset += read as u64;
        Ok(content)
    }
}

fn parse_line(line: &[u8]) -> Option<SensorEvent> {
    let Ok(line) = std::str::from_utf8(line) else {
        warn!("Skipping feed line that is not valid utf-8: {line:?}");
        return None;
    };
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.parse::<SensorEvent>() {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Skipping feed line {line:?}: {e}");
            None
        }
    }
}

impl StepSensor for FeedSensor {
    fn poll(&mut self) -> Result<Vec<SensorEvent>> {
        let content = self.read_new_content()?;
        if content.is_empty() {
            return Ok(vec![]);
        }

        let mut buffer = std::mem::take(&mut self.partial);
        buffer.extend_from_slice(&content);

        let Some(end) = buffer.iter().rposition(|&b| b == b'\n') else {
            self.partial = buffer;
            return Ok(vec![]);
        };
        self.partial = buffer.split_off(end + 1);

        Ok(buffer
            .split(|&b| b == b'\n')
            .filter_map(parse_line)
            .collect())
    }
}
