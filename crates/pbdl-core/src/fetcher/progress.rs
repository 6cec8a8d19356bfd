//! Progress reporting for downloads.
//!
//! Progress is a side channel: the fetcher reports after every written chunk
//! and never waits on the consumer.

use std::sync::mpsc;

/// Snapshot reported after each chunk is written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// The response declared its length.
    Percent {
        downloaded: u64,
        total: u64,
        percent: f64,
    },
    /// No declared length; only the running byte count is known.
    Bytes { downloaded: u64 },
}

impl Progress {
    /// Build the right variant for `downloaded` bytes out of an optional declared total.
    pub fn new(downloaded: u64, total: Option<u64>) -> Self {
        match total {
            Some(total) if total > 0 => Progress::Percent {
                downloaded,
                total,
                percent: downloaded as f64 * 100.0 / total as f64,
            },
            _ => Progress::Bytes { downloaded },
        }
    }

    pub fn downloaded(&self) -> u64 {
        match *self {
            Progress::Percent { downloaded, .. } | Progress::Bytes { downloaded } => downloaded,
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match *self {
            Progress::Percent { percent, .. } => Some(percent),
            Progress::Bytes { .. } => None,
        }
    }
}

/// Consumer of progress snapshots.
pub trait ProgressSink {
    fn report(&self, progress: Progress);
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: Progress) {}
}

/// Forwards reports over an unbounded channel; a dropped receiver is ignored.
impl ProgressSink for mpsc::Sender<Progress> {
    fn report(&self, progress: Progress) {
        let _ = self.send(progress);
    }
}
