//! # Trend History
//! Bounded rolling buffer of per-fetch aggregate samples, feeding the
//! dashboard chart. One sample per successful fetch; oldest samples are
//! evicted FIFO once the buffer reaches capacity.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::trend::Trend;

/// Score used when a fetch returned zero topics.
pub const NEUTRAL_SENTIMENT: f64 = 50.0;

/// Default buffer capacity: ten one-minute samples.
pub const DEFAULT_HISTORY_CAP: usize = 10;

/// One time-stamped aggregate snapshot.
///
/// `volumes` is sparse: a name absent from the map means the topic was
/// not present in that fetch, which is different from a zero volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySample {
    /// Wall-clock label at fetch completion, `HH:MM`.
    pub time: String,
    pub average_sentiment: f64,
    pub volumes: BTreeMap<String, u64>,
}

/// Thread-safe rolling buffer of [`HistorySample`]s.
#[derive(Debug)]
pub struct TrendHistory {
    inner: Mutex<VecDeque<HistorySample>>,
    cap: usize,
}

impl TrendHistory {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, 1_000);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            cap,
        }
    }

    /// Append one sample derived from a successful fetch.
    ///
    /// Aggregate sentiment is the arithmetic mean of the scores, or
    /// [`NEUTRAL_SENTIMENT`] when `trends` is empty. Evicts from the
    /// front until the buffer is back within capacity.
    pub fn append(&self, trends: &[Trend], now: DateTime<Local>) {
        let average = if trends.is_empty() {
            NEUTRAL_SENTIMENT
        } else {
            let total: u64 = trends.iter().map(|t| u64::from(t.sentiment_score)).sum();
            total as f64 / trends.len() as f64
        };

        let volumes = trends
            .iter()
            .map(|t| (t.name.clone(), t.volume))
            .collect::<BTreeMap<_, _>>();

        let sample = HistorySample {
            time: now.format("%H:%M").to_string(),
            average_sentiment: average,
            volumes,
        };

        let mut buf = self.inner.lock().expect("history mutex poisoned");
        buf.push_back(sample);
        while buf.len() > self.cap {
            buf.pop_front();
        }
    }

    /// Ordered snapshot, oldest to newest. Length never exceeds capacity.
    pub fn snapshot(&self) -> Vec<HistorySample> {
        let buf = self.inner.lock().expect("history mutex poisoned");
        buf.iter().cloned().collect()
    }

    /// Clear the buffer. Called on parameter or watch-set change.
    pub fn reset(&self) {
        let mut buf = self.inner.lock().expect("history mutex poisoned");
        buf.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("history mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }
}
