//! Bookkeeping shared by the response parsers.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{insert_unique, MarketRecord, MarketSnapshot};

/// Accumulates parsed records and counts what was skipped.
///
/// A malformed entry is skipped on its own, but a payload in which every
/// entry is malformed fails the whole parse.
pub(crate) struct SnapshotBuilder {
    provider: &'static str,
    snapshot: MarketSnapshot,
    malformed: usize,
    duplicates: usize,
}

impl SnapshotBuilder {
    pub(crate) fn new(provider: &'static str) -> Self {
        Self {
            provider,
            snapshot: MarketSnapshot::new(),
            malformed: 0,
            duplicates: 0,
        }
    }

    pub(crate) fn push(&mut self, record: MarketRecord) {
        if !insert_unique(&mut self.snapshot, record) {
            self.duplicates += 1;
        }
    }

    /// Decode one array element, skipping it as malformed on a type mismatch.
    pub(crate) fn decode<T: DeserializeOwned>(&mut self, index: usize, entry: Value) -> Option<T> {
        match serde_json::from_value(entry) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                self.skip_malformed(&format!("#{}", index), &e.to_string());
                None
            }
        }
    }

    pub(crate) fn skip_malformed(&mut self, what: &str, reason: &str) {
        warn!("{}: skipping malformed entry {}: {}", self.provider, what, reason);
        self.malformed += 1;
    }

    pub(crate) fn finish(self) -> Result<MarketSnapshot, MarketDataError> {
        if self.snapshot.is_empty() && self.malformed > 0 {
            return Err(MarketDataError::malformed(
                self.provider,
                format!("all {} entries were malformed", self.malformed),
            ));
        }

        debug!(
            "{}: parsed {} records ({} malformed, {} duplicate symbols skipped)",
            self.provider,
            self.snapshot.len(),
            self.malformed,
            self.duplicates
        );

        Ok(self.snapshot)
    }
}
