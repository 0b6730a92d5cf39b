use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use super::sink::{JsonSink, LogSink, TracingSink};
use crate::constants::DEFAULT_CORRELATION_KEY;

/// Builds the sink for a declaring type path.
pub type SinkFactory = Arc<dyn Fn(&str) -> Arc<dyn LogSink> + Send + Sync>;

/// Resolves one sink per declaring type and caches it.
///
/// The factory runs at most once per declaring type in the common case;
/// under a race the first inserted sink wins.
pub struct SinkRegistry {
    factory: SinkFactory,
    sinks: DashMap<String, Arc<dyn LogSink>>,
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::tracing(DEFAULT_CORRELATION_KEY)
    }
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("cached", &self.sinks.len())
            .finish()
    }
}

impl SinkRegistry {
    /// Creates a registry building sinks with `factory`.
    pub fn new(factory: SinkFactory) -> Self {
        Self {
            factory,
            sinks: DashMap::new(),
        }
    }

    /// Creates a registry handing out the same sink for every type.
    pub fn shared(sink: Arc<dyn LogSink>) -> Self {
        Self::new(Arc::new(move |_: &str| Arc::clone(&sink)))
    }

    /// Shares one [`TracingSink`] labelling ids with `correlation_key`.
    pub fn tracing(correlation_key: &str) -> Self {
        Self::shared(Arc::new(TracingSink::new(correlation_key)))
    }

    /// Shares one [`JsonSink`] writing ids under `correlation_key`.
    pub fn json(correlation_key: &str) -> Self {
        Self::shared(Arc::new(JsonSink::new(correlation_key)))
    }

    /// Returns the sink for `declaring_type`, building it on first use.
    pub fn resolve(&self, declaring_type: &str) -> Arc<dyn LogSink> {
        if let Some(sink) = self.sinks.get(declaring_type) {
            return Arc::clone(sink.value());
        }
        let sink = self
            .sinks
            .entry(declaring_type.to_string())
            .or_insert_with(|| (self.factory)(declaring_type));
        Arc::clone(sink.value())
    }

    /// Number of cached sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if no sink has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
