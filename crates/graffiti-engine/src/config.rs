use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`GraffitiEngine`](crate::GraffitiEngine) instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Logical database name handed to the storage backend.
    pub name: String,
    /// Minimum delay between cursor continuations. A resume arriving
    /// sooner waits out the remainder before scanning, preventing busy
    /// polling.
    pub continue_buffer: Duration,
    /// Capacity of per-subscriber session event channels.
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "graffitiDb".to_string(),
            continue_buffer: Duration::from_millis(2000),
            channel_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// A configuration with the given database name and defaults for
    /// everything else.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Disable the continuation rate limit. Intended for tests.
    pub fn without_continue_buffer(mut self) -> Self {
        self.continue_buffer = Duration::ZERO;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.name, "graffitiDb");
        assert_eq!(config.continue_buffer, Duration::from_millis(2000));
        assert_eq!(config.channel_capacity, 64);
    }

    #[test]
    fn named_overrides_only_the_name() {
        let config = EngineConfig::named("other");
        assert_eq!(config.name, "other");
        assert_eq!(config.continue_buffer, Duration::from_millis(2000));
    }
}
