use std::sync::Arc;

use chrono::{DateTime, Utc};

/// One observed change of the on-screen timer. Ephemeral, lives only for the
/// trip from the sampler to the forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEvent {
    /// The matched timer text, for example `12:34` or `1:05:12`.
    pub label: Arc<str>,
    pub timestamp: DateTime<Utc>,
}
