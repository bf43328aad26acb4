use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded connection to the stream endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerEvent {
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ListenerEvent {
    pub fn new(ip: impl Into<String>, country: Option<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            ip: ip.into(),
            country,
            timestamp,
        }
    }
}
