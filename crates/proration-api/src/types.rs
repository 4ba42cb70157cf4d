//! Response payloads of the informational endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "Allocation Portal API";

/// Version reported to clients; tracks the public API, not the crate.
pub const API_VERSION: &str = "1.0.0";

/// Paths a client can call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointIndex {
    pub health: String,
    pub prorate: String,
}

/// Body of `GET /` and `GET /api`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub endpoints: EndpointIndex,
}

impl ServiceInfo {
    pub fn current() -> Self {
        Self {
            message: SERVICE_NAME.to_string(),
            version: API_VERSION.to_string(),
            endpoints: EndpointIndex {
                health: "/api/health".to_string(),
                prorate: "/api/prorate (POST)".to_string(),
            },
        }
    }
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
}
