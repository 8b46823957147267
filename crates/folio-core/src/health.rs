//! Health of the import backend.
//!
//! Mirrors the body of the backend's `GET /health`: an overall status derived
//! from the database probe, the probe result itself, the deployment
//! environment and the API version. The client adds how long the check took
//! and when it ran.

use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Overall status reported by the backend.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceStatus {
    Healthy,
    /// Anything other than `healthy`.
    #[default]
    Unhealthy,
}

/// Result of the backend's `SELECT 1` probe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DatabaseStatus {
    Connected,
    Disconnected,
    /// The probe raised.
    Error,
    /// The backend sent a value this client does not know.
    #[default]
    Unknown,
}

/// One `/health` answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: ServiceStatus,
    pub database: DatabaseStatus,
    /// `ENVIRONMENT` of the backend deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// API version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Backend clock at the time of the check, as sent (naive ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<String>,
    /// Round-trip time of the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Duration>,
    /// When the client ran the check.
    pub checked_at: Timestamp,
}

impl ServiceHealth {
    /// Creates a report checked now.
    pub fn new(status: ServiceStatus, database: DatabaseStatus) -> Self {
        Self {
            status,
            database,
            environment: None,
            version: None,
            reported_at: None,
            response: None,
            checked_at: Timestamp::now(),
        }
    }

    /// A healthy backend with a connected database.
    pub fn healthy() -> Self {
        Self::new(ServiceStatus::Healthy, DatabaseStatus::Connected)
    }

    /// Parses the raw `status` and `database` strings of a `/health` body.
    ///
    /// Unknown values map to [`ServiceStatus::Unhealthy`] and
    /// [`DatabaseStatus::Unknown`].
    pub fn from_raw(status: &str, database: &str) -> Self {
        Self::new(
            status.parse().unwrap_or(ServiceStatus::Unhealthy),
            database.parse().unwrap_or(DatabaseStatus::Unknown),
        )
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_reported_at(mut self, reported_at: impl Into<String>) -> Self {
        self.reported_at = Some(reported_at.into());
        self
    }

    /// Sets the round-trip time of the check.
    #[must_use]
    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response = Some(response_time);
        self
    }

    /// Returns whether the backend reported itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }

    /// Describes why the backend is unhealthy, if it is.
    pub fn problem(&self) -> Option<String> {
        (!self.is_healthy()).then(|| format!("database {}", self.database))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_maps_backend_values() {
        let health = ServiceHealth::from_raw("unhealthy", "error")
            .with_version("1.0.0")
            .with_response_time(Duration::from_millis(12));

        assert!(!health.is_healthy());
        assert_eq!(health.database, DatabaseStatus::Error);
        assert_eq!(health.problem().as_deref(), Some("database error"));
        assert_eq!(health.response, Some(Duration::from_millis(12)));

        let odd = ServiceHealth::from_raw("starting", "pooling");
        assert_eq!(odd.status, ServiceStatus::Unhealthy);
        assert_eq!(odd.database, DatabaseStatus::Unknown);
    }

    #[test]
    fn test_healthy_has_no_problem() {
        let health = ServiceHealth::from_raw("healthy", "connected");
        assert!(health.is_healthy());
        assert!(health.problem().is_none());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ServiceStatus::Unhealthy).unwrap();
        assert_eq!(json, "\"unhealthy\"");
    }
}
