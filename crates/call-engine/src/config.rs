use serde::{Deserialize, Serialize};

use crate::error::{CallCenterError, Result};

/// Call routing engine configuration
///
/// Encompasses every tunable of the routing engine, from operator selection
/// policy to backlog capacity and database location.
///
/// # Examples
///
/// ```
/// use callgrid_call_engine::config::{CallCenterConfig, SelectionStrategy};
///
/// let mut config = CallCenterConfig::default();
/// config.routing.selection = SelectionStrategy::RoundRobin;
/// config.queues.max_queue_size = 500;
///
/// config.validate().expect("configuration should be valid");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallCenterConfig {
    /// General engine settings
    pub general: GeneralConfig,

    /// Operator selection and reservation retry behavior
    pub routing: RoutingConfig,

    /// Backlog capacity settings
    pub queues: QueueConfig,

    /// Persistent storage settings
    pub database: DatabaseConfig,
}

/// General engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default number of records returned by `list_calls` when the caller
    /// does not pass a limit
    pub list_limit: usize,
}

/// Operator selection and reservation behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// How `find_available` picks among multiple ONLINE operators
    pub selection: SelectionStrategy,

    /// How many times `initiate_call` re-queries the registry after losing a
    /// reservation race before falling back to the queue
    pub reserve_retries: u32,
}

/// Deterministic operator selection policy
///
/// Any ONLINE operator is eligible; the strategy only fixes the tie-break so
/// tests can predict assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionStrategy {
    /// Always pick the lexicographically smallest operator id
    LowestId,
    /// Rotate through ONLINE operators in id order
    RoundRobin,
}

/// Backlog capacity settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of calls allowed to wait in the backlog
    pub max_queue_size: usize,
}

/// Persistent storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite:callgrid.db` or `sqlite::memory:`
    pub url: String,
}

impl Default for CallCenterConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig { list_limit: 100 },
            routing: RoutingConfig {
                selection: SelectionStrategy::LowestId,
                reserve_retries: 1,
            },
            queues: QueueConfig { max_queue_size: 10_000 },
            database: DatabaseConfig { url: "sqlite::memory:".to_string() },
        }
    }
}

impl CallCenterConfig {
    /// Validate the configuration
    ///
    /// Returns a `Configuration` error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.general.list_limit == 0 {
            return Err(CallCenterError::configuration(
                "general.list_limit must be greater than zero",
            ));
        }
        if self.queues.max_queue_size == 0 {
            return Err(CallCenterError::configuration(
                "queues.max_queue_size must be greater than zero",
            ));
        }
        if self.database.url.is_empty() {
            return Err(CallCenterError::configuration(
                "database.url must not be empty",
            ));
        }
        Ok(())
    }

    /// Export the configuration as pretty-printed JSON (administrative
    /// snapshot).
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CallCenterError::configuration(format!("Serialization failed: {}", e)))
    }

    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            CallCenterError::configuration(format!("Invalid configuration JSON: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CallCenterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.general.list_limit, 100);
        assert_eq!(config.routing.reserve_retries, 1);
        assert_eq!(config.routing.selection, SelectionStrategy::LowestId);
    }

    #[test]
    fn zero_list_limit_is_rejected() {
        let mut config = CallCenterConfig::default();
        config.general.list_limit = 0;
        assert!(matches!(
            config.validate(),
            Err(CallCenterError::Configuration(_))
        ));
    }

    #[test]
    fn empty_database_url_is_rejected() {
        let mut config = CallCenterConfig::default();
        config.database.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = CallCenterConfig::default();
        config.routing.selection = SelectionStrategy::RoundRobin;
        config.queues.max_queue_size = 500;

        let json = config.to_json().unwrap();
        let parsed = CallCenterConfig::from_json(&json).unwrap();
        assert_eq!(parsed.routing.selection, SelectionStrategy::RoundRobin);
        assert_eq!(parsed.queues.max_queue_size, 500);
    }

    #[test]
    fn invalid_json_config_is_rejected() {
        assert!(matches!(
            CallCenterConfig::from_json("{not json"),
            Err(CallCenterError::Configuration(_))
        ));

        // Well-formed JSON still goes through validation.
        let json = CallCenterConfig::default().to_json().unwrap();
        let json = json.replace("\"max_queue_size\": 10000", "\"max_queue_size\": 0");
        assert!(CallCenterConfig::from_json(&json).is_err());
    }
}
