//! Core types for operator management

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator identifier for strongly-typed operator references
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperatorId(pub String);

impl From<String> for OperatorId {
    fn from(s: String) -> Self {
        OperatorId(s)
    }
}

impl From<&str> for OperatorId {
    fn from(s: &str) -> Self {
        OperatorId(s.to_string())
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OperatorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Operator availability state
///
/// An operator is BUSY exactly while one active call references it. ONLINE
/// and OFFLINE are presence states toggled by the surrounding system; the
/// routing engine only performs the ONLINE→BUSY and BUSY→ONLINE transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    /// Not signed in; never selected for routing
    Offline,

    /// Signed in and eligible for assignment
    Online,

    /// Handling a call
    Busy,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Offline => "OFFLINE",
            Availability::Online => "ONLINE",
            Availability::Busy => "BUSY",
        }
    }
}

impl std::str::FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "offline" | "Offline" | "OFFLINE" => Ok(Availability::Offline),
            "online" | "Online" | "ONLINE" => Ok(Availability::Online),
            "busy" | "Busy" | "BUSY" => Ok(Availability::Busy),
            _ => Err(format!("Unknown availability: {}", s)),
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Offline => write!(f, "offline"),
            Availability::Online => write!(f, "online"),
            Availability::Busy => write!(f, "busy"),
        }
    }
}
