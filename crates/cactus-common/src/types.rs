use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::InvalidModeError;

/// Which backend serves a routable request, and whether the other one is
/// tried when the first fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoutingMode {
    /// Local engine only.
    #[default]
    Local,
    /// Remote service only.
    Remote,
    /// Local engine, remote service on failure.
    LocalFirst,
    /// Remote service, local engine on failure.
    RemoteFirst,
}

impl RoutingMode {
    pub const ALL: [RoutingMode; 4] = [
        RoutingMode::Local,
        RoutingMode::Remote,
        RoutingMode::LocalFirst,
        RoutingMode::RemoteFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::Local => "local",
            RoutingMode::Remote => "remote",
            RoutingMode::LocalFirst => "local-first",
            RoutingMode::RemoteFirst => "remote-first",
        }
    }

    /// True for the modes that try a second backend on failure.
    pub fn has_fallback(&self) -> bool {
        matches!(self, RoutingMode::LocalFirst | RoutingMode::RemoteFirst)
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingMode {
    type Err = InvalidModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(RoutingMode::Local),
            "remote" => Ok(RoutingMode::Remote),
            "local-first" | "localfirst" => Ok(RoutingMode::LocalFirst),
            "remote-first" | "remotefirst" => Ok(RoutingMode::RemoteFirst),
            other => Err(InvalidModeError(other.to_string())),
        }
    }
}

impl TryFrom<String> for RoutingMode {
    type Error = InvalidModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoutingMode> for String {
    fn from(mode: RoutingMode) -> Self {
        mode.as_str().to_string()
    }
}
