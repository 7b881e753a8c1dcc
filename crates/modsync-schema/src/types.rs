//! Module identifiers, lifecycle states and registry wire types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::str::FromStr;

/// Identifier of a module in a registry.
///
/// Names are opaque and case-sensitive: `Sale` and `sale` are different
/// modules. Ordering is lexicographic on the underlying string, which is what
/// makes resolution order reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Create a module name from the given string (stored as-is).
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModuleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for ModuleName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ModuleName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ModuleName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModuleName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle state of a module as reported by a registry.
///
/// The serialized spelling follows what ERP module registries report, so a
/// registry row can be deserialized directly. Deserialization goes through
/// [`FromStr`], which also accepts the older `uninstallable` spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ModuleState {
    /// Installed and active.
    #[serde(rename = "installed")]
    Installed,
    /// Scheduled for installation but not yet applied.
    #[serde(rename = "to install")]
    ToInstall,
    /// Installed, with an upgrade scheduled.
    #[serde(rename = "to upgrade")]
    ToUpgrade,
    /// Known to the registry and installable, but not installed.
    #[serde(rename = "uninstalled")]
    Uninstalled,
    /// Known to the registry but cannot be installed.
    #[serde(rename = "unavailable")]
    Unavailable,
}

impl ModuleState {
    /// Wire spelling of this state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::ToInstall => "to install",
            Self::ToUpgrade => "to upgrade",
            Self::Uninstalled => "uninstalled",
            Self::Unavailable => "unavailable",
        }
    }

    /// Returns `true` only for [`ModuleState::Installed`].
    pub fn is_installed(self) -> bool {
        self == Self::Installed
    }
}

impl std::fmt::Display for ModuleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a registry reports a state string we do not know.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown module state: '{0}'")]
pub struct ParseStateError(pub String);

impl FromStr for ModuleState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "installed" => Ok(Self::Installed),
            "to install" => Ok(Self::ToInstall),
            "to upgrade" => Ok(Self::ToUpgrade),
            "uninstalled" => Ok(Self::Uninstalled),
            "unavailable" | "uninstallable" => Ok(Self::Unavailable),
            other => Err(ParseStateError(other.to_string())),
        }
    }
}

impl TryFrom<String> for ModuleState {
    type Error = ParseStateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One row of a registry listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Module identifier.
    pub name: ModuleName,
    /// Current lifecycle state.
    pub state: ModuleState,
}

impl ModuleRecord {
    /// Create a record for `name` in `state`.
    pub fn new(name: impl Into<ModuleName>, state: ModuleState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }
}

/// What a registry answered to a single install request.
///
/// A response with `success == false` is a clean refusal by the registry
/// (for instance an immediate dependency is missing). Transport failures are
/// reported separately as errors by the registry implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallResponse {
    /// Whether the registry applied the installation.
    pub success: bool,
    /// Human-readable status line.
    pub message: String,
    /// Failure detail when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallResponse {
    /// A successful response.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    /// A refused installation.
    pub fn refused(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}
