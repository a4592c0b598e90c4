//! Host group configuration objects.

use serde::{Deserialize, Serialize};

/// A named collection of hosts.
///
/// Groups exist so that dependencies (and operator commands) can address
/// many hosts at once; expansion resolves group references into concrete
/// member names before diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostGroupConfig {
    /// Group name, the natural key.
    pub name: String,
    /// Display alias.
    pub alias: String,
    /// Member host names.
    pub members: Vec<String>,
}

impl HostGroupConfig {
    /// Creates a group with the given members.
    pub fn new(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            alias: String::new(),
            members,
        }
    }

    /// Returns the natural key.
    pub fn key(&self) -> &str {
        &self.name
    }

    /// Returns true if `host` is a member.
    pub fn contains(&self, host: &str) -> bool {
        self.members.iter().any(|m| m == host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() {
        let group = HostGroupConfig::new("frontends", vec!["web-1".into(), "web-2".into()]);
        assert!(group.contains("web-1"));
        assert!(!group.contains("db-1"));
    }
}
