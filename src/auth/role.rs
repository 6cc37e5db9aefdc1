use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Closed set of user roles. `Role::parse` is the only way raw input becomes a role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Moderator,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error("Role is required")]
    Missing,
    #[error("Role must be 'employee' or 'moderator'")]
    Invalid(String),
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Moderator => "moderator",
        }
    }

    /// Parses optional request input; absent and empty values are both "missing".
    pub fn parse(raw: Option<&str>) -> Result<Self, RoleError> {
        match raw {
            None | Some("") => Err(RoleError::Missing),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(Role::Employee),
            "moderator" => Ok(Role::Moderator),
            other => Err(RoleError::Invalid(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
