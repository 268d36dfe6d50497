//! Actors that perform logged actions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Anything that can be named in an action log line.
pub trait Actor {
    fn name(&self) -> &str;
    fn role(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Editor,
    Viewer,
    Generic,
}

impl UserRole {
    /// Map a free-form user kind onto a role; unknown kinds fall back to [`UserRole::Generic`].
    pub fn from_kind(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "editor" => Self::Editor,
            "viewer" => Self::Viewer,
            _ => Self::Generic,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Editor => "Editor",
            UserRole::Viewer => "Viewer",
            UserRole::Generic => "Generic User",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    name: String,
    role: UserRole,
}

impl User {
    pub fn new(name: impl Into<String>, role: UserRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    pub fn user_role(&self) -> UserRole {
        self.role
    }
}

impl Actor for User {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> &str {
        self.role.label()
    }
}

/// Build a user for the given kind (`admin`, `editor`, `viewer`, anything else).
pub fn create_user(kind: &str, name: impl Into<String>) -> User {
    User::new(name, UserRole::from_kind(kind))
}
