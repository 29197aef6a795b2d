//! Domain model for an authenticated identity.
use shared::Role;

/// Result of a successful credential match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Admin {
        username: String,
    },
    /// A parent, scoped to the first school whose roster matched
    Parent {
        name: String,
        contact: String,
        school: String,
    },
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Identity::Admin { .. } => Role::Admin,
            Identity::Parent { .. } => Role::Parent,
        }
    }

    /// Display name for logs
    pub fn username(&self) -> &str {
        match self {
            Identity::Admin { username } => username,
            Identity::Parent { name, .. } => name,
        }
    }

    /// The school a parent session is scoped to; admins are not scoped
    pub fn school(&self) -> Option<&str> {
        match self {
            Identity::Admin { .. } => None,
            Identity::Parent { school, .. } => Some(school),
        }
    }
}
