//! Community identifiers
//!
//! This module turns the free-form identifiers a user types (profile URLs,
//! short names, `club123`-style ids) into signed owner ids.

mod identifier;
mod resolver;

pub use identifier::{parse_identifier, Identifier};
pub use resolver::{ResolveError, Resolver};

use std::fmt;

/// Signed owner id: negative for communities, positive for user pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(i64);

impl OwnerId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Owner id of the community with the given positive id
    pub fn community(id: i64) -> Self {
        Self(-id.abs())
    }

    /// Owner id of the user page with the given id
    pub fn user(id: i64) -> Self {
        Self(id.abs())
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// Returns true for groups, public pages and events
    pub fn is_community(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-supplied identifier together with the owner id it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityRef {
    pub raw: String,
    pub owner_id: OwnerId,
}
