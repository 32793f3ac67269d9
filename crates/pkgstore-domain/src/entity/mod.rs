//! Entity references.
//!
//! An entity is addressed by `[~owner/][series/]name[-revision]`. Series and
//! revision may be missing until the reference has been passed through an
//! [`EntityResolver`](crate::resolver::EntityResolver).

mod parser;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};

pub use parser::{is_valid_name, is_valid_series, is_valid_user, parse_reference};

/// Scheme prefix of the canonical reference form.
pub const SCHEME: &str = "cs:";

/// Series tokens recognised when splitting a request path.
///
/// A path segment that is not in this list is taken to be an entity name,
/// so `wordpress/meta` is the entity `wordpress` followed by `/meta`.
pub const KNOWN_SERIES: &[&str] = &[
    "bundle", "oneiric", "precise", "quantal", "raring", "saucy", "trusty", "utopic", "vivid",
    "wily", "xenial", "yakkety", "zesty", "artful", "bionic", "win2012r2", "centos7",
];

/// Returns true if `series` is one of [`KNOWN_SERIES`].
pub fn is_known_series(series: &str) -> bool {
    KNOWN_SERIES.contains(&series)
}

/// Reference to a stored entity.
///
/// The name is always valid. Owner is part of identity: `~joe/precise/x-1`
/// and `precise/x-1` are different entities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    owner: Option<String>,
    series: Option<String>,
    name: String,
    revision: Option<u32>,
}

impl EntityRef {
    /// Creates an unowned reference with no series or revision.
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(DomainError::InvalidName { name });
        }
        Ok(Self {
            owner: None,
            series: None,
            name,
            revision: None,
        })
    }

    /// Sets the owner.
    pub fn with_owner(mut self, owner: impl Into<String>) -> DomainResult<Self> {
        let owner = owner.into();
        if !is_valid_user(&owner) {
            return Err(DomainError::InvalidUser {
                reference: format!("~{}", owner),
            });
        }
        self.owner = Some(owner);
        Ok(self)
    }

    /// Sets the series.
    pub fn with_series(mut self, series: impl Into<String>) -> DomainResult<Self> {
        let series = series.into();
        if !is_valid_series(&series) {
            return Err(DomainError::InvalidSeries { series });
        }
        self.series = Some(series);
        Ok(self)
    }

    /// Sets the revision.
    pub fn with_revision(mut self, revision: u32) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn series(&self) -> Option<&str> {
        self.series.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    /// True once both series and revision are known.
    pub fn is_resolved(&self) -> bool {
        self.series.is_some() && self.revision.is_some()
    }

    /// The reference without the `cs:` scheme, e.g. `~joe/precise/wordpress-34`.
    pub fn path(&self) -> String {
        let mut path = String::new();
        if let Some(owner) = &self.owner {
            path.push('~');
            path.push_str(owner);
            path.push('/');
        }
        if let Some(series) = &self.series {
            path.push_str(series);
            path.push('/');
        }
        path.push_str(&self.name);
        if let Some(revision) = self.revision {
            path.push('-');
            path.push_str(&revision.to_string());
        }
        path
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SCHEME, self.path())
    }
}

impl FromStr for EntityRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_reference(s)
    }
}

impl Serialize for EntityRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_reference(&s).map_err(serde::de::Error::custom)
    }
}
