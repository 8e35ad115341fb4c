//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for caller-supplied fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was not supplied.
    #[error("{field} is required")]
    Missing { field: &'static str },

    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A finished entry cannot have a negative duration.
    #[error("duration must be non-negative, got {value}")]
    NegativeDuration { value: i64 },

    /// `start + duration` ends outside the storable timestamp range.
    #[error("duration {value}s is out of range for start {start}")]
    DurationOutOfRange { start: DateTime<Utc>, value: i64 },

    /// Stored timestamps are limited to four-digit years.
    #[error("{field} {value} is outside the supported range (years 0000 to 9999)")]
    TimestampOutOfRange {
        field: &'static str,
        value: DateTime<Utc>,
    },

    /// The interval would end before it begins.
    #[error("stop {stop} is before start {start}")]
    StopBeforeStart {
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    },

    /// Unknown tag edit mode.
    #[error("invalid tag mode: {value} (expected \"add\" or \"remove\")")]
    InvalidTagMode { value: String },

    /// Page numbers and sizes start at 1.
    #[error("{field} must be at least 1")]
    InvalidPage { field: &'static str },
}

/// A malformed identifier, rejected before any storage access.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {field}: {value:?}")]
pub struct InvalidId {
    pub field: &'static str,
    pub value: String,
}

/// Generates a UUID-backed ID newtype with common trait implementations.
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid);

        impl $name {
            /// Parses an ID from its textual form.
            pub fn parse(id: &str) -> Result<Self, InvalidId> {
                Uuid::parse_str(id.trim()).map(Self).map_err(|_| InvalidId {
                    field: $field_name,
                    value: id.to_string(),
                })
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }
    };
}

/// Adds the all-zero "no association" sentinel to an ID type.
macro_rules! impl_none_sentinel {
    ($name:ident) => {
        impl $name {
            /// The reserved all-zero ID meaning "no association".
            pub const NONE: Self = Self(Uuid::nil());

            /// Parses an optional ID, mapping absent or blank input to [`Self::NONE`].
            pub fn parse_or_none(id: Option<&str>) -> Result<Self, InvalidId> {
                match id.map(str::trim) {
                    None | Some("") => Ok(Self::NONE),
                    Some(id) => Self::parse(id),
                }
            }

            /// Returns true for the "no association" sentinel.
            #[must_use]
            pub fn is_none(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::NONE
            }
        }
    };
}

define_uuid_id!(
    /// A time entry identifier. Generated at creation and immutable.
    EntryId, "time entry ID"
);

define_uuid_id!(
    /// The owning user of a time entry.
    UserId, "user ID"
);

define_uuid_id!(
    /// A workspace identifier.
    WorkspaceId, "workspace ID"
);

define_uuid_id!(
    /// A project identifier.
    ///
    /// Entries without a project reference [`ProjectId::NONE`] so aggregate
    /// queries can always filter on a concrete value.
    ProjectId, "project ID"
);

define_uuid_id!(
    /// A task identifier. Same sentinel convention as [`ProjectId`].
    TaskId, "task ID"
);

impl_none_sentinel!(ProjectId);
impl_none_sentinel!(TaskId);

/// How [`crate::TimeEntryService::update_tags`] combines the supplied tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMode {
    /// Union the supplied tags into the entry's set.
    Add,
    /// Drop every supplied tag from the entry's set.
    Remove,
}

impl TagMode {
    /// String representation used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for TagMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TagMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            _ => Err(ValidationError::InvalidTagMode {
                value: s.to_string(),
            }),
        }
    }
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Creates a page request. Both values must be at least 1.
    pub const fn new(page: u32, page_size: u32) -> Result<Self, ValidationError> {
        if page == 0 {
            return Err(ValidationError::InvalidPage { field: "page" });
        }
        if page_size == 0 {
            return Err(ValidationError::InvalidPage { field: "page size" });
        }
        Ok(Self { page, page_size })
    }

    /// Number of rows to skip: `(page - 1) * page_size`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.page_size)
    }

    /// Maximum number of rows on this page.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}
