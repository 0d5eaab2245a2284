//! Sorting

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DataAccessError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Sort on one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorting {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sorting {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    pub fn is_descending(&self) -> bool {
        self.direction == SortDirection::Descending
    }
}

/// `"Name"` sorts ascending, `"~Name"` or `"-Name"` descending
impl FromStr for Sorting {
    type Err = DataAccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (field, descending) = match text.strip_prefix(['~', '-']) {
            Some(rest) => (rest.trim(), true),
            None => (text, false),
        };
        if field.is_empty() {
            return Err(DataAccessError::invalid_argument(format!(
                "sorting '{}' names no member",
                s
            )));
        }
        Ok(if descending {
            Self::descending(field)
        } else {
            Self::ascending(field)
        })
    }
}

impl fmt::Display for Sorting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_descending() {
            write!(f, "~{}", self.field)
        } else {
            write!(f, "{}", self.field)
        }
    }
}
