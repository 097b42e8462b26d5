use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort descriptor handed to adapters. `name` is a storage column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub name: String,
    pub by: Option<Direction>,
}

impl Order {
    pub fn new(name: impl Into<String>, by: Option<Direction>) -> Self {
        Self {
            name: name.into(),
            by,
        }
    }

    /// Effective direction; adapters sort ascending when none was given.
    pub fn direction(&self) -> Direction {
        self.by.unwrap_or(Direction::Asc)
    }
}

/// Parses `field[:asc|desc]` into the field name and optional direction.
///
/// The field must be one or more ASCII alphanumerics or underscores; the
/// direction suffix is case-sensitive. Anything else yields `None`.
pub fn parse_order(arg: &str) -> Option<(&str, Option<Direction>)> {
    let (key, direction) = match arg.split_once(':') {
        Some((key, "asc")) => (key, Some(Direction::Asc)),
        Some((key, "desc")) => (key, Some(Direction::Desc)),
        Some(_) => return None,
        None => (arg, None),
    };
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, direction))
}
