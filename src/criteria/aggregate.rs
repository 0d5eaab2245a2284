//! Aggregate functions

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Count,
    Sum,
    Average,
    Maximum,
    Minimum,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Sum => "Sum",
            Self::Average => "Average",
            Self::Maximum => "Maximum",
            Self::Minimum => "Minimum",
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An aggregate over one member (or all rows, for `Count` without member)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAggregate {
    pub function: AggregateFunction,
    #[serde(default)]
    pub member: Option<String>,
    #[serde(default)]
    pub distinct: bool,
    /// Output key in grouped results
    #[serde(default)]
    pub alias: Option<String>,
}

impl DataAggregate {
    pub fn new(function: AggregateFunction, member: Option<&str>) -> Self {
        Self {
            function,
            member: member.map(str::to_string),
            distinct: false,
            alias: None,
        }
    }

    /// Count rows
    pub fn count() -> Self {
        Self::new(AggregateFunction::Count, None)
    }

    /// Count non-null values of a member
    pub fn count_of(member: &str) -> Self {
        Self::new(AggregateFunction::Count, Some(member))
    }

    pub fn sum(member: &str) -> Self {
        Self::new(AggregateFunction::Sum, Some(member))
    }

    pub fn average(member: &str) -> Self {
        Self::new(AggregateFunction::Average, Some(member))
    }

    pub fn maximum(member: &str) -> Self {
        Self::new(AggregateFunction::Maximum, Some(member))
    }

    pub fn minimum(member: &str) -> Self {
        Self::new(AggregateFunction::Minimum, Some(member))
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Alias, or `Function(member)` / `Function(*)`
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => format!(
                "{}({})",
                self.function,
                self.member.as_deref().unwrap_or("*")
            ),
        }
    }
}
