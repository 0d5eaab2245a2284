//! Grouping for grouped selects

use serde::{Deserialize, Serialize};

use super::aggregate::DataAggregate;
use super::condition::Condition;

/// Group rows by key members, compute aggregates per group, then filter groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grouping {
    pub keys: Vec<String>,
    #[serde(default)]
    pub aggregates: Vec<DataAggregate>,
    /// Applied to each group row after aggregation (HAVING)
    #[serde(default)]
    pub filter: Option<Condition>,
}

impl Grouping {
    pub fn by<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            aggregates: Vec::new(),
            filter: None,
        }
    }

    pub fn aggregate(mut self, aggregate: DataAggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    pub fn having(mut self, filter: Condition) -> Self {
        self.filter = Some(filter);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let grouping = Grouping::by(["Region"])
            .aggregate(DataAggregate::count())
            .having(Condition::greater_than("Count(*)", 1));

        assert_eq!(grouping.keys, vec!["Region".to_string()]);
        assert_eq!(grouping.aggregates.len(), 1);
        assert!(grouping.filter.is_some());
    }
}
