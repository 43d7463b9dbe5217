//! Weighted choice of the next operation kind

use crate::config::Configuration;
use crate::error::{Error, Result};
use tracegen_common::{Distribution, OperationType, UniformDistribution};

/// Ordered `(kind, weight)` table.
///
/// Order is the tie-break order of the selection walk and is fixed at
/// construction: READ, UPDATE, WRITE (insert), SCAN. Zero weights are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationProportions {
    entries: Vec<(OperationType, f64)>,
}

impl OperationProportions {
    pub fn from_config(config: &Configuration) -> Self {
        let candidates = [
            (OperationType::Read, config.read_proportion),
            (OperationType::Update, config.update_proportion),
            (OperationType::Write, config.insert_proportion),
            (OperationType::Scan, config.scan_proportion),
        ];
        Self::from_entries(candidates.into_iter().filter(|(_, weight)| *weight > 0.0).collect())
    }

    pub fn from_entries(entries: Vec<(OperationType, f64)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(OperationType, f64)] {
        &self.entries
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, weight)| weight).sum()
    }

    pub fn contains(&self, kind: OperationType) -> bool {
        self.entries.iter().any(|(k, _)| *k == kind)
    }
}

/// Draws operation kinds according to an `OperationProportions` table
pub struct OperationSelector {
    proportions: OperationProportions,
    total_weight: f64,
    dist: UniformDistribution,
}

impl OperationSelector {
    pub fn new(proportions: OperationProportions, seed: u64) -> anyhow::Result<Self> {
        let total_weight = proportions.total_weight();
        let dist = UniformDistribution::unit(seed)?;
        Ok(Self { proportions, total_weight, dist })
    }

    /// Pick the next kind.
    pub fn select(&mut self) -> Result<OperationType> {
        let draw = self.dist.sample();
        select_with(&self.proportions, self.total_weight, draw)
    }

    pub fn proportions(&self) -> &OperationProportions {
        &self.proportions
    }
}

/// Walk the table subtracting normalised weights until `draw` falls inside one.
fn select_with(
    proportions: &OperationProportions,
    total_weight: f64,
    draw: f64,
) -> Result<OperationType> {
    let mut remaining = draw;
    for (kind, weight) in proportions.entries() {
        let normalised = weight / total_weight;
        if remaining < normalised {
            return Ok(*kind);
        }
        remaining -= normalised;
    }
    Err(Error::NoOperationSelected { draw, total_weight })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table(entries: &[(OperationType, f64)]) -> OperationProportions {
        OperationProportions::from_entries(entries.to_vec())
    }

    #[test]
    fn test_from_config_order_and_filtering() {
        let config = Configuration {
            read_proportion: 0.5,
            update_proportion: 0.0,
            insert_proportion: 0.2,
            scan_proportion: 0.3,
            ..Default::default()
        };
        let proportions = OperationProportions::from_config(&config);
        assert_eq!(
            proportions.entries(),
            &[(OperationType::Read, 0.5), (OperationType::Write, 0.2), (OperationType::Scan, 0.3)]
        );
        assert!(!proportions.contains(OperationType::Update));
    }

    #[test]
    fn test_select_walks_in_order() {
        let proportions = table(&[(OperationType::Read, 1.0), (OperationType::Update, 3.0)]);
        // Weights need not sum to one: 1/4 read, 3/4 update.
        assert_eq!(select_with(&proportions, 4.0, 0.0).unwrap(), OperationType::Read);
        assert_eq!(select_with(&proportions, 4.0, 0.24).unwrap(), OperationType::Read);
        assert_eq!(select_with(&proportions, 4.0, 0.25).unwrap(), OperationType::Update);
        assert_eq!(select_with(&proportions, 4.0, 0.99).unwrap(), OperationType::Update);
    }

    #[test]
    fn test_empty_table_fails() {
        let proportions = table(&[]);
        let err = select_with(&proportions, 0.0, 0.3).unwrap_err();
        assert!(matches!(err, Error::NoOperationSelected { .. }));
    }

    #[test]
    fn test_non_positive_weight_fails() {
        let proportions = table(&[(OperationType::Read, 0.0)]);
        let mut selector = OperationSelector::new(proportions, 1).unwrap();
        assert!(selector.select().is_err());
    }

    #[test]
    fn test_selection_frequencies() {
        let proportions = table(&[
            (OperationType::Read, 0.95),
            (OperationType::Write, 0.05),
        ]);
        let mut selector = OperationSelector::new(proportions, 42).unwrap();

        let mut counts: HashMap<OperationType, u32> = HashMap::new();
        for _ in 0..100_000 {
            *counts.entry(selector.select().unwrap()).or_insert(0) += 1;
        }
        let reads = counts[&OperationType::Read];
        assert!((93_000..97_000).contains(&reads), "reads = {}", reads);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let proportions = table(&[(OperationType::Read, 0.5), (OperationType::Scan, 0.5)]);
        let mut a = OperationSelector::new(proportions.clone(), 9).unwrap();
        let mut b = OperationSelector::new(proportions, 9).unwrap();
        for _ in 0..1000 {
            assert_eq!(a.select().unwrap(), b.select().unwrap());
        }
    }
}
