//! Partitioning a subtree into transfer units.
//!
//! A transfer unit is the granularity of one export/import round-trip. An
//! *atomic* unit (`oversized == false`) ships its whole subtree in one
//! recursive operation; an *oversized* unit ships only the node's own
//! properties, leaving every child to its own unit. Together the units form a
//! covering partition: each node in the subtree is shipped exactly once.
//!
//! Partitioning and ordering are deliberately separate steps — the partition
//! is an unordered set, and [`order_units`] applies the replay ordering
//! (oversized units first, each group ascending by lower-cased path).

use crate::aggregate::{ReferencePolicy, SizeFact, SubtreeIndex};
use crate::errors::StoreResult;
use crate::paths;
use crate::traits::store::ContentStore;

/// One unit of transfer: a node path and whether the unit covers only the
/// node itself (`oversized`) or its whole subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferUnit {
    pub path: String,
    pub oversized: bool,
}

/// Strategy seam for deciding a subtree's transfer units.
pub trait Partitioner {
    fn partition<S: ContentStore + ?Sized>(
        &self,
        store: &S,
        path: &str,
    ) -> StoreResult<Vec<TransferUnit>>;
}

/// Partitions by subtree byte size against a limit, refusing to bundle
/// reference-bearing subtrees into recursive units.
#[derive(Debug, Clone, Copy)]
pub struct SizePartitioner {
    limit: u64,
    policy: ReferencePolicy,
}

impl SizePartitioner {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            policy: ReferencePolicy::default(),
        }
    }

    pub fn with_policy(limit: u64, policy: ReferencePolicy) -> Self {
        Self { limit, policy }
    }

    fn fits(&self, fact: SizeFact) -> bool {
        fact.size < self.limit && !fact.has_reference
    }
}

impl Partitioner for SizePartitioner {
    /// A node whose whole subtree fact is under the limit and reference-free
    /// collapses into a single atomic unit; any other node gets an oversized
    /// unit of its own and each child faces the same decision independently.
    /// An over-limit leaf therefore yields a lone oversized unit, and a
    /// reference-bearing node is oversized no matter how small.
    fn partition<S: ContentStore + ?Sized>(
        &self,
        store: &S,
        path: &str,
    ) -> StoreResult<Vec<TransferUnit>> {
        let index = SubtreeIndex::build(store, path, self.policy)?;
        let mut units = Vec::new();
        let mut stack = vec![index.root().to_string()];
        while let Some(path) = stack.pop() {
            let Some(fact) = index.subtree_fact(&path) else {
                continue;
            };
            if self.fits(fact) {
                units.push(TransferUnit {
                    path,
                    oversized: false,
                });
            } else {
                for child in index.children(&path) {
                    stack.push(child.clone());
                }
                units.push(TransferUnit {
                    path,
                    oversized: true,
                });
            }
        }
        Ok(units)
    }
}

/// Replay ordering: all oversized units before all atomic units, each group
/// ascending by case-insensitive path.
pub fn order_units(units: &mut [TransferUnit]) {
    units.sort_by(|a, b| {
        b.oversized
            .cmp(&a.oversized)
            .then_with(|| paths::ordering_key(&a.path).cmp(&paths::ordering_key(&b.path)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(path: &str, oversized: bool) -> TransferUnit {
        TransferUnit {
            path: path.to_string(),
            oversized,
        }
    }

    #[test]
    fn test_order_units_groups_then_sorts_case_insensitively() {
        let mut units = vec![
            unit("/a/b", false),
            unit("/a/Z", true),
            unit("/a/ab", true),
            unit("/A/a", false),
        ];
        order_units(&mut units);
        assert_eq!(
            units,
            vec![
                unit("/a/ab", true),
                unit("/a/Z", true),
                unit("/A/a", false),
                unit("/a/b", false),
            ]
        );
    }
}
