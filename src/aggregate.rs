//! Size/reference aggregation over a subtree.
//!
//! A [`SizeFact`] records how many property bytes a node (or subtree)
//! carries and whether any property in it is a structural reference to
//! another node. Facts compose with [`SizeFact::combine`]; a subtree fact is
//! the node's own fact combined with the facts of all descendants. Property
//! bytes are the UTF-8 lengths of string-rendered values — path and name
//! overhead never counts.
//!
//! [`SubtreeIndex`] materializes the facts for one subtree in a single
//! bottom-up pass, using an explicit work stack so arbitrarily deep trees
//! cannot exhaust the call stack.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::StoreResult;
use crate::node::{ContentNode, Property};
use crate::paths;
use crate::traits::store::ContentStore;

/// Which properties count as references when aggregating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferencePolicy {
    /// A reference-typed property is flagged regardless of cardinality.
    /// The conservative default: a missed reference risks importing a
    /// dangling link, over-flagging only costs unit granularity.
    #[default]
    AnyValue,
    /// Only single-valued reference properties are flagged.
    SingleValuedOnly,
    /// References are never flagged; partitioning degrades to pure
    /// size-budget splitting.
    Ignore,
}

impl ReferencePolicy {
    pub fn flags(&self, property: &Property) -> bool {
        match self {
            ReferencePolicy::AnyValue => property.ty.is_reference(),
            ReferencePolicy::SingleValuedOnly => {
                property.ty.is_reference() && !property.values.is_multiple()
            }
            ReferencePolicy::Ignore => false,
        }
    }
}

/// Aggregate byte size and reference flag for a node or subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeFact {
    pub size: u64,
    pub has_reference: bool,
}

impl SizeFact {
    pub const EMPTY: SizeFact = SizeFact {
        size: 0,
        has_reference: false,
    };

    pub fn combine(self, other: SizeFact) -> SizeFact {
        SizeFact {
            size: self.size + other.size,
            has_reference: self.has_reference || other.has_reference,
        }
    }

    pub fn of_property(property: &Property, policy: ReferencePolicy) -> SizeFact {
        SizeFact {
            size: property.byte_size(),
            has_reference: policy.flags(property),
        }
    }

    /// Fact over a node's own properties only.
    pub fn of_node(node: &ContentNode, policy: ReferencePolicy) -> SizeFact {
        node.properties
            .iter()
            .fold(SizeFact::EMPTY, |acc, p| {
                acc.combine(SizeFact::of_property(p, policy))
            })
    }
}

/// Path-indexed arena of per-node and per-subtree facts for one subtree.
pub struct SubtreeIndex {
    root: String,
    own: BTreeMap<String, SizeFact>,
    subtree: BTreeMap<String, SizeFact>,
    children: BTreeMap<String, Vec<String>>,
}

impl SubtreeIndex {
    /// Walk the subtree rooted at `root` and compute all facts bottom-up.
    pub fn build<S: ContentStore + ?Sized>(
        store: &S,
        root: &str,
        policy: ReferencePolicy,
    ) -> StoreResult<SubtreeIndex> {
        let mut index = SubtreeIndex {
            root: root.to_string(),
            own: BTreeMap::new(),
            subtree: BTreeMap::new(),
            children: BTreeMap::new(),
        };

        // pre-order collection
        let mut order: Vec<String> = Vec::new();
        let mut stack = vec![root.to_string()];
        while let Some(path) = stack.pop() {
            let node = store.get_node(&path)?;
            index.own.insert(path.clone(), SizeFact::of_node(&node, policy));
            let child_paths: Vec<String> = node
                .children
                .iter()
                .map(|name| paths::join(&path, name))
                .collect();
            for child in child_paths.iter().rev() {
                stack.push(child.clone());
            }
            index.children.insert(path.clone(), child_paths);
            order.push(path);
        }

        // reverse pre-order visits every child before its parent
        for path in order.iter().rev() {
            let mut fact = index.own.get(path).copied().unwrap_or(SizeFact::EMPTY);
            if let Some(children) = index.children.get(path) {
                for child in children {
                    if let Some(child_fact) = index.subtree.get(child) {
                        fact = fact.combine(*child_fact);
                    }
                }
            }
            index.subtree.insert(path.clone(), fact);
        }
        Ok(index)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Fact over the node's own properties.
    pub fn own_fact(&self, path: &str) -> Option<SizeFact> {
        self.own.get(path).copied()
    }

    /// Fact over the node and all its descendants.
    pub fn subtree_fact(&self, path: &str) -> Option<SizeFact> {
        self.subtree.get(path).copied()
    }

    /// Child paths in sibling order; empty for leaves and unknown paths.
    pub fn children(&self, path: &str) -> &[String] {
        self.children.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every indexed path, in path order.
    pub fn node_paths(&self) -> impl Iterator<Item = &str> {
        self.own.keys().map(String::as_str)
    }
}
