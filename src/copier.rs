//! Copies one transfer unit from a source store to a destination store.
//!
//! A unit copy is an export/import round-trip: serialize the node (recursive
//! for atomic units, node-only for oversized ones), make sure the destination
//! ancestors exist, resolve collisions, import, commit. A missing source node
//! and an import rejected by the destination are logged and reported as
//! skipped — the protocol moves on to the next unit.

use log::{error, info, warn};

use crate::config::MigrationConfig;
use crate::errors::{StoreError, StoreResult};
use crate::paths;
use crate::traits::store::{CollisionPolicy, ContentStore, ImportIdBehavior};

/// What became of one unit copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Copied,
    /// Source node was absent.
    SkippedMissing,
    /// Destination target existed and the policy is [`CollisionPolicy::SkipExisting`].
    SkippedExisting,
    /// Destination rejected the import (not-found or constraint violation).
    SkippedRejected,
}

pub struct TransferCopier {
    add_node_type: bool,
    collision: CollisionPolicy,
}

impl TransferCopier {
    pub fn new(add_node_type: bool, collision: CollisionPolicy) -> Self {
        Self {
            add_node_type,
            collision,
        }
    }

    pub fn from_config(config: &MigrationConfig) -> Self {
        Self::new(config.add_node_type, config.collision)
    }

    /// Copy the unit at `src_root + rel` into `dest_root + rel`.
    ///
    /// The final destination segment is re-derived from the source node's own
    /// name, so a relative path denoting an ancestor chain distinct from the
    /// leaf still lands on the right node. For the root unit (`rel` empty)
    /// the payload lands at `dest_root` itself and no collision removal
    /// occurs; collision handling applies to relative copies only.
    pub fn copy_unit<S, D>(
        &self,
        src: &S,
        dest: &D,
        src_root: &str,
        dest_root: &str,
        rel: &str,
        recursive: bool,
    ) -> StoreResult<UnitOutcome>
    where
        S: ContentStore + ?Sized,
        D: ContentStore + ?Sized,
    {
        let src_path = paths::join(src_root, rel);
        if !src.node_exists(&src_path)? {
            error!(
                "{}: {} does not exist",
                src.workspace_name(),
                src_path
            );
            return Ok(UnitOutcome::SkippedMissing);
        }

        let payload = src.export_subtree(&src_path, recursive)?;
        let target = if rel.is_empty() {
            dest_root.to_string()
        } else {
            let node_name = src.get_node(&src_path)?.name;
            let rel_parent = paths::relative_parent(rel);
            self.create_ancestors(src, dest, src_root, dest_root, rel_parent)?;
            let target = paths::join(&paths::join(dest_root, rel_parent), &node_name);
            if dest.item_exists(&target)? {
                match self.collision {
                    // remove the existing item to avoid duplicate siblings
                    CollisionPolicy::RemoveThenImport => dest.remove_item(&target)?,
                    CollisionPolicy::SkipExisting => {
                        warn!(
                            "{}: {} already exists in destination, skipping",
                            src.workspace_name(),
                            target
                        );
                        return Ok(UnitOutcome::SkippedExisting);
                    }
                }
            }
            target
        };

        match dest.import_payload(&target, &payload, ImportIdBehavior::ReplaceExisting) {
            Ok(()) => {
                dest.commit()?;
                info!(
                    "{}: node copied from {} to {} ({})",
                    src.workspace_name(),
                    src_path,
                    target,
                    if recursive { "recursive" } else { "node only" }
                );
                Ok(UnitOutcome::Copied)
            }
            Err(StoreError::NotFound(path)) => {
                warn!(
                    "{}: import of {} skipped, destination item not found: {}",
                    src.workspace_name(),
                    src_path,
                    path
                );
                Ok(UnitOutcome::SkippedRejected)
            }
            Err(StoreError::ConstraintViolation { path, reason }) => {
                warn!(
                    "{}: import of {} rejected at {}: {}",
                    src.workspace_name(),
                    src_path,
                    path,
                    reason
                );
                Ok(UnitOutcome::SkippedRejected)
            }
            Err(other) => Err(other),
        }
    }

    /// Materialize every segment of the absolute `path` in the destination,
    /// walking from the workspace root. Each created segment is typed after
    /// the source node at the same absolute path when `add_node_type` is set
    /// and such a node exists. Re-running over existing nodes is a no-op.
    pub fn create_path<S, D>(&self, src: &S, dest: &D, path: &str) -> StoreResult<()>
    where
        S: ContentStore + ?Sized,
        D: ContentStore + ?Sized,
    {
        if dest.node_exists(path)? {
            return Ok(());
        }
        let mut parent = paths::ROOT.to_string();
        for segment in paths::segments(path) {
            let next = paths::join(&parent, segment);
            if !dest.node_exists(&next)? {
                let type_name = self.source_type(src, &next)?;
                dest.create_child(&parent, segment, type_name.as_deref())?;
            }
            parent = next;
        }
        dest.commit()
    }

    /// Materialize the ancestor chain `dest_root + rel_parent`, typing each
    /// created segment after the corresponding source node under `src_root`.
    fn create_ancestors<S, D>(
        &self,
        src: &S,
        dest: &D,
        src_root: &str,
        dest_root: &str,
        rel_parent: &str,
    ) -> StoreResult<()>
    where
        S: ContentStore + ?Sized,
        D: ContentStore + ?Sized,
    {
        if rel_parent.is_empty() {
            return Ok(());
        }
        if dest.node_exists(&paths::join(dest_root, rel_parent))? {
            return Ok(());
        }
        let mut src_cumulative = src_root.to_string();
        let mut parent = dest_root.to_string();
        for segment in paths::segments(rel_parent) {
            src_cumulative = paths::join(&src_cumulative, segment);
            let next = paths::join(&parent, segment);
            if !dest.node_exists(&next)? {
                let type_name = self.source_type(src, &src_cumulative)?;
                dest.create_child(&parent, segment, type_name.as_deref())?;
            }
            parent = next;
        }
        dest.commit()
    }

    fn source_type<S: ContentStore + ?Sized>(
        &self,
        src: &S,
        path: &str,
    ) -> StoreResult<Option<String>> {
        if self.add_node_type && src.node_exists(path)? {
            Ok(src.get_node(path)?.type_name)
        } else {
            Ok(None)
        }
    }
}
