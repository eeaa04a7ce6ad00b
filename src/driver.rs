//! The tree migration driver.
//!
//! Per workspace: materialize the destination root path, partition the
//! source subtree into transfer units, replay the units in order. The
//! default workspace is handled first; the driver then creates any source
//! workspace missing from the destination and re-runs the same steps for
//! every workspace except the reserved ones. Each invocation is a stateless
//! batch job — re-running after a partial failure is the retry mechanism,
//! safe because every unit copy is idempotent.

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;

use crate::config::MigrationConfig;
use crate::copier::{TransferCopier, UnitOutcome};
use crate::errors::{MigrateError, MigrateResult};
use crate::partition::{Partitioner, SizePartitioner, order_units};
use crate::paths;
use crate::traits::store::{ContentRepository, ContentStore};

/// Workspace handled once, before the fan-out loop.
pub const DEFAULT_WORKSPACE: &str = "default";
/// Infrastructure-only workspace, never migrated as content.
pub const SECURITY_WORKSPACE: &str = "security";

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceReport {
    pub workspace: String,
    pub units: usize,
    pub copied: usize,
    pub skipped: usize,
    pub failed: bool,
}

impl WorkspaceReport {
    fn failed(workspace: &str) -> Self {
        Self {
            workspace: workspace.to_string(),
            units: 0,
            copied: 0,
            skipped: 0,
            failed: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workspaces: Vec<WorkspaceReport>,
}

pub struct Migrator {
    config: MigrationConfig,
}

impl Migrator {
    pub fn new(config: MigrationConfig) -> MigrateResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Migrate the configured subtree across every eligible workspace of the
    /// source repository into the destination repository.
    ///
    /// Failures scoped to one workspace's sessions are logged and the run
    /// proceeds to the next workspace; repository-level failures (workspace
    /// enumeration or creation) abort the run.
    pub fn migrate<SR, DR>(&self, src: &SR, dest: &DR) -> MigrateResult<MigrationReport>
    where
        SR: ContentRepository,
        DR: ContentRepository,
    {
        let started_at = Utc::now();
        let mut workspaces = Vec::new();

        workspaces.push(self.run_workspace(src, dest, DEFAULT_WORKSPACE));

        for workspace in self.destination_workspaces(src, dest)? {
            workspaces.push(self.run_workspace(src, dest, &workspace));
        }

        Ok(MigrationReport {
            started_at,
            finished_at: Utc::now(),
            workspaces,
        })
    }

    /// Migrate the configured subtree between two already-open stores.
    pub fn migrate_workspace<S, D>(&self, src: &S, dest: &D) -> MigrateResult<WorkspaceReport>
    where
        S: ContentStore + ?Sized,
        D: ContentStore + ?Sized,
    {
        if !src.node_exists(&self.config.src_path)? {
            error!(
                "{}: {} does not exist",
                src.workspace_name(),
                self.config.src_path
            );
            return Ok(WorkspaceReport {
                workspace: src.workspace_name().to_string(),
                units: 0,
                copied: 0,
                skipped: 0,
                failed: false,
            });
        }

        let copier = TransferCopier::from_config(&self.config);
        copier.create_path(src, dest, &self.config.dest_path)?;

        let partitioner =
            SizePartitioner::with_policy(self.config.limit, self.config.reference_policy);
        let mut units = partitioner.partition(src, &self.config.src_path)?;
        order_units(&mut units);

        let mut copied = 0;
        let mut skipped = 0;
        for unit in &units {
            let rel = paths::relative_to(&self.config.src_path, &unit.path).ok_or_else(|| {
                MigrateError::UnitOutsideRoot {
                    unit: unit.path.clone(),
                    root: self.config.src_path.clone(),
                }
            })?;
            match copier.copy_unit(
                src,
                dest,
                &self.config.src_path,
                &self.config.dest_path,
                rel,
                !unit.oversized,
            )? {
                UnitOutcome::Copied => copied += 1,
                _ => skipped += 1,
            }
        }

        info!(
            "{}: migrated {} to {} in {} units ({} copied, {} skipped)",
            src.workspace_name(),
            self.config.src_path,
            self.config.dest_path,
            units.len(),
            copied,
            skipped
        );
        Ok(WorkspaceReport {
            workspace: src.workspace_name().to_string(),
            units: units.len(),
            copied,
            skipped,
            failed: false,
        })
    }

    fn run_workspace<SR, DR>(&self, src: &SR, dest: &DR, workspace: &str) -> WorkspaceReport
    where
        SR: ContentRepository,
        DR: ContentRepository,
    {
        let (src_store, dest_store) = match (src.login(workspace), dest.login(workspace)) {
            (Ok(s), Ok(d)) => (s, d),
            (Err(e), _) | (_, Err(e)) => {
                error!("workspace {workspace}: login failed: {e}");
                return WorkspaceReport::failed(workspace);
            }
        };
        match self.migrate_workspace(&src_store, &dest_store) {
            Ok(report) => report,
            Err(e) => {
                error!("workspace {workspace}: migration failed: {e}");
                WorkspaceReport::failed(workspace)
            }
        }
    }

    /// Source workspaces to replay after the default one: every source
    /// workspace is created in the destination when missing, then the two
    /// reserved names are dropped from the replay list.
    fn destination_workspaces<SR, DR>(&self, src: &SR, dest: &DR) -> MigrateResult<Vec<String>>
    where
        SR: ContentRepository,
        DR: ContentRepository,
    {
        let dest_existing = dest.workspaces()?;
        let mut names = Vec::new();
        for workspace in src.workspaces()? {
            if !dest_existing.contains(&workspace) {
                dest.create_workspace(&workspace)?;
            }
            names.push(workspace);
        }
        names.retain(|w| w != DEFAULT_WORKSPACE && w != SECURITY_WORKSPACE);
        Ok(names)
    }
}
