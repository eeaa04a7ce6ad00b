//! Migration configuration.
//!
//! One immutable [`MigrationConfig`] is built up front via the builder and
//! passed by reference into the driver — there is no process-wide mutable
//! option state.

use typed_builder::TypedBuilder;

use crate::aggregate::ReferencePolicy;
use crate::errors::{MigrateError, MigrateResult};
use crate::traits::store::CollisionPolicy;

/// Configuration for one migration run.
///
/// # Examples
///
/// ```rust,ignore
/// use hierabase_migrate::config::MigrationConfig;
///
/// let config = MigrationConfig::builder()
///     .src_path("/content")
///     .dest_path("/content")
///     .limit(10 * 1024 * 1024)
///     .build();
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct MigrationConfig {
    /// Absolute path of the subtree to copy from, per workspace.
    #[builder(default = String::from("/"), setter(into))]
    pub src_path: String,

    /// Absolute path the source subtree maps onto in the destination.
    #[builder(default = String::from("/"), setter(into))]
    pub dest_path: String,

    /// Transfer unit size budget in bytes. Must be positive.
    pub limit: u64,

    /// Give created ancestor nodes the type of the corresponding source
    /// node, when one exists.
    #[builder(default = true)]
    pub add_node_type: bool,

    /// Reference-detection rule used while aggregating subtree facts.
    #[builder(default)]
    pub reference_policy: ReferencePolicy,

    /// How to resolve an existing node at a unit's destination target.
    #[builder(default)]
    pub collision: CollisionPolicy,
}

impl MigrationConfig {
    pub fn validate(&self) -> MigrateResult<()> {
        if self.limit == 0 {
            return Err(MigrateError::InvalidConfig(
                "limit must be a positive number of bytes".to_string(),
            ));
        }
        if !self.src_path.starts_with('/') {
            return Err(MigrateError::InvalidConfig(format!(
                "src_path must be absolute: {}",
                self.src_path
            )));
        }
        if !self.dest_path.starts_with('/') {
            return Err(MigrateError::InvalidConfig(format!(
                "dest_path must be absolute: {}",
                self.dest_path
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = MigrationConfig::builder().limit(1024).build();
        assert_eq!(config.src_path, "/");
        assert_eq!(config.dest_path, "/");
        assert!(config.add_node_type);
        assert_eq!(config.reference_policy, ReferencePolicy::AnyValue);
        assert_eq!(config.collision, CollisionPolicy::RemoveThenImport);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = MigrationConfig::builder().limit(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_paths_rejected() {
        let config = MigrationConfig::builder()
            .src_path("content")
            .limit(1024)
            .build();
        assert!(config.validate().is_err());
    }
}
