//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use hierabase_migrate::prelude::*;
//! ```

pub use crate::aggregate::{ReferencePolicy, SizeFact, SubtreeIndex};
pub use crate::config::MigrationConfig;
pub use crate::copier::{TransferCopier, UnitOutcome};
pub use crate::databases::memory_store::{MemoryRepository, MemoryStore};
#[cfg(feature = "sled")]
pub use crate::databases::sled_store::{SledRepository, SledStore};
pub use crate::driver::{
    DEFAULT_WORKSPACE, MigrationReport, Migrator, SECURITY_WORKSPACE, WorkspaceReport,
};
pub use crate::errors::{CodecError, MigrateError, MigrateResult, StoreError, StoreResult};
pub use crate::node::{ContentNode, NodeData, Property, PropertyType, PropertyValues};
pub use crate::partition::{Partitioner, SizePartitioner, TransferUnit, order_units};
pub use crate::query::{QueryLanguage, QueryMatch};
pub use crate::traits::store::{
    CollisionPolicy, ContentRepository, ContentStore, ImportIdBehavior,
};
