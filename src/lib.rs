//! # Hierabase Migrate
//!
//! Size- and reference-aware subtree migration between hierarchical,
//! property-bearing content stores.
//!
//! The crate answers three questions about moving an arbitrarily large,
//! arbitrarily deep content tree from one store instance to another:
//!
//! - **What to copy**: a bottom-up size/reference aggregation over the
//!   source subtree ([`aggregate`]).
//! - **In what granularity**: a covering partition into transfer units that
//!   never exceed a byte budget and never bundle reference-bearing nodes
//!   into a recursive copy ([`partition`]).
//! - **In what order, and safely**: an ordered, per-unit export/import
//!   replay that materializes missing ancestors, resolves collisions, and
//!   can be re-run idempotently after an interruption ([`copier`],
//!   [`driver`]).
//!
//! Stores are external collaborators behind the [`traits::store`] seam; two
//! reference backends ship in [`databases`] (in-memory, and sled behind the
//! default `sled` feature).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hierabase_migrate::prelude::*;
//!
//! let src = SledRepository::open("/data/src")?;
//! let dest = SledRepository::open("/data/dest")?;
//!
//! let config = MigrationConfig::builder()
//!     .src_path("/content")
//!     .dest_path("/content")
//!     .limit(10 * 1024 * 1024)
//!     .build();
//!
//! let report = Migrator::new(config)?.migrate(&src, &dest)?;
//! for ws in &report.workspaces {
//!     println!("{}: {}/{} units copied", ws.workspace, ws.copied, ws.units);
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod copier;
pub mod databases;
pub mod driver;
pub mod errors;
pub mod node;
pub mod partition;
pub mod paths;
pub mod prelude;
pub mod query;
pub mod traits;
