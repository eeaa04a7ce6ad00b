//! Command-line front end over the migration driver.
//!
//! Copies a subtree between two sled-backed repositories, or — in query
//! mode — runs an inspection query against the source and prints the
//! matches, ignoring all destination options.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;

use hierabase_migrate::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "migrate", version, about = "Copy a content subtree between store instances")]
struct Args {
    /// Source repository directory
    #[arg(long)]
    src: PathBuf,

    /// Destination repository directory (required unless --query is given)
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Path of the source node to copy from
    #[arg(long, default_value = "/")]
    src_path: String,

    /// Path of the destination node to copy to
    #[arg(long, default_value = "/")]
    dest_path: String,

    /// Transfer unit size budget in bytes
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    limit: u64,

    /// Do not type created ancestor nodes after their source counterparts
    #[arg(long)]
    no_node_type: bool,

    /// Skip units whose destination target already exists instead of
    /// replacing them
    #[arg(long)]
    skip_existing: bool,

    /// Run a query against the source and print matches instead of migrating
    #[arg(long)]
    query: Option<String>,

    /// Query language: path-glob or property-equals
    #[arg(long, default_value = "path-glob")]
    query_language: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let src = SledRepository::open(&args.src)
        .with_context(|| format!("failed to open source repository {}", args.src.display()))?;

    if let Some(query) = &args.query {
        let language: QueryLanguage = args
            .query_language
            .parse()
            .map_err(|_| anyhow::anyhow!("unknown query language: {}", args.query_language))?;
        let store = src.login(DEFAULT_WORKSPACE)?;
        for m in store.run_query(query, language)? {
            if m.values.is_empty() {
                println!("{}", m.path);
            } else {
                println!("{}|{}", m.path, m.values.join("|"));
            }
        }
        return Ok(());
    }

    let Some(dest_dir) = &args.dest else {
        bail!("--dest is required unless --query is given");
    };
    let dest = SledRepository::open(dest_dir)
        .with_context(|| format!("failed to open destination repository {}", dest_dir.display()))?;

    let config = MigrationConfig::builder()
        .src_path(args.src_path)
        .dest_path(args.dest_path)
        .limit(args.limit)
        .add_node_type(!args.no_node_type)
        .collision(if args.skip_existing {
            CollisionPolicy::SkipExisting
        } else {
            CollisionPolicy::RemoveThenImport
        })
        .build();

    let report = Migrator::new(config)?.migrate(&src, &dest)?;
    for ws in &report.workspaces {
        if ws.failed {
            println!("{}: FAILED", ws.workspace);
        } else {
            println!(
                "{}: {} units, {} copied, {} skipped",
                ws.workspace, ws.units, ws.copied, ws.skipped
            );
        }
    }
    Ok(())
}
