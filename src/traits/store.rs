//! The store seam: traits every content store collaborator must expose.
//!
//! The migration core never touches a backend directly — it works against
//! [`ContentStore`] (one workspace's node tree) and [`ContentRepository`]
//! (workspace enumeration and login). Backends implement the required
//! primitives; the export/import round-trip and the query helper are provided
//! methods on top, so every backend shares one wire format.

use std::collections::BTreeMap;

use crate::errors::{StoreError, StoreResult};
use crate::node::{self, ContentNode, NodeData};
use crate::paths;
use crate::query::{self, QueryLanguage, QueryMatch};

/// How an import treats a pre-existing node that carries one of the imported
/// stable identifiers at a different path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportIdBehavior {
    /// Remove the conflicting pre-existing node, then import.
    #[default]
    ReplaceExisting,
    /// Reject the import with a constraint violation.
    Throw,
}

/// How the copier resolves an already-existing node at a unit's destination
/// target before importing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Remove the existing node, then import. Re-running a migration
    /// converges on the source state.
    #[default]
    RemoveThenImport,
    /// Leave the existing node untouched and skip the unit.
    SkipExisting,
}

/// One workspace of a hierarchical, property-bearing content store.
///
/// Required methods are the backend primitives; `export_subtree`,
/// `import_payload` and `run_query` are implemented generically on top of
/// them. All paths are absolute, `/`-separated, with `/` the workspace root.
pub trait ContentStore {
    /// Name of the workspace this store is bound to.
    fn workspace_name(&self) -> &str;

    fn node_exists(&self, path: &str) -> StoreResult<bool>;

    /// Whether a node *or a property* exists at `path` (the final segment may
    /// name a property of the parent node).
    fn item_exists(&self, path: &str) -> StoreResult<bool>;

    /// Snapshot of the node at `path`: own properties plus child names.
    fn get_node(&self, path: &str) -> StoreResult<ContentNode>;

    /// Create a new, property-less child under an existing parent. Fails with
    /// a constraint violation if the name is already taken.
    fn create_child(&self, parent: &str, name: &str, type_name: Option<&str>) -> StoreResult<()>;

    /// Remove the node (and its whole subtree) or property at `path`.
    fn remove_item(&self, path: &str) -> StoreResult<()>;

    /// Create or replace the single node record at `path` from `data`'s type,
    /// identifier and properties. `data.children` is ignored; the node's name
    /// derives from the path. The parent must already exist.
    fn write_node(&self, path: &str, data: &NodeData) -> StoreResult<()>;

    /// Path of the node currently holding `node_id`, if any.
    fn find_node_by_id(&self, node_id: &str) -> StoreResult<Option<String>>;

    /// Persist pending changes at the store's own commit granularity.
    fn commit(&self) -> StoreResult<()>;

    /// Serialize the node at `path` — the whole subtree when `recursive`,
    /// the node's own properties only otherwise — into a payload.
    fn export_subtree(&self, path: &str, recursive: bool) -> StoreResult<Vec<u8>> {
        let data = collect_subtree(self, path, recursive)?;
        Ok(node::encode_payload(&data)?)
    }

    /// Materialize a payload at `path`: the payload root's type, identifier
    /// and properties are written to the node at `path` (created if missing,
    /// named after the path leaf), descendants are written beneath it, and
    /// same-named existing children are replaced wholesale. Under
    /// [`ImportIdBehavior::ReplaceExisting`] any pre-existing node elsewhere
    /// in the workspace holding an imported identifier is removed first.
    fn import_payload(
        &self,
        path: &str,
        payload: &[u8],
        behavior: ImportIdBehavior,
    ) -> StoreResult<()> {
        let data = node::decode_payload(payload)?;
        import_tree(self, path, &data, behavior)
    }

    /// Execute an ad-hoc inspection query over the whole workspace. Not used
    /// by the migration core.
    fn run_query(&self, text: &str, language: QueryLanguage) -> StoreResult<Vec<QueryMatch>> {
        query::execute(self, text, language)
    }
}

/// A content store installation: a set of independently named workspaces.
pub trait ContentRepository {
    type Store: ContentStore;

    /// Open a store bound to the named workspace.
    fn login(&self, workspace: &str) -> StoreResult<Self::Store>;

    fn workspaces(&self) -> StoreResult<Vec<String>>;

    /// Create a new, empty workspace. Creating an existing workspace is a
    /// constraint violation.
    fn create_workspace(&self, name: &str) -> StoreResult<()>;
}

/// Build the payload tree for `export_subtree` with an explicit work stack.
fn collect_subtree<S: ContentStore + ?Sized>(
    store: &S,
    root: &str,
    recursive: bool,
) -> StoreResult<NodeData> {
    // pre-order collection into an arena, children pushed in reverse so the
    // stack pops them in sibling order
    let mut order: Vec<(String, ContentNode)> = Vec::new();
    let mut stack = vec![root.to_string()];
    while let Some(path) = stack.pop() {
        let snapshot = store.get_node(&path)?;
        if recursive {
            for child in snapshot.children.iter().rev() {
                stack.push(paths::join(&path, child));
            }
        }
        order.push((path, snapshot));
    }

    // assemble bottom-up: reverse pre-order guarantees children are built
    // before their parent
    let mut built: BTreeMap<String, NodeData> = BTreeMap::new();
    while let Some((path, snapshot)) = order.pop() {
        let ContentNode {
            name,
            type_name,
            node_id,
            properties,
            children,
        } = snapshot;
        let mut child_data = Vec::new();
        if recursive {
            for child in &children {
                if let Some(data) = built.remove(&paths::join(&path, child)) {
                    child_data.push(data);
                }
            }
        }
        built.insert(
            path,
            NodeData {
                name,
                type_name,
                node_id,
                properties,
                children: child_data,
            },
        );
    }
    built
        .remove(root)
        .ok_or_else(|| StoreError::NotFound(root.to_string()))
}

/// Write a decoded payload tree into the store for `import_payload`.
fn import_tree<S: ContentStore + ?Sized>(
    store: &S,
    root: &str,
    data: &NodeData,
    behavior: ImportIdBehavior,
) -> StoreResult<()> {
    let mut stack: Vec<(String, &NodeData)> = vec![(root.to_string(), data)];
    while let Some((target, node)) = stack.pop() {
        if let Some(id) = &node.node_id {
            if let Some(existing) = store.find_node_by_id(id)? {
                if existing != target {
                    match behavior {
                        ImportIdBehavior::ReplaceExisting => store.remove_item(&existing)?,
                        ImportIdBehavior::Throw => {
                            return Err(StoreError::ConstraintViolation {
                                path: target,
                                reason: format!("identifier {id} already in use at {existing}"),
                            });
                        }
                    }
                }
            }
        }
        // same-named children are replaced wholesale
        for child in &node.children {
            let child_path = paths::join(&target, &child.name);
            if store.node_exists(&child_path)? {
                store.remove_item(&child_path)?;
            }
        }
        store.write_node(&target, node)?;
        for child in node.children.iter().rev() {
            stack.push((paths::join(&target, &child.name), child));
        }
    }
    Ok(())
}
