//! In-memory content store backend.
//!
//! One `BTreeMap` of path -> record per workspace behind a shared `RwLock`.
//! Writes are immediate, so `commit` is a durability no-op — the store's own
//! commit granularity, which is all the copy protocol asks for. Useful as the
//! test workhorse and as the reference semantics for other backends.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::driver::DEFAULT_WORKSPACE;
use crate::errors::{StoreError, StoreResult};
use crate::node::{ContentNode, NodeData};
use crate::paths;
use crate::traits::store::{ContentRepository, ContentStore};

use super::NodeRecord;

type NodeMap = BTreeMap<String, NodeRecord>;
type Workspaces = HashMap<String, NodeMap>;

/// An in-memory store installation, created with a `default` workspace.
#[derive(Clone)]
pub struct MemoryRepository {
    inner: Arc<RwLock<Workspaces>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        let mut workspaces = Workspaces::new();
        workspaces.insert(DEFAULT_WORKSPACE.to_string(), empty_workspace());
        Self {
            inner: Arc::new(RwLock::new(workspaces)),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRepository for MemoryRepository {
    type Store = MemoryStore;

    fn login(&self, workspace: &str) -> StoreResult<MemoryStore> {
        let guard = read_guard(&self.inner)?;
        if !guard.contains_key(workspace) {
            return Err(StoreError::UnknownWorkspace(workspace.to_string()));
        }
        Ok(MemoryStore {
            inner: Arc::clone(&self.inner),
            workspace: workspace.to_string(),
        })
    }

    fn workspaces(&self) -> StoreResult<Vec<String>> {
        let guard = read_guard(&self.inner)?;
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn create_workspace(&self, name: &str) -> StoreResult<()> {
        let mut guard = write_guard(&self.inner)?;
        if guard.contains_key(name) {
            return Err(StoreError::ConstraintViolation {
                path: paths::ROOT.to_string(),
                reason: format!("workspace {name} already exists"),
            });
        }
        guard.insert(name.to_string(), empty_workspace());
        Ok(())
    }
}

/// One workspace of a [`MemoryRepository`].
pub struct MemoryStore {
    inner: Arc<RwLock<Workspaces>>,
    workspace: String,
}

impl MemoryStore {
    fn with_nodes<R>(&self, f: impl FnOnce(&NodeMap) -> StoreResult<R>) -> StoreResult<R> {
        let guard = read_guard(&self.inner)?;
        let nodes = guard
            .get(&self.workspace)
            .ok_or_else(|| StoreError::UnknownWorkspace(self.workspace.clone()))?;
        f(nodes)
    }

    fn with_nodes_mut<R>(
        &self,
        f: impl FnOnce(&mut NodeMap) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let mut guard = write_guard(&self.inner)?;
        let nodes = guard
            .get_mut(&self.workspace)
            .ok_or_else(|| StoreError::UnknownWorkspace(self.workspace.clone()))?;
        f(nodes)
    }
}

impl ContentStore for MemoryStore {
    fn workspace_name(&self) -> &str {
        &self.workspace
    }

    fn node_exists(&self, path: &str) -> StoreResult<bool> {
        self.with_nodes(|nodes| Ok(nodes.contains_key(path)))
    }

    fn item_exists(&self, path: &str) -> StoreResult<bool> {
        self.with_nodes(|nodes| {
            if nodes.contains_key(path) {
                return Ok(true);
            }
            Ok(property_parent(nodes, path).is_some())
        })
    }

    fn get_node(&self, path: &str) -> StoreResult<ContentNode> {
        self.with_nodes(|nodes| {
            let record = nodes
                .get(path)
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            Ok(record.to_node(paths::leaf(path).to_string(), child_names(nodes, path)))
        })
    }

    fn create_child(&self, parent: &str, name: &str, type_name: Option<&str>) -> StoreResult<()> {
        self.with_nodes_mut(|nodes| {
            if !nodes.contains_key(parent) {
                return Err(StoreError::NotFound(parent.to_string()));
            }
            let path = paths::join(parent, name);
            if nodes.contains_key(&path) {
                return Err(StoreError::ConstraintViolation {
                    path,
                    reason: "node already exists".to_string(),
                });
            }
            nodes.insert(path, NodeRecord::with_type(type_name));
            Ok(())
        })
    }

    fn remove_item(&self, path: &str) -> StoreResult<()> {
        self.with_nodes_mut(|nodes| {
            if paths::is_root(path) {
                return Err(StoreError::ConstraintViolation {
                    path: path.to_string(),
                    reason: "cannot remove the root node".to_string(),
                });
            }
            if nodes.contains_key(path) {
                let prefix = subtree_prefix(path);
                let doomed: Vec<String> = nodes
                    .range(prefix.clone()..)
                    .take_while(|(k, _)| k.starts_with(&prefix))
                    .map(|(k, _)| k.clone())
                    .collect();
                for key in doomed {
                    nodes.remove(&key);
                }
                nodes.remove(path);
                return Ok(());
            }
            if let Some(parent) = property_parent(nodes, path) {
                let name = paths::leaf(path).to_string();
                if let Some(record) = nodes.get_mut(&parent) {
                    record.properties.retain(|p| p.name != name);
                }
                return Ok(());
            }
            Err(StoreError::NotFound(path.to_string()))
        })
    }

    fn write_node(&self, path: &str, data: &NodeData) -> StoreResult<()> {
        self.with_nodes_mut(|nodes| {
            if !paths::is_root(path) {
                let parent = paths::parent(path)
                    .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
                if !nodes.contains_key(parent) {
                    return Err(StoreError::NotFound(parent.to_string()));
                }
            }
            nodes.insert(path.to_string(), NodeRecord::from_data(data));
            Ok(())
        })
    }

    fn find_node_by_id(&self, node_id: &str) -> StoreResult<Option<String>> {
        self.with_nodes(|nodes| {
            Ok(nodes
                .iter()
                .find(|(_, record)| record.node_id.as_deref() == Some(node_id))
                .map(|(path, _)| path.clone()))
        })
    }

    fn commit(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn empty_workspace() -> NodeMap {
    let mut nodes = NodeMap::new();
    nodes.insert(paths::ROOT.to_string(), NodeRecord::default());
    nodes
}

fn subtree_prefix(path: &str) -> String {
    if paths::is_root(path) {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

fn child_names(nodes: &NodeMap, path: &str) -> Vec<String> {
    let prefix = subtree_prefix(path);
    nodes
        .range(prefix.clone()..)
        .take_while(|(k, _)| k.starts_with(&prefix))
        .filter_map(|(k, _)| {
            let rest = &k[prefix.len()..];
            (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
        })
        .collect()
}

/// If the final segment of `path` names a property of an existing parent
/// node, return the parent path.
fn property_parent(nodes: &NodeMap, path: &str) -> Option<String> {
    let parent = paths::parent(path)?;
    let name = paths::leaf(path);
    let record = nodes.get(parent)?;
    record
        .properties
        .iter()
        .any(|p| p.name == name)
        .then(|| parent.to_string())
}

fn read_guard(
    inner: &Arc<RwLock<Workspaces>>,
) -> StoreResult<RwLockReadGuard<'_, Workspaces>> {
    inner
        .read()
        .map_err(|_| StoreError::Backend("workspace lock poisoned".to_string()))
}

fn write_guard(
    inner: &Arc<RwLock<Workspaces>>,
) -> StoreResult<RwLockWriteGuard<'_, Workspaces>> {
    inner
        .write()
        .map_err(|_| StoreError::Backend("workspace lock poisoned".to_string()))
}
