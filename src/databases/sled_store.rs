//! Sled-backed content store backend.
//!
//! One sled tree per workspace, holding bincode-encoded node records keyed
//! by absolute path. Children and subtrees come out of `scan_prefix`, and
//! `commit` maps to a database flush.

use std::path::Path;

use crate::driver::DEFAULT_WORKSPACE;
use crate::errors::{StoreError, StoreResult};
use crate::node::{ContentNode, NodeData};
use crate::paths;
use crate::traits::store::{ContentRepository, ContentStore};

use super::{NodeRecord, decode_record, encode_record};

const WORKSPACE_TREE_PREFIX: &str = "ws:";

/// A sled-backed store installation, opened (or created) with a `default`
/// workspace.
pub struct SledRepository {
    db: sled::Db,
}

impl SledRepository {
    /// Open a repository at the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        let repo = Self { db };
        repo.ensure_workspace(DEFAULT_WORKSPACE)?;
        Ok(repo)
    }

    /// Open a temporary repository (useful for testing).
    pub fn temp() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let repo = Self { db };
        repo.ensure_workspace(DEFAULT_WORKSPACE)?;
        Ok(repo)
    }

    fn tree(&self, workspace: &str) -> StoreResult<sled::Tree> {
        Ok(self
            .db
            .open_tree(format!("{WORKSPACE_TREE_PREFIX}{workspace}"))?)
    }

    fn workspace_exists(&self, workspace: &str) -> bool {
        let name = format!("{WORKSPACE_TREE_PREFIX}{workspace}");
        self.db
            .tree_names()
            .iter()
            .any(|n| n.as_ref() == name.as_bytes())
    }

    fn ensure_workspace(&self, workspace: &str) -> StoreResult<()> {
        let tree = self.tree(workspace)?;
        if tree.get(paths::ROOT.as_bytes())?.is_none() {
            tree.insert(
                paths::ROOT.as_bytes(),
                encode_record(&NodeRecord::default())?,
            )?;
        }
        Ok(())
    }
}

impl ContentRepository for SledRepository {
    type Store = SledStore;

    fn login(&self, workspace: &str) -> StoreResult<SledStore> {
        if !self.workspace_exists(workspace) {
            return Err(StoreError::UnknownWorkspace(workspace.to_string()));
        }
        Ok(SledStore {
            db: self.db.clone(),
            tree: self.tree(workspace)?,
            workspace: workspace.to_string(),
        })
    }

    fn workspaces(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self
            .db
            .tree_names()
            .iter()
            .filter_map(|n| {
                std::str::from_utf8(n.as_ref())
                    .ok()
                    .and_then(|s| s.strip_prefix(WORKSPACE_TREE_PREFIX))
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        Ok(names)
    }

    fn create_workspace(&self, name: &str) -> StoreResult<()> {
        if self.workspace_exists(name) {
            return Err(StoreError::ConstraintViolation {
                path: paths::ROOT.to_string(),
                reason: format!("workspace {name} already exists"),
            });
        }
        self.ensure_workspace(name)
    }
}

/// One workspace of a [`SledRepository`].
pub struct SledStore {
    db: sled::Db,
    tree: sled::Tree,
    workspace: String,
}

impl SledStore {
    fn record(&self, path: &str) -> StoreResult<Option<NodeRecord>> {
        match self.tree.get(path.as_bytes())? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    fn child_names(&self, path: &str) -> StoreResult<Vec<String>> {
        let prefix = subtree_prefix(path);
        let mut names = Vec::new();
        for entry in self.tree.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            let key = std::str::from_utf8(key.as_ref())
                .map_err(|e| StoreError::Backend(format!("non-utf8 path key: {e}")))?;
            let rest = &key[prefix.len()..];
            if !rest.is_empty() && !rest.contains('/') {
                names.push(rest.to_string());
            }
        }
        Ok(names)
    }

    /// If the final segment of `path` names a property of an existing parent
    /// node, return the parent path.
    fn property_parent(&self, path: &str) -> StoreResult<Option<String>> {
        let Some(parent) = paths::parent(path) else {
            return Ok(None);
        };
        let name = paths::leaf(path);
        match self.record(parent)? {
            Some(record) if record.properties.iter().any(|p| p.name == name) => {
                Ok(Some(parent.to_string()))
            }
            _ => Ok(None),
        }
    }
}

impl ContentStore for SledStore {
    fn workspace_name(&self) -> &str {
        &self.workspace
    }

    fn node_exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.tree.contains_key(path.as_bytes())?)
    }

    fn item_exists(&self, path: &str) -> StoreResult<bool> {
        if self.node_exists(path)? {
            return Ok(true);
        }
        Ok(self.property_parent(path)?.is_some())
    }

    fn get_node(&self, path: &str) -> StoreResult<ContentNode> {
        let record = self
            .record(path)?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(record.to_node(paths::leaf(path).to_string(), self.child_names(path)?))
    }

    fn create_child(&self, parent: &str, name: &str, type_name: Option<&str>) -> StoreResult<()> {
        if !self.node_exists(parent)? {
            return Err(StoreError::NotFound(parent.to_string()));
        }
        let path = paths::join(parent, name);
        if self.node_exists(&path)? {
            return Err(StoreError::ConstraintViolation {
                path,
                reason: "node already exists".to_string(),
            });
        }
        self.tree
            .insert(path.as_bytes(), encode_record(&NodeRecord::with_type(type_name))?)?;
        Ok(())
    }

    fn remove_item(&self, path: &str) -> StoreResult<()> {
        if paths::is_root(path) {
            return Err(StoreError::ConstraintViolation {
                path: path.to_string(),
                reason: "cannot remove the root node".to_string(),
            });
        }
        if self.node_exists(path)? {
            let prefix = subtree_prefix(path);
            let mut doomed = vec![path.to_string()];
            for entry in self.tree.scan_prefix(prefix.as_bytes()) {
                let (key, _) = entry?;
                let key = std::str::from_utf8(key.as_ref())
                    .map_err(|e| StoreError::Backend(format!("non-utf8 path key: {e}")))?;
                doomed.push(key.to_string());
            }
            for key in doomed {
                self.tree.remove(key.as_bytes())?;
            }
            return Ok(());
        }
        if let Some(parent) = self.property_parent(path)? {
            let name = paths::leaf(path).to_string();
            if let Some(mut record) = self.record(&parent)? {
                record.properties.retain(|p| p.name != name);
                self.tree.insert(parent.as_bytes(), encode_record(&record)?)?;
            }
            return Ok(());
        }
        Err(StoreError::NotFound(path.to_string()))
    }

    fn write_node(&self, path: &str, data: &NodeData) -> StoreResult<()> {
        if !paths::is_root(path) {
            let parent =
                paths::parent(path).ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            if !self.node_exists(parent)? {
                return Err(StoreError::NotFound(parent.to_string()));
            }
        }
        self.tree
            .insert(path.as_bytes(), encode_record(&NodeRecord::from_data(data))?)?;
        Ok(())
    }

    fn find_node_by_id(&self, node_id: &str) -> StoreResult<Option<String>> {
        for entry in self.tree.iter() {
            let (key, value) = entry?;
            let record = decode_record(&value)?;
            if record.node_id.as_deref() == Some(node_id) {
                let key = std::str::from_utf8(key.as_ref())
                    .map_err(|e| StoreError::Backend(format!("non-utf8 path key: {e}")))?;
                return Ok(Some(key.to_string()));
            }
        }
        Ok(None)
    }

    fn commit(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn subtree_prefix(path: &str) -> String {
    if paths::is_root(path) {
        path.to_string()
    } else {
        format!("{path}/")
    }
}
