// Shared tree-building helpers for integration tests.

#![allow(dead_code)]

use hierabase_migrate::paths::join;
use hierabase_migrate::prelude::*;

/// Create a property-less child node.
pub fn add_node<S: ContentStore>(store: &S, parent: &str, name: &str, type_name: Option<&str>) {
    store
        .create_child(parent, name, type_name)
        .unwrap_or_else(|e| panic!("create {parent}/{name}: {e}"));
}

/// Replace the properties (and only the properties) of an existing node.
pub fn set_props(store: &impl ContentStore, path: &str, properties: Vec<Property>) {
    let node = store
        .get_node(path)
        .unwrap_or_else(|e| panic!("get {path}: {e}"));
    let mut data = NodeData::new(node.name.clone());
    data.type_name = node.type_name.clone();
    data.node_id = node.node_id.clone();
    data.properties = properties;
    store
        .write_node(path, &data)
        .unwrap_or_else(|e| panic!("write {path}: {e}"));
}

/// A single-valued string property occupying exactly `bytes` bytes.
pub fn filler(name: &str, bytes: usize) -> Property {
    Property::string(name, "x".repeat(bytes))
}

/// A single-valued path-reference property.
pub fn path_ref(name: &str, target: &str) -> Property {
    Property::new(name, PropertyType::PathReference, target.to_string())
}

/// A multi-valued id-reference property.
pub fn multi_id_ref(name: &str, targets: &[&str]) -> Property {
    Property::new(
        name,
        PropertyType::IdReference,
        targets.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
    )
}

/// Every node path in the subtree at `root`, in walk order.
pub fn subtree_paths(store: &impl ContentStore, root: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_string()];
    while let Some(path) = stack.pop() {
        let node = store
            .get_node(&path)
            .unwrap_or_else(|e| panic!("get {path}: {e}"));
        for child in node.children.iter().rev() {
            stack.push(join(&path, child));
        }
        found.push(path);
    }
    found
}

/// Recursively seed a subtree from a payload description. The parent of
/// `path` must already exist.
pub fn seed_tree(store: &impl ContentStore, path: &str, data: &NodeData) {
    store
        .write_node(path, data)
        .unwrap_or_else(|e| panic!("write {path}: {e}"));
    for child in &data.children {
        seed_tree(store, &join(path, &child.name), child);
    }
}

/// Assert two subtrees are observably identical: same nodes, same types,
/// identifiers, properties and children everywhere.
pub fn assert_subtree_eq<A: ContentStore, B: ContentStore>(
    left: &A,
    left_root: &str,
    right: &B,
    right_root: &str,
) {
    let mut stack = vec![String::new()];
    while let Some(rel) = stack.pop() {
        let lpath = join(left_root, &rel);
        let rpath = join(right_root, &rel);
        let lnode = left
            .get_node(&lpath)
            .unwrap_or_else(|e| panic!("left {lpath}: {e}"));
        let rnode = right
            .get_node(&rpath)
            .unwrap_or_else(|e| panic!("right {rpath}: {e}"));
        assert_eq!(
            lnode.type_name, rnode.type_name,
            "type mismatch at {rel:?}"
        );
        assert_eq!(lnode.node_id, rnode.node_id, "id mismatch at {rel:?}");
        assert_eq!(
            lnode.properties, rnode.properties,
            "property mismatch at {rel:?}"
        );
        assert_eq!(
            lnode.children, rnode.children,
            "children mismatch at {rel:?}"
        );
        for child in &lnode.children {
            stack.push(format!("{rel}/{child}"));
        }
    }
}
