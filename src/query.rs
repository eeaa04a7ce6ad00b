//! Ad-hoc inspection queries over one workspace.
//!
//! A thin helper for the CLI's query mode; the migration core never calls
//! it. Two languages are supported: `path-glob` matches absolute node paths
//! against a glob pattern, `property-equals` takes `name=value` and returns
//! the nodes carrying that property value.

use globset::Glob;
use strum::{AsRefStr, EnumString};

use crate::errors::{StoreError, StoreResult};
use crate::paths;
use crate::traits::store::ContentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum QueryLanguage {
    PathGlob,
    PropertyEquals,
}

/// One matching node: its path and the property values that matched (empty
/// for path-only queries).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch {
    pub path: String,
    pub values: Vec<String>,
}

/// Walk the whole workspace and collect matches in path order.
pub fn execute<S: ContentStore + ?Sized>(
    store: &S,
    text: &str,
    language: QueryLanguage,
) -> StoreResult<Vec<QueryMatch>> {
    match language {
        QueryLanguage::PathGlob => {
            let matcher = Glob::new(text)
                .map_err(|e| StoreError::InvalidQuery(e.to_string()))?
                .compile_matcher();
            walk(store, |path, _| {
                matcher
                    .is_match(path)
                    .then(|| QueryMatch {
                        path: path.to_string(),
                        values: Vec::new(),
                    })
            })
        }
        QueryLanguage::PropertyEquals => {
            let (name, value) = text.split_once('=').ok_or_else(|| {
                StoreError::InvalidQuery(format!("expected name=value, got: {text}"))
            })?;
            let (name, value) = (name.trim(), value.trim());
            walk(store, |path, node| {
                let matched: Vec<String> = node
                    .properties
                    .iter()
                    .filter(|p| p.name == name)
                    .flat_map(|p| p.values.as_slice())
                    .filter(|v| v.as_str() == value)
                    .cloned()
                    .collect();
                (!matched.is_empty()).then(|| QueryMatch {
                    path: path.to_string(),
                    values: matched,
                })
            })
        }
    }
}

fn walk<S, F>(store: &S, mut visit: F) -> StoreResult<Vec<QueryMatch>>
where
    S: ContentStore + ?Sized,
    F: FnMut(&str, &crate::node::ContentNode) -> Option<QueryMatch>,
{
    let mut matches = Vec::new();
    let mut stack = vec![paths::ROOT.to_string()];
    while let Some(path) = stack.pop() {
        let node = store.get_node(&path)?;
        if let Some(m) = visit(&path, &node) {
            matches.push(m);
        }
        for child in node.children.iter().rev() {
            stack.push(paths::join(&path, child));
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::databases::memory_store::MemoryRepository;
    use crate::node::{NodeData, Property};
    use crate::traits::store::ContentRepository;
    use std::str::FromStr;

    fn sample_store() -> impl ContentStore {
        let repo = MemoryRepository::new();
        let store = repo.login("default").unwrap();
        store.create_child("/", "content", Some("app:root")).unwrap();
        store.create_child("/content", "news", None).unwrap();
        store.create_child("/content", "sport", None).unwrap();
        store
            .write_node(
                "/content/news",
                &NodeData::new("news").with_property(Property::string("lang", "en")),
            )
            .unwrap();
        store
            .write_node(
                "/content/sport",
                &NodeData::new("sport").with_property(Property::string("lang", "fr")),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_language_keys() {
        assert_eq!(
            QueryLanguage::from_str("path-glob").unwrap(),
            QueryLanguage::PathGlob
        );
        assert_eq!(
            QueryLanguage::from_str("property-equals").unwrap(),
            QueryLanguage::PropertyEquals
        );
        assert!(QueryLanguage::from_str("sql").is_err());
    }

    #[test]
    fn test_path_glob() {
        let store = sample_store();
        let matches = execute(&store, "/content/*", QueryLanguage::PathGlob).unwrap();
        let found: Vec<&str> = matches.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(found, vec!["/content/news", "/content/sport"]);
    }

    #[test]
    fn test_property_equals() {
        let store = sample_store();
        let matches = execute(&store, "lang = fr", QueryLanguage::PropertyEquals).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].path, "/content/sport");
        assert_eq!(matches[0].values, vec!["fr".to_string()]);
    }

    #[test]
    fn test_malformed_property_query() {
        let store = sample_store();
        assert!(execute(&store, "lang", QueryLanguage::PropertyEquals).is_err());
    }
}
