//! Node and property model shared by the store seam and the wire payload.
//!
//! A [`ContentNode`] is the single-node snapshot a store hands out: its own
//! properties plus the names of its children. [`NodeData`] is the recursive
//! form used as the export/import payload; a non-recursive export is simply a
//! `NodeData` with no children. Both sides of a migration speak the same
//! bincode-encoded `NodeData` wire format.

use bincode::{Decode, Encode};
use derive_more::From;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::errors::CodecError;

/// Property value types. The two reference types point at another node by
/// path or by stable identifier rather than carrying plain data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, AsRefStr, Default,
)]
pub enum PropertyType {
    #[default]
    String,
    Long,
    Double,
    Boolean,
    Date,
    Binary,
    Name,
    PathReference,
    IdReference,
}

impl PropertyType {
    pub fn is_reference(&self) -> bool {
        matches!(self, PropertyType::PathReference | PropertyType::IdReference)
    }
}

/// A single string-rendered value or an ordered multi-value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode, From)]
pub enum PropertyValues {
    Single(String),
    Multi(Vec<String>),
}

impl PropertyValues {
    pub fn is_multiple(&self) -> bool {
        matches!(self, PropertyValues::Multi(_))
    }

    /// All values in order, regardless of cardinality.
    pub fn as_slice(&self) -> &[String] {
        match self {
            PropertyValues::Single(value) => std::slice::from_ref(value),
            PropertyValues::Multi(values) => values,
        }
    }

    /// Sum of the UTF-8 byte lengths of the rendered values.
    pub fn byte_size(&self) -> u64 {
        self.as_slice().iter().map(|v| v.len() as u64).sum()
    }
}

/// A typed, possibly multi-valued attribute attached to a node. Property
/// order on a node is insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Property {
    pub name: String,
    pub ty: PropertyType,
    pub values: PropertyValues,
}

impl Property {
    pub fn new(
        name: impl Into<String>,
        ty: PropertyType,
        values: impl Into<PropertyValues>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            values: values.into(),
        }
    }

    /// Shorthand for a single-valued string property.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, PropertyType::String, value.into())
    }

    pub fn byte_size(&self) -> u64 {
        self.values.byte_size()
    }
}

/// Snapshot of one node as returned by a store: own properties plus child
/// names (unique among siblings). The workspace root has the empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    pub name: String,
    pub type_name: Option<String>,
    pub node_id: Option<String>,
    pub properties: Vec<Property>,
    pub children: Vec<String>,
}

/// Recursive payload node used for export/import round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct NodeData {
    pub name: String,
    pub type_name: Option<String>,
    pub node_id: Option<String>,
    pub properties: Vec<Property>,
    pub children: Vec<NodeData>,
}

impl NodeData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            node_id: None,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_child(mut self, child: NodeData) -> Self {
        self.children.push(child);
        self
    }
}

/// Encode a payload tree into the wire format.
pub fn encode_payload(data: &NodeData) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::encode_to_vec(data, bincode::config::standard())?)
}

/// Decode a wire payload back into a payload tree.
pub fn decode_payload(payload: &[u8]) -> Result<NodeData, CodecError> {
    let (data, _) = bincode::decode_from_slice(payload, bincode::config::standard())?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_byte_size_is_utf8_bytes() {
        let p = Property::string("title", "héllo");
        assert_eq!(p.byte_size(), 6);

        let multi = Property::new(
            "tags",
            PropertyType::String,
            vec!["ab".to_string(), "cde".to_string()],
        );
        assert_eq!(multi.byte_size(), 5);
        assert!(multi.values.is_multiple());
    }

    #[test]
    fn test_reference_types() {
        assert!(PropertyType::PathReference.is_reference());
        assert!(PropertyType::IdReference.is_reference());
        assert!(!PropertyType::String.is_reference());
        assert!(!PropertyType::Binary.is_reference());
    }

    #[test]
    fn test_payload_round_trip() {
        let data = NodeData::new("a")
            .with_type("app:page")
            .with_property(Property::string("title", "home"))
            .with_child(NodeData::new("b").with_id("id-b"));
        let bytes = encode_payload(&data).unwrap();
        let decoded = decode_payload(&bytes).unwrap();
        assert_eq!(decoded, data);
    }
}
