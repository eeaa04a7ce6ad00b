//! Reference store backends.
//!
//! Both backends persist one [`NodeRecord`] per absolute path and derive a
//! node's children by path-prefix scan, so sibling order is name order.

use bincode::{Decode, Encode};

use crate::errors::{CodecError, StoreResult};
use crate::node::{ContentNode, NodeData, Property};

pub mod memory_store;
#[cfg(feature = "sled")]
pub mod sled_store;

/// The stored shape of one node: everything except its name (derived from
/// the path leaf) and its children (derived by prefix scan).
#[derive(Debug, Clone, Default, PartialEq, Encode, Decode)]
pub(crate) struct NodeRecord {
    pub type_name: Option<String>,
    pub node_id: Option<String>,
    pub properties: Vec<Property>,
}

impl NodeRecord {
    pub fn from_data(data: &NodeData) -> Self {
        Self {
            type_name: data.type_name.clone(),
            node_id: data.node_id.clone(),
            properties: data.properties.clone(),
        }
    }

    pub fn with_type(type_name: Option<&str>) -> Self {
        Self {
            type_name: type_name.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn to_node(&self, name: String, children: Vec<String>) -> ContentNode {
        ContentNode {
            name,
            type_name: self.type_name.clone(),
            node_id: self.node_id.clone(),
            properties: self.properties.clone(),
            children,
        }
    }
}

pub(crate) fn encode_record(record: &NodeRecord) -> StoreResult<Vec<u8>> {
    Ok(bincode::encode_to_vec(record, bincode::config::standard())
        .map_err(CodecError::Encode)?)
}

pub(crate) fn decode_record(bytes: &[u8]) -> StoreResult<NodeRecord> {
    let (record, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
        .map_err(CodecError::Decode)?;
    Ok(record)
}
