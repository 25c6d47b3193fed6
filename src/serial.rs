//! Binary serialization of compiled rule trees.
//!
//! A compiled [`RuleTree`](crate::RuleTree) can be cached on disk and loaded
//! without recompiling its rules. The format is a 32-byte fixed header
//! followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"PMTR"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! The format version must match exactly. Decoded trees are checked for
//! structural soundness before use: every index is in range and the nodes form
//! a tree rooted at index 0 in which children follow their parents.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::{Branch, Edges, Node, PropertyRegistry};
use crate::{GroupingStrategy, RuleTree, Scalar};

const MAGIC: &[u8; 4] = b"PMTR";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

/// Errors that can occur when serializing a [`RuleTree`](crate::RuleTree) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule tree: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`RuleTree`](crate::RuleTree) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a propmatch binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// -- Serialized shape -------------------------------------------------------

/// `O` is `&[T]` when encoding and `Vec<T>` when decoding.
#[derive(Debug, Serialize, Deserialize)]
struct SerializedTree<O> {
    metadata: TreeMetadata,
    grouping: SerializedGrouping,
    properties: Vec<String>,
    outcomes: O,
    nodes: Vec<SerializedNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TreeMetadata {
    rule_count: usize,
    node_count: usize,
    property_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum SerializedGrouping {
    MostShared,
    FirstSeen,
    Lexicographic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedNode {
    outcomes: Vec<usize>,
    branches: Vec<SerializedBranch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedBranch {
    property: usize,
    edges: Vec<(SerializedKey, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
enum SerializedKey {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
}

// -- Conversions ------------------------------------------------------------

fn serialize_grouping(strategy: GroupingStrategy) -> SerializedGrouping {
    match strategy {
        GroupingStrategy::MostShared => SerializedGrouping::MostShared,
        GroupingStrategy::FirstSeen => SerializedGrouping::FirstSeen,
        GroupingStrategy::Lexicographic => SerializedGrouping::Lexicographic,
    }
}

fn deserialize_grouping(grouping: SerializedGrouping) -> GroupingStrategy {
    match grouping {
        SerializedGrouping::MostShared => GroupingStrategy::MostShared,
        SerializedGrouping::FirstSeen => GroupingStrategy::FirstSeen,
        SerializedGrouping::Lexicographic => GroupingStrategy::Lexicographic,
    }
}

fn serialize_key(key: Scalar<'_>) -> SerializedKey {
    match key {
        Scalar::Null => SerializedKey::Null,
        Scalar::Bool(v) => SerializedKey::Bool(v),
        Scalar::Int(v) => SerializedKey::Int(v),
        Scalar::Str(v) => SerializedKey::Str(v.to_owned()),
    }
}

fn deserialize_key(key: &SerializedKey) -> Scalar<'_> {
    match key {
        SerializedKey::Null => Scalar::Null,
        SerializedKey::Bool(v) => Scalar::Bool(*v),
        SerializedKey::Int(v) => Scalar::Int(*v),
        SerializedKey::Str(v) => Scalar::Str(v),
    }
}

fn serialize_node(node: &Node) -> SerializedNode {
    SerializedNode {
        outcomes: node.outcomes.clone(),
        branches: node
            .branches
            .iter()
            .map(|branch| SerializedBranch {
                property: branch.property,
                edges: branch
                    .edges
                    .entries()
                    .into_iter()
                    .map(|(key, child)| (serialize_key(key), child))
                    .collect(),
            })
            .collect(),
    }
}

fn deserialize_node(node: SerializedNode) -> Node {
    Node {
        outcomes: node.outcomes,
        branches: node
            .branches
            .into_iter()
            .map(|branch| {
                let mut edges = Edges::default();
                for (key, child) in &branch.edges {
                    edges.insert(deserialize_key(key), *child);
                }
                Branch {
                    property: branch.property,
                    edges,
                }
            })
            .collect(),
    }
}

fn tree_to_serialized<'a, T>(
    tree: &'a RuleTree<T>,
    source_text: Option<&str>,
) -> SerializedTree<&'a [T]> {
    SerializedTree {
        metadata: TreeMetadata {
            rule_count: tree.outcomes.len(),
            node_count: tree.nodes.len(),
            property_count: tree.properties.len(),
            source_digest: source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes()),
        },
        grouping: serialize_grouping(tree.strategy),
        properties: tree.properties.iter().map(str::to_owned).collect(),
        outcomes: &tree.outcomes,
        nodes: tree.nodes.iter().map(serialize_node).collect(),
    }
}

fn serialized_to_tree<T>(ser: SerializedTree<Vec<T>>) -> Result<RuleTree<T>, DeserializeError> {
    validate(&ser)?;
    Ok(RuleTree {
        nodes: ser.nodes.into_iter().map(deserialize_node).collect(),
        outcomes: ser.outcomes,
        properties: PropertyRegistry::from_names(ser.properties),
        strategy: deserialize_grouping(ser.grouping),
    })
}

// -- Validation -------------------------------------------------------------

fn validate<T>(ser: &SerializedTree<Vec<T>>) -> Result<(), DeserializeError> {
    let rule_count = ser.outcomes.len();
    let node_count = ser.nodes.len();
    let property_count = ser.properties.len();

    if ser.metadata.rule_count != rule_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {rule_count}",
            ser.metadata.rule_count
        )));
    }
    if ser.metadata.node_count != node_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} nodes but payload has {node_count}",
            ser.metadata.node_count
        )));
    }
    if ser.metadata.property_count != property_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} properties but payload has {property_count}",
            ser.metadata.property_count
        )));
    }
    if node_count == 0 {
        return Err(DeserializeError::Validation("tree has no root node".to_owned()));
    }

    let mut seen = std::collections::HashSet::with_capacity(property_count);
    for name in &ser.properties {
        if !seen.insert(name.as_str()) {
            return Err(DeserializeError::Validation(format!(
                "property '{name}' registered twice"
            )));
        }
    }

    let mut parents = vec![0_usize; node_count];
    for (id, node) in ser.nodes.iter().enumerate() {
        if let Some(&rule) = node.outcomes.iter().find(|&&rule| rule >= rule_count) {
            return Err(DeserializeError::Validation(format!(
                "node {id} references rule {rule} but only {rule_count} rules exist"
            )));
        }
        for branch in &node.branches {
            if branch.property >= property_count {
                return Err(DeserializeError::Validation(format!(
                    "node {id} branches on property {} out of bounds (max {property_count})",
                    branch.property
                )));
            }
            let mut keys: Vec<&SerializedKey> = branch.edges.iter().map(|(k, _)| k).collect();
            keys.sort_unstable();
            if keys.windows(2).any(|w| w[0] == w[1]) {
                return Err(DeserializeError::Validation(format!(
                    "node {id} has duplicate edge keys on property {}",
                    branch.property
                )));
            }
            for &(_, child) in &branch.edges {
                if child <= id || child >= node_count {
                    return Err(DeserializeError::Validation(format!(
                        "node {id} has edge to node {child} (must be in {}..{node_count})",
                        id + 1
                    )));
                }
                parents[child] += 1;
            }
        }
    }

    if let Some((orphan, count)) = parents
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, &count)| count != 1)
    {
        return Err(DeserializeError::Validation(format!(
            "node {orphan} has {count} parents, expected exactly 1"
        )));
    }

    Ok(())
}

// -- Header I/O -------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // payload will never exceed 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash.as_bytes()[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }
    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// -- Public encode/decode ---------------------------------------------------

pub(crate) fn encode<T: Serialize>(
    tree: &RuleTree<T>,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = tree_to_serialized(tree, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    debug!(bytes = buf.len(), nodes = tree.nodes.len(), "encoded rule tree");
    Ok(buf)
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    bytes: &[u8],
) -> Result<RuleTree<T>, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedTree<Vec<T>>, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    serialized_to_tree(serialized)
}
