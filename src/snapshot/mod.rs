//! Snapshot codec
//!
//! Serializes a whole graph (schema tables, node and relationship slots,
//! index definitions) into a self-describing byte stream and rebuilds it.
//! Index contents are never stored; decoding replays `create_index` for each
//! stored definition.
//!
//! Encode and decode walk live storage without locking, so the host must only
//! call them while no query against the graph is in flight.

pub mod format;

use crate::config::{SnapshotConfig, TraversalConfig};
use crate::graph::{EdgeId, GraphError, GraphStore, LabelId, NodeId, PropertyId, RelationTypeId, SchemaKind, SchemaRegistry};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use format::{
    EdgeEntry, Header, IndexDefinition, NodeEntry, SchemaTables, SnapshotBody, DIGEST_LEN, FLAG_GZIP, HEADER_LEN,
    INFLATED_LEN_PREFIX, MAX_DEFLATE_RATIO,
};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Snapshot encoding and decoding errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("not a snapshot: bad magic bytes")]
    BadMagic,

    #[error("unsupported snapshot version {found} (expected {expected})")]
    VersionMismatch { found: u16, expected: u16 },

    #[error("snapshot truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("snapshot checksum mismatch")]
    ChecksumMismatch,

    #[error("unknown snapshot flags {0:#04x}")]
    UnknownFlags(u8),

    #[error("compression error: {0}")]
    Compression(io::Error),

    #[error("corrupt snapshot: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

impl From<GraphError> for CodecError {
    fn from(err: GraphError) -> Self {
        CodecError::Corrupt(err.to_string())
    }
}

/// Encode with default options (uncompressed)
pub fn encode(store: &GraphStore) -> CodecResult<Bytes> {
    encode_with_config(store, &SnapshotConfig::default())
}

pub fn encode_with_config(store: &GraphStore, config: &SnapshotConfig) -> CodecResult<Bytes> {
    let body = snapshot_body(store);
    let mut payload = bincode::serialize(&body)?;

    let mut flags = 0;
    if config.compress {
        let mut prefixed = Vec::with_capacity(INFLATED_LEN_PREFIX + payload.len() / 2);
        prefixed.put_u64_le(payload.len() as u64);
        let mut encoder = GzEncoder::new(prefixed, Compression::new(config.compression_level));
        encoder.write_all(&payload).map_err(CodecError::Compression)?;
        payload = encoder.finish().map_err(CodecError::Compression)?;
        flags |= FLAG_GZIP;
    }

    let digest = Sha256::digest(&payload);

    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len() + DIGEST_LEN);
    Header::new(flags, payload.len() as u64).write_to(&mut buf);
    buf.put_slice(&payload);
    buf.put_slice(&digest);

    info!(
        "Encoded snapshot: {} node slots, {} relationship slots, {} indices, {} bytes",
        body.nodes.len(),
        body.edges.len(),
        body.indices.len(),
        buf.len()
    );
    Ok(buf.freeze())
}

/// Decode with the default traversal tuning
pub fn decode(bytes: &[u8]) -> CodecResult<GraphStore> {
    decode_with_config(bytes, TraversalConfig::default())
}

/// Rebuild a graph from a snapshot. On any error no graph is produced.
pub fn decode_with_config(bytes: &[u8], traversal: TraversalConfig) -> CodecResult<GraphStore> {
    match decode_inner(bytes, traversal) {
        Ok(store) => {
            info!(
                "Decoded snapshot: {} nodes, {} relationships, {} indices",
                store.node_count(),
                store.edge_count(),
                store.indices().len()
            );
            Ok(store)
        }
        Err(err) => {
            warn!("Rejected snapshot: {}", err);
            Err(err)
        }
    }
}

/// Write a snapshot file, replacing any existing file at `path`
pub fn save_to_path(store: &GraphStore, path: impl AsRef<Path>, config: &SnapshotConfig) -> CodecResult<()> {
    let bytes = encode_with_config(store, config)?;
    fs::write(path.as_ref(), &bytes)?;
    debug!("Wrote snapshot to {}", path.as_ref().display());
    Ok(())
}

pub fn load_from_path(path: impl AsRef<Path>) -> CodecResult<GraphStore> {
    let bytes = fs::read(path.as_ref())?;
    debug!("Read {} snapshot bytes from {}", bytes.len(), path.as_ref().display());
    decode(&bytes)
}

fn snapshot_body(store: &GraphStore) -> SnapshotBody {
    let schema = store.schema();
    let names = |kind| schema.names(kind).map(str::to_string).collect();

    let nodes = store
        .node_slots()
        .map(|slot| match slot {
            Some(node) => NodeEntry::Live {
                labels: node.labels.iter().map(|l| l.0).collect(),
                properties: node.properties.iter().map(|(k, v)| (k.0, v.clone())).collect(),
            },
            None => NodeEntry::Tombstone,
        })
        .collect();

    let edges = store
        .edge_slots()
        .map(|slot| match slot {
            Some(edge) => EdgeEntry::Live {
                source: edge.source.0,
                target: edge.target.0,
                rel_type: edge.rel_type.0,
                properties: edge.properties.iter().map(|(k, v)| (k.0, v.clone())).collect(),
            },
            None => EdgeEntry::Tombstone,
        })
        .collect();

    let indices = store
        .indices()
        .definitions()
        .into_iter()
        .map(|key| IndexDefinition {
            label: key.label.0,
            property: key.property.0,
        })
        .collect();

    SnapshotBody {
        schema: SchemaTables {
            labels: names(SchemaKind::Label),
            relation_types: names(SchemaKind::RelationType),
            properties: names(SchemaKind::Property),
        },
        nodes,
        edges,
        indices,
    }
}

fn decode_inner(bytes: &[u8], traversal: TraversalConfig) -> CodecResult<GraphStore> {
    let header = Header::parse(bytes)?;

    let expected = usize::try_from(header.body_len)
        .ok()
        .and_then(|len| len.checked_add(HEADER_LEN + DIGEST_LEN))
        .ok_or_else(|| CodecError::Corrupt(format!("body length {} is not addressable", header.body_len)))?;
    if bytes.len() < expected {
        return Err(CodecError::Truncated {
            expected,
            found: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(CodecError::Corrupt(format!(
            "{} trailing bytes after digest",
            bytes.len() - expected
        )));
    }

    let payload = &bytes[HEADER_LEN..expected - DIGEST_LEN];
    let digest = &bytes[expected - DIGEST_LEN..];
    if Sha256::digest(payload).as_slice() != digest {
        return Err(CodecError::ChecksumMismatch);
    }

    let body: SnapshotBody = if header.is_compressed() {
        bincode::deserialize(&inflate(payload)?)?
    } else {
        bincode::deserialize(payload)?
    };
    body.validate()?;

    build_store(body, traversal)
}

/// Inflate a compressed body, reading no more than its declared length
fn inflate(payload: &[u8]) -> CodecResult<Vec<u8>> {
    if payload.len() < INFLATED_LEN_PREFIX {
        return Err(CodecError::Corrupt("compressed body has no length prefix".to_string()));
    }
    let mut stream = payload;
    let declared = stream.get_u64_le();

    let ceiling = (stream.len() as u64).saturating_mul(MAX_DEFLATE_RATIO);
    if declared > ceiling {
        return Err(CodecError::Corrupt(format!(
            "declared inflated length {} exceeds {} for a {}-byte stream",
            declared,
            ceiling,
            stream.len()
        )));
    }

    let mut raw = Vec::new();
    GzDecoder::new(stream)
        .take(declared.saturating_add(1))
        .read_to_end(&mut raw)
        .map_err(CodecError::Compression)?;
    if raw.len() as u64 != declared {
        return Err(CodecError::Corrupt(format!(
            "compressed body does not inflate to its declared {} bytes",
            declared
        )));
    }
    Ok(raw)
}

fn build_store(body: SnapshotBody, traversal: TraversalConfig) -> CodecResult<GraphStore> {
    let SchemaTables {
        labels,
        relation_types,
        properties,
    } = body.schema;
    let schema = SchemaRegistry::from_tables(labels, relation_types, properties)
        .ok_or_else(|| CodecError::Corrupt("schema table repeats a name".to_string()))?;

    let mut store = GraphStore::with_schema(schema, traversal);

    for (slot, entry) in body.nodes.into_iter().enumerate() {
        let restored = match entry {
            NodeEntry::Live { labels, properties } => Some((
                labels.into_iter().map(LabelId).collect(),
                properties.into_iter().map(|(k, v)| (PropertyId(k), v)).collect(),
            )),
            NodeEntry::Tombstone => None,
        };
        let id = store.restore_node(restored);
        debug_assert_eq!(id, NodeId(slot as u64));
    }

    for (slot, entry) in body.edges.into_iter().enumerate() {
        let restored = match entry {
            EdgeEntry::Live {
                source,
                target,
                rel_type,
                properties,
            } => Some((
                NodeId(source),
                NodeId(target),
                RelationTypeId(rel_type),
                properties.into_iter().map(|(k, v)| (PropertyId(k), v)).collect(),
            )),
            EdgeEntry::Tombstone => None,
        };
        let id = store.restore_edge(restored)?;
        debug_assert_eq!(id, EdgeId(slot as u64));
    }

    for def in body.indices {
        store.create_index_by_id(LabelId(def.label), PropertyId(def.property))?;
    }
    Ok(store)
}
