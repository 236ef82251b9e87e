//! On-disk snapshot layout
//!
//! ```text
//! +-------+---------+-------+----------+-----------------+-----------+
//! | magic | version | flags | body len |      body       |  sha-256  |
//! | SMYG  | u16 LE  |  u8   |  u64 LE  | bincode(+gzip)  | 32 bytes  |
//! +-------+---------+-------+----------+-----------------+-----------+
//! ```
//!
//! The body holds four sections in order: schema tables, node table,
//! relationship table and index directory. The digest covers the body
//! exactly as stored, compressed or not.
//!
//! A compressed body starts with the inflated length as a `u64 LE`,
//! followed by the gzip stream.

use super::{CodecError, CodecResult};
use crate::graph::PropertyValue;
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

pub const MAGIC: &[u8; 4] = b"SMYG";
pub const FORMAT_VERSION: u16 = 1;

/// Body is gzip-compressed
pub const FLAG_GZIP: u8 = 0b0000_0001;
const KNOWN_FLAGS: u8 = FLAG_GZIP;

pub const HEADER_LEN: usize = 4 + 2 + 1 + 8;
pub const DIGEST_LEN: usize = 32;

/// Inflated length in front of a gzip body
pub const INFLATED_LEN_PREFIX: usize = 8;
/// Deflate never expands input by more than this factor
pub const MAX_DEFLATE_RATIO: u64 = 1032;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub flags: u8,
    pub body_len: u64,
}

impl Header {
    pub fn new(flags: u8, body_len: u64) -> Self {
        Self {
            version: FORMAT_VERSION,
            flags,
            body_len,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_GZIP != 0
    }

    pub fn write_to(&self, buf: &mut BytesMut) {
        buf.put_slice(MAGIC);
        buf.put_u16_le(self.version);
        buf.put_u8(self.flags);
        buf.put_u64_le(self.body_len);
    }

    /// Parse and check the fixed header at the start of `bytes`
    pub fn parse(mut bytes: &[u8]) -> CodecResult<Self> {
        let seen = bytes.len().min(MAGIC.len());
        if bytes[..seen] != MAGIC[..seen] {
            return Err(CodecError::BadMagic);
        }
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::Truncated {
                expected: HEADER_LEN,
                found: bytes.len(),
            });
        }

        bytes.advance(MAGIC.len());
        let version = bytes.get_u16_le();
        if version != FORMAT_VERSION {
            return Err(CodecError::VersionMismatch {
                found: version,
                expected: FORMAT_VERSION,
            });
        }
        let flags = bytes.get_u8();
        if flags & !KNOWN_FLAGS != 0 {
            return Err(CodecError::UnknownFlags(flags));
        }
        let body_len = bytes.get_u64_le();

        Ok(Self {
            version,
            flags,
            body_len,
        })
    }
}

/// Interned names in id order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaTables {
    pub labels: Vec<String>,
    pub relation_types: Vec<String>,
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeEntry {
    Tombstone,
    Live {
        labels: Vec<u32>,
        properties: Vec<(u32, PropertyValue)>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeEntry {
    Tombstone,
    Live {
        source: u64,
        target: u64,
        rel_type: u32,
        properties: Vec<(u32, PropertyValue)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub label: u32,
    pub property: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBody {
    pub schema: SchemaTables,
    pub nodes: Vec<NodeEntry>,
    pub edges: Vec<EdgeEntry>,
    pub indices: Vec<IndexDefinition>,
}

impl SnapshotBody {
    /// Check every id the body refers to before anything is built from it
    pub fn validate(&self) -> CodecResult<()> {
        let labels = self.schema.labels.len();
        let rel_types = self.schema.relation_types.len();
        let properties = self.schema.properties.len();

        let check_props = |props: &[(u32, PropertyValue)], owner: &str| -> CodecResult<()> {
            match props.iter().find(|(key, _)| *key as usize >= properties) {
                Some((key, _)) => Err(CodecError::Corrupt(format!("{} uses unknown property id {}", owner, key))),
                None => Ok(()),
            }
        };

        for (id, node) in self.nodes.iter().enumerate() {
            if let NodeEntry::Live {
                labels: node_labels,
                properties: props,
            } = node
            {
                if let Some(label) = node_labels.iter().find(|l| **l as usize >= labels) {
                    return Err(CodecError::Corrupt(format!("node {} uses unknown label id {}", id, label)));
                }
                check_props(props, &format!("node {}", id))?;
            }
        }

        let is_live_node =
            |id: u64| matches!(self.nodes.get(id as usize), Some(NodeEntry::Live { .. }));
        for (id, edge) in self.edges.iter().enumerate() {
            if let EdgeEntry::Live {
                source,
                target,
                rel_type,
                properties: props,
            } = edge
            {
                if !is_live_node(*source) || !is_live_node(*target) {
                    return Err(CodecError::Corrupt(format!(
                        "relationship {} connects missing nodes {} -> {}",
                        id, source, target
                    )));
                }
                if *rel_type as usize >= rel_types {
                    return Err(CodecError::Corrupt(format!(
                        "relationship {} uses unknown type id {}",
                        id, rel_type
                    )));
                }
                check_props(props, &format!("relationship {}", id))?;
            }
        }

        for def in &self.indices {
            if def.label as usize >= labels || def.property as usize >= properties {
                return Err(CodecError::Corrupt(format!(
                    "index on unknown label/property ids ({}, {})",
                    def.label, def.property
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let mut buf = BytesMut::new();
        Header::new(FLAG_GZIP, 42).write_to(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);
        let header = Header::parse(&buf).unwrap();
        assert!(header.is_compressed());
        assert_eq!(header.body_len, 42);
    }

    #[test]
    fn test_header_rejections() {
        assert!(matches!(Header::parse(b"NOPE"), Err(CodecError::BadMagic)));
        assert!(matches!(Header::parse(b"SMYG\x01"), Err(CodecError::Truncated { .. })));
        assert!(matches!(Header::parse(b"XY"), Err(CodecError::BadMagic)));

        // Shorter than the magic but not contradicting it
        for short in [&b""[..], b"S", b"SMY"] {
            assert!(matches!(
                Header::parse(short),
                Err(CodecError::Truncated { expected: HEADER_LEN, found }) if found == short.len()
            ));
        }

        let mut buf = BytesMut::new();
        Header {
            version: 9,
            flags: 0,
            body_len: 0,
        }
        .write_to(&mut buf);
        assert!(matches!(
            Header::parse(&buf),
            Err(CodecError::VersionMismatch { found: 9, expected: 1 })
        ));

        let mut buf = BytesMut::new();
        Header::new(0x80, 0).write_to(&mut buf);
        assert!(matches!(Header::parse(&buf), Err(CodecError::UnknownFlags(0x80))));
    }

    #[test]
    fn test_body_validation() {
        let mut body = SnapshotBody {
            schema: SchemaTables {
                labels: vec!["A".into()],
                relation_types: vec!["e".into()],
                properties: vec!["v".into()],
            },
            nodes: vec![
                NodeEntry::Live {
                    labels: vec![0],
                    properties: vec![(0, PropertyValue::Null)],
                },
                NodeEntry::Tombstone,
            ],
            edges: vec![EdgeEntry::Live {
                source: 0,
                target: 0,
                rel_type: 0,
                properties: vec![],
            }],
            indices: vec![IndexDefinition { label: 0, property: 0 }],
        };
        assert!(body.validate().is_ok());

        body.edges.push(EdgeEntry::Live {
            source: 0,
            target: 1,
            rel_type: 0,
            properties: vec![],
        });
        assert!(matches!(body.validate(), Err(CodecError::Corrupt(_))));

        body.edges.pop();
        body.indices.push(IndexDefinition { label: 3, property: 0 });
        assert!(matches!(body.validate(), Err(CodecError::Corrupt(_))));
    }
}
