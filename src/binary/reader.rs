//! Decoding of binary place payloads
//!
//! This is the inverse of [`write_binary`](super::write_binary) for the
//! subset of the format it produces. It is used to inspect exported files
//! and to check the encoder's output byte for byte.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::{Value, ValueType};

use super::buffer::ByteReader;
use super::{HEADER_LEN, MAGIC, SIGNATURE, chunk, delta_decode, props};

/// Fixed-size header at the start of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceHeader {
    /// Format version
    pub version: u16,
    /// Number of classes (INST chunks)
    pub class_count: u32,
    /// Number of instances
    pub instance_count: u32,
}

/// A chunk with its frame removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// Chunk name without padding
    pub name: String,
    /// Uncompressed payload
    pub data: Vec<u8>,
}

/// Decoded `INST` chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstChunk {
    /// Encoding-local class id
    pub class_id: u32,
    /// Class name
    pub class_name: String,
    /// Service flag byte
    pub is_service: bool,
    /// Referents of the class's instances
    pub referents: Vec<i32>,
    /// Per-instance service markers, empty for non-services
    pub service_markers: Vec<u8>,
}

/// Decoded `PROP` chunk
#[derive(Debug, Clone, PartialEq)]
pub struct PropChunk {
    /// Class the column belongs to
    pub class_id: u32,
    /// Property name
    pub name: String,
    /// Column type
    pub value_type: ValueType,
    /// One value per instance of the class
    pub values: Vec<Value>,
}

/// Decoded `PRNT` chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrntChunk {
    /// Format version byte
    pub version: u8,
    /// `(child, parent)` referent pairs; parent -1 means top level
    pub links: Vec<(i32, i32)>,
}

/// A parsed payload: header plus raw chunks up to and including `END`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceFile {
    /// Header fields
    pub header: PlaceHeader,
    /// Chunks in file order
    pub chunks: Vec<RawChunk>,
}

impl PlaceFile {
    /// Split a payload into its header and chunks
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::truncated("header"));
        }
        if bytes[0..8] != MAGIC || bytes[8..14] != SIGNATURE {
            return Err(Error::InvalidBinary(
                "missing place file magic".to_string(),
            ));
        }

        let mut r = ByteReader::new(&bytes[14..]);
        let header = PlaceHeader {
            version: r.read_u16_le("version")?,
            class_count: r.read_u32_le("class count")?,
            instance_count: r.read_u32_le("instance count")?,
        };
        r.read_bytes(8, "reserved header bytes")?;

        let mut chunks = Vec::new();
        while r.remaining() > 0 {
            let tag = r.read_bytes(4, "chunk name")?;
            let name = String::from_utf8_lossy(tag)
                .trim_end_matches('\0')
                .to_string();
            let compressed = r.read_u32_le("chunk compressed length")?;
            let length = r.read_u32_le("chunk length")? as usize;
            r.read_u32_le("chunk reserved")?;

            if compressed != 0 {
                return Err(Error::InvalidBinary(format!(
                    "chunk {} is compressed, which is not supported",
                    name
                )));
            }

            let data = r.read_bytes(length, "chunk payload")?.to_vec();
            let done = name == chunk::END;
            chunks.push(RawChunk { name, data });
            if done {
                break;
            }
        }

        Ok(Self { header, chunks })
    }

    /// Chunks with the given name, in file order
    pub fn chunks_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawChunk> {
        self.chunks.iter().filter(move |c| c.name == name)
    }

    /// Entries of the `META` chunk
    pub fn metadata(&self) -> Result<Vec<(String, String)>> {
        let Some(meta) = self.chunks_named(chunk::META).next() else {
            return Ok(Vec::new());
        };
        let mut r = ByteReader::new(&meta.data);
        let count = r.read_u32_le("META count")?;
        (0..count)
            .map(|_| Ok((r.read_string("META key")?, r.read_string("META value")?)))
            .collect()
    }

    /// All `INST` chunks, decoded
    pub fn instances(&self) -> Result<Vec<InstChunk>> {
        self.chunks_named(chunk::INST)
            .map(|c| InstChunk::decode(&c.data))
            .collect()
    }

    /// All `PROP` chunks, decoded using the instance counts from `INST`
    pub fn properties(&self) -> Result<Vec<PropChunk>> {
        let counts: HashMap<u32, usize> = self
            .instances()?
            .into_iter()
            .map(|inst| (inst.class_id, inst.referents.len()))
            .collect();

        self.chunks_named(chunk::PROP)
            .map(|c| PropChunk::decode(&c.data, &counts))
            .collect()
    }

    /// The `PRNT` chunk, decoded
    pub fn parents(&self) -> Result<PrntChunk> {
        let prnt = self
            .chunks_named(chunk::PRNT)
            .next()
            .ok_or_else(|| Error::InvalidBinary("missing PRNT chunk".to_string()))?;
        PrntChunk::decode(&prnt.data)
    }
}

impl InstChunk {
    /// Decode an `INST` payload
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let class_id = r.read_u32_le("INST class id")?;
        let class_name = r.read_string("INST class name")?;
        let is_service = r.read_u8("INST format")? == 1;
        let count = r.read_u32_le("INST count")? as usize;
        let referents = delta_decode(&r.read_interleaved(count, "INST referents")?);
        let service_markers = if is_service {
            r.read_bytes(count, "INST service markers")?.to_vec()
        } else {
            Vec::new()
        };

        Ok(Self {
            class_id,
            class_name,
            is_service,
            referents,
            service_markers,
        })
    }
}

impl PropChunk {
    /// Decode a `PROP` payload given each class's instance count
    pub fn decode(data: &[u8], counts: &HashMap<u32, usize>) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let class_id = r.read_u32_le("PROP class id")?;
        let name = r.read_string("PROP name")?;
        let type_id = r.read_u8("PROP type")?;
        let value_type = ValueType::from_type_id(type_id).ok_or_else(|| {
            Error::InvalidBinary(format!("unknown property type 0x{:02X}", type_id))
        })?;
        let count = *counts.get(&class_id).ok_or_else(|| {
            Error::InvalidBinary(format!("PROP {} refers to unknown class {}", name, class_id))
        })?;
        let values = props::read_column(&mut r, value_type, count)?;

        Ok(Self {
            class_id,
            name,
            value_type,
            values,
        })
    }
}

impl PrntChunk {
    /// Decode a `PRNT` payload
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let version = r.read_u8("PRNT version")?;
        let count = r.read_u32_le("PRNT count")? as usize;
        let children = delta_decode(&r.read_interleaved(count, "PRNT children")?);
        let parents = delta_decode(&r.read_interleaved(count, "PRNT parents")?);

        Ok(Self {
            version,
            links: children.into_iter().zip(parents).collect(),
        })
    }
}
