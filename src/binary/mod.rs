//! Binary chunked place format
//!
//! A payload is a 32-byte header followed by named chunks:
//!
//! ```text
//! META  key/value metadata
//! SSTR  shared string table (always empty)
//! INST  one per class: class id, name, service flag, referents
//! PROP  one per (class, property): column of values
//! PRNT  child/parent referent pairs for every instance
//! END   closing marker
//! ```
//!
//! Chunks are never compressed; the compressed-length field is always 0.

mod buffer;
pub mod encoding;
mod props;
pub mod reader;

use crate::config::BinaryConfig;
use crate::error::Result;
use crate::model::schema::{class_properties, is_service};
use crate::model::{CFrame, ClassGroup, InstanceTree, Value, ValueType, Vector3};

pub use buffer::{ByteReader, ByteWriter};
pub use encoding::{
    deinterleave, delta_decode, delta_encode, interleave, transform_float, unzigzag, zigzag,
};
pub use props::{CFRAME_EXPLICIT, CFRAME_IDENTITY};

/// File magic, `<roblox!`
pub const MAGIC: [u8; 8] = *b"<roblox!";
/// Signature following the magic
pub const SIGNATURE: [u8; 6] = [0x89, 0xFF, 0x0D, 0x0A, 0x1A, 0x0A];
/// Format version written in the header
pub const VERSION: u16 = 0;
/// Header size in bytes
pub const HEADER_LEN: usize = 32;
/// Chunk frame size before the payload
pub const CHUNK_HEADER_LEN: usize = 16;
/// Payload of the `END` chunk
pub const END_MARKER: &[u8] = b"</roblox>";

/// Chunk names
pub mod chunk {
    /// Metadata
    pub const META: &str = "META";
    /// Shared strings
    pub const SSTR: &str = "SSTR";
    /// Class instances
    pub const INST: &str = "INST";
    /// Property column
    pub const PROP: &str = "PROP";
    /// Parent links
    pub const PRNT: &str = "PRNT";
    /// Terminator
    pub const END: &str = "END";
}

/// Whether a row-major rotation is written with the identity shortcut
pub fn is_identity_rotation(rotation: &[f32; 9]) -> bool {
    CFrame::new(Vector3::zero(), *rotation).is_identity_rotation()
}

/// Encode `tree` into the binary place format
pub fn write_binary(tree: &InstanceTree, config: &BinaryConfig) -> Result<Vec<u8>> {
    let groups = tree.class_groups();
    let mut out = ByteWriter::with_capacity(config.initial_capacity());

    out.write_bytes(&MAGIC);
    out.write_bytes(&SIGNATURE);
    out.write_u16_le(VERSION);
    out.write_u32_le(groups.len() as u32);
    out.write_u32_le(tree.len() as u32);
    out.write_bytes(&[0u8; 8]);

    write_meta(&mut out, config)?;
    write_sstr(&mut out);

    for group in &groups {
        write_inst(&mut out, group)?;
    }

    for group in &groups {
        let names: Vec<Value> = group
            .instances
            .iter()
            .map(|inst| Value::String(inst.name.clone()))
            .collect();
        write_prop(&mut out, group, "Name", ValueType::String, &names)?;

        for spec in class_properties(group.class_name) {
            let values: Vec<Value> = group
                .instances
                .iter()
                .map(|inst| inst.property_or_default(spec))
                .collect();
            write_prop(&mut out, group, spec.name, spec.value_type, &values)?;
        }
    }

    write_prnt(&mut out, tree);
    write_chunk(&mut out, chunk::END, END_MARKER);

    log::debug!(
        "Encoded {} instances in {} classes ({} bytes)",
        tree.len(),
        groups.len(),
        out.len()
    );
    Ok(out.into_inner())
}

/// Frame `payload` as an uncompressed chunk
fn write_chunk(out: &mut ByteWriter, name: &str, payload: &[u8]) {
    let mut tag = [0u8; 4];
    let bytes = name.as_bytes();
    let len = bytes.len().min(4);
    tag[..len].copy_from_slice(&bytes[..len]);

    out.write_bytes(&tag);
    out.write_u32_le(0);
    out.write_u32_le(payload.len() as u32);
    out.write_u32_le(0);
    out.write_bytes(payload);

    log::debug!("Wrote {} chunk ({} bytes)", name, payload.len());
}

fn write_meta(out: &mut ByteWriter, config: &BinaryConfig) -> Result<()> {
    let mut body = ByteWriter::default();
    body.write_u32_le(config.metadata().len() as u32);
    for (key, value) in config.metadata() {
        body.write_string(key)?;
        body.write_string(value)?;
    }
    write_chunk(out, chunk::META, &body.into_inner());
    Ok(())
}

fn write_sstr(out: &mut ByteWriter) {
    let mut body = ByteWriter::default();
    body.write_u32_le(0); // version
    body.write_u32_le(0); // count
    write_chunk(out, chunk::SSTR, &body.into_inner());
}

fn write_inst(out: &mut ByteWriter, group: &ClassGroup<'_>) -> Result<()> {
    let service = is_service(group.class_name);

    let mut body = ByteWriter::default();
    body.write_u32_le(group.class_id);
    body.write_string(group.class_name)?;
    body.write_u8(u8::from(service));
    body.write_u32_le(group.instances.len() as u32);

    let referents: Vec<i32> = group.instances.iter().map(|inst| inst.id as i32).collect();
    body.write_interleaved(&delta_encode(&referents));

    if service {
        body.write_bytes(&vec![1u8; group.instances.len()]);
    }

    write_chunk(out, chunk::INST, &body.into_inner());
    Ok(())
}

fn write_prop(
    out: &mut ByteWriter,
    group: &ClassGroup<'_>,
    property: &str,
    value_type: ValueType,
    values: &[Value],
) -> Result<()> {
    let mut body = ByteWriter::default();
    body.write_u32_le(group.class_id);
    body.write_string(property)?;
    body.write_u8(value_type.type_id());
    props::write_column(&mut body, property, value_type, values)?;

    write_chunk(out, chunk::PROP, &body.into_inner());
    Ok(())
}

fn write_prnt(out: &mut ByteWriter, tree: &InstanceTree) {
    let children: Vec<i32> = tree.iter().map(|inst| inst.id as i32).collect();
    let parents: Vec<i32> = tree.iter().map(|inst| inst.parent_referent()).collect();

    let mut body = ByteWriter::default();
    body.write_u8(0); // version
    body.write_u32_le(tree.len() as u32);
    body.write_interleaved(&delta_encode(&children));
    body.write_interleaved(&delta_encode(&parents));

    write_chunk(out, chunk::PRNT, &body.into_inner());
}
