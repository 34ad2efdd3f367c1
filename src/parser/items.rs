//! Reader for `Item` and `Properties` elements
//!
//! Each top-level item is read whole into a `RawItem` tree first, so an
//! item's name is known before its children are turned into instructions
//! regardless of where `Properties` sits among them.

use crate::config::ImportConfig;
use crate::error::{Error, Result};
use crate::model::schema::is_part_class;
use crate::model::{CFrame, Color3, Quaternion, Vector3};
use nalgebra::{Matrix3, Rotation3, UnitQuaternion};
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart, Event};

use super::{ImportInstruction, PartOptions};

/// One element inside `Properties`
#[derive(Debug, Default)]
struct RawProperty {
    tag: String,
    name: String,
    text: String,
    components: Vec<(String, String)>,
}

impl RawProperty {
    fn component(&self, key: &str) -> Option<&str> {
        self.components
            .iter()
            .find_map(|(k, v)| if k == key { Some(v.as_str()) } else { None })
    }
}

/// The `Properties` block of one item
#[derive(Debug, Default)]
struct PropertyBag {
    properties: Vec<RawProperty>,
}

impl PropertyBag {
    /// First property with this tag and name
    fn find(&self, tag: &str, name: &str) -> Option<&RawProperty> {
        self.properties
            .iter()
            .find(|p| p.tag == tag && p.name == name)
    }

    fn string(&self, name: &str) -> Option<&str> {
        self.find("string", name).map(|p| p.text.as_str())
    }

    /// `true` only for the text "true" in any case; `default` when absent
    fn bool_or(&self, name: &str, default: bool) -> bool {
        self.find("bool", name)
            .map_or(default, |p| p.text.trim().eq_ignore_ascii_case("true"))
    }
}

/// One `Item` with its subtree, before any instructions are derived from it
#[derive(Debug, Default)]
struct RawItem {
    class_name: String,
    /// `None` when the item had no `Properties` block
    properties: Option<PropertyBag>,
    children: Vec<RawItem>,
}

impl RawItem {
    /// `Name` property, the class name when missing or empty
    fn name(&self, properties: &PropertyBag) -> String {
        properties
            .string("Name")
            .filter(|name| !name.is_empty())
            .unwrap_or(self.class_name.as_str())
            .to_string()
    }
}

fn unexpected_eof(element: &str) -> Error {
    Error::invalid_xml_element(element, "document ended before the element was closed")
}

fn element_name(e: &BytesStart<'_>) -> Result<String> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .map_err(|err| Error::InvalidXml(err.to_string()))
}

/// Unescaped value of attribute `key`, if present
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            let raw =
                std::str::from_utf8(&attr.value).map_err(|err| Error::InvalidXml(err.to_string()))?;
            let value = unescape(raw).map_err(|err| Error::InvalidXml(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn resolve_reference(r: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = r
        .resolve_char_ref()
        .map_err(|err| Error::InvalidXml(err.to_string()))?
    {
        return Ok(ch.to_string());
    }
    let name = r.decode().map_err(|err| Error::InvalidXml(err.to_string()))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidXml(format!("Unknown entity reference '&{};'", name)))
}

/// Append a character-data event to `text`; returns false for other events
fn append_text(event: &Event<'_>, text: &mut String) -> Result<bool> {
    match event {
        Event::Text(t) => {
            let value = t.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
            text.push_str(&value);
        }
        Event::CData(c) => {
            let value = std::str::from_utf8(c).map_err(|e| Error::InvalidXml(e.to_string()))?;
            text.push_str(value);
        }
        Event::GeneralRef(r) => text.push_str(&resolve_reference(r)?),
        _ => return Ok(false),
    }
    Ok(true)
}

/// Character data up to the end of the current element; nested elements are ignored
fn read_text(reader: &mut Reader<&[u8]>, element: &str) -> Result<String> {
    let mut text = String::new();
    loop {
        let event = reader.read_event()?;
        if append_text(&event, &mut text)? {
            continue;
        }
        match event {
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(unexpected_eof(element)),
            _ => {}
        }
    }
}

/// Text and child elements of one property element
fn read_property(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<RawProperty> {
    let tag = element_name(start)?;
    let mut property = RawProperty {
        name: attribute(start, b"name")?.unwrap_or_default(),
        ..RawProperty::default()
    };

    loop {
        let event = reader.read_event()?;
        if append_text(&event, &mut property.text)? {
            continue;
        }
        match event {
            Event::Start(e) => {
                let key = element_name(&e)?;
                let value = read_text(reader, &key)?;
                property.components.push((key, value));
            }
            Event::Empty(e) => property.components.push((element_name(&e)?, String::new())),
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof(&tag)),
            _ => {}
        }
    }

    property.tag = tag;
    Ok(property)
}

fn read_property_bag(reader: &mut Reader<&[u8]>) -> Result<PropertyBag> {
    let mut bag = PropertyBag::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => bag.properties.push(read_property(reader, &e)?),
            Event::Empty(e) => bag.properties.push(RawProperty {
                tag: element_name(&e)?,
                name: attribute(&e, b"name")?.unwrap_or_default(),
                ..RawProperty::default()
            }),
            Event::End(_) => return Ok(bag),
            Event::Eof => return Err(unexpected_eof("Properties")),
            _ => {}
        }
    }
}

/// Read the rest of an `Item` whose start tag was just consumed
///
/// `Properties` and child items may appear in any order; a second
/// `Properties` block is ignored.
fn read_item(
    reader: &mut Reader<&[u8]>,
    config: &ImportConfig,
    class_name: String,
    depth: usize,
) -> Result<RawItem> {
    let mut item = RawItem {
        class_name,
        ..RawItem::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"Properties" => {
                if item.properties.is_some() {
                    reader.read_to_end(e.name())?;
                } else {
                    item.properties = Some(read_property_bag(reader)?);
                }
            }
            Event::Empty(e) if e.name().as_ref() == b"Properties" => {
                item.properties.get_or_insert_with(PropertyBag::default);
            }
            Event::Start(e) if e.name().as_ref() == b"Item" => {
                if depth + 1 > config.max_depth() {
                    return Err(Error::invalid_xml_element(
                        "Item",
                        &format!("nested deeper than {} levels", config.max_depth()),
                    ));
                }
                let child_class = attribute(&e, b"class")?.unwrap_or_default();
                let child = read_item(reader, config, child_class, depth + 1)?;
                item.children.push(child);
            }
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => return Ok(item),
            Event::Eof => return Err(unexpected_eof("Item")),
            _ => {}
        }
    }
}

/// Walk the children of `<roblox>`
pub(super) fn read_root(
    reader: &mut Reader<&[u8]>,
    config: &ImportConfig,
    out: &mut Vec<ImportInstruction>,
) -> Result<()> {
    let mut items = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"Item" => {
                items += 1;
                let class_name = attribute(&e, b"class")?.unwrap_or_default();
                let container = read_item(reader, config, class_name, 1)?;
                emit_container(&container, config, out)?;
            }
            Event::Empty(e) if e.name().as_ref() == b"Item" => items += 1,
            Event::Start(e) => {
                reader.read_to_end(e.name())?;
            }
            Event::End(_) => break,
            Event::Eof => return Err(unexpected_eof("roblox")),
            _ => {}
        }
    }

    if items == 0 {
        log::warn!("No items found in the file");
    }
    Ok(())
}

/// Emit the children of a top-level item if its name is a known container
fn emit_container(
    container: &RawItem,
    config: &ImportConfig,
    out: &mut Vec<ImportInstruction>,
) -> Result<()> {
    let Some(properties) = &container.properties else {
        return Ok(());
    };
    let name = properties.string("Name").unwrap_or_default();

    if !config.is_known_container(name) {
        log::warn!("Skipping unknown top-level container '{}'", name);
        return Ok(());
    }

    for child in &container.children {
        emit_item(child, name, out)?;
    }
    Ok(())
}

/// Emit the instruction for `item`, then for its descendants
fn emit_item(item: &RawItem, parent_name: &str, out: &mut Vec<ImportInstruction>) -> Result<()> {
    let Some(properties) = &item.properties else {
        log::debug!("Skipping {} item without Properties", item.class_name);
        return Ok(());
    };
    let name = item.name(properties);

    if is_part_class(&item.class_name) {
        out.push(ImportInstruction::CreatePart(part_options(
            &item.class_name,
            &name,
            properties,
        )?));
    } else if item.class_name == "Script" {
        let source = properties
            .find("ProtectedString", "Source")
            .map(|p| p.text.clone())
            .unwrap_or_default();
        out.push(ImportInstruction::CreateScript {
            name: name.clone(),
            source,
            parent_name: parent_name.to_string(),
        });
    }

    for child in &item.children {
        emit_item(child, &name, out)?;
    }
    Ok(())
}

fn parse_f32(field: &str, text: Option<&str>, default: f32) -> Result<f32> {
    match text.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<f32>()
            .map_err(|_| Error::parse_error_with_context(field, value, "floating-point number")),
    }
}

fn vector_components(field: &str, property: &RawProperty, default: f32) -> Result<Vector3> {
    Ok(Vector3::new(
        parse_f32(&format!("{} X", field), property.component("X"), default)?,
        parse_f32(&format!("{} Y", field), property.component("Y"), default)?,
        parse_f32(&format!("{} Z", field), property.component("Z"), default)?,
    ))
}

fn part_color(properties: &PropertyBag) -> Result<Color3> {
    if let Some(color) = properties.find("Color3", "Color") {
        let mid = Color3::mid_gray();
        return Ok(Color3::new(
            parse_f32("Color R", color.component("R"), mid.r)?,
            parse_f32("Color G", color.component("G"), mid.g)?,
            parse_f32("Color B", color.component("B"), mid.b)?,
        ));
    }

    if let Some(packed) = properties.find("Color3uint8", "Color3uint8") {
        let text = packed.text.trim();
        let value = text
            .parse::<u32>()
            .map_err(|_| Error::parse_error_with_context("Color3uint8", text, "unsigned integer"))?;
        return Ok(Color3::from_packed_argb(value));
    }

    Ok(Color3::mid_gray())
}

fn part_cframe(properties: &PropertyBag) -> Result<CFrame> {
    const ROTATION_TAGS: [&str; 9] = [
        "R00", "R01", "R02", "R10", "R11", "R12", "R20", "R21", "R22",
    ];

    let Some(node) = properties.find("CoordinateFrame", "CFrame") else {
        return Ok(CFrame::default());
    };

    let position = vector_components("CFrame", node, 0.0)?;
    let mut rotation = CFrame::IDENTITY_ROTATION;
    for (slot, tag) in rotation.iter_mut().zip(ROTATION_TAGS) {
        *slot = parse_f32(&format!("CFrame {}", tag), node.component(tag), *slot)?;
    }
    Ok(CFrame::new(position, rotation))
}

fn part_options(class_name: &str, name: &str, properties: &PropertyBag) -> Result<PartOptions> {
    let (position, orientation) = decompose_transform(&part_cframe(properties)?);

    let size = match properties
        .find("Vector3", "size")
        .or_else(|| properties.find("Vector3", "Size"))
    {
        Some(node) => vector_components("size", node, 0.0)?,
        None => Vector3::zero(),
    };

    Ok(PartOptions {
        class_name: class_name.to_string(),
        name: name.to_string(),
        position,
        orientation,
        size,
        color: part_color(properties)?,
        anchored: properties.bool_or("Anchored", false),
        can_collide: properties.bool_or("CanCollide", true),
        locked: properties.bool_or("Locked", false),
    })
}

/// Split a transform into position and orientation, discarding scale
///
/// Scale is the length of each rotation column, negated on X when the
/// matrix is a reflection. Whatever remains after dividing it out is
/// projected onto the nearest rotation, so skewed input loses its skew.
pub fn decompose_transform(cframe: &CFrame) -> (Vector3, Quaternion) {
    let mut m = Matrix3::from_row_slice(&cframe.rotation);

    let mut scale = [m.column(0).norm(), m.column(1).norm(), m.column(2).norm()];
    if m.determinant() < 0.0 {
        scale[0] = -scale[0];
    }
    for (col, s) in scale.into_iter().enumerate() {
        if s != 0.0 && s.is_finite() {
            for row in 0..3 {
                m[(row, col)] /= s;
            }
        }
    }

    let rotation = Rotation3::from_matrix(&m);
    let orientation = Quaternion::from_unit(&UnitQuaternion::from_rotation_matrix(&rotation));
    (cframe.position, orientation)
}
