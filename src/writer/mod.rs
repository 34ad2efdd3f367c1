//! XML writing for `.rbxlx` place files
//!
//! This module serializes an [`InstanceTree`] into the XML place format:
//! a `roblox` envelope, one `Item` per top-level instance (children nested
//! inside their parent), then a few fixed services the format expects.

mod items;

use crate::config::XmlConfig;
use crate::error::{Error, Result};
use crate::model::InstanceTree;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use std::io::Write as IoWrite;

pub use items::{MATERIAL_TOKEN, cdata_sections};

/// Format version written on the root element
pub const XML_FORMAT_VERSION: &str = "4";

/// Services appended after the tree, with their single boolean setting
const STATIC_SERVICES: [(&str, Option<(&str, bool)>); 3] = [
    ("StarterPlayer", None),
    ("HttpService", Some(("HttpEnabled", false))),
    ("TestService", Some(("Is30FpsThrottleEnabled", true))),
];

/// Serialize `tree` to an XML place document
pub fn write_xml(tree: &InstanceTree, config: &XmlConfig) -> Result<String> {
    let mut buffer = Vec::new();
    write_place_xml(tree, config, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| Error::xml_write(format!("Generated document is not UTF-8: {}", e)))
}

/// Write an XML place document for `tree` into `writer`
pub fn write_place_xml<W: IoWrite>(tree: &InstanceTree, config: &XmlConfig, writer: W) -> Result<()> {
    let mut xml_writer = match config.indent() {
        Some(width) => Writer::new_with_indent(writer, b' ', width),
        None => Writer::new(writer),
    };

    let mut root = BytesStart::new("roblox");
    root.push_attribute(("xmlns:xmime", "http://www.w3.org/2005/05/xmlmime"));
    root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
    root.push_attribute((
        "xsi:noNamespaceSchemaLocation",
        "http://www.roblox.com/roblox.xsd",
    ));
    root.push_attribute(("version", XML_FORMAT_VERSION));

    xml_writer
        .write_event(Event::Start(root))
        .map_err(|e| Error::xml_write(format!("Failed to write roblox element: {}", e)))?;

    for external in ["null", "nil"] {
        items::write_text_element(&mut xml_writer, "External", None, external)?;
    }

    for &root_id in tree.roots() {
        items::write_item(&mut xml_writer, tree, tree.instance(root_id)?)?;
    }

    if config.static_services() {
        for (class_name, setting) in STATIC_SERVICES {
            write_static_service(&mut xml_writer, class_name, setting)?;
        }
    }

    xml_writer
        .write_event(Event::End(BytesEnd::new("roblox")))
        .map_err(|e| Error::xml_write(format!("Failed to close roblox element: {}", e)))?;

    log::debug!("Wrote XML for {} instances", tree.len());
    Ok(())
}

/// Write one of the fixed services that are not part of the editor's tree
fn write_static_service<W: IoWrite>(
    writer: &mut Writer<W>,
    class_name: &str,
    setting: Option<(&str, bool)>,
) -> Result<()> {
    let referent = items::new_referent();
    let mut item = BytesStart::new("Item");
    item.push_attribute(("class", class_name));
    item.push_attribute(("referent", referent.as_str()));

    writer
        .write_event(Event::Start(item))
        .map_err(|e| Error::xml_write(format!("Failed to write {} item: {}", class_name, e)))?;
    writer
        .write_event(Event::Start(BytesStart::new("Properties")))
        .map_err(|e| Error::xml_write(format!("Failed to write Properties element: {}", e)))?;

    items::write_text_element(writer, "string", Some("Name"), class_name)?;
    items::write_unique_id(writer)?;
    if let Some((name, value)) = setting {
        items::write_text_element(writer, "bool", Some(name), items::bool_text(value))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("Properties")))
        .map_err(|e| Error::xml_write(format!("Failed to close Properties element: {}", e)))?;
    writer
        .write_event(Event::End(BytesEnd::new("Item")))
        .map_err(|e| Error::xml_write(format!("Failed to close {} item: {}", class_name, e)))?;

    Ok(())
}
