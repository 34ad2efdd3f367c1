//! `Item` elements and their typed property tags

use crate::error::{Error, Result};
use crate::model::schema::{class_properties, is_part_class, property_spec};
use crate::model::{CFrame, Instance, InstanceTree, Value};
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Write as IoWrite;
use uuid::Uuid;

/// `Material` token written on every part (plastic)
pub const MATERIAL_TOKEN: u32 = 256;

/// Order in which part properties appear inside `Properties`
const PART_PROPERTY_ORDER: [&str; 8] = [
    "Anchored",
    "CFrame",
    "Size",
    "Color",
    "CanCollide",
    "Locked",
    "Transparency",
    "Shape",
];

/// A fresh 36-character referent token
pub(super) fn new_referent() -> String {
    Uuid::new_v4().hyphenated().to_string().to_uppercase()
}

/// A fresh 32-hex-digit `UniqueId` value
fn new_unique_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub(super) fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Split script source into CDATA-safe sections
///
/// A CDATA section cannot contain `]]>`, so the text is cut between `]]`
/// and `>`; the sections concatenate back to the input.
pub fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

/// Write `<tag name="...">text</tag>`, or `<tag>text</tag>` without a name
pub(super) fn write_text_element<W: IoWrite>(
    writer: &mut Writer<W>,
    tag: &str,
    name: Option<&str>,
    text: &str,
) -> Result<()> {
    let mut elem = BytesStart::new(tag);
    if let Some(name) = name {
        elem.push_attribute(("name", name));
    }

    writer
        .write_event(Event::Start(elem))
        .map_err(|e| Error::xml_write(format!("Failed to write {} element: {}", tag, e)))?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| Error::xml_write(format!("Failed to write {} value: {}", tag, e)))?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(|e| Error::xml_write(format!("Failed to close {} element: {}", tag, e)))?;

    Ok(())
}

/// Write a named element whose value is a list of numeric child elements
fn write_components<W: IoWrite>(
    writer: &mut Writer<W>,
    tag: &str,
    name: &str,
    components: &[(&str, f32)],
) -> Result<()> {
    let mut elem = BytesStart::new(tag);
    elem.push_attribute(("name", name));

    writer
        .write_event(Event::Start(elem))
        .map_err(|e| Error::xml_write(format!("Failed to write {} element: {}", tag, e)))?;

    for (component, value) in components {
        write_text_element(writer, component, None, &value.to_string())?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(|e| Error::xml_write(format!("Failed to close {} element: {}", tag, e)))?;

    Ok(())
}

fn write_cframe<W: IoWrite>(writer: &mut Writer<W>, name: &str, cf: &CFrame) -> Result<()> {
    const ROTATION_TAGS: [&str; 9] = [
        "R00", "R01", "R02", "R10", "R11", "R12", "R20", "R21", "R22",
    ];

    let mut components = vec![
        ("X", cf.position.x),
        ("Y", cf.position.y),
        ("Z", cf.position.z),
    ];
    components.extend(ROTATION_TAGS.into_iter().zip(cf.rotation));

    write_components(writer, "CoordinateFrame", name, &components)
}

/// Script source as CDATA sections
///
/// The element is written in one piece so the indenting writer cannot put
/// whitespace around the sections, which would change the source.
fn write_protected_string<W: IoWrite>(writer: &mut Writer<W>, name: &str, source: &str) -> Result<()> {
    let mut element = format!("<ProtectedString name=\"{}\">", escape(name));
    for section in cdata_sections(source) {
        element.push_str("<![CDATA[");
        element.push_str(section);
        element.push_str("]]>");
    }
    element.push_str("</ProtectedString>");

    writer
        .write_indent()
        .map_err(|e| Error::xml_write(format!("Failed to write ProtectedString element: {}", e)))?;
    writer
        .get_mut()
        .write_all(element.as_bytes())
        .map_err(|e| Error::xml_write(format!("Failed to write script source: {}", e)))?;

    Ok(())
}

pub(super) fn write_unique_id<W: IoWrite>(writer: &mut Writer<W>) -> Result<()> {
    write_text_element(writer, "UniqueId", Some("UniqueId"), &new_unique_id())
}

/// Write a property under its own name, the tag chosen by the value type
fn write_value<W: IoWrite>(writer: &mut Writer<W>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::String(s) => write_text_element(writer, "string", Some(name), s),
        Value::Bool(b) => write_text_element(writer, "bool", Some(name), bool_text(*b)),
        Value::Int32(i) => write_text_element(writer, "int", Some(name), &i.to_string()),
        Value::Float32(f) => write_text_element(writer, "float", Some(name), &f.to_string()),
        Value::Enum(token) => write_text_element(writer, "token", Some(name), &token.to_string()),
        Value::Color3(c) => {
            write_components(writer, "Color3", name, &[("R", c.r), ("G", c.g), ("B", c.b)])
        }
        Value::Vector3(v) => {
            write_components(writer, "Vector3", name, &[("X", v.x), ("Y", v.y), ("Z", v.z)])
        }
        Value::CFrame(cf) => write_cframe(writer, name, cf),
    }
}

/// Parts use the place format's own names for size, colour and shape
fn write_part_properties<W: IoWrite>(writer: &mut Writer<W>, instance: &Instance) -> Result<()> {
    for name in PART_PROPERTY_ORDER {
        let Some(spec) = property_spec(&instance.class_name, name) else {
            continue;
        };
        let value = instance.property_or_default(spec);
        match (name, &value) {
            ("Size", Value::Vector3(v)) => {
                write_components(writer, "Vector3", "size", &[("X", v.x), ("Y", v.y), ("Z", v.z)])?
            }
            ("Color", Value::Color3(c)) => write_text_element(
                writer,
                "Color3uint8",
                Some("Color3uint8"),
                &c.to_packed_argb().to_string(),
            )?,
            ("Shape", Value::Enum(token)) => {
                write_text_element(writer, "token", Some("shape"), &token.to_string())?
            }
            _ => write_value(writer, name, &value)?,
        }
    }

    write_text_element(writer, "token", Some("Material"), &MATERIAL_TOKEN.to_string())
}

/// Write `instance` and, nested inside it, all of its descendants
pub(super) fn write_item<W: IoWrite>(
    writer: &mut Writer<W>,
    tree: &InstanceTree,
    instance: &Instance,
) -> Result<()> {
    let referent = new_referent();
    let mut item = BytesStart::new("Item");
    item.push_attribute(("class", instance.class_name.as_str()));
    item.push_attribute(("referent", referent.as_str()));

    writer
        .write_event(Event::Start(item))
        .map_err(|e| Error::xml_write(format!("Failed to write Item element: {}", e)))?;
    writer
        .write_event(Event::Start(BytesStart::new("Properties")))
        .map_err(|e| Error::xml_write(format!("Failed to write Properties element: {}", e)))?;

    write_text_element(writer, "string", Some("Name"), &instance.name)?;

    let part = is_part_class(&instance.class_name);
    if part {
        write_part_properties(writer, instance)?;
    }

    let fixed = class_properties(&instance.class_name);
    for (name, value) in instance.properties.iter() {
        let is_fixed = fixed.iter().any(|spec| spec.name == name);
        if part && is_fixed {
            continue;
        }
        match value {
            Value::String(source) if instance.class_name == "Script" && name == "Source" => {
                write_protected_string(writer, name, source)?
            }
            _ => write_value(writer, name, value)?,
        }
    }

    write_unique_id(writer)?;

    writer
        .write_event(Event::End(BytesEnd::new("Properties")))
        .map_err(|e| Error::xml_write(format!("Failed to close Properties element: {}", e)))?;

    for &child in &instance.children {
        write_item(writer, tree, tree.instance(child)?)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("Item")))
        .map_err(|e| Error::xml_write(format!("Failed to close Item element: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color3, Vector3};

    fn render(tree: &InstanceTree, id: u32) -> String {
        let mut writer = Writer::new(Vec::new());
        write_item(&mut writer, tree, tree.instance(id).unwrap()).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_cdata_sections() {
        assert_eq!(cdata_sections("print(1)"), vec!["print(1)"]);
        assert_eq!(cdata_sections(""), vec![""]);
        assert_eq!(cdata_sections("a]]>b"), vec!["a]]", ">b"]);
        assert_eq!(cdata_sections("]]>]]>").concat(), "]]>]]>");
    }

    #[test]
    fn test_script_source_in_cdata() {
        let mut tree = InstanceTree::new();
        let script = tree.add_instance("Script", "Main", None).unwrap();
        tree.set_property(script, "Source", Value::from("if a < b then x = t[\"]]>\"] end"))
            .unwrap();

        let xml = render(&tree, script);
        assert!(xml.contains(
            "<ProtectedString name=\"Source\"><![CDATA[if a < b then x = t[\"]]]]>\
             <![CDATA[>\"] end]]></ProtectedString>"
        ));
    }

    #[test]
    fn test_non_part_color_uses_components() {
        let mut tree = InstanceTree::new();
        let lighting = tree.add_instance("Lighting", "Lighting", None).unwrap();
        tree.set_property(lighting, "Ambient", Value::Color3(Color3::new(0.2745, 0.2745, 0.2745)))
            .unwrap();
        tree.set_property(lighting, "Technology", Value::Enum(3)).unwrap();
        tree.set_property(lighting, "TimeOfDay", Value::from("14:30:00")).unwrap();

        let xml = render(&tree, lighting);
        assert!(xml.contains(
            "<Color3 name=\"Ambient\"><R>0.2745</R><G>0.2745</G><B>0.2745</B></Color3>"
        ));
        assert!(xml.contains("<token name=\"Technology\">3</token>"));
        assert!(xml.contains("<string name=\"TimeOfDay\">14:30:00</string>"));
    }

    #[test]
    fn test_part_property_order() {
        let mut tree = InstanceTree::new();
        let part = tree.add_instance("SpawnLocation", "Spawn", None).unwrap();
        tree.set_property(part, "Size", Value::Vector3(Vector3::new(6.0, 1.0, 6.0)))
            .unwrap();

        let xml = render(&tree, part);
        let order: Vec<usize> = [
            "name=\"Name\"",
            "name=\"Anchored\"",
            "name=\"CFrame\"",
            "name=\"size\"",
            "name=\"Color3uint8\"",
            "name=\"CanCollide\"",
            "name=\"Locked\"",
            "name=\"Transparency\"",
            "name=\"shape\"",
            "name=\"Material\"",
            "name=\"UniqueId\"",
        ]
        .iter()
        .map(|needle| xml.find(needle).unwrap())
        .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(xml.matches("name=\"size\"").count(), 1);
        assert!(!xml.contains("name=\"Size\""));
    }

    #[test]
    fn test_name_is_escaped() {
        let mut tree = InstanceTree::new();
        let folder = tree.add_instance("Folder", "A & <B>", None).unwrap();
        let xml = render(&tree, folder);
        assert!(xml.contains("<string name=\"Name\">A &amp; &lt;B&gt;</string>"));
    }
}
