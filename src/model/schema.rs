//! Fixed class knowledge: service names and per-class property sets

use super::value::{CFrame, Color3, PartShape, Value, ValueType, Vector3};

/// Top-level containers recognised by name rather than by kind
pub const SERVICE_NAMES: [&str; 12] = [
    "Workspace",
    "Lighting",
    "ReplicatedStorage",
    "ServerScriptService",
    "ServerStorage",
    "StarterGui",
    "StarterPack",
    "Teams",
    "SoundService",
    "Chat",
    "Players",
    "ReplicatedFirst",
];

/// Class name of the generic container
pub const FOLDER_CLASS: &str = "Folder";

/// Whether `name` is one of the well-known services
pub fn is_service(name: &str) -> bool {
    SERVICE_NAMES.contains(&name)
}

/// Whether `class_name` is a physical part
pub fn is_part_class(class_name: &str) -> bool {
    matches!(class_name, "Part" | "SpawnLocation")
}

/// One entry of a class's fixed property set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySpec {
    /// Property name
    pub name: &'static str,
    /// Tag every value of this property carries
    pub value_type: ValueType,
}

impl PropertySpec {
    const fn new(name: &'static str, value_type: ValueType) -> Self {
        Self { name, value_type }
    }

    /// Value used when an instance has no entry for this property
    pub fn default_value(&self) -> Value {
        match (self.name, self.value_type) {
            ("CanCollide", _) => Value::Bool(true),
            ("Size", _) => Value::Vector3(Vector3::new(4.0, 1.0, 2.0)),
            ("Shape", _) => Value::Enum(PartShape::Block.token()),
            (_, ValueType::String) => Value::String(String::new()),
            (_, ValueType::Bool) => Value::Bool(false),
            (_, ValueType::Int32) => Value::Int32(0),
            (_, ValueType::Float32) => Value::Float32(0.0),
            (_, ValueType::Color3) => Value::Color3(Color3::mid_gray()),
            (_, ValueType::Vector3) => Value::Vector3(Vector3::zero()),
            (_, ValueType::Enum) => Value::Enum(0),
            (_, ValueType::CFrame) => Value::CFrame(CFrame::default()),
        }
    }
}

const PART_PROPERTIES: &[PropertySpec] = &[
    PropertySpec::new("Anchored", ValueType::Bool),
    PropertySpec::new("CanCollide", ValueType::Bool),
    PropertySpec::new("Locked", ValueType::Bool),
    PropertySpec::new("Transparency", ValueType::Float32),
    PropertySpec::new("Size", ValueType::Vector3),
    PropertySpec::new("Color", ValueType::Color3),
    PropertySpec::new("CFrame", ValueType::CFrame),
    PropertySpec::new("Shape", ValueType::Enum),
];

const SCRIPT_PROPERTIES: &[PropertySpec] = &[PropertySpec::new("Source", ValueType::String)];

/// Class-specific properties in encoding order, not counting `Name`
///
/// Classes without a fixed set return an empty slice.
pub fn class_properties(class_name: &str) -> &'static [PropertySpec] {
    match class_name {
        "Part" | "SpawnLocation" => PART_PROPERTIES,
        "Script" => SCRIPT_PROPERTIES,
        _ => &[],
    }
}

/// Look up the fixed spec for `(class_name, property)`, if there is one
pub fn property_spec(class_name: &str, property: &str) -> Option<&'static PropertySpec> {
    class_properties(class_name)
        .iter()
        .find(|spec| spec.name == property)
}

/// Default properties injected for services at extraction time
pub fn service_defaults(class_name: &str) -> Vec<(&'static str, Value)> {
    let ambient = Color3::new(0.2745, 0.2745, 0.2745);
    match class_name {
        "Lighting" => vec![
            ("Ambient", Value::Color3(ambient)),
            ("Brightness", Value::Float32(3.0)),
            ("OutdoorAmbient", Value::Color3(ambient)),
            ("GlobalShadows", Value::Bool(true)),
            ("TimeOfDay", Value::String("14:30:00".to_string())),
            ("Technology", Value::Enum(3)),
        ],
        "StarterGui" => vec![
            ("ResetPlayerGuiOnSpawn", Value::Bool(true)),
            ("ShowDevelopmentGui", Value::Bool(true)),
            ("ScreenOrientation", Value::Enum(2)),
        ],
        "Players" => vec![("CharacterAutoLoads", Value::Bool(true))],
        _ => Vec::new(),
    }
}
