//! Typed property values

use nalgebra::{Matrix3, Rotation3, UnitQuaternion};

/// Tolerance used when deciding whether a rotation is the identity
pub const IDENTITY_TOLERANCE: f32 = 1e-4;

/// A 3-component vector
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vector3 {
    /// Create a new vector
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// An RGB colour with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color3 {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
}

impl Color3 {
    /// Create a new colour
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Neutral mid-gray, used when no colour is known
    pub const fn mid_gray() -> Self {
        Self::new(0.5, 0.5, 0.5)
    }

    /// Pack into a `Color3uint8` value: `0xFF` alpha in the high byte,
    /// then one byte each for red, green and blue
    pub fn to_packed_argb(&self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        0xFF00_0000 | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Unpack a `Color3uint8` value, ignoring the alpha byte
    pub fn from_packed_argb(packed: u32) -> Self {
        let channel = |shift: u32| ((packed >> shift) & 0xFF) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }
}

/// Rotation as a unit quaternion (`w` is the scalar part)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// X component of the vector part
    pub x: f32,
    /// Y component of the vector part
    pub y: f32,
    /// Z component of the vector part
    pub z: f32,
    /// Scalar part
    pub w: f32,
}

impl Quaternion {
    /// Create a quaternion from its components
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    pub(crate) fn from_unit(q: &UnitQuaternion<f32>) -> Self {
        Self::new(q.i, q.j, q.k, q.w)
    }

    pub(crate) fn to_unit(self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(self.w, self.x, self.y, self.z))
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

/// A rigid transform: position plus a 3x3 rotation stored row-major
/// (`R00 R01 R02 R10 … R22`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CFrame {
    /// Translation
    pub position: Vector3,
    /// Row-major rotation matrix
    pub rotation: [f32; 9],
}

impl CFrame {
    /// Identity rotation matrix, row-major
    pub const IDENTITY_ROTATION: [f32; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

    /// Create a transform from a position and a row-major rotation
    pub const fn new(position: Vector3, rotation: [f32; 9]) -> Self {
        Self { position, rotation }
    }

    /// A pure translation
    pub const fn from_position(position: Vector3) -> Self {
        Self::new(position, Self::IDENTITY_ROTATION)
    }

    /// Build a transform from a position and an orientation quaternion
    pub fn from_position_quaternion(position: Vector3, orientation: Quaternion) -> Self {
        let m = orientation.to_unit().to_rotation_matrix().into_inner();
        let mut rotation = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                rotation[row * 3 + col] = m[(row, col)];
            }
        }
        Self::new(position, rotation)
    }

    /// Rotation component at `(row, col)`
    pub fn r(&self, row: usize, col: usize) -> f32 {
        self.rotation[row * 3 + col]
    }

    /// True when every diagonal component is within [`IDENTITY_TOLERANCE`]
    /// of 1 and every off-diagonal component is within it of 0
    pub fn is_identity_rotation(&self) -> bool {
        self.rotation.iter().enumerate().all(|(i, &v)| {
            let expected = if i % 4 == 0 { 1.0 } else { 0.0 };
            (v - expected).abs() < IDENTITY_TOLERANCE
        })
    }

    /// Orientation as a quaternion, projecting onto the nearest rotation
    pub fn orientation(&self) -> Quaternion {
        let m = Matrix3::from_row_slice(&self.rotation);
        let rot = Rotation3::from_matrix(&m);
        Quaternion::from_unit(&UnitQuaternion::from_rotation_matrix(&rot))
    }
}

impl Default for CFrame {
    fn default() -> Self {
        Self::from_position(Vector3::zero())
    }
}

/// Geometric primitive of a part, as stored in its `Shape` token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartShape {
    /// Sphere
    Ball,
    /// Box (the default)
    #[default]
    Block,
    /// Cylinder
    Cylinder,
    /// Wedge
    Wedge,
}

impl PartShape {
    /// Enum token stored in the `Shape` property
    pub fn token(&self) -> u32 {
        match self {
            PartShape::Ball => 0,
            PartShape::Block => 1,
            PartShape::Cylinder => 2,
            PartShape::Wedge => 3,
        }
    }

    /// Parse an editor shape name; unknown names are blocks
    pub fn from_name(name: &str) -> Self {
        match name {
            "Ball" => PartShape::Ball,
            "Cylinder" => PartShape::Cylinder,
            "Wedge" => PartShape::Wedge,
            _ => PartShape::Block,
        }
    }
}

/// Tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// UTF-8 string
    String,
    /// Boolean
    Bool,
    /// Signed 32-bit integer
    Int32,
    /// 32-bit float
    Float32,
    /// RGB colour
    Color3,
    /// 3-component vector
    Vector3,
    /// Enum token
    Enum,
    /// Rigid transform
    CFrame,
}

impl ValueType {
    /// Type id written in binary `PROP` chunks
    pub fn type_id(&self) -> u8 {
        match self {
            ValueType::String => 0x01,
            ValueType::Bool => 0x02,
            ValueType::Int32 => 0x03,
            ValueType::Float32 => 0x04,
            ValueType::Color3 => 0x0C,
            ValueType::Vector3 => 0x0E,
            ValueType::CFrame => 0x10,
            ValueType::Enum => 0x12,
        }
    }

    /// Inverse of [`ValueType::type_id`]
    pub fn from_type_id(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(ValueType::String),
            0x02 => Some(ValueType::Bool),
            0x03 => Some(ValueType::Int32),
            0x04 => Some(ValueType::Float32),
            0x0C => Some(ValueType::Color3),
            0x0E => Some(ValueType::Vector3),
            0x10 => Some(ValueType::CFrame),
            0x12 => Some(ValueType::Enum),
            _ => None,
        }
    }

    /// Human-readable name, used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::String => "String",
            ValueType::Bool => "Bool",
            ValueType::Int32 => "Int32",
            ValueType::Float32 => "Float32",
            ValueType::Color3 => "Color3",
            ValueType::Vector3 => "Vector3",
            ValueType::Enum => "Enum",
            ValueType::CFrame => "CFrame",
        }
    }
}

/// A typed property value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 string
    String(String),
    /// Boolean
    Bool(bool),
    /// Signed 32-bit integer
    Int32(i32),
    /// 32-bit float
    Float32(f32),
    /// RGB colour
    Color3(Color3),
    /// 3-component vector
    Vector3(Vector3),
    /// Enum token
    Enum(u32),
    /// Rigid transform
    CFrame(CFrame),
}

impl Value {
    /// The tag of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::String(_) => ValueType::String,
            Value::Bool(_) => ValueType::Bool,
            Value::Int32(_) => ValueType::Int32,
            Value::Float32(_) => ValueType::Float32,
            Value::Color3(_) => ValueType::Color3,
            Value::Vector3(_) => ValueType::Vector3,
            Value::Enum(_) => ValueType::Enum,
            Value::CFrame(_) => ValueType::CFrame,
        }
    }

    /// Borrow the string payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean payload, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float32(f)
    }
}

impl From<Color3> for Value {
    fn from(c: Color3) -> Self {
        Value::Color3(c)
    }
}

impl From<Vector3> for Value {
    fn from(v: Vector3) -> Self {
        Value::Vector3(v)
    }
}

impl From<CFrame> for Value {
    fn from(cf: CFrame) -> Self {
        Value::CFrame(cf)
    }
}
