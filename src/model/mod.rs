//! Data structures representing a place's instance tree

mod instance;
pub mod schema;
mod value;

pub use instance::{
    ClassGroup, Instance, InstanceId, InstanceTree, PropertyMap, ROOT_PARENT_REFERENT,
};
pub use value::{
    CFrame, Color3, IDENTITY_TOLERANCE, PartShape, Quaternion, Value, ValueType, Vector3,
};
