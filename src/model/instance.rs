//! The instance tree handed to the codecs

use crate::error::{Error, Result};

use super::schema::{PropertySpec, property_spec};
use super::value::Value;

/// Identifier of an instance within one tree
pub type InstanceId = u32;

/// Referent written for instances that hang off the conceptual root
pub const ROOT_PARENT_REFERENT: i32 = -1;

/// Property name → value, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, Value)>,
}

impl PropertyMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Look up a value by property name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find_map(|(k, v)| if k == name { Some(v) } else { None })
    }

    /// Iterate `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no property is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One node of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    /// Referent, unique within the tree
    pub id: InstanceId,
    /// Class name, selects the property set
    pub class_name: String,
    /// Display name, written as the `Name` property
    pub name: String,
    /// Class-specific properties
    pub properties: PropertyMap,
    /// Child ids in encoding order
    pub children: Vec<InstanceId>,
    /// Parent id, `None` for top-level instances
    pub parent: Option<InstanceId>,
}

impl Instance {
    /// Parent referent as written to the binary format, -1 for top-level instances
    pub fn parent_referent(&self) -> i32 {
        self.parent.map_or(ROOT_PARENT_REFERENT, |p| p as i32)
    }

    /// The stored value for `spec`, or its default when absent
    pub fn property_or_default(&self, spec: &PropertySpec) -> Value {
        self.properties
            .get(spec.name)
            .cloned()
            .unwrap_or_else(|| spec.default_value())
    }
}

/// Instances sharing a class name, in first-encounter order
#[derive(Debug, Clone)]
pub struct ClassGroup<'a> {
    /// Encoding-local class index
    pub class_id: u32,
    /// Shared class name
    pub class_name: &'a str,
    /// Members in tree order
    pub instances: Vec<&'a Instance>,
}

/// A forest of instances under a conceptual root
///
/// Ids are dense and assigned in insertion order, so a parent always has
/// a lower id than its descendants and the storage order is the global
/// instance order used by the binary `PRNT` chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceTree {
    instances: Vec<Instance>,
    roots: Vec<InstanceId>,
}

impl InstanceTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance under `parent` (or at the top level) and return its id
    ///
    /// The parent must already be in the tree, which keeps the children
    /// relation acyclic.
    pub fn add_instance(
        &mut self,
        class_name: impl Into<String>,
        name: impl Into<String>,
        parent: Option<InstanceId>,
    ) -> Result<InstanceId> {
        let id = InstanceId::try_from(self.instances.len())
            .map_err(|_| Error::InvalidTree("too many instances".to_string()))?;

        match parent {
            Some(parent_id) => self.instance_mut(parent_id)?.children.push(id),
            None => self.roots.push(id),
        }

        self.instances.push(Instance {
            id,
            class_name: class_name.into(),
            name: name.into(),
            properties: PropertyMap::new(),
            children: Vec::new(),
            parent,
        });
        Ok(id)
    }

    /// Set a property, enforcing the fixed tag of known `(class, property)` pairs
    pub fn set_property(
        &mut self,
        id: InstanceId,
        name: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let name = name.into();
        let instance = self.instance_mut(id)?;

        if let Some(spec) = property_spec(&instance.class_name, &name) {
            if spec.value_type != value.value_type() {
                return Err(Error::PropertyType(format!(
                    "{}.{} must be {}, got {}",
                    instance.class_name,
                    name,
                    spec.value_type.name(),
                    value.value_type().name()
                )));
            }
        }

        instance.properties.insert(name, value);
        Ok(())
    }

    /// Look up an instance
    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id as usize)
    }

    /// Look up an instance, failing with an invalid-tree error
    pub fn instance(&self, id: InstanceId) -> Result<&Instance> {
        self.get(id)
            .ok_or_else(|| Error::InvalidTree(format!("instance {} does not exist", id)))
    }

    fn instance_mut(&mut self, id: InstanceId) -> Result<&mut Instance> {
        self.instances
            .get_mut(id as usize)
            .ok_or_else(|| Error::InvalidTree(format!("instance {} does not exist", id)))
    }

    /// Number of instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether the tree has no instances
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// All instances in id (pre-order) order
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.instances.iter()
    }

    /// Ids of the top-level instances
    pub fn roots(&self) -> &[InstanceId] {
        &self.roots
    }

    /// Group instances by class, numbering classes in order of first encounter
    pub fn class_groups(&self) -> Vec<ClassGroup<'_>> {
        let mut groups: Vec<ClassGroup<'_>> = Vec::new();

        for instance in &self.instances {
            match groups
                .iter_mut()
                .find(|g| g.class_name == instance.class_name)
            {
                Some(group) => group.instances.push(instance),
                None => groups.push(ClassGroup {
                    class_id: groups.len() as u32,
                    class_name: &instance.class_name,
                    instances: vec![instance],
                }),
            }
        }

        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::Vector3;

    fn sample_tree() -> InstanceTree {
        let mut tree = InstanceTree::new();
        let workspace = tree.add_instance("Workspace", "Workspace", None).unwrap();
        tree.add_instance("Part", "A", Some(workspace)).unwrap();
        tree.add_instance("Script", "S", Some(workspace)).unwrap();
        tree.add_instance("Part", "B", Some(workspace)).unwrap();
        tree
    }

    #[test]
    fn test_ids_are_dense_and_linked() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.roots(), &[0]);
        assert_eq!(tree.get(0).unwrap().children, vec![1, 2, 3]);
        assert_eq!(tree.get(3).unwrap().parent, Some(0));
        assert_eq!(tree.get(0).unwrap().parent_referent(), -1);
        assert_eq!(tree.get(2).unwrap().parent_referent(), 0);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut tree = InstanceTree::new();
        let err = tree.add_instance("Part", "P", Some(5)).unwrap_err();
        assert!(matches!(err, Error::InvalidTree(_)));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_class_groups_first_encounter_order() {
        let tree = sample_tree();
        let groups = tree.class_groups();
        let summary: Vec<_> = groups
            .iter()
            .map(|g| (g.class_id, g.class_name, g.instances.len()))
            .collect();
        assert_eq!(
            summary,
            vec![(0, "Workspace", 1), (1, "Part", 2), (2, "Script", 1)]
        );
        let part_ids: Vec<_> = groups[1].instances.iter().map(|i| i.id).collect();
        assert_eq!(part_ids, vec![1, 3]);
    }

    #[test]
    fn test_schema_type_enforced() {
        let mut tree = sample_tree();
        tree.set_property(1, "Size", Value::Vector3(Vector3::new(1.0, 2.0, 3.0)))
            .unwrap();
        let err = tree.set_property(1, "Size", Value::Bool(true)).unwrap_err();
        assert!(matches!(err, Error::PropertyType(_)));

        // Classes without a fixed set accept anything
        tree.set_property(0, "Gravity", Value::Float32(196.2)).unwrap();
    }

    #[test]
    fn test_property_map_replaces_in_place() {
        let mut map = PropertyMap::new();
        map.insert("A", Value::Bool(true));
        map.insert("B", Value::Int32(1));
        assert_eq!(map.insert("A", Value::Bool(false)), Some(Value::Bool(true)));
        let names: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(map.len(), 2);
    }
}
