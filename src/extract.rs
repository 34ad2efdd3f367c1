//! Snapshotting the editor's scene into an [`InstanceTree`]
//!
//! The editor exposes three read-only collaborators: the hierarchical
//! [`TreeIndex`] shown in its explorer, a [`SceneLookup`] resolving live
//! geometry by name, and a [`ScriptStore`] holding script sources. The
//! extractor walks the index depth-first and copies what it finds into a
//! fresh tree. Missing live objects or script sources are not errors; the
//! affected instance simply keeps its default properties.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::model::schema::{
    FOLDER_CLASS, class_properties, is_part_class, is_service, service_defaults,
};
use crate::model::{CFrame, Color3, InstanceId, InstanceTree, PartShape, Value, Vector3};

/// Id of the synthetic root in the editor's index
pub const DEFAULT_ROOT_ID: &str = "root";

/// One node of the editor's explorer index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Node id, unique within the index
    pub index: String,
    /// Whether the node is a container
    pub is_folder: bool,
    /// Object kind (`Part`, `Script`, …), if the node has one
    pub kind: Option<String>,
    /// Display name
    pub data: String,
    /// Child node ids in display order
    pub children: Vec<String>,
}

impl TreeNode {
    /// A container whose display name equals its id
    pub fn folder(index: impl Into<String>) -> Self {
        let index = index.into();
        Self {
            data: index.clone(),
            index,
            is_folder: true,
            kind: None,
            children: Vec::new(),
        }
    }

    /// A leaf of the given kind whose display name equals its id
    pub fn item(index: impl Into<String>, kind: impl Into<String>) -> Self {
        let index = index.into();
        Self {
            data: index.clone(),
            index,
            is_folder: false,
            kind: Some(kind.into()),
            children: Vec::new(),
        }
    }
}

/// Immutable snapshot of the editor's explorer hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeIndex {
    root_id: String,
    nodes: HashMap<String, TreeNode>,
}

impl TreeIndex {
    /// An index holding only an empty root
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(DEFAULT_ROOT_ID.to_string(), TreeNode::folder(DEFAULT_ROOT_ID));
        Self {
            root_id: DEFAULT_ROOT_ID.to_string(),
            nodes,
        }
    }

    /// The editor's initial layout: every service as an empty folder under the root
    pub fn with_default_services() -> Self {
        let mut index = Self::new();
        for name in [
            "Workspace",
            "Players",
            "Lighting",
            "ReplicatedStorage",
            "ReplicatedFirst",
            "ServerScriptService",
            "ServerStorage",
            "StarterGui",
            "StarterPack",
            "Teams",
            "SoundService",
            "Chat",
        ] {
            index.add_child(DEFAULT_ROOT_ID, TreeNode::folder(name));
        }
        index
    }

    /// Insert `node` and append it to `parent`'s children
    ///
    /// A parent that is not in the index yet is created as a folder.
    pub fn add_child(&mut self, parent: &str, node: TreeNode) {
        let parent_node = self
            .nodes
            .entry(parent.to_string())
            .or_insert_with(|| TreeNode::folder(parent));
        parent_node.is_folder = true;
        parent_node.children.push(node.index.clone());
        self.nodes.insert(node.index.clone(), node);
    }

    /// Look up a node
    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// Id of the synthetic root
    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Ids of the root-level containers
    pub fn root_children(&self) -> &[String] {
        self.nodes
            .get(&self.root_id)
            .map(|root| root.children.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for TreeIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Geometric and material state of a live scene object
#[derive(Debug, Clone, PartialEq)]
pub struct LiveObject {
    /// World transform
    pub cframe: CFrame,
    /// Size with object scale already applied
    pub size: Vector3,
    /// Base colour
    pub color: Color3,
    /// Material opacity; transparency is `1 - opacity`
    pub opacity: f32,
    /// Anchored flag
    pub anchored: bool,
    /// Collision flag
    pub can_collide: bool,
    /// Locked flag
    pub locked: bool,
    /// Geometric primitive
    pub shape: PartShape,
}

impl Default for LiveObject {
    fn default() -> Self {
        Self {
            cframe: CFrame::default(),
            size: Vector3::new(4.0, 1.0, 2.0),
            color: Color3::mid_gray(),
            opacity: 1.0,
            anchored: false,
            can_collide: true,
            locked: false,
            shape: PartShape::Block,
        }
    }
}

/// Resolves live scene objects by display name
pub trait SceneLookup {
    /// The object named `name`, if it exists in the scene
    fn object_by_name(&self, name: &str) -> Option<&LiveObject>;
}

impl SceneLookup for HashMap<String, LiveObject> {
    fn object_by_name(&self, name: &str) -> Option<&LiveObject> {
        self.get(name)
    }
}

/// Resolves script sources by script name
pub trait ScriptStore {
    /// Source text of the script named `name`
    fn source(&self, name: &str) -> Option<&str>;
}

impl ScriptStore for HashMap<String, String> {
    fn source(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Class name for an index node
///
/// Service ids map to their own class; otherwise the node's kind wins,
/// containers without a kind are folders and kindless leaves are parts.
pub fn resolve_class_name(node_id: &str, node: &TreeNode) -> String {
    if is_service(node_id) {
        return node_id.to_string();
    }
    match &node.kind {
        Some(kind) => kind.clone(),
        None if node.is_folder => FOLDER_CLASS.to_string(),
        None => "Part".to_string(),
    }
}

/// Build an instance tree from the editor's collaborators
///
/// Traversal is depth-first pre-order over the index, starting at the
/// root's children, so ids grow from 0 in visitation order.
pub fn extract_tree<S, T>(index: &TreeIndex, scene: &S, scripts: &T) -> Result<InstanceTree>
where
    S: SceneLookup + ?Sized,
    T: ScriptStore + ?Sized,
{
    let mut extractor = Extractor {
        index,
        scene,
        scripts,
        tree: InstanceTree::new(),
        visited: HashSet::new(),
    };

    for child in index.root_children() {
        extractor.visit(child, None)?;
    }

    log::debug!("Extracted {} instances", extractor.tree.len());
    Ok(extractor.tree)
}

struct Extractor<'a, S: ?Sized, T: ?Sized> {
    index: &'a TreeIndex,
    scene: &'a S,
    scripts: &'a T,
    tree: InstanceTree,
    visited: HashSet<&'a str>,
}

impl<'a, S, T> Extractor<'a, S, T>
where
    S: SceneLookup + ?Sized,
    T: ScriptStore + ?Sized,
{
    fn visit(&mut self, node_id: &'a str, parent: Option<InstanceId>) -> Result<()> {
        let index = self.index;
        let Some(node) = index.get(node_id) else {
            log::warn!("Index references missing node '{}'", node_id);
            return Ok(());
        };
        if !self.visited.insert(node_id) {
            log::warn!("Node '{}' reached twice, skipping", node_id);
            return Ok(());
        }

        let class_name = resolve_class_name(node_id, node);
        let id = self.tree.add_instance(class_name.as_str(), node.data.as_str(), parent)?;
        self.populate(id, &class_name, &node.data)?;

        for child in &node.children {
            self.visit(child, Some(id))?;
        }
        Ok(())
    }

    fn populate(&mut self, id: InstanceId, class_name: &str, name: &str) -> Result<()> {
        if is_part_class(class_name) {
            match self.scene.object_by_name(name) {
                Some(object) => {
                    let props = [
                        ("Anchored", Value::Bool(object.anchored)),
                        ("CanCollide", Value::Bool(object.can_collide)),
                        ("Locked", Value::Bool(object.locked)),
                        ("Transparency", Value::Float32(1.0 - object.opacity)),
                        ("Size", Value::Vector3(object.size)),
                        ("Color", Value::Color3(object.color)),
                        ("CFrame", Value::CFrame(object.cframe)),
                        ("Shape", Value::Enum(object.shape.token())),
                    ];
                    for (prop, value) in props {
                        self.tree.set_property(id, prop, value)?;
                    }
                }
                None => log::warn!("No live object named '{}', using defaults", name),
            }
        } else if class_name == "Script" {
            let source = self.scripts.source(name).unwrap_or_default();
            self.tree
                .set_property(id, "Source", Value::String(source.to_string()))?;
        } else {
            for (prop, value) in service_defaults(class_name) {
                self.tree.set_property(id, prop, value)?;
            }
        }

        // Anything still unset gets its class default so every instance of a
        // class carries the full property set.
        for spec in class_properties(class_name) {
            let missing = self
                .tree
                .get(id)
                .is_some_and(|inst| inst.properties.get(spec.name).is_none());
            if missing {
                self.tree.set_property(id, spec.name, spec.default_value())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_scene() -> HashMap<String, LiveObject> {
        HashMap::new()
    }

    fn no_scripts() -> HashMap<String, String> {
        HashMap::new()
    }

    fn scene_with(name: &str, object: LiveObject) -> HashMap<String, LiveObject> {
        let mut scene = HashMap::new();
        scene.insert(name.to_string(), object);
        scene
    }

    #[test]
    fn test_preorder_ids() {
        let mut index = TreeIndex::new();
        index.add_child("root", TreeNode::folder("Workspace"));
        index.add_child("Workspace", TreeNode::folder("Model"));
        index.add_child("Model", TreeNode::item("Inner", "Part"));
        index.add_child("Workspace", TreeNode::item("Outer", "Part"));
        index.add_child("root", TreeNode::folder("Lighting"));

        let tree = extract_tree(&index, &no_scene(), &no_scripts()).unwrap();
        let order: Vec<_> = tree.iter().map(|i| (i.id, i.name.as_str())).collect();
        assert_eq!(
            order,
            vec![
                (0, "Workspace"),
                (1, "Model"),
                (2, "Inner"),
                (3, "Outer"),
                (4, "Lighting")
            ]
        );
        assert_eq!(tree.get(2).unwrap().parent, Some(1));
        assert_eq!(tree.roots(), &[0, 4]);
    }

    #[test]
    fn test_class_resolution() {
        assert_eq!(
            resolve_class_name("Lighting", &TreeNode::folder("Lighting")),
            "Lighting"
        );
        assert_eq!(resolve_class_name("Stuff", &TreeNode::folder("Stuff")), "Folder");
        assert_eq!(
            resolve_class_name("Hello", &TreeNode::item("Hello", "Script")),
            "Script"
        );

        let mut kindless = TreeNode::item("Baseplate", "Part");
        kindless.kind = None;
        assert_eq!(resolve_class_name("Baseplate", &kindless), "Part");
    }

    #[test]
    fn test_part_properties_from_live_object() {
        let mut index = TreeIndex::new();
        index.add_child("root", TreeNode::folder("Workspace"));
        index.add_child("Workspace", TreeNode::item("Ball", "Part"));

        let object = LiveObject {
            cframe: CFrame::from_position(Vector3::new(1.0, 2.0, 3.0)),
            opacity: 0.25,
            anchored: true,
            shape: PartShape::Ball,
            ..LiveObject::default()
        };
        let tree =
            extract_tree(&index, &scene_with("Ball", object), &no_scripts()).unwrap();

        let part = tree.get(1).unwrap();
        assert_eq!(part.class_name, "Part");
        assert_eq!(part.properties.get("Anchored"), Some(&Value::Bool(true)));
        assert_eq!(part.properties.get("Transparency"), Some(&Value::Float32(0.75)));
        assert_eq!(part.properties.get("Shape"), Some(&Value::Enum(0)));
    }

    #[test]
    fn test_missing_live_object_defaults() {
        let mut index = TreeIndex::new();
        index.add_child("root", TreeNode::folder("Workspace"));
        index.add_child("Workspace", TreeNode::item("Ghost", "Part"));

        let tree = extract_tree(&index, &no_scene(), &no_scripts()).unwrap();
        let part = tree.get(1).unwrap();
        assert_eq!(part.properties.len(), 8);
        assert_eq!(part.properties.get("CanCollide"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_script_source_lookup() {
        let mut index = TreeIndex::new();
        index.add_child("root", TreeNode::folder("ServerScriptService"));
        index.add_child("ServerScriptService", TreeNode::item("Main", "Script"));
        index.add_child("ServerScriptService", TreeNode::item("Empty", "Script"));

        let mut scripts = HashMap::new();
        scripts.insert("Main".to_string(), "print('hi')".to_string());

        let tree = extract_tree(&index, &no_scene(), &scripts).unwrap();
        assert_eq!(
            tree.get(1).unwrap().properties.get("Source"),
            Some(&Value::from("print('hi')"))
        );
        assert_eq!(
            tree.get(2).unwrap().properties.get("Source"),
            Some(&Value::from(""))
        );
    }

    #[test]
    fn test_lighting_defaults_injected() {
        let index = TreeIndex::with_default_services();
        let tree = extract_tree(&index, &no_scene(), &no_scripts()).unwrap();
        let lighting = tree.iter().find(|i| i.class_name == "Lighting").unwrap();
        assert_eq!(lighting.properties.get("Technology"), Some(&Value::Enum(3)));
        assert_eq!(tree.len(), 12);
    }

    #[test]
    fn test_cycle_in_index_terminates() {
        let mut index = TreeIndex::new();
        index.add_child("root", TreeNode::folder("A"));
        let mut back_edge = TreeNode::folder("B");
        back_edge.children.push("A".to_string());
        index.add_child("A", back_edge);

        let tree = extract_tree(&index, &no_scene(), &no_scripts()).unwrap();
        assert_eq!(tree.len(), 2);
    }
}
