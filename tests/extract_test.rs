//! Editor snapshot through both exporters and back through the importer

use std::collections::HashMap;

use rbxplace::binary::reader::PlaceFile;
use rbxplace::extract::DEFAULT_ROOT_ID;
use rbxplace::{
    BinaryConfig, CFrame, Color3, ImportConfig, LiveObject, PartOptions, PartShape, SceneSink,
    TreeIndex, TreeNode, Value, Vector3, XmlConfig, export_binary, export_xml, extract_tree,
    import_xml,
};

#[derive(Default)]
struct Scene {
    parts: Vec<PartOptions>,
    scripts: Vec<(String, String)>,
}

impl SceneSink for Scene {
    fn create_object(&mut self, options: &PartOptions) {
        self.parts.push(options.clone());
    }

    fn create_script(&mut self, name: &str, source: &str) {
        self.scripts.push((name.to_string(), source.to_string()));
    }
}

struct Editor {
    index: TreeIndex,
    scene: HashMap<String, LiveObject>,
    scripts: HashMap<String, String>,
}

fn editor() -> Editor {
    let mut index = TreeIndex::with_default_services();
    index.add_child("Workspace", TreeNode::item("Brick", "Part"));
    index.add_child("Workspace", TreeNode::item("Spawn", "SpawnLocation"));
    index.add_child("ServerScriptService", TreeNode::item("Main", "Script"));

    let mut scene = HashMap::new();
    scene.insert(
        "Brick".to_string(),
        LiveObject {
            cframe: CFrame::from_position(Vector3::new(0.0, 10.0, -4.0)),
            size: Vector3::new(8.0, 2.0, 8.0),
            color: Color3::new(0.0, 0.0, 1.0),
            opacity: 0.75,
            anchored: true,
            can_collide: false,
            locked: true,
            shape: PartShape::Block,
        },
    );

    let mut scripts = HashMap::new();
    scripts.insert("Main".to_string(), "print(\"hello\")".to_string());

    Editor {
        index,
        scene,
        scripts,
    }
}

#[test]
fn test_snapshot_shape() {
    let _ = env_logger::builder().is_test(true).try_init();
    let ed = editor();

    let tree = extract_tree(&ed.index, &ed.scene, &ed.scripts).unwrap();
    assert_eq!(tree.len(), 15);
    assert_eq!(tree.roots().len(), 12);

    let brick = tree.iter().find(|i| i.name == "Brick").unwrap();
    assert_eq!(brick.class_name, "Part");
    assert_eq!(brick.properties.get("Transparency"), Some(&Value::Float32(0.25)));
    assert_eq!(brick.properties.get("Locked"), Some(&Value::Bool(true)));

    // No live object: the spawn keeps its class defaults
    let spawn = tree.iter().find(|i| i.name == "Spawn").unwrap();
    assert_eq!(spawn.properties.get("CanCollide"), Some(&Value::Bool(true)));
    assert_eq!(
        spawn.properties.get("Size"),
        Some(&Value::Vector3(Vector3::new(4.0, 1.0, 2.0)))
    );
}

#[test]
fn test_binary_export() {
    let ed = editor();
    let bytes = export_binary(&ed.index, &ed.scene, &ed.scripts, &BinaryConfig::default()).unwrap();
    let file = PlaceFile::parse(&bytes).unwrap();

    assert_eq!(file.header.instance_count, 15);
    // 12 services + Part + SpawnLocation + Script
    assert_eq!(file.header.class_count, 15);

    let insts = file.instances().unwrap();
    let services = insts.iter().filter(|i| i.is_service).count();
    assert_eq!(services, 12);

    let script_class = insts.iter().find(|i| i.class_name == "Script").unwrap();
    let source = file
        .properties()
        .unwrap()
        .into_iter()
        .find(|p| p.class_id == script_class.class_id && p.name == "Source")
        .unwrap();
    assert_eq!(source.values, vec![Value::from("print(\"hello\")")]);

    // Every non-service hangs off a service
    let links = file.parents().unwrap().links;
    assert_eq!(links.iter().filter(|(_, parent)| *parent == -1).count(), 12);
}

#[test]
fn test_xml_export_then_import() {
    let ed = editor();
    let xml = export_xml(&ed.index, &ed.scene, &ed.scripts, &XmlConfig::default()).unwrap();

    let mut scene = Scene::default();
    let summary = import_xml(&xml, &ImportConfig::from_index(&ed.index), &mut scene).unwrap();

    assert_eq!(summary.objects, 2);
    assert_eq!(summary.scripts, 1);
    assert_eq!(summary.total(), 3);

    let brick = scene.parts.iter().find(|p| p.name == "Brick").unwrap();
    assert_eq!(brick.position, Vector3::new(0.0, 10.0, -4.0));
    assert_eq!(brick.size, Vector3::new(8.0, 2.0, 8.0));
    assert_eq!(brick.color, Color3::new(0.0, 0.0, 1.0));
    assert!(brick.anchored);
    assert!(!brick.can_collide);
    assert!(brick.locked);

    let spawn = scene.parts.iter().find(|p| p.name == "Spawn").unwrap();
    assert_eq!(spawn.class_name, "SpawnLocation");

    assert_eq!(
        scene.scripts,
        vec![("Main".to_string(), "print(\"hello\")".to_string())]
    );
}

#[test]
fn test_import_limited_to_index_containers() {
    let ed = editor();
    let xml = export_xml(&ed.index, &ed.scene, &ed.scripts, &XmlConfig::default()).unwrap();

    let mut index = TreeIndex::new();
    index.add_child(DEFAULT_ROOT_ID, TreeNode::folder("Workspace"));
    let config = ImportConfig::from_index(&index);
    assert!(config.is_known_container("Workspace"));
    assert!(!config.is_known_container("ServerScriptService"));

    let mut scene = Scene::default();
    let summary = import_xml(&xml, &config, &mut scene).unwrap();
    assert_eq!(summary.objects, 2);
    assert_eq!(summary.scripts, 0);
}

#[test]
fn test_export_with_empty_index() {
    let index = TreeIndex::new();
    let scene: HashMap<String, LiveObject> = HashMap::new();
    let scripts: HashMap<String, String> = HashMap::new();

    let xml = export_xml(&index, &scene, &scripts, &XmlConfig::default()).unwrap();
    assert!(xml.contains("StarterPlayer"));

    let bytes = export_binary(&index, &scene, &scripts, &BinaryConfig::default()).unwrap();
    let file = PlaceFile::parse(&bytes).unwrap();
    assert_eq!(file.header.instance_count, 0);
}
