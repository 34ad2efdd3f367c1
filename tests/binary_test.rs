//! Binary place encoding, checked by decoding the output

use rbxplace::binary::reader::PlaceFile;
use rbxplace::binary::{CFRAME_EXPLICIT, CFRAME_IDENTITY, END_MARKER, SIGNATURE, chunk};
use rbxplace::{BinaryConfig, CFrame, Color3, InstanceTree, Value, Vector3};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn part_tree() -> InstanceTree {
    let mut tree = InstanceTree::new();
    let ws = tree.add_instance("Workspace", "Workspace", None).unwrap();
    let a = tree.add_instance("Part", "A", Some(ws)).unwrap();
    tree.add_instance("Script", "Main", Some(ws)).unwrap();
    let b = tree.add_instance("Part", "B", Some(ws)).unwrap();

    tree.set_property(a, "Anchored", Value::Bool(true)).unwrap();
    tree.set_property(a, "Color", Value::Color3(Color3::new(1.0, 0.0, 0.0)))
        .unwrap();
    tree.set_property(
        b,
        "CFrame",
        Value::CFrame(CFrame::from_position(Vector3::new(1.0, 2.0, 3.0))),
    )
    .unwrap();
    tree
}

#[test]
fn test_header_counts() {
    init_logging();
    let tree = part_tree();
    let bytes = tree.to_binary().unwrap();

    assert_eq!(&bytes[8..14], &SIGNATURE);
    let file = PlaceFile::parse(&bytes).unwrap();
    assert_eq!(file.header.version, 0);
    assert_eq!(file.header.class_count, 3);
    assert_eq!(file.header.instance_count, 4);
    assert!(bytes.ends_with(END_MARKER));
}

#[test]
fn test_service_only_tree() {
    let mut tree = InstanceTree::new();
    tree.add_instance("Lighting", "Lighting", None).unwrap();
    let bytes = tree.to_binary().unwrap();

    let file = PlaceFile::parse(&bytes).unwrap();
    let insts = file.instances().unwrap();
    assert_eq!(insts.len(), 1);
    assert_eq!(insts[0].class_name, "Lighting");
    assert!(insts[0].is_service);
    assert_eq!(insts[0].referents, vec![0]);
    assert_eq!(insts[0].service_markers, vec![1]);

    // Lighting has no fixed property set, so only Name is encoded
    let props = file.properties().unwrap();
    assert_eq!(props.len(), 1);
    assert_eq!(props[0].name, "Name");
    assert_eq!(props[0].values, vec![Value::String("Lighting".to_string())]);

    let prnt = file.parents().unwrap();
    assert_eq!(prnt.links, vec![(0, -1)]);
}

#[test]
fn test_instances_grouped_by_class() {
    let tree = part_tree();
    let bytes = tree.to_binary().unwrap();
    let file = PlaceFile::parse(&bytes).unwrap();

    let insts = file.instances().unwrap();
    let summary: Vec<(u32, &str, usize)> = insts
        .iter()
        .map(|i| (i.class_id, i.class_name.as_str(), i.referents.len()))
        .collect();
    assert_eq!(
        summary,
        vec![(0, "Workspace", 1), (1, "Part", 2), (2, "Script", 1)]
    );
    assert_eq!(insts[1].referents, vec![1, 3]);
    assert!(!insts[1].is_service);
    assert!(insts[1].service_markers.is_empty());

    for prop in file.properties().unwrap() {
        let expected = insts[prop.class_id as usize].referents.len();
        assert_eq!(prop.values.len(), expected, "column {}", prop.name);
    }
}

#[test]
fn test_part_columns_carry_values() {
    let tree = part_tree();
    let bytes = tree.to_binary().unwrap();
    let file = PlaceFile::parse(&bytes).unwrap();
    let props = file.properties().unwrap();

    let column = |name: &str| {
        props
            .iter()
            .find(|p| p.class_id == 1 && p.name == name)
            .unwrap()
            .values
            .clone()
    };

    assert_eq!(
        column("Name"),
        vec![Value::from("A"), Value::from("B")]
    );
    assert_eq!(column("Anchored"), vec![Value::Bool(true), Value::Bool(false)]);
    assert_eq!(column("CanCollide"), vec![Value::Bool(true), Value::Bool(true)]);
    assert_eq!(
        column("Size"),
        vec![
            Value::Vector3(Vector3::new(4.0, 1.0, 2.0)),
            Value::Vector3(Vector3::new(4.0, 1.0, 2.0))
        ]
    );
    assert_eq!(column("Color")[0], Value::Color3(Color3::new(1.0, 0.0, 0.0)));
    assert_eq!(
        column("CFrame")[1],
        Value::CFrame(CFrame::from_position(Vector3::new(1.0, 2.0, 3.0)))
    );
}

#[test]
fn test_cframe_identity_shortcut() {
    let mut tree = InstanceTree::new();
    let near = tree.add_instance("Part", "Near", None).unwrap();
    let turned = tree.add_instance("Part", "Turned", None).unwrap();

    let mut rotation = CFrame::IDENTITY_ROTATION;
    rotation[1] = 5e-5;
    tree.set_property(
        near,
        "CFrame",
        Value::CFrame(CFrame::new(Vector3::zero(), rotation)),
    )
    .unwrap();

    let quarter_turn = [0.0, 0.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0];
    tree.set_property(
        turned,
        "CFrame",
        Value::CFrame(CFrame::new(Vector3::new(0.0, 5.0, 0.0), quarter_turn)),
    )
    .unwrap();

    let bytes = tree.to_binary().unwrap();
    let file = PlaceFile::parse(&bytes).unwrap();
    let props = file.properties().unwrap();
    let cframes = &props.iter().find(|p| p.name == "CFrame").unwrap().values;

    assert_eq!(cframes[0], Value::CFrame(CFrame::default()));
    assert_eq!(
        cframes[1],
        Value::CFrame(CFrame::new(Vector3::new(0.0, 5.0, 0.0), quarter_turn))
    );
    assert_ne!(CFRAME_IDENTITY, CFRAME_EXPLICIT);
}

#[test]
fn test_parent_links_in_tree_order() {
    let tree = part_tree();
    let bytes = tree.to_binary().unwrap();
    let file = PlaceFile::parse(&bytes).unwrap();

    let prnt = file.parents().unwrap();
    assert_eq!(prnt.version, 0);
    assert_eq!(prnt.links, vec![(0, -1), (1, 0), (2, 0), (3, 0)]);
}

#[test]
fn test_chunk_sequence() {
    let tree = part_tree();
    let bytes = tree.to_binary().unwrap();
    let file = PlaceFile::parse(&bytes).unwrap();

    let names: Vec<&str> = file.chunks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names.first(), Some(&chunk::META));
    assert_eq!(names[1], chunk::SSTR);
    assert_eq!(&names[2..5], &[chunk::INST; 3]);
    assert_eq!(names.last(), Some(&chunk::END));
    assert_eq!(names[names.len() - 2], chunk::PRNT);

    // Workspace: Name; Part: Name + 8; Script: Name + Source
    assert_eq!(file.chunks_named(chunk::PROP).count(), 1 + 9 + 2);
}

#[test]
fn test_metadata_entries() {
    let tree = part_tree();
    let config = BinaryConfig::new().with_metadata([("ExplicitAutoJoints", "true")]);
    let bytes = tree.to_binary_with_config(&config).unwrap();
    let file = PlaceFile::parse(&bytes).unwrap();

    assert_eq!(
        file.metadata().unwrap(),
        vec![("ExplicitAutoJoints".to_string(), "true".to_string())]
    );
}

#[test]
fn test_empty_tree() {
    let bytes = InstanceTree::new().to_binary().unwrap();
    let file = PlaceFile::parse(&bytes).unwrap();
    assert_eq!(file.header.class_count, 0);
    assert_eq!(file.header.instance_count, 0);
    assert!(file.instances().unwrap().is_empty());
    assert!(file.parents().unwrap().links.is_empty());
}
