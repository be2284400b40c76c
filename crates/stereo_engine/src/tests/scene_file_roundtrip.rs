use std::collections::BTreeSet;

use super::*;
use crate::core::config::EditorConfig;
use crate::primitive::{Construction, ObjectId, PrimitiveKind};
use crate::render::{Camera, CameraSettings};
use crate::serialization::{from_json, load_scene, save_scene, to_json, SerializationError};

/// Face (0,0)-(1,0)-(0,1) with its edges, a plane through it and a line cutting the plane
fn sample_scene() -> Scene {
    let (mut tools, mut scene) = start(Tool::Face);
    click_at(&mut tools, &mut scene, 0.0, 0.0);
    click_at(&mut tools, &mut scene, 1.0, 0.0);
    assert!(click_at(&mut tools, &mut scene, 0.0, 1.0));

    let ids: Vec<ObjectId> = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)]
        .iter()
        .map(|p| scene.id_of(point_at(&scene, *p).unwrap()).unwrap())
        .collect();
    let plane = scene.create(Construction::PlaneByThreePoints { a: ids[0], b: ids[1], c: ids[2] }).unwrap();
    let line = scene.create(Construction::LineByTwoPoints { a: ids[0], b: ids[2] }).unwrap();
    scene.add_cut(plane, line).unwrap();
    scene
}

fn child_ids(scene: &Scene, key: ObjectKey) -> BTreeSet<ObjectId> {
    scene.children(key).iter().filter_map(|k| scene.id_of(*k)).collect()
}

fn parent_ids(scene: &Scene, key: ObjectKey) -> BTreeSet<ObjectId> {
    scene.parents(key).iter().filter_map(|k| scene.id_of(*k)).collect()
}

fn assert_same_scene(saved: &Scene, loaded: &Scene) {
    assert_eq!(saved.len(), loaded.len());
    let saved_ids: Vec<ObjectId> = saved.objects().map(|(_, o)| o.id()).collect();
    let loaded_ids: Vec<ObjectId> = loaded.objects().map(|(_, o)| o.id()).collect();
    assert_eq!(saved_ids, loaded_ids);

    for (key, object) in saved.objects() {
        let other_key = loaded.key_of(object.id()).expect("object survives");
        let other = loaded.get(other_key).unwrap();
        assert_eq!(object.kind(), other.kind());
        assert_eq!(object.name(), other.name());
        assert_eq!(object.primitive().construction, other.primitive().construction);
        assert_eq!(object.primitive().cuts, other.primitive().cuts);
        assert_eq!(child_ids(saved, key), child_ids(loaded, other_key));
        assert_eq!(parent_ids(saved, key), parent_ids(loaded, other_key));
        assert!((object.position() - other.position()).norm() < 1e-12);
    }
}

#[test]
fn test_roundtrip_through_json() {
    let scene = sample_scene();
    let settings = Camera::default().settings();

    let text = to_json(&scene, settings.clone()).unwrap();
    let loaded = from_json(&text, EditorConfig::default()).unwrap();

    assert_same_scene(&scene, &loaded.scene);
    assert_eq!(loaded.camera, settings);

    let face = loaded.scene.objects().find(|(_, o)| o.kind() == PrimitiveKind::Triangle).map(|(k, _)| k).unwrap();
    assert_eq!(loaded.scene.parents(face).len(), 6);
    let plane = loaded.scene.objects().find(|(_, o)| o.kind() == PrimitiveKind::Plane).map(|(_, o)| o).unwrap();
    assert_eq!(plane.primitive().cuts.len(), 1);
}

#[test]
fn test_file_lists_children_and_cuts() {
    let scene = sample_scene();
    let value: serde_json::Value = serde_json::from_str(&to_json(&scene, Camera::default().settings()).unwrap()).unwrap();

    let objects = value["objects"].as_object().unwrap();
    assert_eq!(objects.len(), scene.len());
    let planes: Vec<&serde_json::Value> = objects.values().filter(|o| o["type"] == "plane").collect();
    assert_eq!(planes.len(), 1);
    assert_eq!(planes[0]["construction"], "three_points");
    assert_eq!(planes[0]["cuts"].as_array().unwrap().len(), 1);

    let point = objects.values().find(|o| o["type"] == "point").unwrap();
    assert_eq!(point["forming objects"].as_array().unwrap().len(), 3);
    assert!(point.get("construction").is_none());

    // Every object has a children entry, points list their dependents
    let children = value["children"].as_object().unwrap();
    assert_eq!(children.len(), scene.len());
    let origin = scene.id_of(point_at(&scene, Vec3::zeros()).unwrap()).unwrap().to_string();
    assert_eq!(children[&origin].as_array().unwrap().len(), scene.children(point_at(&scene, Vec3::zeros()).unwrap()).len());
    assert!(!children[&origin].as_array().unwrap().is_empty());
}

#[test]
fn test_loaded_scene_stays_editable() {
    let scene = sample_scene();
    let text = to_json(&scene, Camera::default().settings()).unwrap();
    let mut loaded = from_json(&text, EditorConfig::default()).unwrap().scene;

    let corner = point_at(&loaded, Vec3::new(0.0, 1.0, 0.0)).unwrap();
    loaded.update_position(corner, Vec3::new(0.0, 3.0, 0.0)).unwrap();
    let face = loaded.common_child(&[corner], PrimitiveKind::Triangle).unwrap();
    let centroid = loaded.get(face).unwrap().transform().translation;
    assert!((centroid - Vec3::new(1.0 / 3.0, 1.0, 0.0)).norm() < 1e-12);

    // Removing a defining point drops its dependents and the cut reference
    let origin = point_at(&loaded, Vec3::new(0.0, 0.0, 0.0)).unwrap();
    loaded.remove_object(origin).unwrap();
    assert_eq!(loaded.count_of(PrimitiveKind::Plane), 0);
    assert_eq!(loaded.count_of(PrimitiveKind::Line), 0);
    assert_eq!(loaded.count_of(PrimitiveKind::Triangle), 0);
    assert_eq!(loaded.count_of(PrimitiveKind::Segment), 1);
}

#[test]
fn test_save_and_load_file() {
    let scene = sample_scene();
    let mut camera = Camera::default();
    camera.apply_settings(&CameraSettings { translation: "1 2 3".to_string(), rotation: "1 0 0 0".to_string() }).unwrap();

    let path = std::env::temp_dir().join(format!("stereo_scene_{}.json", ObjectId::new()));
    save_scene(&scene, camera.settings(), &path).unwrap();
    let loaded = load_scene(&path, EditorConfig::default());
    std::fs::remove_file(&path).ok();
    let loaded = loaded.unwrap();

    assert_same_scene(&scene, &loaded.scene);
    let mut restored = Camera::default();
    loaded.apply_camera(&mut restored).unwrap();
    assert_eq!(restored.settings(), camera.settings());
}

#[test]
fn test_missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join(format!("stereo_missing_{}.json", ObjectId::new()));
    let result = load_scene(&path, EditorConfig::default());
    assert!(matches!(result, Err(SerializationError::Io(_))));
}

/// Points along the x axis, each consecutive pair joined by an edge
fn point_chain(points: u32) -> Scene {
    let mut scene = Scene::default();
    let mut previous: Option<ObjectId> = None;
    for i in 0..points {
        let key = scene.create_point(Vec3::new(f64::from(i), 0.0, 0.0)).unwrap();
        let id = scene.id_of(key).unwrap();
        if let Some(prev) = previous {
            scene.create(Construction::Segment { a: prev, b: id }).unwrap();
        }
        previous = Some(id);
    }
    scene
}

#[test]
fn test_large_scene_loads() {
    let scene = point_chain(4000);
    assert_eq!(scene.len(), 7999);

    let text = to_json(&scene, Camera::default().settings()).unwrap();
    let loaded = from_json(&text, EditorConfig::default()).unwrap().scene;

    assert_eq!(loaded.count_of(PrimitiveKind::Point), 4000);
    assert_eq!(loaded.count_of(PrimitiveKind::Segment), 3999);
    let saved_ids: Vec<ObjectId> = scene.objects().map(|(_, o)| o.id()).collect();
    let loaded_ids: Vec<ObjectId> = loaded.objects().map(|(_, o)| o.id()).collect();
    assert_eq!(saved_ids, loaded_ids);

    // Inner points keep both of their edges
    let middle = point_at(&loaded, Vec3::new(2000.0, 0.0, 0.0)).unwrap();
    assert_eq!(loaded.children(middle).len(), 2);
}
