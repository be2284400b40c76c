use super::*;
use crate::core::config::EditorConfig;
use crate::primitive::{Construction, PrimitiveKind};
use crate::render::{RenderMode, RenderQueue};
use crate::scene::mesh::{LINE_COLOR, SELECTED_COLOR};
use crate::scene::ObjectMesh;

fn small_blocks() -> (ToolController, Scene) {
    let mut scene = Scene::new(EditorConfig::default().with_block_capacity(4));
    let mut tools = ToolController::new();
    tools.set_tool(&mut scene, Tool::Point).unwrap();
    (tools, scene)
}

fn lease_colors(scene: &Scene, key: ObjectKey) -> Vec<[f32; 4]> {
    match scene.get(key).unwrap().mesh() {
        ObjectMesh::Shared(lease) => scene.arena().read_colors(lease).unwrap(),
        ObjectMesh::Unique(_) => panic!("expected an arena lease"),
    }
}

fn as_f32(color: [f64; 4]) -> [f32; 4] {
    color.map(|c| c as f32)
}

#[test]
fn test_points_spill_into_a_second_block() {
    let (mut tools, mut scene) = small_blocks();
    for i in 0..5 {
        assert!(click_at(&mut tools, &mut scene, f64::from(i), 0.0));
    }

    let stats = scene.arena().stats();
    assert_eq!(stats.blocks, 2);
    assert_eq!(stats.used_vertices, 5);
    assert_eq!(stats.capacity_vertices, 8);
    assert_eq!(stats.released_vertices, 0);

    let queue = RenderQueue::build(&scene, &OrthoCamera::new());
    assert_eq!(queue.batches().len(), 2);
    assert!(queue.commands().is_empty());
    assert!(queue.batches().iter().all(|b| b.mode == RenderMode::Points));
}

#[test]
fn test_removed_points_leave_released_space() {
    let (mut tools, mut scene) = small_blocks();
    for i in 0..5 {
        click_at(&mut tools, &mut scene, f64::from(i), 0.0);
    }
    let last = point_at(&scene, Vec3::new(4.0, 0.0, 0.0)).unwrap();
    scene.remove_object(last).unwrap();

    let stats = scene.arena().stats();
    assert_eq!(stats.blocks, 2);
    assert_eq!(stats.used_vertices, 5);
    assert_eq!(stats.released_vertices, 1);

    // The second block holds nothing live any more
    assert_eq!(scene.arena().batches().len(), 1);
}

#[test]
fn test_kinds_get_their_own_blocks() {
    let (mut tools, mut scene) = start(Tool::Face);
    click_at(&mut tools, &mut scene, 0.0, 0.0);
    click_at(&mut tools, &mut scene, 1.0, 0.0);
    click_at(&mut tools, &mut scene, 0.0, 1.0);

    let a = scene.id_of(point_at(&scene, Vec3::new(0.0, 0.0, 0.0)).unwrap()).unwrap();
    let b = scene.id_of(point_at(&scene, Vec3::new(1.0, 0.0, 0.0)).unwrap()).unwrap();
    let line = scene.create(Construction::LineByTwoPoints { a, b }).unwrap();

    let queue = RenderQueue::build(&scene, &OrthoCamera::new());
    let modes: Vec<RenderMode> = queue.batches().iter().map(|b| b.mode).collect();
    assert_eq!(modes, vec![RenderMode::Triangles, RenderMode::Lines, RenderMode::Points]);
    let vertices: Vec<u32> = queue.batches().iter().map(|b| b.vertex_count).collect();
    assert_eq!(vertices, vec![3, 6, 3]);

    assert_eq!(queue.commands().len(), 1);
    assert_eq!(queue.commands()[0].object, line);
    assert_eq!(queue.draw_count(), 4);
    assert_eq!(scene.count_of(PrimitiveKind::Line), 1);
}

#[test]
fn test_selection_recolors_leases() {
    let (mut tools, mut scene) = small_blocks();
    click_at(&mut tools, &mut scene, 0.0, 0.0);
    click_at(&mut tools, &mut scene, 1.0, 0.0);
    let first = point_at(&scene, Vec3::new(0.0, 0.0, 0.0)).unwrap();
    let second = point_at(&scene, Vec3::new(1.0, 0.0, 0.0)).unwrap();

    // The point tool leaves only the newest point selected
    assert_eq!(lease_colors(&scene, first), vec![as_f32(LINE_COLOR)]);
    assert_eq!(lease_colors(&scene, second), vec![as_f32(SELECTED_COLOR)]);

    scene.select(&[first]);
    assert_eq!(lease_colors(&scene, first), vec![as_f32(SELECTED_COLOR)]);
    scene.deselect_all();
    assert_eq!(lease_colors(&scene, second), vec![as_f32(LINE_COLOR)]);
}

#[test]
fn test_moving_a_point_rewrites_dependent_leases() {
    let (mut tools, mut scene) = start(Tool::Edge);
    click_at(&mut tools, &mut scene, 0.0, 0.0);
    click_at(&mut tools, &mut scene, 1.0, 0.0);
    let end = point_at(&scene, Vec3::new(1.0, 0.0, 0.0)).unwrap();
    let edge = scene.common_child(&[end], PrimitiveKind::Segment).unwrap();

    scene.update_position(end, Vec3::new(2.0, 0.5, 0.0)).unwrap();

    let ObjectMesh::Shared(lease) = scene.get(edge).unwrap().mesh() else {
        panic!("edges lease arena storage");
    };
    let positions = scene.arena().read_positions(lease).unwrap();
    assert_eq!(positions, vec![[0.0, 0.0, 0.0], [2.0, 0.5, 0.0]]);
}
