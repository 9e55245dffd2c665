use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use scenewire::scene::components::{Camera, MeshRenderer};
use scenewire::scene::{InstanceId, Scene};
use scenewire::{
    Commands, HierarchyPaginator, PageRequest, ParentSelector, ProjectOptions, Projector,
};

// ---------------------------------------------------------------------------
// Scene fixtures
// ---------------------------------------------------------------------------

/// A root with `width` children, each holding a mesh renderer whose
/// materials reference a shared pool of assets.
fn wide_scene(width: usize) -> (Scene, InstanceId) {
    let mut scene = Scene::new();
    let root = scene.spawn("Root");
    let materials: Vec<InstanceId> = (0..8)
        .map(|i| {
            scene.add_asset(format!("Mat{i}"), "Material", format!("Assets/Mat{i}.mat"))
        })
        .collect();
    for i in 0..width {
        let child = scene.spawn_child(root, format!("Child{i}")).unwrap();
        scene
            .add_component(
                child,
                MeshRenderer {
                    materials: materials.iter().map(|&m| Some(m.into())).collect(),
                    ..MeshRenderer::default()
                },
            )
            .unwrap();
    }
    (scene, root)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

fn bench_project_camera(c: &mut Criterion) {
    let mut scene = Scene::new();
    let node = scene.spawn("Main Camera");
    let camera = scene.add_component(node, Camera::default()).unwrap();
    let projector = Projector::default();

    c.bench_function("project_camera", |b| {
        b.iter(|| {
            black_box(
                projector
                    .project_component(&scene, camera, &ProjectOptions::default())
                    .unwrap(),
            )
        });
    });
}

fn bench_project_mesh_renderer(c: &mut Criterion) {
    let (scene, root) = wide_scene(1);
    let child = scene.node(root).unwrap().children()[0];
    let renderer = scene.node(child).unwrap().components()[1];
    let projector = Projector::default();

    c.bench_function("project_mesh_renderer_generic", |b| {
        b.iter(|| {
            black_box(
                projector
                    .project_component(&scene, renderer, &ProjectOptions::default())
                    .unwrap()
                    .to_json(),
            )
        });
    });
}

fn bench_project_node(c: &mut Criterion) {
    let (scene, root) = wide_scene(1);
    let child = scene.node(root).unwrap().children()[0];
    let projector = Projector::default();

    c.bench_function("project_node", |b| {
        b.iter(|| {
            black_box(
                projector
                    .project_node(&scene, child, &ProjectOptions::default())
                    .unwrap(),
            )
        });
    });
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

fn bench_page_children(c: &mut Criterion) {
    let (scene, root) = wide_scene(1_000);
    let paginator = HierarchyPaginator::default();
    let request = PageRequest {
        parent: ParentSelector::parse("Root"),
        page_size: Some(50),
        cursor: Some(500),
        include_transform: true,
    };

    c.bench_function("page_50_of_1k_children", |b| {
        b.iter(|| black_box(paginator.page(&scene, root, &request).unwrap()));
    });
}

fn bench_resolve_by_name(c: &mut Criterion) {
    let (scene, root) = wide_scene(1_000);
    let commands = Commands::default();
    let params = json!({"parent": "Child999", "pageSize": 10});

    c.bench_function("get_hierarchy_by_name_1k", |b| {
        b.iter(|| black_box(commands.get_hierarchy(&scene, root, &params)));
    });
}

criterion_group!(
    benches,
    bench_project_camera,
    bench_project_mesh_renderer,
    bench_project_node,
    bench_page_children,
    bench_resolve_by_name,
);
criterion_main!(benches);
