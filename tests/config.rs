use serde_json::json;

use scenewire::scene::Scene;
use scenewire::{Commands, ProjectionConfig};

#[test]
fn config_file_drives_paging() {
    let path = std::env::temp_dir().join(format!("scenewire-{}.toml", std::process::id()));
    std::fs::write(&path, "default_page_size = 2\nmax_page_size = 3\n").unwrap();
    let config = ProjectionConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.max_depth, 5);

    let mut scene = Scene::new();
    let root = scene.spawn("Root");
    for i in 0..4 {
        scene.spawn_child(root, format!("Child{i}")).unwrap();
    }
    let commands = Commands::new(config);

    let defaulted = commands.get_hierarchy(&scene, root, &json!({"parent": "Root"}));
    let data = defaulted.data.unwrap();
    assert_eq!(data["pageSize"], 2);
    assert_eq!(data["next_cursor"], 2);

    let clamped =
        commands.get_hierarchy(&scene, root, &json!({"parent": "Root", "pageSize": 10}));
    assert_eq!(clamped.data.unwrap()["pageSize"], 3);
}
