use std::path::PathBuf;

use vitrine::{
    LayoutDocument, LayoutId, MediaId, ModuleKind, PublishState, Rect, Region, RegionId, Widget,
    WidgetId,
};

fn sample_layout() -> LayoutDocument {
    LayoutDocument {
        id: LayoutId(761),
        width: 1280.0,
        height: 720.0,
        background_ref: None,
        duration_seconds: 30.0,
        publish_state: PublishState::Published,
        parent_id: None,
        regions: vec![Region {
            id: RegionId(1),
            geometry: Rect::new(0.0, 0.0, 1280.0, 720.0),
            widgets: vec![Widget {
                id: WidgetId(100),
                module_kind: ModuleKind::Image,
                raw_options: vec![],
                attached_media_ids: vec![MediaId(42)],
                playlist_id: None,
                duration_seconds: None,
            }],
        }],
    }
}

fn bin_path() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_vitrine")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target").join("debug").join("vitrine"))
}

#[test]
fn cli_scene_prints_nodes() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let layout_path = dir.join("layout.json");
    let f = std::fs::File::create(&layout_path).unwrap();
    serde_json::to_writer_pretty(f, &sample_layout()).unwrap();

    let out = std::process::Command::new(bin_path())
        .args(["scene", "--in"])
        .arg(&layout_path)
        .args(["--width", "1920", "--height", "1080"])
        .output()
        .expect("run vitrine scene");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let scene: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(scene["layout_id"], 761);
    assert_eq!(scene["nodes"].as_array().unwrap().len(), 1);

    // Without --fill-ratio the binary uses the library default:
    // min(1920/1280, 1080/720) * 0.9.
    let scale = scene["scale"].as_f64().unwrap();
    assert!((scale - 1.35).abs() < 1e-9);
}

#[test]
fn cli_decode_prints_per_widget_options() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let layout_path = dir.join("layout_decode.json");
    let f = std::fs::File::create(&layout_path).unwrap();
    serde_json::to_writer_pretty(f, &sample_layout()).unwrap();

    let out = std::process::Command::new(bin_path())
        .args(["decode", "--in"])
        .arg(&layout_path)
        .output()
        .expect("run vitrine decode");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let decoded: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(decoded.get("100").is_some());
}
