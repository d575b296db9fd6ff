use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use renderer::{
    AssetLoadError, AssetRequest, PendingAssets, ShaderOrigin, BUILTIN_FRAGMENT_SHADER,
    BUILTIN_VERTEX_SHADER,
};
use tempfile::TempDir;

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let mut image = RgbaImage::new(width, height);
    image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
    image.save(&path).expect("write png");
    path
}

#[test]
fn loads_two_images_and_builtin_shaders() {
    let dir = TempDir::new().expect("temp dir");
    let first = write_png(dir.path(), "first.png", 4, 3);
    let second = write_png(dir.path(), "second.png", 2, 5);

    let assets = PendingAssets::spawn(AssetRequest {
        images: [first.clone(), second.clone()],
        vertex_shader: None,
        fragment_shader: None,
    })
    .expect("spawn workers")
    .wait()
    .expect("assets load");

    let [slot0, slot1] = &assets.images;
    assert_eq!((slot0.width, slot0.height), (4, 3));
    assert_eq!((slot1.width, slot1.height), (2, 5));
    assert_eq!(slot0.path, first);
    assert_eq!(slot1.path, second);
    assert_eq!(slot0.pixels.len(), 4 * 3 * 4);
    assert_eq!(&slot0.pixels[..4], &[255, 0, 0, 255]);

    assert_eq!(assets.shaders.vertex.origin, ShaderOrigin::Builtin);
    assert_eq!(assets.shaders.vertex.code, BUILTIN_VERTEX_SHADER);
    assert_eq!(assets.shaders.fragment.code, BUILTIN_FRAGMENT_SHADER);
}

#[test]
fn shader_overrides_are_read_from_disk() {
    let dir = TempDir::new().expect("temp dir");
    let first = write_png(dir.path(), "a.png", 1, 1);
    let second = write_png(dir.path(), "b.png", 1, 1);
    let fragment = dir.path().join("custom.frag");
    fs::write(&fragment, "#version 450\nvoid main() {}\n").expect("write shader");

    let assets = PendingAssets::spawn(AssetRequest {
        images: [first, second],
        vertex_shader: None,
        fragment_shader: Some(fragment.clone()),
    })
    .expect("spawn workers")
    .wait()
    .expect("assets load");

    assert_eq!(assets.shaders.fragment.origin, ShaderOrigin::File(fragment));
    assert!(assets.shaders.fragment.code.contains("void main"));
    assert_eq!(assets.shaders.vertex.origin, ShaderOrigin::Builtin);
}

#[test]
fn missing_image_aborts_loading() {
    let dir = TempDir::new().expect("temp dir");
    let first = write_png(dir.path(), "present.png", 2, 2);
    let missing = dir.path().join("missing.png");

    let err = PendingAssets::spawn(AssetRequest {
        images: [first, missing.clone()],
        vertex_shader: None,
        fragment_shader: None,
    })
    .expect("spawn workers")
    .wait()
    .unwrap_err();

    match err {
        AssetLoadError::Read { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn undecodable_image_reports_decode_error() {
    let dir = TempDir::new().expect("temp dir");
    let first = write_png(dir.path(), "ok.png", 2, 2);
    let garbage = dir.path().join("garbage.png");
    fs::write(&garbage, b"definitely not an image").expect("write garbage");

    let err = PendingAssets::spawn(AssetRequest {
        images: [garbage.clone(), first],
        vertex_shader: None,
        fragment_shader: None,
    })
    .expect("spawn workers")
    .wait()
    .unwrap_err();

    match err {
        AssetLoadError::Decode { path, .. } => assert_eq!(path, garbage),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_shader_override_is_a_read_error() {
    let dir = TempDir::new().expect("temp dir");
    let first = write_png(dir.path(), "a.png", 1, 1);
    let second = write_png(dir.path(), "b.png", 1, 1);
    let vertex = dir.path().join("nope.vert");

    let err = PendingAssets::spawn(AssetRequest {
        images: [first, second],
        vertex_shader: Some(vertex.clone()),
        fragment_shader: None,
    })
    .expect("spawn workers")
    .wait()
    .unwrap_err();

    assert!(matches!(err, AssetLoadError::Read { ref path, .. } if *path == vertex));
}
