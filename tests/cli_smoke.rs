use std::path::PathBuf;

use recolor::{ImageFrame, PixelFormat};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_recolor")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "recolor.exe"
            } else {
                "recolor"
            });
            p
        })
}

#[test]
fn cli_apply_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke").join("apply");
    std::fs::create_dir_all(&dir).unwrap();

    let image_path = dir.join("image.png");
    let mask_path = dir.join("mask.png");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    ImageFrame::filled(8, 8, PixelFormat::Rgb8, &[100, 150, 200])
        .unwrap()
        .save(&image_path)
        .unwrap();
    ImageFrame::filled(4, 4, PixelFormat::Gray8, &[255])
        .unwrap()
        .save(&mask_path)
        .unwrap();

    let status = std::process::Command::new(exe())
        .arg("apply")
        .arg("--image")
        .arg(&image_path)
        .arg("--mask")
        .arg(&mask_path)
        .arg("--out")
        .arg(&out_path)
        .args(["--color", "0,0,255"])
        .status()
        .unwrap();

    assert!(status.success());
    let out = ImageFrame::open(&out_path).unwrap().into_rgb8().unwrap();
    assert_eq!(out.dimensions(), (8, 8));
    assert_eq!(out.pixel(4, 4), &[45, 67, 230]);
}

#[test]
fn cli_apply_accepts_grayscale_image() {
    let dir = PathBuf::from("target").join("cli_smoke").join("gray");
    std::fs::create_dir_all(&dir).unwrap();

    let image_path = dir.join("image.png");
    let mask_path = dir.join("mask.png");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    ImageFrame::filled(4, 4, PixelFormat::Gray8, &[255])
        .unwrap()
        .save(&image_path)
        .unwrap();
    ImageFrame::filled(4, 4, PixelFormat::Gray8, &[255])
        .unwrap()
        .save(&mask_path)
        .unwrap();

    let status = std::process::Command::new(exe())
        .arg("apply")
        .arg("--image")
        .arg(&image_path)
        .arg("--mask")
        .arg(&mask_path)
        .arg("--out")
        .arg(&out_path)
        .args(["--color", "10,20,30"])
        .status()
        .unwrap();

    assert!(status.success());
    let out = ImageFrame::open(&out_path).unwrap();
    assert_eq!(out.format(), PixelFormat::Rgb8);
    assert_eq!(out.pixel(1, 1), &[10, 20, 30]);
}

#[test]
fn cli_apply_without_color_fails() {
    let dir = PathBuf::from("target").join("cli_smoke").join("no_color");
    std::fs::create_dir_all(&dir).unwrap();

    let image_path = dir.join("image.png");
    ImageFrame::filled(2, 2, PixelFormat::Rgb8, &[0, 0, 0])
        .unwrap()
        .save(&image_path)
        .unwrap();

    let status = std::process::Command::new(exe())
        .arg("apply")
        .arg("--image")
        .arg(&image_path)
        .arg("--mask")
        .arg(&image_path)
        .arg("--out")
        .arg(dir.join("out.png"))
        .status()
        .unwrap();

    assert!(!status.success());
}

#[test]
fn cli_sequence_skips_frames_without_mask() {
    let dir = PathBuf::from("target").join("cli_smoke").join("sequence");
    let _ = std::fs::remove_dir_all(&dir);
    let (images, masks, out) = (dir.join("images"), dir.join("masks"), dir.join("out"));
    std::fs::create_dir_all(&images).unwrap();
    std::fs::create_dir_all(&masks).unwrap();

    for name in ["f0.png", "f1.png", "f2.png"] {
        ImageFrame::filled(4, 4, PixelFormat::Rgb8, &[255, 255, 255])
            .unwrap()
            .save(&images.join(name))
            .unwrap();
    }
    for name in ["f0.png", "f2.png"] {
        ImageFrame::filled(4, 4, PixelFormat::Gray8, &[255])
            .unwrap()
            .save(&masks.join(name))
            .unwrap();
    }

    let status = std::process::Command::new(exe())
        .arg("sequence")
        .arg("--images")
        .arg(&images)
        .arg("--masks")
        .arg(&masks)
        .arg("--out")
        .arg(&out)
        .args(["--color", "10,20,30", "--resample", "nearest"])
        .status()
        .unwrap();

    assert!(status.success());
    assert!(out.join("f0.png").exists());
    assert!(!out.join("f1.png").exists());
    assert!(out.join("f2.png").exists());

    let f0 = ImageFrame::open(&out.join("f0.png")).unwrap().into_rgb8().unwrap();
    assert_eq!(f0.pixel(0, 0), &[10, 20, 30]);
}
