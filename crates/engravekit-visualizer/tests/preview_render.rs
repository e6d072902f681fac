//! Integration tests for preview rendering

use engravekit_core::MotionProgram;
use engravekit_visualizer::{mirror, PreviewConfig, PreviewRenderer};
use image::{Rgb, RgbImage};
use proptest::prelude::*;

const BACKGROUND: Rgb<u8> = Rgb([0xde, 0xb8, 0x87]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

fn renderer() -> PreviewRenderer {
    PreviewRenderer::new(PreviewConfig::default()).unwrap()
}

fn small_renderer() -> PreviewRenderer {
    PreviewRenderer::new(PreviewConfig {
        card_width: 20.0,
        card_height: 10.0,
        scale_factor: 2.0,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_comment_only_program_is_background() {
    let renderer = renderer();
    let program = MotionProgram::parse("; nothing to see\n\n   \n; still nothing");
    let (canvas, mirrored) = renderer.render_both(&program);

    assert_eq!(canvas.dimensions(), (850, 540));
    assert!(canvas.pixels().all(|p| *p == BACKGROUND));
    assert_eq!(canvas, mirrored);
}

#[test]
fn test_rapid_moves_do_not_draw() {
    let renderer = renderer();
    let program = MotionProgram::parse("G0 X10 Y10\nG0 X40 Y20 Z2\nG0 X0 Y0");
    assert_eq!(renderer.render(&program), renderer.blank());
}

#[test]
fn test_linear_move_draws_scaled_segment() {
    let renderer = renderer();
    let canvas = renderer.render(&MotionProgram::parse("G1 X10 Y10"));

    // From (0,0) to (100,100) pixels; canonical canvas is not flipped.
    assert_eq!(*canvas.get_pixel(50, 50), INK);
    assert_eq!(*canvas.get_pixel(50, 5), BACKGROUND);
    assert_eq!(*canvas.get_pixel(300, 300), BACKGROUND);
}

#[test]
fn test_mirrored_segment_is_point_reflected() {
    let renderer = renderer();
    let (canvas, mirrored) = renderer.render_both(&MotionProgram::parse("G0 X10 Y5\nG1 X30"));
    let (w, h) = canvas.dimensions();

    assert_eq!(*canvas.get_pixel(200, 50), INK);
    assert_eq!(*mirrored.get_pixel(w - 1 - 200, h - 1 - 50), INK);
    assert_eq!(*mirrored.get_pixel(200, 50), BACKGROUND);
}

#[test]
fn test_generated_toolpath_renders_something() {
    let program = MotionProgram::parse(
        "G21\nG90\nM3 S8000\nG0 X0 Y0 Z0 F228.6\nG1 X0.5 Y2 Z-0.15 F228.6\nG0 Z2\nG0 Z4\nG0 X0 Y0\nM5",
    );
    let canvas = renderer().render(&program);
    assert!(canvas.pixels().any(|p| *p == INK));
}

#[test]
fn test_generate_preview_writes_both_images() {
    let dir = tempfile::tempdir().unwrap();
    let program_path = dir.path().join("card.nc");
    std::fs::write(&program_path, "G1 X10 Y10\n").unwrap();
    let output_path = dir.path().join("card.png");

    let output = renderer()
        .generate_preview(&program_path, &output_path)
        .unwrap();
    assert_eq!(output.canonical, output_path);
    assert_eq!(output.mirrored, dir.path().join("card_mirrored.png"));

    let canonical = image::open(&output.canonical).unwrap().to_rgb8();
    let mirrored = image::open(&output.mirrored).unwrap().to_rgb8();
    assert_eq!(mirror(&canonical), mirrored);
}

#[test]
fn test_generate_preview_missing_program() {
    let dir = tempfile::tempdir().unwrap();
    let result = renderer().generate_preview(&dir.path().join("absent.nc"), &dir.path().join("p.png"));
    assert!(result.is_err());
}

proptest! {
    #[test]
    fn prop_mirror_is_an_involution(
        width in 1u32..16,
        height in 1u32..16,
        seed in prop::collection::vec(any::<u8>(), 768),
    ) {
        let canvas = RgbImage::from_fn(width, height, |x, y| {
            let i = ((y * width + x) * 3) as usize;
            Rgb([seed[i], seed[i + 1], seed[i + 2]])
        });
        prop_assert_eq!(mirror(&mirror(&canvas)), canvas);
    }

    #[test]
    fn prop_rendered_mirror_is_an_involution(
        points in prop::collection::vec((0.0f64..20.0, 0.0f64..10.0, any::<bool>()), 0..12),
    ) {
        let text: Vec<String> = points
            .iter()
            .map(|(x, y, cut)| format!("{} X{:.3} Y{:.3}", if *cut { "G1" } else { "G0" }, x, y))
            .collect();
        let program = MotionProgram::parse(&text.join("\n"));
        let (canvas, mirrored) = small_renderer().render_both(&program);
        prop_assert_eq!(mirror(&mirrored), canvas);
    }
}
