//! Raster preview of a motion program
//!
//! Draws every cut segment onto a card-sized canvas with tiny-skia and
//! produces the point-reflected variant used for stamp-style previews.

use crate::parser::{parse_moves, MoveKind};
use engravekit_core::{MotionProgram, ValidationError};
use image::{ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tiny_skia::{Color, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Errors while producing preview files
#[derive(Error, Debug)]
pub enum PreviewError {
    /// Reading the program failed
    #[error(transparent)]
    Program(#[from] engravekit_core::Error),

    /// Encoding or writing an image failed
    #[error("Failed to write preview {path}: {source}")]
    Image {
        /// Destination that could not be written
        path: PathBuf,
        /// Underlying image error
        #[source]
        source: image::ImageError,
    },
}

/// Canvas and color settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Card width in millimeters
    pub card_width: f64,
    /// Card height in millimeters
    pub card_height: f64,
    /// Pixels per millimeter
    pub scale_factor: f64,
    /// Canvas color, `#rrggbb`
    pub background_color: String,
    /// Segment color, `#rrggbb`
    pub stroke_color: String,
    /// Segment width in pixels
    pub stroke_width: f32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            card_width: 85.0,
            card_height: 54.0,
            scale_factor: 10.0,
            background_color: "#deb887".to_string(),
            stroke_color: "#000000".to_string(),
            stroke_width: 2.0,
        }
    }
}

impl PreviewConfig {
    /// Canvas size in whole pixels
    pub fn canvas_size(&self) -> (u32, u32) {
        (
            (self.card_width * self.scale_factor) as u32,
            (self.card_height * self.scale_factor) as u32,
        )
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("card_width", self.card_width),
            ("card_height", self.card_height),
            ("scale_factor", self.scale_factor),
            ("stroke_width", f64::from(self.stroke_width)),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::config(field, "must be > 0"));
            }
        }

        let (width, height) = self.canvas_size();
        if width == 0 || height == 0 {
            return Err(ValidationError::config(
                "scale_factor",
                "canvas must be at least one pixel in each direction",
            ));
        }

        parse_hex_color(&self.background_color)?;
        parse_hex_color(&self.stroke_color)?;
        Ok(())
    }
}

/// Parse a `#rrggbb` color
pub fn parse_hex_color(value: &str) -> Result<Rgb<u8>, ValidationError> {
    let invalid = || ValidationError::InvalidColor {
        value: value.to_string(),
    };
    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Point reflection: pixel `(x, y)` moves to `(w-1-x, h-1-y)`
pub fn mirror(canvas: &RgbImage) -> RgbImage {
    image::imageops::rotate180(canvas)
}

/// Renders motion programs to images
#[derive(Debug, Clone)]
pub struct PreviewRenderer {
    config: PreviewConfig,
    width: u32,
    height: u32,
    background: Rgb<u8>,
    stroke: Rgb<u8>,
}

impl PreviewRenderer {
    /// Create a renderer, rejecting invalid dimensions or colors
    pub fn new(config: PreviewConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let (width, height) = config.canvas_size();
        let background = parse_hex_color(&config.background_color)?;
        let stroke = parse_hex_color(&config.stroke_color)?;
        Ok(Self {
            config,
            width,
            height,
            background,
            stroke,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Canvas width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Background-only canvas
    pub fn blank(&self) -> RgbImage {
        RgbImage::from_pixel(self.width, self.height, self.background)
    }

    /// Draw the program's cut segments over the background
    pub fn render(&self, program: &MotionProgram) -> RgbImage {
        let Some(mut pixmap) = Pixmap::new(self.width, self.height) else {
            return self.blank();
        };
        let [br, bg, bb] = self.background.0;
        pixmap.fill(Color::from_rgba8(br, bg, bb, 255));

        let scale = self.config.scale_factor;
        let px = |(x, y): (f64, f64)| ((x * scale) as f32, (y * scale) as f32);

        let mut pb = PathBuilder::new();
        let mut segments = 0usize;
        for mv in parse_moves(program) {
            if mv.kind != MoveKind::Cut {
                continue;
            }
            let (x0, y0) = px(mv.from);
            let (x1, y1) = px(mv.to);
            pb.move_to(x0, y0);
            pb.line_to(x1, y1);
            segments += 1;
        }

        if let Some(path) = pb.finish() {
            let [sr, sg, sb] = self.stroke.0;
            let mut paint = Paint::default();
            paint.set_color(Color::from_rgba8(sr, sg, sb, 255));
            paint.anti_alias = false;
            let stroke = Stroke {
                width: self.config.stroke_width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
        tracing::debug!(
            "Rendered {} segments on a {}x{} canvas",
            segments,
            self.width,
            self.height
        );

        // Opaque canvas, so premultiplied data is plain RGB.
        let data = pixmap.data();
        let width = self.width;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let idx = ((y * width + x) * 4) as usize;
            Rgb([data[idx], data[idx + 1], data[idx + 2]])
        })
    }

    /// Canonical and mirrored renderings
    pub fn render_both(&self, program: &MotionProgram) -> (RgbImage, RgbImage) {
        let canvas = self.render(program);
        let mirrored = mirror(&canvas);
        (canvas, mirrored)
    }

    /// Render a program file and write the canonical image to `output_path`
    /// and the mirrored image next to it as `<stem>_mirrored.<ext>`
    pub fn generate_preview(
        &self,
        program_path: &Path,
        output_path: &Path,
    ) -> Result<PreviewOutput, PreviewError> {
        let program = MotionProgram::load(program_path)?;
        let (canvas, mirrored) = self.render_both(&program);

        let output = PreviewOutput {
            canonical: output_path.to_path_buf(),
            mirrored: mirrored_path(output_path),
        };
        save_image(&canvas, &output.canonical)?;
        save_image(&mirrored, &output.mirrored)?;

        tracing::info!(
            "Preview written to {} and {}",
            output.canonical.display(),
            output.mirrored.display()
        );
        Ok(output)
    }
}

/// Paths written by [`PreviewRenderer::generate_preview`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewOutput {
    /// Canonical rendering
    pub canonical: PathBuf,
    /// Point-reflected rendering
    pub mirrored: PathBuf,
}

/// `<stem>_mirrored.<ext>` beside `path`
pub fn mirrored_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "preview".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}_mirrored.{}", stem, ext.to_string_lossy()),
        None => format!("{}_mirrored", stem),
    };
    path.with_file_name(name)
}

fn save_image(image: &RgbImage, path: &Path) -> Result<(), PreviewError> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    image
        .save_with_format(path, format)
        .map_err(|source| PreviewError::Image {
            path: path.to_path_buf(),
            source,
        })
}
