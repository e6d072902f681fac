//! # EngraveKit Visualizer
//!
//! Motion program parsing and raster previews.

pub mod parser;
pub mod preview;

pub use parser::{parse_line, parse_moves, MoveKind, PreviewMove};
pub use preview::{
    mirror, mirrored_path, parse_hex_color, PreviewConfig, PreviewError, PreviewOutput,
    PreviewRenderer,
};
