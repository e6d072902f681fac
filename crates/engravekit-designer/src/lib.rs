//! # EngraveKit Designer
//!
//! Turns labeled text fields into an engraving toolpath.
//!
//! - [`glyphs`] - single-stroke glyph catalog with a defined lookup rule
//! - [`fields`] - ordered text field records
//! - [`gcode_gen`] - layout and G-code emission

pub mod fields;
pub mod gcode_gen;
pub mod glyphs;

pub use fields::{fields_to_text, TextFieldRecord};
pub use gcode_gen::{glyph_command_count, GeneratorConfig, ToolpathGenerator};
pub use glyphs::{validate_glyph, GlyphCatalog, PathElement};
