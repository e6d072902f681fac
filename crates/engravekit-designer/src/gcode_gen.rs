//! G-code generation from text.
//!
//! Lays text out line by line with the glyph catalog and emits a motion
//! program: a fixed header, one block per drawable character, a fixed footer.

use crate::fields::{fields_to_text, TextFieldRecord};
use crate::glyphs::{GlyphCatalog, PathElement};
use engravekit_core::{MotionCommand, MotionProgram, ValidationError};
use serde::{Deserialize, Serialize};

/// Layout and tool parameters for text engraving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Glyph scale factor (glyph units to mm)
    pub scale: f64,
    /// Horizontal advance per character, in glyph units
    pub spacing: f64,
    /// Vertical advance per line, in glyph units
    pub line_spacing: f64,
    /// Tool speed for `M3`
    pub spindle_speed: u32,
    /// Engraving depth in mm (emitted as negative Z)
    pub depth: f64,
    /// Feed rate for every XY move in mm/min
    pub feed_rate: f64,
    /// Pen-up height between strokes and glyphs
    pub travel_z: f64,
    /// Final retract height before returning to origin
    pub park_z: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            spacing: 1.5,
            line_spacing: 3.5,
            spindle_speed: 8000,
            depth: 0.15,
            feed_rate: 228.6,
            travel_z: 2.0,
            park_z: 4.0,
        }
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::config(field, format!("must be > 0 (got {})", value)));
    }
    Ok(())
}

impl GeneratorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive("scale", self.scale)?;
        require_positive("spacing", self.spacing)?;
        require_positive("line_spacing", self.line_spacing)?;
        require_positive("feed_rate", self.feed_rate)?;

        if !self.depth.is_finite() || self.depth < 0.0 {
            return Err(ValidationError::config("depth", "must be >= 0"));
        }
        if !self.travel_z.is_finite() || !self.park_z.is_finite() {
            return Err(ValidationError::config("travel_z", "heights must be finite"));
        }
        if self.park_z < self.travel_z {
            return Err(ValidationError::config(
                "park_z",
                format!("must be >= travel_z ({})", self.travel_z),
            ));
        }
        Ok(())
    }
}

/// Converts text into a motion program
#[derive(Debug, Clone)]
pub struct ToolpathGenerator<'a> {
    config: GeneratorConfig,
    catalog: &'a GlyphCatalog,
}

impl ToolpathGenerator<'static> {
    /// Create a generator over the built-in glyph catalog
    pub fn new(config: GeneratorConfig) -> Result<Self, ValidationError> {
        Self::with_catalog(config, GlyphCatalog::builtin())
    }
}

impl<'a> ToolpathGenerator<'a> {
    /// Create a generator over a custom glyph catalog
    pub fn with_catalog(
        config: GeneratorConfig,
        catalog: &'a GlyphCatalog,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config, catalog })
    }

    /// Active configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the program for a field record
    pub fn generate(&self, fields: &TextFieldRecord) -> MotionProgram {
        self.generate_text(&fields_to_text(fields))
    }

    /// Generate the program for a raw text block (`\n` separates lines)
    pub fn generate_text(&self, text: &str) -> MotionProgram {
        let mut commands = self.generate_header();

        let line_step = self.config.line_spacing * self.config.scale;
        let advance = self.config.spacing * self.config.scale;
        let line_count = text.split('\n').count();

        let mut x_offset = 0.0;
        let mut y_offset = (line_count - 1) as f64 * line_step;
        let mut skipped = 0usize;

        for ch in text.chars() {
            if ch == '\n' {
                y_offset -= line_step;
                x_offset = 0.0;
                continue;
            }

            let Some(glyph) = self.catalog.lookup(ch) else {
                tracing::trace!("No glyph for {:?}, skipping", ch);
                skipped += 1;
                continue;
            };

            self.generate_glyph(glyph, x_offset, y_offset, &mut commands);
            commands.push(MotionCommand::rapid_z(self.config.travel_z));
            x_offset += advance;
        }

        commands.extend(self.generate_footer());

        let program = MotionProgram::from_commands(commands);
        tracing::debug!(
            "Generated {} commands for {} text lines ({} characters skipped)",
            program.len(),
            line_count,
            skipped
        );
        program
    }

    /// Setup: millimeters, absolute positioning, tool on
    pub fn generate_header(&self) -> Vec<MotionCommand> {
        vec![
            MotionCommand::SetUnitsMillimeters,
            MotionCommand::AbsolutePositioning,
            MotionCommand::SpindleOn {
                speed: self.config.spindle_speed,
            },
        ]
    }

    /// Shutdown: park, return to origin, tool off
    pub fn generate_footer(&self) -> Vec<MotionCommand> {
        vec![
            MotionCommand::rapid_z(self.config.park_z),
            MotionCommand::rapid_xy(0.0, 0.0, None),
            MotionCommand::SpindleOff,
        ]
    }

    fn generate_glyph(
        &self,
        glyph: &[PathElement],
        x_offset: f64,
        y_offset: f64,
        commands: &mut Vec<MotionCommand>,
    ) {
        let scale = self.config.scale;
        let feed = Some(self.config.feed_rate);
        let cut_z = -self.config.depth;
        let place = |x: f64, y: f64| (x * scale + x_offset, y * scale + y_offset);

        let mut first = true;
        let mut elements = glyph.iter().peekable();
        while let Some(element) = elements.next() {
            match *element {
                PathElement::Lift => {
                    // Travel pen-up to the next point; that point still emits its own move.
                    let Some(&&PathElement::Point(px, py)) = elements.peek() else {
                        continue;
                    };
                    let (x, y) = place(px, py);
                    commands.push(MotionCommand::rapid_z(self.config.travel_z));
                    commands.push(MotionCommand::rapid_xy(x, y, feed));
                    commands.push(MotionCommand::rapid_z(cut_z));
                }
                PathElement::Point(px, py) => {
                    let (x, y) = place(px, py);
                    if first {
                        commands.push(MotionCommand::Rapid {
                            x: Some(x),
                            y: Some(y),
                            z: Some(0.0),
                            feed,
                        });
                        first = false;
                    } else {
                        commands.push(MotionCommand::Linear {
                            x: Some(x),
                            y: Some(y),
                            z: Some(cut_z),
                            feed,
                        });
                    }
                }
            }
        }
    }
}

/// Number of program lines one glyph contributes, including the trailing raise
pub fn glyph_command_count(glyph: &[PathElement]) -> usize {
    let lifts = glyph.iter().filter(|e| **e == PathElement::Lift).count();
    let points = glyph.len() - lifts;
    lifts * 3 + points + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_scale_and_spacing() {
        let config = GeneratorConfig {
            scale: 0.0,
            ..Default::default()
        };
        assert!(ToolpathGenerator::new(config).is_err());

        let config = GeneratorConfig {
            spacing: -1.5,
            ..Default::default()
        };
        assert!(matches!(
            ToolpathGenerator::new(config),
            Err(ValidationError::InvalidConfig { .. })
        ));

        let config = GeneratorConfig {
            scale: f64::NAN,
            ..Default::default()
        };
        assert!(ToolpathGenerator::new(config).is_err());
    }

    #[test]
    fn test_rejects_park_below_travel() {
        let config = GeneratorConfig {
            travel_z: 5.0,
            park_z: 4.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_glyph_command_count() {
        let a = GlyphCatalog::builtin().lookup('A').unwrap();
        // start, two cuts, lift (3 lines), landing cut, one cut, raise
        assert_eq!(glyph_command_count(a), 9);
        assert_eq!(glyph_command_count(&[]), 1);
    }
}
