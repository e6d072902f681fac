//! Motion program artifact
//!
//! The ordered command sequence exchanged between the toolpath generator, the
//! execution session and the preview renderer. Immutable once built.

use crate::gcode::MotionCommand;
use crate::Result;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// An ordered, immutable sequence of motion command lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionProgram {
    lines: Arc<[String]>,
}

impl MotionProgram {
    /// Build a program from typed commands, in emission order
    pub fn from_commands<I>(commands: I) -> Self
    where
        I: IntoIterator<Item = MotionCommand>,
    {
        Self {
            lines: commands.into_iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Parse the textual encoding (one command per line).
    ///
    /// Surrounding whitespace is trimmed and blank lines are dropped.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Read a program from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Write the program to disk in its canonical encoding
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_string())?;
        tracing::debug!("Wrote {} program lines to {}", self.len(), path.display());
        Ok(())
    }

    /// Command lines in program order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True if the program has no commands
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for MotionProgram {
    fn default() -> Self {
        Self {
            lines: Arc::from(Vec::new()),
        }
    }
}

impl fmt::Display for MotionProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_commands_preserves_order() {
        let program = MotionProgram::from_commands([
            MotionCommand::SetUnitsMillimeters,
            MotionCommand::AbsolutePositioning,
            MotionCommand::SpindleOff,
        ]);
        assert_eq!(program.lines(), &["G21", "G90", "M5"]);
        assert_eq!(program.to_string(), "G21\nG90\nM5");
    }

    #[test]
    fn test_parse_drops_blank_lines() {
        let program = MotionProgram::parse("G21\n\n  G90  \r\n\nM5\n");
        assert_eq!(program.len(), 3);
        assert_eq!(program.lines()[1], "G90");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.nc");
        let program = MotionProgram::parse("G21\nG90\nM3 S8000\nG0 Z4\nG0 X0 Y0\nM5");
        program.save(&path).unwrap();

        let loaded = MotionProgram::load(&path).unwrap();
        assert_eq!(loaded, program);
    }

    #[test]
    fn test_empty_program() {
        let program = MotionProgram::parse("\n\n");
        assert!(program.is_empty());
        assert_eq!(program.to_string(), "");
    }
}
