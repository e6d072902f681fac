//! Motion program parsing for preview
//!
//! Reduces a program to the XY segments the pen travels. Only rapid (`G0`) and
//! linear (`G1`) moves matter; Z and every other word are ignored.

use engravekit_core::{MotionProgram, ProgramError};
use regex::Regex;
use std::sync::OnceLock;

/// Pen state during a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// `G0`: moves without drawing
    Travel,
    /// `G1`: draws a segment
    Cut,
}

/// One XY segment, in program units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewMove {
    /// Travel or cut
    pub kind: MoveKind,
    /// Start point
    pub from: (f64, f64),
    /// End point
    pub to: (f64, f64),
}

fn remove_comment(line: &str) -> &str {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = COMMENT_REGEX.get_or_init(|| Regex::new(r"[;(].*").expect("invalid regex pattern"));
    match regex.find(line) {
        Some(m) => &line[..m.start()],
        None => line,
    }
}

fn number_at_start(text: &str) -> Option<f64> {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NUMBER_REGEX
        .get_or_init(|| Regex::new(r"^[-+]?[0-9]*\.?[0-9]+").expect("invalid regex pattern"));
    regex.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Classify a line by its leading command word, which may run straight into
/// the axis words (`G1X10Y10`)
fn move_kind(line: &str) -> Option<MoveKind> {
    static MOVE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = MOVE_REGEX
        .get_or_init(|| Regex::new(r"^G0?([01])(?:[^0-9.]|$)").expect("invalid regex pattern"));
    let caps = regex.captures(line)?;
    match &caps[1] {
        "0" => Some(MoveKind::Travel),
        _ => Some(MoveKind::Cut),
    }
}

/// Value of an axis word; `Ok(None)` if the word is absent
fn axis_value(line: &str, axis: char) -> Result<Option<f64>, String> {
    let Some(pos) = line.find(axis) else {
        return Ok(None);
    };
    number_at_start(&line[pos + axis.len_utf8()..])
        .map(Some)
        .ok_or_else(|| format!("unparseable {} word", axis))
}

/// Parse one line against the current position.
///
/// Returns `Ok(None)` for lines that do not move the pen in XY terms (blank,
/// comments, other commands).
pub fn parse_line(
    line: &str,
    line_number: usize,
    position: (f64, f64),
) -> Result<Option<PreviewMove>, ProgramError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(';') {
        return Ok(None);
    }
    let Some(kind) = move_kind(line) else {
        return Ok(None);
    };

    let code = remove_comment(line);
    let malformed = |reason: String| ProgramError::MalformedProgram {
        line_number,
        reason,
    };
    let x = axis_value(code, 'X').map_err(malformed)?;
    let y = axis_value(code, 'Y').map_err(malformed)?;

    Ok(Some(PreviewMove {
        kind,
        from: position,
        to: (x.unwrap_or(position.0), y.unwrap_or(position.1)),
    }))
}

/// Every G0/G1 move in the program, starting from `(0, 0)`.
///
/// Malformed lines are logged and skipped; the pen stays where it was.
pub fn parse_moves(program: &MotionProgram) -> Vec<PreviewMove> {
    let mut position = (0.0, 0.0);
    let mut moves = Vec::new();

    for (index, line) in program.lines().iter().enumerate() {
        match parse_line(line, index + 1, position) {
            Ok(Some(mv)) => {
                position = mv.to;
                moves.push(mv);
            }
            Ok(None) => {}
            Err(e) => tracing::debug!("Skipping line: {}", e),
        }
    }
    moves
}
