//! Terminal rendering of session snapshots.
//!
//! Rendering is split into a pure part that turns a snapshot into plain
//! lines (tested) and a thin styling pass applied when writing to a terminal.

use console::style;

use qiblafinder::alignment::{AlignmentResult, TurnDirection};
use qiblafinder::bearing::qibla_distance_km;
use qiblafinder::session::{SessionPhase, SessionSnapshot};

/// Arrow glyphs for the eight compass sectors, clockwise from straight ahead.
const ARROWS: [char; 8] = ['↑', '↗', '→', '↘', '↓', '↙', '←', '↖'];

/// Kind of a rendered line, used to pick its style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Status,
    Error,
    Value,
    Aligned,
    Hint,
}

/// One line of session output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

impl Line {
    fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Text with terminal styling for its kind.
    pub fn styled(&self) -> String {
        match self.kind {
            LineKind::Title => style(&self.text).bold().to_string(),
            LineKind::Status => style(&self.text).dim().to_string(),
            LineKind::Error => style(&self.text).red().to_string(),
            LineKind::Value => self.text.clone(),
            LineKind::Aligned => style(&self.text).green().bold().to_string(),
            LineKind::Hint => style(&self.text).cyan().to_string(),
        }
    }
}

/// Arrow pointing `rotation_deg` clockwise from straight ahead.
pub fn arrow_glyph(rotation_deg: f64) -> char {
    if !rotation_deg.is_finite() {
        return ARROWS[0];
    }
    let sector = (rotation_deg.rem_euclid(360.0) / 45.0).round() as usize % ARROWS.len();
    ARROWS[sector]
}

/// Format a distance in kilometres with thousands separators.
pub fn format_distance(km: f64) -> String {
    let whole = km.round().max(0.0) as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{} km", out)
}

/// Describe how far and which way to turn.
pub fn turn_hint(alignment: &AlignmentResult) -> String {
    let amount = alignment.signed_difference.abs();
    match alignment.turn_direction {
        TurnDirection::None => "Facing the Qibla".to_string(),
        TurnDirection::Right => format!("Turn right {:.0}°", amount),
        TurnDirection::Left => format!("Turn left {:.0}°", amount),
    }
}

/// Lines describing `snapshot`.
pub fn render_lines(snapshot: &SessionSnapshot) -> Vec<Line> {
    let mut lines = vec![Line::new(LineKind::Title, "Qibla Finder")];

    match snapshot.phase {
        SessionPhase::Init | SessionPhase::AcquiringLocation => {
            lines.push(Line::new(LineKind::Status, "Finding your location…"));
        }
        SessionPhase::AwaitingOrientationPermission => {
            lines.push(Line::new(
                LineKind::Hint,
                "Press Enter to enable the compass",
            ));
        }
        SessionPhase::LocationError | SessionPhase::Tracking => {}
    }

    if let Some(message) = snapshot.error_message() {
        lines.push(Line::new(LineKind::Error, message));
    }

    if snapshot.phase.is_terminal() {
        return lines;
    }

    if let Some(bearing) = snapshot.bearing {
        lines.push(Line::new(
            LineKind::Value,
            format!("Qibla Direction: {}", bearing),
        ));
    }

    if let Some(position) = snapshot.position {
        lines.push(Line::new(
            LineKind::Value,
            format!(
                "From {} ({} away)",
                position,
                format_distance(qibla_distance_km(&position))
            ),
        ));
    }

    match snapshot.alignment {
        Some(alignment) => {
            lines.push(Line::new(
                LineKind::Value,
                format!(
                    "Heading: {}   {}",
                    snapshot.heading,
                    arrow_glyph(alignment.rotation_deg())
                ),
            ));
            if alignment.is_aligned {
                lines.push(Line::new(LineKind::Aligned, "✓ Aligned with the Qibla"));
            } else {
                lines.push(Line::new(LineKind::Hint, turn_hint(&alignment)));
            }
        }
        None if snapshot.phase == SessionPhase::Tracking && snapshot.error.is_none() => {
            lines.push(Line::new(LineKind::Status, "Waiting for compass…"));
        }
        None => {}
    }

    lines
}
