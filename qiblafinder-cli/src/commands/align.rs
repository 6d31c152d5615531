//! `align` command - evaluate a heading against a bearing.

use clap::Args;

use qiblafinder::alignment::{evaluate, ALIGNMENT_TOLERANCE_DEG};
use qiblafinder::bearing::Bearing;
use qiblafinder::heading::Heading;

use crate::error::CliError;
use crate::render::{arrow_glyph, turn_hint};

/// Arguments for the align command.
#[derive(Debug, Args)]
pub struct AlignArgs {
    /// Target bearing in degrees clockwise from north
    #[arg(long, allow_hyphen_values = true)]
    pub bearing: f64,

    /// Device heading in degrees clockwise from north
    #[arg(long, allow_hyphen_values = true)]
    pub heading: f64,
}

/// Run the align command.
pub fn run(args: AlignArgs) -> Result<(), CliError> {
    for (name, value) in [("bearing", args.bearing), ("heading", args.heading)] {
        if !value.is_finite() {
            return Err(CliError::InvalidArgument(format!(
                "--{} must be a finite number of degrees",
                name
            )));
        }
    }

    let bearing = Bearing::from_degrees(args.bearing);
    let heading = Heading::from_degrees(args.heading);
    let result = evaluate(bearing, heading);

    println!("Bearing:    {}", bearing);
    println!("Heading:    {}", heading);
    println!(
        "Difference: {:+.2}° ({})",
        result.signed_difference, result.turn_direction
    );
    println!(
        "Pointer:    {} {:.1}°",
        arrow_glyph(result.rotation_deg()),
        result.rotation_deg()
    );
    println!(
        "Aligned:    {} (tolerance ±{}°)",
        if result.is_aligned { "yes" } else { "no" },
        ALIGNMENT_TOLERANCE_DEG
    );
    if !result.is_aligned {
        println!("{}", turn_hint(&result));
    }

    Ok(())
}
