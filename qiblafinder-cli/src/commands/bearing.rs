//! `bearing` command - one-shot Qibla bearing for a position.

use clap::Args;

use qiblafinder::bearing::{qibla_bearing, qibla_distance_km};
use qiblafinder::coord::{GeoCoordinate, KAABA};

use crate::error::CliError;
use crate::render::format_distance;

/// Arguments for the bearing command.
#[derive(Debug, Args)]
pub struct BearingArgs {
    /// Latitude in degrees, positive north
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in degrees, positive east
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
}

/// Run the bearing command.
pub fn run(args: BearingArgs) -> Result<(), CliError> {
    let position = GeoCoordinate::new(args.lat, args.lon)?;
    let bearing = qibla_bearing(&position);
    let distance = qibla_distance_km(&position);

    tracing::debug!(%position, %bearing, distance_km = distance, "Computed bearing");

    println!("Position:        {}", position);
    println!("Kaaba:           {}", KAABA);
    println!("Qibla Direction: {}", bearing);
    println!("Distance:        {}", format_distance(distance));

    Ok(())
}
