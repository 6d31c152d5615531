//! `track` command - run a live session and render every update.
//!
//! The position comes from `--lat/--lon` or the configured location; the
//! orientation stream comes from a simulated sweep, stdin lines, or nothing.
//! Pressing Enter grants orientation permission when the session asks for it
//! and otherwise dismisses the current warning. Ctrl+C ends the session.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::Term;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use qiblafinder::config::{ConfigFile, OrientationMode, OrientationSettings};
use qiblafinder::coord::GeoCoordinate;
use qiblafinder::sensors::{
    DeniedPositionSource, FixedPositionSource, LineOrientationSource, NoOrientationSource,
    OrientationSource, PermissionPolicy, PositionSource, SampleConvention, SweepConfig,
    SweepOrientationSource,
};
use qiblafinder::session::{Session, SessionHandle, SessionPhase, SessionSnapshot};

use crate::error::CliError;
use crate::render::{render_lines, Line};

/// Arguments for the track command.
#[derive(Debug, Args)]
pub struct TrackArgs {
    /// Latitude in degrees (overrides location.latitude)
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude in degrees (overrides location.longitude)
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    pub lon: Option<f64>,

    /// Orientation input: sweep, stdin or none (overrides orientation.mode)
    #[arg(long)]
    pub orientation: Option<OrientationMode>,

    /// Require an explicit grant (Enter) before the compass starts
    #[arg(long)]
    pub require_permission: bool,

    /// Simulate a denied location permission
    #[arg(long)]
    pub deny_location: bool,

    /// Print one JSON snapshot per line instead of the live display
    #[arg(long)]
    pub json: bool,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<u64>,
}

/// How snapshots are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    /// Redraw in place on a terminal, append otherwise.
    Human,
    Json,
}

/// Run the track command.
pub fn run(args: TrackArgs, config: &ConfigFile) -> Result<(), CliError> {
    let mode = args.orientation.unwrap_or(config.orientation.mode);
    let require_permission = args.require_permission || config.orientation.require_permission;
    if mode == OrientationMode::Stdin && require_permission {
        return Err(CliError::InvalidArgument(
            "--require-permission needs Enter on stdin, which --orientation stdin already uses"
                .to_string(),
        ));
    }

    let stop = CancellationToken::new();
    let on_signal = stop.clone();
    ctrlc::set_handler(move || on_signal.cancel()).map_err(|e| CliError::Signal(e.to_string()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let output = if args.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };
    let duration = args.duration.map(Duration::from_secs);

    let position = position_source(&args, config)?;
    let orientation = orientation_source(mode, require_permission, &config.orientation);
    tracing::info!(
        position = position.name(),
        orientation = orientation.name(),
        require_permission,
        "Starting live tracking"
    );

    let listen_for_enter = mode != OrientationMode::Stdin;
    let result = runtime.block_on(async move {
        let handle = Session::start(position, orientation);
        track(handle, output, duration, stop, listen_for_enter).await
    });

    // The Enter listener may be parked in a blocking stdin read.
    runtime.shutdown_background();

    let final_snapshot = result?;
    match final_snapshot.error {
        Some(error) if error.is_terminal() => Err(CliError::Location(error)),
        _ => Ok(()),
    }
}

/// Position source from flags, then configuration.
fn position_source(
    args: &TrackArgs,
    config: &ConfigFile,
) -> Result<Arc<dyn PositionSource>, CliError> {
    if args.deny_location {
        return Ok(Arc::new(DeniedPositionSource::permission_denied()));
    }

    let coordinate = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(GeoCoordinate::new(lat, lon)?),
        _ => config.location.coordinate(),
    };

    Ok(match coordinate {
        Some(coordinate) => Arc::new(FixedPositionSource::new(coordinate)),
        None => {
            tracing::warn!("No position configured");
            Arc::new(DeniedPositionSource::unsupported())
        }
    })
}

fn orientation_source(
    mode: OrientationMode,
    require_permission: bool,
    settings: &OrientationSettings,
) -> Arc<dyn OrientationSource> {
    let permission = if require_permission {
        PermissionPolicy::Grant
    } else {
        PermissionPolicy::NotRequired
    };

    match mode {
        OrientationMode::Sweep => Arc::new(SweepOrientationSource::new(SweepConfig {
            start_heading: 0.0,
            rate_deg_per_sec: settings.sweep_rate,
            sample_interval: settings.sample_interval(),
            convention: SampleConvention::Compass,
            permission,
        })),
        OrientationMode::Stdin => Arc::new(LineOrientationSource::with_permission(
            BufReader::new(tokio::io::stdin()),
            permission,
        )),
        OrientationMode::None => Arc::new(NoOrientationSource),
    }
}

/// Render updates until the session ends, the user stops it, or time runs out.
async fn track(
    handle: SessionHandle,
    output: OutputMode,
    duration: Option<Duration>,
    stop: CancellationToken,
    listen_for_enter: bool,
) -> Result<SessionSnapshot, CliError> {
    let mut updates = handle.subscribe();
    let mut display = Display::new(output);
    let initial = updates.borrow_and_update().clone();
    display.show(&initial)?;

    let (enter_tx, mut enter_rx) = mpsc::unbounded_channel();
    if listen_for_enter {
        tokio::spawn(read_enter_presses(enter_tx, stop.clone()));
    }

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut finished = initial.phase.is_terminal();
    while !finished {
        tokio::select! {
            _ = stop.cancelled() => {
                tracing::info!("Tracking interrupted");
                break;
            }
            _ = &mut deadline => {
                tracing::info!("Tracking duration elapsed");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                display.show(&snapshot)?;
                finished = snapshot.phase.is_terminal();
            }
            Some(()) = enter_rx.recv() => on_enter(&handle),
        }
    }

    stop.cancel();
    Ok(handle.shutdown().await)
}

/// Enter grants permission while the session waits for it, otherwise it
/// dismisses a dismissible warning.
fn on_enter(handle: &SessionHandle) {
    let snapshot = handle.snapshot();
    if snapshot.phase == SessionPhase::AwaitingOrientationPermission {
        tracing::debug!("User granted orientation permission");
        handle.grant_orientation_permission();
    } else if snapshot.error.is_some_and(|e| e.is_dismissible()) {
        handle.dismiss_error();
    }
}

async fn read_enter_presses(presses: mpsc::UnboundedSender<()>, stop: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            line = lines.next_line() => match line {
                Ok(Some(_)) => {
                    if presses.send(()).is_err() {
                        break;
                    }
                }
                Ok(None) | Err(_) => break,
            },
        }
    }
}

/// Writes snapshots to stdout in the selected mode.
struct Display {
    mode: OutputMode,
    term: Term,
    live: bool,
    previous: Vec<Line>,
}

impl Display {
    fn new(mode: OutputMode) -> Self {
        let term = Term::stdout();
        let live = mode == OutputMode::Human && term.is_term();
        Self {
            mode,
            term,
            live,
            previous: Vec::new(),
        }
    }

    fn show(&mut self, snapshot: &SessionSnapshot) -> Result<(), CliError> {
        match self.mode {
            OutputMode::Json => {
                self.term.write_line(&serde_json::to_string(snapshot)?)?;
            }
            OutputMode::Human => {
                let lines = render_lines(snapshot);
                if lines == self.previous {
                    return Ok(());
                }

                if self.live && !self.previous.is_empty() {
                    self.term.clear_last_lines(self.previous.len())?;
                } else if !self.previous.is_empty() {
                    self.term.write_line("")?;
                }

                for line in &lines {
                    if self.live {
                        self.term.write_line(&line.styled())?;
                    } else {
                        self.term.write_line(&line.text)?;
                    }
                }
                self.previous = lines;
            }
        }
        Ok(())
    }
}
