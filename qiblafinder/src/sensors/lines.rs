//! Orientation source fed by text lines, e.g. a sensor bridge piped to stdin.
//!
//! # Line Format
//!
//! ```text
//! compass=123.4     direct compass heading
//! alpha=236.6       rotation angle (inverted during normalization)
//! 123.4             bare number, treated as a compass heading
//! none              sample with no heading data
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Unparseable lines
//! are logged and skipped; they never end the stream.

use std::sync::Mutex;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::permission::{PermissionGate, PermissionPolicy};
use super::traits::{
    BoxFuture, OrientationError, OrientationSource, PermissionStatus,
    ORIENTATION_CHANNEL_CAPACITY,
};
use crate::heading::OrientationSample;

/// Parse one input line into a sample.
///
/// Returns `None` for lines that carry nothing (blank, comment) or cannot be
/// parsed.
pub fn parse_sample_line(line: &str) -> Option<OrientationSample> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    if line.eq_ignore_ascii_case("none") {
        return Some(OrientationSample::empty());
    }

    match line.split_once('=') {
        Some((key, value)) => {
            let value: f64 = value.trim().parse().ok()?;
            match key.trim().to_ascii_lowercase().as_str() {
                "compass" | "heading" => Some(OrientationSample::compass(value)),
                "alpha" => Some(OrientationSample::rotation(value)),
                _ => None,
            }
        }
        None => line.parse::<f64>().ok().map(OrientationSample::compass),
    }
}

/// Orientation source reading samples from an async line reader.
///
/// The reader can be consumed by a single subscription only; later
/// subscriptions report `OrientationError::Unavailable`.
pub struct LineOrientationSource<R> {
    reader: Mutex<Option<R>>,
    gate: PermissionGate,
}

impl<R> std::fmt::Debug for LineOrientationSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let consumed = self.reader.lock().map(|r| r.is_none()).unwrap_or(true);
        f.debug_struct("LineOrientationSource")
            .field("consumed", &consumed)
            .field("gate", &self.gate)
            .finish()
    }
}

impl<R> LineOrientationSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    /// Create a source over `reader` with no permission step.
    pub fn new(reader: R) -> Self {
        Self::with_permission(reader, PermissionPolicy::NotRequired)
    }

    /// Create a source over `reader` with the given permission behaviour.
    pub fn with_permission(reader: R, permission: PermissionPolicy) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            gate: PermissionGate::new(permission),
        }
    }
}

impl<R> OrientationSource for LineOrientationSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn requires_permission(&self) -> bool {
        self.gate.requires_permission()
    }

    fn request_permission(&self) -> BoxFuture<'_, PermissionStatus> {
        let status = self.gate.resolve();
        Box::pin(async move { status })
    }

    fn subscribe(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<OrientationSample>, OrientationError> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| OrientationError::Unavailable)?
            .take()
            .ok_or(OrientationError::Unavailable)?;

        let (tx, rx) = mpsc::channel(ORIENTATION_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Line orientation listener released");
                        break;
                    }
                    line = lines.next_line() => {
                        let line = match line {
                            Ok(Some(line)) => line,
                            Ok(None) => {
                                tracing::debug!("Orientation input reached end of stream");
                                break;
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Failed to read orientation input");
                                break;
                            }
                        };

                        let Some(sample) = parse_sample_line(&line) else {
                            if !line.trim().is_empty() && !line.trim_start().starts_with('#') {
                                tracing::warn!(line = %line, "Ignoring unparseable orientation line");
                            }
                            continue;
                        };

                        if tx.send(sample).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "lines"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compass() {
        assert_eq!(
            parse_sample_line("compass=123.5"),
            Some(OrientationSample::compass(123.5))
        );
        assert_eq!(
            parse_sample_line("  heading = 10 "),
            Some(OrientationSample::compass(10.0))
        );
    }

    #[test]
    fn test_parse_alpha() {
        assert_eq!(
            parse_sample_line("alpha=90"),
            Some(OrientationSample::rotation(90.0))
        );
    }

    #[test]
    fn test_parse_bare_number() {
        assert_eq!(
            parse_sample_line("58.5"),
            Some(OrientationSample::compass(58.5))
        );
    }

    #[test]
    fn test_parse_none() {
        assert_eq!(parse_sample_line("none"), Some(OrientationSample::empty()));
    }

    #[test]
    fn test_parse_skips_noise() {
        assert_eq!(parse_sample_line(""), None);
        assert_eq!(parse_sample_line("# comment"), None);
        assert_eq!(parse_sample_line("beta=10"), None);
        assert_eq!(parse_sample_line("compass=north"), None);
    }

    #[tokio::test]
    async fn test_subscribe_reads_lines() {
        let input: &[u8] = b"compass=10\n# skip\nalpha=90\ngarbage\nnone\n";
        let source = LineOrientationSource::new(input);
        let mut rx = source.subscribe(CancellationToken::new()).unwrap();

        assert_eq!(rx.recv().await, Some(OrientationSample::compass(10.0)));
        assert_eq!(rx.recv().await, Some(OrientationSample::rotation(90.0)));
        assert_eq!(rx.recv().await, Some(OrientationSample::empty()));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_second_subscription_is_unavailable() {
        let input: &[u8] = b"";
        let source = LineOrientationSource::new(input);
        let _first = source.subscribe(CancellationToken::new()).unwrap();
        let second = source.subscribe(CancellationToken::new());
        assert_eq!(second.err(), Some(OrientationError::Unavailable));
    }
}
