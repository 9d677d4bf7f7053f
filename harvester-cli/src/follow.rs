//! Follow loop: drives a `PollingReader` and copies its output.
//!
//! Terminal signals are acted on through their `Disposition`:
//! `Reopen` opens the path again from offset 0, `Finish` ends the run
//! successfully, `Abort` ends it with an error.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use harvester_reader::backoff::{next_backoff, sleep_or_cancel};
use harvester_reader::source::stream::STDIN_NAME;
use harvester_reader::{
    CancellationToken, Disposition, FileSource, LogFile, PollingReader, ReadError, ReaderConfig,
    StreamSource,
};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// `-` selects standard input; anything else is a file path.
    pub fn from_arg(path: &Path) -> Self {
        if path == Path::new(STDIN_NAME) {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

/// Options for one follow run.
#[derive(Debug, Clone)]
pub struct FollowOptions {
    pub reader: ReaderConfig,
    pub buffer_size: usize,
    /// Start the first open at the current end of the file.
    pub from_end: bool,
}

/// How a follow run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The cancellation token fired.
    Cancelled,
    /// A `Finish` signal ended the run.
    Finished,
}

/// Summary returned when a follow run ends without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowReport {
    pub bytes: u64,
    pub reopens: u32,
    pub completion: Completion,
}

enum Outcome {
    Cancelled,
    Stopped(ReadError),
}

/// Follow a file by path until cancelled or a `Finish` signal arrives.
pub async fn follow_file<W>(
    path: &Path,
    options: &FollowOptions,
    out: &mut W,
    cancel: CancellationToken,
) -> Result<FollowReport>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; options.buffer_size];
    let mut report = FollowReport {
        bytes: 0,
        reopens: 0,
        completion: Completion::Finished,
    };

    let first = if options.from_end {
        LogFile::open_at_end(path).await
    } else {
        LogFile::open(path).await
    };
    let mut source =
        first.with_context(|| format!("failed to open {}", path.display()))?;

    loop {
        let mut reader =
            PollingReader::new(source, options.reader.clone(), cancel.clone()).await?;
        info!(source = reader.name(), offset = reader.offset(), "following source");

        let err = match pump(&mut reader, out, &mut buf, &mut report.bytes, &cancel).await? {
            Outcome::Cancelled => {
                report.completion = Completion::Cancelled;
                return Ok(report);
            }
            Outcome::Stopped(err) => err,
        };

        match err.disposition() {
            Disposition::Reopen => {
                info!(source = reader.name(), signal = %err, "reopening source");
            }
            Disposition::Finish => {
                info!(source = reader.name(), signal = %err, "source finished");
                return Ok(report);
            }
            Disposition::Abort => return Err(err.into()),
        }

        drop(reader);
        source = match reopen(path, &options.reader, &cancel).await? {
            Some(source) => source,
            None if cancel.is_cancelled() => {
                report.completion = Completion::Cancelled;
                return Ok(report);
            }
            None => return Ok(report),
        };
        report.reopens += 1;
    }
}

/// Follow a finite stream (stdin) until it ends or the run is cancelled.
pub async fn follow_stream<R, W>(
    name: &str,
    inner: R,
    options: &FollowOptions,
    out: &mut W,
    cancel: CancellationToken,
) -> Result<FollowReport>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; options.buffer_size];
    let mut report = FollowReport {
        bytes: 0,
        reopens: 0,
        completion: Completion::Finished,
    };

    let source = StreamSource::new(name, inner);
    let mut reader = PollingReader::new(source, options.reader.clone(), cancel.clone()).await?;

    match pump(&mut reader, out, &mut buf, &mut report.bytes, &cancel).await? {
        Outcome::Cancelled => report.completion = Completion::Cancelled,
        Outcome::Stopped(err) => match err.disposition() {
            Disposition::Abort => return Err(err.into()),
            _ => debug!(source = name, signal = %err, "stream finished"),
        },
    }

    Ok(report)
}

/// Copy reader output until cancellation or a signal.
///
/// Cancellation also drops an in-flight read, since a blocked stdin
/// read never returns to observe the token.
async fn pump<S, W>(
    reader: &mut PollingReader<S>,
    out: &mut W,
    buf: &mut [u8],
    total: &mut u64,
    cancel: &CancellationToken,
) -> Result<Outcome>
where
    S: FileSource,
    W: AsyncWrite + Unpin,
{
    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
            result = reader.read(buf) => result,
        };

        match result {
            Ok(0) => return Ok(Outcome::Cancelled),
            Ok(n) => {
                out.write_all(&buf[..n])
                    .await
                    .context("failed to write output")?;
                out.flush().await.context("failed to flush output")?;
                *total += n as u64;
            }
            Err(err) => return Ok(Outcome::Stopped(err)),
        }
    }
}

/// Reopen `path` from the start, waiting for it to reappear after rotation.
///
/// Gives up with `None` once the path has been missing for longer than
/// `close_inactive`, or when cancelled.
async fn reopen(
    path: &Path,
    config: &ReaderConfig,
    cancel: &CancellationToken,
) -> Result<Option<LogFile>> {
    let started = Instant::now();
    let mut backoff = config.backoff;

    loop {
        let err = match LogFile::open(path).await {
            Ok(source) => return Ok(Some(source)),
            Err(e) => e,
        };

        if err.kind() != io::ErrorKind::NotFound {
            return Err(err).with_context(|| format!("failed to reopen {}", path.display()));
        }

        let waited = started.elapsed();
        if waited > config.close_inactive {
            warn!(
                path = %path.display(),
                waited_ms = waited.as_millis() as u64,
                "file did not reappear, giving up"
            );
            return Ok(None);
        }

        debug!(
            path = %path.display(),
            backoff_ms = backoff.as_millis() as u64,
            "waiting for file to reappear"
        );
        if !sleep_or_cancel(backoff.min(remaining(config.close_inactive, waited)), cancel).await {
            return Ok(None);
        }
        backoff = next_backoff(backoff, config.backoff_factor, config.max_backoff);
    }
}

/// Time left before `limit`, at least 1ms so the final check runs past it.
fn remaining(limit: Duration, waited: Duration) -> Duration {
    limit.saturating_sub(waited).max(Duration::from_millis(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_dash_is_stdin() {
        assert_eq!(Input::from_arg(Path::new("-")), Input::Stdin);
    }

    #[test]
    fn test_input_path_is_file() {
        assert_eq!(
            Input::from_arg(Path::new("/var/log/app.log")),
            Input::File(PathBuf::from("/var/log/app.log"))
        );
    }

    #[test]
    fn test_remaining_never_zero() {
        let limit = Duration::from_secs(1);
        assert_eq!(remaining(limit, Duration::from_secs(2)), Duration::from_millis(1));
        assert_eq!(
            remaining(limit, Duration::from_millis(400)),
            Duration::from_millis(600)
        );
    }
}
