//! 폴링 리더
//!
//! [`PollingReader`]는 하나의 소스를 감싸 오프셋을 추적하고, EOF에서
//! backoff 대기 후 재시도하며, 종료 조건을 분류된 신호로 보고합니다.
//!
//! # 읽기 루프
//! ```text
//! cancelled? ──yes──> Ok(0)
//!     │
//! source.read ──Err──> ReadError::Io
//!     │ n > 0 ──────> offset += n, backoff = base, Ok(n)
//!     │ EOF
//! continuable? ──no──> ReadError::EndOfStream
//!     │
//! diagnostics ──terminal──> ReadError::{Truncated, Inactive, Renamed, Removed, ...}
//!     │
//! sleep(backoff), backoff = min(backoff × factor, max), 처음으로
//! ```
//!
//! 하나의 `read` 호출이 여러 번의 하위 읽기/stat/대기를 포함할 수 있으며,
//! 호출자에게는 하나의 논리적 연산으로 보입니다.

use std::time::Duration;

use harvester_core::metrics as m;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::backoff::{next_backoff, sleep_or_cancel};
use crate::config::ReaderConfig;
use crate::diagnostics::{self, EofObservation, Terminal};
use crate::error::ReadError;
use crate::source::FileSource;

/// 계속 커지는 소스를 추적하는 폴링 리더
///
/// 하나의 소스당 하나의 인스턴스를 생성하며, 종료 신호를 받으면 버립니다.
/// 리더는 소스를 닫지 않습니다. 소스 정리는 호출자 책임입니다.
pub struct PollingReader<S> {
    /// 읽기 대상
    source: S,
    /// 불변 정책
    config: ReaderConfig,
    /// 지금까지 호출자에게 전달한 바이트 수
    offset: u64,
    /// 마지막으로 바이트를 전달한 시각
    last_read: Instant,
    /// 다음 재시도 전 대기 시간
    backoff: Duration,
    /// 외부 취소 신호 (관찰만 함)
    cancel: CancellationToken,
}

impl<S: FileSource> PollingReader<S> {
    /// 새 리더를 생성합니다.
    ///
    /// seek 가능한 소스는 현재 위치를 시작 오프셋으로 사용하고,
    /// 그렇지 않으면 0에서 시작합니다.
    ///
    /// `config`는 [`ReaderConfig::validate`]를 통과한 값이어야 합니다
    /// ([`ReaderConfigBuilder`](crate::config::ReaderConfigBuilder) 또는 `from_core` 후 검증).
    /// `backoff`가 0이면 EOF 재시도가 대기 없이 반복되고, `max_backoff < backoff`이면
    /// 대기 시간이 기준값 아래로 내려갑니다.
    pub async fn new(
        mut source: S,
        config: ReaderConfig,
        cancel: CancellationToken,
    ) -> Result<Self, ReadError> {
        debug_assert!(
            config.validate().is_ok(),
            "PollingReader requires a validated ReaderConfig"
        );

        let offset = match source.current_offset().await {
            Some(Ok(offset)) => offset,
            Some(Err(e)) => {
                return Err(ReadError::Offset {
                    name: source.name().to_owned(),
                    source: e,
                });
            }
            None => 0,
        };

        debug!(source = source.name(), offset, "polling reader created");

        Ok(Self {
            backoff: config.backoff,
            source,
            config,
            offset,
            last_read: Instant::now(),
            cancel,
        })
    }

    /// 새로 추가된 바이트를 버퍼에 채웁니다.
    ///
    /// 데이터가 생기거나, 종료 조건이 감지되거나, 취소될 때까지 대기합니다.
    ///
    /// - `Ok(n)` (`n > 0`): 읽은 바이트 수. 버퍼가 다 차지 않아도 즉시 반환합니다.
    /// - `Ok(0)`: 취소되었거나 빈 버퍼가 주어진 경우.
    /// - `Err(_)`: 종료 신호 또는 예기치 않은 에러. 이 경우 전달된 바이트는 없습니다.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        loop {
            if self.cancel.is_cancelled() {
                debug!(source = self.source.name(), "read cancelled");
                return Ok(0);
            }

            let n = match self.source.read(buf).await {
                Ok(n) => n,
                Err(e) => {
                    error!(
                        source = self.source.name(),
                        error = %e,
                        "unexpected error reading from source"
                    );
                    metrics::counter!(m::READER_IO_ERRORS_TOTAL).increment(1);
                    return Err(ReadError::Io {
                        name: self.source.name().to_owned(),
                        source: e,
                    });
                }
            };

            if n > 0 || buf.is_empty() {
                self.record_read(n);
                return Ok(n);
            }

            if !self.source.continuable() {
                debug!(source = self.source.name(), "source is not continuable");
                metrics::counter!(m::READER_TERMINAL_SIGNALS_TOTAL, m::LABEL_SIGNAL => "eof")
                    .increment(1);
                return Err(self.end_of_stream());
            }

            if let Some(err) = self.check_eof().await {
                return Err(err);
            }

            debug!(
                source = self.source.name(),
                backoff_ms = self.backoff.as_millis() as u64,
                "end of file reached, backing off"
            );
            self.wait().await;
        }
    }

    /// 지금까지 호출자에게 전달한 바이트 수
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 다음 재시도 전 대기 시간
    pub fn current_backoff(&self) -> Duration {
        self.backoff
    }

    /// 소스 이름
    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// 리더를 해체하고 소스를 돌려받습니다.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn record_read(&mut self, n: usize) {
        if n > 0 {
            self.offset += n as u64;
            self.last_read = Instant::now();
            metrics::counter!(m::READER_BYTES_READ_TOTAL).increment(n as u64);
        }
        self.backoff = self.config.backoff;
    }

    /// EOF의 원인을 진단합니다. `None`이면 재시도합니다.
    async fn check_eof(&self) -> Option<ReadError> {
        if self.config.close_eof {
            debug!(source = self.source.name(), "close_eof enabled, stopping at end of file");
            metrics::counter!(m::READER_TERMINAL_SIGNALS_TOTAL, m::LABEL_SIGNAL => "eof")
                .increment(1);
            return Some(self.end_of_stream());
        }

        let observation = match diagnostics::observe(
            &self.source,
            &self.config,
            self.offset,
            self.last_read.elapsed(),
        )
        .await
        {
            Ok(observation) => observation,
            Err(e) => {
                error!(
                    source = self.source.name(),
                    error = %e,
                    "unexpected error checking source state"
                );
                return Some(ReadError::Stat {
                    name: self.source.name().to_owned(),
                    source: e,
                });
            }
        };

        let terminal = diagnostics::classify(&self.config, &observation)?;
        warn!(
            source = self.source.name(),
            signal = terminal.as_str(),
            offset = observation.offset,
            size = observation.source.size,
            idle_ms = observation.idle.as_millis() as u64,
            "stopping reader"
        );
        metrics::counter!(m::READER_TERMINAL_SIGNALS_TOTAL, m::LABEL_SIGNAL => terminal.as_str())
            .increment(1);
        Some(self.terminal_error(terminal, &observation))
    }

    fn terminal_error(&self, terminal: Terminal, observation: &EofObservation) -> ReadError {
        let name = self.source.name().to_owned();
        match terminal {
            Terminal::Truncated => ReadError::Truncated {
                name,
                offset: observation.offset,
                size: observation.source.size,
            },
            Terminal::Inactive => ReadError::Inactive {
                name,
                idle: observation.idle,
            },
            Terminal::Renamed => ReadError::Renamed { name },
            Terminal::Removed => ReadError::Removed { name },
        }
    }

    fn end_of_stream(&self) -> ReadError {
        ReadError::EndOfStream {
            name: self.source.name().to_owned(),
        }
    }

    /// backoff만큼 대기한 뒤 다음 대기 시간을 늘립니다.
    ///
    /// 취소되면 backoff를 늘리지 않고 돌아가며, 루프 처음의 취소 검사에서 종료됩니다.
    async fn wait(&mut self) {
        metrics::counter!(m::READER_BACKOFF_WAITS_TOTAL).increment(1);
        if sleep_or_cancel(self.backoff, &self.cancel).await {
            self.backoff =
                next_backoff(self.backoff, self.config.backoff_factor, self.config.max_backoff);
        }
    }
}
