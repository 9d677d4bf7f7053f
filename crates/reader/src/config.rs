//! 폴링 리더 설정
//!
//! [`ReaderConfig`]는 core의 [`ReaderSection`](harvester_core::config::ReaderSection)을
//! 런타임 `Duration` 값으로 변환한 불변 정책 스냅샷입니다.
//!
//! # 사용 예시
//! ```ignore
//! use harvester_core::config::HarvesterConfig;
//! use harvester_reader::config::ReaderConfig;
//!
//! let core_config = HarvesterConfig::default();
//! let config = ReaderConfig::from_core(&core_config.reader);
//! ```

use std::time::Duration;

use harvester_core::config::ReaderSection;
use harvester_core::error::ConfigError;

/// 폴링 리더 정책
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// EOF 이후 첫 재시도 대기 시간
    pub backoff: Duration,
    /// 재시도 대기 시간 상한
    pub max_backoff: Duration,
    /// 대기마다 곱해지는 증가 계수
    pub backoff_factor: u32,
    /// EOF 자체를 종료 조건으로 취급
    pub close_eof: bool,
    /// 비활성 판단 임계값 (항상 검사됨)
    pub close_inactive: Duration,
    /// 이름 변경 감지 시 종료
    pub close_renamed: bool,
    /// 삭제 감지 시 종료
    pub close_removed: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::from_core(&ReaderSection::default())
    }
}

impl ReaderConfig {
    /// core의 `[reader]` 섹션에서 리더 설정을 생성합니다.
    pub fn from_core(section: &ReaderSection) -> Self {
        Self {
            backoff: Duration::from_millis(section.backoff_ms),
            max_backoff: Duration::from_millis(section.max_backoff_ms),
            backoff_factor: section.backoff_factor,
            close_eof: section.close_eof,
            close_inactive: Duration::from_secs(section.close_inactive_secs),
            close_renamed: section.close_renamed,
            close_removed: section.close_removed,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// backoff가 `[backoff, max_backoff]` 범위를 유지하려면
    /// `backoff > 0`, `max_backoff >= backoff`, `backoff_factor >= 1`이어야 합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backoff.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "backoff".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_backoff < self.backoff {
            return Err(ConfigError::InvalidValue {
                field: "max_backoff".to_owned(),
                reason: format!(
                    "must be greater than or equal to backoff ({:?})",
                    self.backoff
                ),
            });
        }

        if self.backoff_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backoff_factor".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(())
    }
}

/// 리더 설정 빌더
#[derive(Default)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    /// 기본값으로 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 첫 재시도 대기 시간을 설정합니다.
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// 재시도 대기 시간 상한을 설정합니다.
    pub fn max_backoff(mut self, max_backoff: Duration) -> Self {
        self.config.max_backoff = max_backoff;
        self
    }

    /// backoff 증가 계수를 설정합니다.
    pub fn backoff_factor(mut self, factor: u32) -> Self {
        self.config.backoff_factor = factor;
        self
    }

    pub fn close_eof(mut self, enabled: bool) -> Self {
        self.config.close_eof = enabled;
        self
    }

    pub fn close_inactive(mut self, threshold: Duration) -> Self {
        self.config.close_inactive = threshold;
        self
    }

    pub fn close_renamed(mut self, enabled: bool) -> Self {
        self.config.close_renamed = enabled;
        self
    }

    pub fn close_removed(mut self, enabled: bool) -> Self {
        self.config.close_removed = enabled;
        self
    }

    /// 설정을 검증하고 `ReaderConfig`를 생성합니다.
    pub fn build(self) -> Result<ReaderConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
