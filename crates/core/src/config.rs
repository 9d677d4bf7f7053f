//! 설정 관리 -- harvester.toml 파싱 및 런타임 설정
//!
//! [`HarvesterConfig`]는 모든 섹션의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`HARVESTER_READER_BACKOFF_MS=500` 형식)
//! 3. 설정 파일 (`harvester.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), harvester_core::error::HarvesterError> {
//! use harvester_core::config::HarvesterConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = HarvesterConfig::load("harvester.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = HarvesterConfig::parse("[reader]\nclose_eof = true")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, HarvesterError};

/// 허용되는 로그 레벨
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// 허용되는 로그 형식
pub const VALID_LOG_FORMATS: &[&str] = &["json", "pretty"];

/// Harvester 통합 설정
///
/// `harvester.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvesterConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 폴링 리더 설정
    #[serde(default)]
    pub reader: ReaderSection,
}

impl HarvesterConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, HarvesterError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, HarvesterError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HarvesterError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                HarvesterError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, HarvesterError> {
        toml::from_str(toml_str).map_err(|e| {
            HarvesterError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `HARVESTER_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "HARVESTER_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "HARVESTER_GENERAL_LOG_FORMAT");

        // Reader
        override_u64(&mut self.reader.backoff_ms, "HARVESTER_READER_BACKOFF_MS");
        override_u64(
            &mut self.reader.max_backoff_ms,
            "HARVESTER_READER_MAX_BACKOFF_MS",
        );
        override_u32(
            &mut self.reader.backoff_factor,
            "HARVESTER_READER_BACKOFF_FACTOR",
        );
        override_bool(&mut self.reader.close_eof, "HARVESTER_READER_CLOSE_EOF");
        override_u64(
            &mut self.reader.close_inactive_secs,
            "HARVESTER_READER_CLOSE_INACTIVE_SECS",
        );
        override_bool(
            &mut self.reader.close_renamed,
            "HARVESTER_READER_CLOSE_RENAMED",
        );
        override_bool(
            &mut self.reader.close_removed,
            "HARVESTER_READER_CLOSE_REMOVED",
        );
        override_usize(&mut self.reader.buffer_size, "HARVESTER_READER_BUFFER_SIZE");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), HarvesterError> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            }
            .into());
        }

        if !VALID_LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            }
            .into());
        }

        self.reader.validate()?;
        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 폴링 리더 설정 (`[reader]` 섹션)
///
/// 시간 값은 TOML에서 정수(밀리초/초)로 표기합니다.
/// 런타임 `Duration` 변환은 `harvester-reader`의 `ReaderConfig::from_core`가 담당합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSection {
    /// EOF 이후 첫 재시도 대기 시간 (밀리초)
    pub backoff_ms: u64,
    /// 재시도 대기 시간 상한 (밀리초)
    pub max_backoff_ms: u64,
    /// 대기마다 곱해지는 증가 계수 (1 이상)
    pub backoff_factor: u32,
    /// EOF 도달 즉시 읽기 종료
    pub close_eof: bool,
    /// 마지막 읽기 이후 이 시간(초)이 지나면 비활성으로 판단
    pub close_inactive_secs: u64,
    /// 파일 이름 변경 시 종료
    pub close_renamed: bool,
    /// 파일 삭제 시 종료
    pub close_removed: bool,
    /// 읽기 버퍼 크기 (바이트)
    pub buffer_size: usize,
}

impl Default for ReaderSection {
    fn default() -> Self {
        Self {
            backoff_ms: 1_000,
            max_backoff_ms: 10_000,
            backoff_factor: 2,
            close_eof: false,
            close_inactive_secs: 300, // 5 minutes
            close_renamed: false,
            close_removed: true,
            buffer_size: 16 * 1024, // 16KB
        }
    }
}

impl ReaderSection {
    /// `[reader]` 섹션의 값 범위를 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backoff_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reader.backoff_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_backoff_ms < self.backoff_ms {
            return Err(ConfigError::InvalidValue {
                field: "reader.max_backoff_ms".to_owned(),
                reason: format!(
                    "must be greater than or equal to backoff_ms ({})",
                    self.backoff_ms
                ),
            });
        }

        if self.backoff_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reader.backoff_factor".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        if self.close_inactive_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reader.close_inactive_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reader.buffer_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u32(target: &mut u32, env_key: &str) {
    override_parsed(target, env_key, "u32");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = HarvesterConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.reader.backoff_ms, 1_000);
        assert_eq!(config.reader.max_backoff_ms, 10_000);
        assert_eq!(config.reader.backoff_factor, 2);
        assert!(!config.reader.close_eof);
        assert!(!config.reader.close_renamed);
        assert!(config.reader.close_removed);
    }

    #[test]
    fn default_config_passes_validation() {
        HarvesterConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_empty_toml_uses_defaults() {
        let config = HarvesterConfig::parse("").unwrap();
        assert_eq!(config.reader, ReaderSection::default());
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[reader]
backoff_ms = 250
close_renamed = true
"#;
        let config = HarvesterConfig::parse(toml).unwrap();
        assert_eq!(config.reader.backoff_ms, 250);
        assert!(config.reader.close_renamed);
        // 나머지는 기본값 유지
        assert_eq!(config.reader.max_backoff_ms, 10_000);
        assert_eq!(config.general.log_format, "json");
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = HarvesterConfig::parse("reader = [[[").unwrap_err();
        assert!(matches!(
            err,
            HarvesterError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = HarvesterConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = HarvesterConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_backoff() {
        let mut config = HarvesterConfig::default();
        config.reader.backoff_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reader.backoff_ms"));
    }

    #[test]
    fn validate_rejects_max_backoff_below_backoff() {
        let mut config = HarvesterConfig::default();
        config.reader.backoff_ms = 5_000;
        config.reader.max_backoff_ms = 1_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_backoff_ms"));
    }

    #[test]
    fn validate_rejects_zero_backoff_factor() {
        let mut config = HarvesterConfig::default();
        config.reader.backoff_factor = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backoff_factor"));
    }

    #[test]
    fn validate_accepts_factor_of_one() {
        let mut config = HarvesterConfig::default();
        config.reader.backoff_factor = 1;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_buffer_size() {
        let mut config = HarvesterConfig::default();
        config.reader.buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_override_string() {
        let mut val = "previous".to_owned();
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_HARVESTER_STR", "overridden") };
        override_string(&mut val, "TEST_HARVESTER_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_HARVESTER_STR") };
    }

    #[test]
    fn env_override_bool_invalid_keeps_previous() {
        let mut val = false;
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_HARVESTER_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_HARVESTER_BOOL_BAD");
        assert!(!val);
        unsafe { std::env::remove_var("TEST_HARVESTER_BOOL_BAD") };
    }

    #[test]
    fn env_override_u64_valid() {
        let mut val = 1_000u64;
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 충돌하지 않습니다.
        unsafe { std::env::set_var("TEST_HARVESTER_U64", "250") };
        override_u64(&mut val, "TEST_HARVESTER_U64");
        assert_eq!(val, 250);
        unsafe { std::env::remove_var("TEST_HARVESTER_U64") };
    }

    #[test]
    fn env_override_missing_var_keeps_previous() {
        let mut val = 7u32;
        override_u32(&mut val, "TEST_HARVESTER_NONEXISTENT_12345");
        assert_eq!(val, 7);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = HarvesterConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = HarvesterConfig::parse(&toml_str).unwrap();
        assert_eq!(config.reader, parsed.reader);
        assert_eq!(config.general.log_level, parsed.general.log_level);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = HarvesterConfig::from_file("/nonexistent/path/harvester.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HarvesterError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
