//! EOF 진단 -- 더 읽을 데이터가 없는 이유를 분류합니다.
//!
//! 재개 가능한 소스에서 EOF를 만나면 리더는 [`observe`]로 관측값을 모은 뒤
//! [`classify`]로 종료 여부를 판단합니다. 검사는 [`CHECKS`]에 나열된 순서대로
//! 평가되며, 처음 일치한 검사가 보고 원인을 결정합니다.
//!
//! ```text
//! truncated > inactive > renamed (close_renamed) > removed (close_removed)
//! ```
//!
//! truncation이 가장 우선입니다. 잘린 파일은 식별자와 무관하게 기존 오프셋에서
//! 계속 읽으면 안전하지 않기 때문입니다.
//!
//! close_renamed와 close_removed가 모두 꺼져 있으면 사라진 파일은
//! 비활성 임계값으로만 감지됩니다.

use std::io;
use std::time::Duration;

use crate::config::ReaderConfig;
use crate::source::{FileSource, SourceInfo, stat_path};

/// EOF 진단이 찾아낸 종료 원인
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Truncated,
    Inactive,
    Renamed,
    Removed,
}

impl Terminal {
    /// 메트릭 레이블 및 로그용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Truncated => "truncated",
            Self::Inactive => "inactive",
            Self::Renamed => "renamed",
            Self::Removed => "removed",
        }
    }
}

/// EOF 시점에 수집한 관측값
#[derive(Debug, Clone)]
pub struct EofObservation {
    /// 리더가 추적 중인 오프셋
    pub offset: u64,
    /// 마지막 성공적인 읽기 이후 경과 시간
    pub idle: Duration,
    /// 열린 핸들 기준 스냅샷
    pub source: SourceInfo,
    /// 경로를 다시 stat 한 결과
    pub path: PathState,
}

/// 소스 경로를 독립적으로 다시 stat 한 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    /// 조회하지 않음: close_renamed/close_removed가 모두 꺼졌거나 경로가 없는 소스
    NotChecked,
    /// 경로 stat 실패
    Missing,
    /// 경로에 존재하는 파일의 스냅샷
    Present(SourceInfo),
}

/// 관측값에 대한 판정 함수
pub type Check = fn(&ReaderConfig, &EofObservation) -> bool;

/// 우선순위 순서의 (원인, 판정) 목록
pub const CHECKS: &[(Terminal, Check)] = &[
    (Terminal::Truncated, is_truncated),
    (Terminal::Inactive, is_inactive),
    (Terminal::Renamed, is_renamed),
    (Terminal::Removed, is_removed),
];

/// 처음 일치하는 종료 원인을 반환합니다. 없으면 재시도 대상입니다.
pub fn classify(config: &ReaderConfig, observation: &EofObservation) -> Option<Terminal> {
    CHECKS
        .iter()
        .find(|(_, check)| check(config, observation))
        .map(|(terminal, _)| *terminal)
}

/// 소스 핸들과 (필요 시) 경로를 stat 하여 관측값을 만듭니다.
///
/// 경로는 표시 이름이 아닌 [`FileSource::path`]로 조회합니다.
///
/// 핸들 stat 실패는 그대로 반환합니다. 읽기와 stat 사이에 파일이
/// 사라지는 경합은 피할 수 없으며 호출자가 별도 에러로 처리합니다.
pub async fn observe<S: FileSource>(
    source: &S,
    config: &ReaderConfig,
    offset: u64,
    idle: Duration,
) -> io::Result<EofObservation> {
    let info = source.stat().await?;

    let check_path = config.close_renamed || config.close_removed;
    let path = match source.path() {
        Some(path) if check_path => match stat_path(path).await {
            Ok(info) => PathState::Present(info),
            Err(_) => PathState::Missing,
        },
        _ => PathState::NotChecked,
    };

    Ok(EofObservation {
        offset,
        idle,
        source: info,
        path,
    })
}

fn is_truncated(_config: &ReaderConfig, observation: &EofObservation) -> bool {
    observation.source.size < observation.offset
}

fn is_inactive(config: &ReaderConfig, observation: &EofObservation) -> bool {
    observation.idle > config.close_inactive
}

fn is_renamed(config: &ReaderConfig, observation: &EofObservation) -> bool {
    config.close_renamed
        && match observation.path {
            PathState::NotChecked => false,
            PathState::Missing => true,
            PathState::Present(path) => !path.same_file(&observation.source),
        }
}

fn is_removed(config: &ReaderConfig, observation: &EofObservation) -> bool {
    config.close_removed && observation.path == PathState::Missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FileId;

    const INACTIVE: Duration = Duration::from_secs(100);

    fn config(close_renamed: bool, close_removed: bool) -> ReaderConfig {
        ReaderConfig {
            close_inactive: INACTIVE,
            close_renamed,
            close_removed,
            ..Default::default()
        }
    }

    fn info(size: u64, ino: u64) -> SourceInfo {
        SourceInfo {
            size,
            file_id: Some(FileId::new(1, ino)),
        }
    }

    /// 아무 조건에도 해당하지 않는 기본 관측값
    fn healthy() -> EofObservation {
        EofObservation {
            offset: 10,
            idle: Duration::from_secs(1),
            source: info(10, 7),
            path: PathState::Present(info(10, 7)),
        }
    }

    #[test]
    fn healthy_file_keeps_retrying() {
        assert_eq!(classify(&config(true, true), &healthy()), None);
    }

    #[test]
    fn detects_truncation() {
        let obs = EofObservation {
            source: info(3, 7),
            ..healthy()
        };
        assert_eq!(classify(&config(false, false), &obs), Some(Terminal::Truncated));
    }

    #[test]
    fn size_equal_to_offset_is_not_truncation() {
        let obs = EofObservation {
            offset: 10,
            source: info(10, 7),
            ..healthy()
        };
        assert_eq!(classify(&config(false, false), &obs), None);
    }

    #[test]
    fn truncation_wins_over_inactivity() {
        let obs = EofObservation {
            source: info(0, 7),
            idle: INACTIVE * 2,
            ..healthy()
        };
        assert_eq!(classify(&config(false, false), &obs), Some(Terminal::Truncated));
    }

    #[test]
    fn truncation_wins_over_rename() {
        let obs = EofObservation {
            source: info(0, 7),
            path: PathState::Present(info(50, 8)),
            ..healthy()
        };
        assert_eq!(classify(&config(true, true), &obs), Some(Terminal::Truncated));
    }

    #[test]
    fn inactivity_is_checked_without_policy() {
        let obs = EofObservation {
            idle: INACTIVE + Duration::from_millis(1),
            ..healthy()
        };
        assert_eq!(classify(&config(false, false), &obs), Some(Terminal::Inactive));
    }

    #[test]
    fn idle_exactly_at_threshold_is_not_inactive() {
        let obs = EofObservation {
            idle: INACTIVE,
            ..healthy()
        };
        assert_eq!(classify(&config(false, false), &obs), None);
    }

    #[test]
    fn inactivity_wins_over_removal() {
        let obs = EofObservation {
            idle: INACTIVE * 3,
            path: PathState::Missing,
            ..healthy()
        };
        assert_eq!(classify(&config(true, true), &obs), Some(Terminal::Inactive));
    }

    #[test]
    fn detects_rename_by_identity() {
        let obs = EofObservation {
            path: PathState::Present(info(0, 8)),
            ..healthy()
        };
        assert_eq!(classify(&config(true, false), &obs), Some(Terminal::Renamed));
    }

    #[test]
    fn rename_ignored_when_policy_disabled() {
        let obs = EofObservation {
            path: PathState::Present(info(0, 8)),
            ..healthy()
        };
        assert_eq!(classify(&config(false, true), &obs), None);
    }

    #[test]
    fn missing_path_counts_as_rename_before_removal() {
        let obs = EofObservation {
            path: PathState::Missing,
            ..healthy()
        };
        assert_eq!(classify(&config(true, true), &obs), Some(Terminal::Renamed));
    }

    #[test]
    fn detects_removal() {
        let obs = EofObservation {
            path: PathState::Missing,
            ..healthy()
        };
        assert_eq!(classify(&config(false, true), &obs), Some(Terminal::Removed));
    }

    #[test]
    fn vanished_file_undetected_without_policies() {
        let obs = EofObservation {
            path: PathState::Missing,
            ..healthy()
        };
        assert_eq!(classify(&config(false, false), &obs), None);
    }

    #[test]
    fn unknown_identity_is_not_a_rename() {
        let obs = EofObservation {
            source: SourceInfo {
                size: 10,
                file_id: None,
            },
            path: PathState::Present(info(10, 99)),
            ..healthy()
        };
        assert_eq!(classify(&config(true, true), &obs), None);
    }

    #[test]
    fn unchecked_path_is_neither_renamed_nor_removed() {
        let obs = EofObservation {
            path: PathState::NotChecked,
            ..healthy()
        };
        assert_eq!(classify(&config(true, true), &obs), None);
    }

    #[test]
    fn check_order_is_fixed() {
        let order: Vec<_> = CHECKS.iter().map(|(terminal, _)| terminal.as_str()).collect();
        assert_eq!(order, vec!["truncated", "inactive", "renamed", "removed"]);
    }
}
