//! 폴링 리더 에러 타입
//!
//! [`ReadError`]는 리더가 호출자에게 돌려주는 모든 신호를 표현합니다.
//! 예기치 않은 실패(`Io`, `Offset`)와 예상된 생명주기 종료
//! (`Truncated`, `Renamed`, `Removed`, `Inactive`, `EndOfStream`)를 구분하며,
//! 호출자는 [`ReadError::disposition`]으로 후속 조치를 결정합니다.
//!
//! `From<ReadError> for HarvesterError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use std::time::Duration;

use harvester_core::error::HarvesterError;

/// 폴링 리더 도메인 에러
///
/// 변형 집합은 고정되어 있으며, 호출자는 패턴 매칭으로 원인을 구분합니다.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// 파일 크기가 추적 중인 오프셋보다 작아짐
    #[error("detected file being truncated: {name} (offset {offset} > size {size})")]
    Truncated {
        /// 소스 이름
        name: String,
        /// 리더가 추적하던 오프셋
        offset: u64,
        /// 다시 조회한 파일 크기
        size: u64,
    },

    /// 파일이 같은 경로에서 더 이상 발견되지 않음 (rotation)
    #[error("file was renamed: {name}")]
    Renamed {
        /// 소스 이름
        name: String,
    },

    /// 파일 경로가 삭제됨
    #[error("file was removed: {name}")]
    Removed {
        /// 소스 이름
        name: String,
    },

    /// 마지막 읽기 이후 비활성 임계값 초과
    #[error("file inactive: {name} (idle {idle:?})")]
    Inactive {
        /// 소스 이름
        name: String,
        /// 마지막 읽기 이후 경과 시간
        idle: Duration,
    },

    /// 재개 불가능한 스트림의 끝, 또는 close_eof 정책에 의한 종료
    #[error("end of stream: {name}")]
    EndOfStream {
        /// 소스 이름
        name: String,
    },

    /// EOF 진단 중 소스 핸들 stat 실패
    #[error("failed to stat {name}: {source}")]
    Stat {
        /// 소스 이름
        name: String,
        /// 원본 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// EOF가 아닌 읽기 에러 (재시도 없이 그대로 전달)
    #[error("read error on {name}: {source}")]
    Io {
        /// 소스 이름
        name: String,
        /// 원본 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// 생성 시 seek 가능한 소스의 현재 위치를 얻지 못함
    #[error("failed to determine initial offset of {name}: {source}")]
    Offset {
        /// 소스 이름
        name: String,
        /// 원본 I/O 에러
        #[source]
        source: std::io::Error,
    },
}

/// 종료 신호를 받은 호출자가 취해야 할 조치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 새 핸들로 다시 열기 (truncated, renamed)
    Reopen,
    /// 영구 종료 처리 (removed, inactive, end of stream, stat 실패)
    Finish,
    /// 로그를 남기고 중단 (예기치 않은 I/O 에러)
    Abort,
}

impl ReadError {
    /// 이 신호에 대한 호출자 조치를 반환합니다.
    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Truncated { .. } | Self::Renamed { .. } => Disposition::Reopen,
            Self::Removed { .. }
            | Self::Inactive { .. }
            | Self::EndOfStream { .. }
            | Self::Stat { .. } => Disposition::Finish,
            Self::Io { .. } | Self::Offset { .. } => Disposition::Abort,
        }
    }

    /// 리더 실패가 아닌, 예상된 생명주기 종료인지 확인합니다.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::Renamed { .. }
                | Self::Removed { .. }
                | Self::Inactive { .. }
                | Self::EndOfStream { .. }
        )
    }

    /// 신호가 발생한 소스 이름
    pub fn source_name(&self) -> &str {
        match self {
            Self::Truncated { name, .. }
            | Self::Renamed { name }
            | Self::Removed { name }
            | Self::Inactive { name, .. }
            | Self::EndOfStream { name }
            | Self::Stat { name, .. }
            | Self::Io { name, .. }
            | Self::Offset { name, .. } => name,
        }
    }
}

impl From<ReadError> for HarvesterError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Io { source, .. } | ReadError::Offset { source, .. } => {
                HarvesterError::Io(source)
            }
            other => HarvesterError::Reader(other.to_string()),
        }
    }
}
