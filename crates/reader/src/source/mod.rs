//! 파일 소스 추상화 -- 리더가 소비하는 읽기 대상
//!
//! # 소스 종류
//! - [`LogFile`]: 경로로 연 일반 파일 (seek 가능, 재개 가능)
//! - [`StreamSource`]: 표준 입력 등 유한 스트림 (seek 불가, 재개 불가)
//!
//! 리더는 [`FileSource`] trait만 사용하므로 새로운 입력 종류는
//! 이 trait을 구현해 추가합니다.

pub mod file;
pub mod stream;

pub use file::LogFile;
pub use stream::StreamSource;

use std::fmt;
use std::fs::Metadata;
use std::future::Future;
use std::io;
use std::path::Path;

/// 플랫폼 독립적인 파일 식별자
///
/// Unix에서는 device ID + inode 번호입니다.
/// 이름이 바뀌어도 유지되므로 rotation 감지에 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    /// Device ID
    dev: u64,
    /// Inode 번호
    ino: u64,
}

impl FileId {
    /// device/inode 값으로 생성합니다.
    pub fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// 메타데이터에서 식별자를 추출합니다.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;

        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    /// 메타데이터에서 식별자를 추출합니다.
    ///
    /// 안정적인 식별자를 제공하지 않는 플랫폼에서는 `None`입니다.
    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }

    pub fn dev(&self) -> u64 {
        self.dev
    }

    pub fn ino(&self) -> u64 {
        self.ino
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dev, self.ino)
    }
}

/// 특정 시점의 소스 메타데이터 스냅샷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    /// 현재 크기 (바이트)
    pub size: u64,
    /// 파일 식별자 (알 수 없으면 `None`)
    pub file_id: Option<FileId>,
}

impl SourceInfo {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            file_id: FileId::from_metadata(metadata),
        }
    }

    /// 두 스냅샷이 같은 파일을 가리키는지 확인합니다.
    ///
    /// 어느 한쪽이라도 식별자가 없으면 비교할 수 없으므로 같은 파일로 간주합니다.
    pub fn same_file(&self, other: &SourceInfo) -> bool {
        match (self.file_id, other.file_id) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

/// 리더가 소비하는 소스 능력 집합
///
/// 구현체는 다음 계약을 지켜야 합니다.
/// - `read`가 비어 있지 않은 버퍼에 대해 `Ok(0)`을 반환하면 현재 스트림의 끝(EOF)입니다.
/// - `name`은 진단/로그 전용 표시 이름입니다. 손실 변환일 수 있으므로 stat에 쓰지 않습니다.
/// - `path`는 rename/remove 검사 시 다시 stat 할 실제 경로입니다. 경로가 없는 소스는
///   해당 검사를 건너뜁니다.
/// - `continuable`이 `false`인 소스는 EOF에서 즉시 종료됩니다.
pub trait FileSource: Send {
    /// 버퍼에 읽은 바이트 수를 반환합니다.
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// 표시용 이름
    fn name(&self) -> &str;

    /// rename/remove 검사에 쓰는 경로. 경로로 열지 않은 소스는 `None`.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// 열린 핸들 기준의 메타데이터 스냅샷
    fn stat(&self) -> impl Future<Output = io::Result<SourceInfo>> + Send;

    /// EOF 이후에도 데이터가 추가될 수 있는 소스인지 여부
    fn continuable(&self) -> bool;

    /// seek 가능한 소스의 현재 읽기 위치. seek 불가능하면 `None`.
    fn current_offset(&mut self) -> impl Future<Output = Option<io::Result<u64>>> + Send {
        async { None }
    }
}

/// 핸들과 무관하게 경로를 직접 stat 합니다.
pub async fn stat_path(path: impl AsRef<Path>) -> io::Result<SourceInfo> {
    let metadata = tokio::fs::metadata(path).await?;
    Ok(SourceInfo::from_metadata(&metadata))
}
