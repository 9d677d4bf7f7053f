//! 일반 파일 소스
//!
//! `tail -f`처럼 계속 커지는 파일을 읽습니다. 핸들은 열린 상태로 유지되며,
//! 파일이 rotation 되어도 기존 inode를 계속 가리킵니다.

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::{FileSource, SourceInfo};

/// 경로로 연 로그 파일
#[derive(Debug)]
pub struct LogFile {
    /// 파일 경로
    path: PathBuf,
    /// 표시용 이름 (경로의 손실 변환, 로그 전용)
    name: String,
    /// 열린 파일 핸들
    file: File,
}

impl LogFile {
    /// 파일을 처음부터 읽도록 엽니다.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;
        Ok(Self {
            name: path.display().to_string(),
            path,
            file,
        })
    }

    /// 파일을 현재 끝에서부터 읽도록 엽니다.
    ///
    /// 리더는 생성 시 `current_offset`으로 이 위치를 오프셋으로 가져갑니다.
    pub async fn open_at_end(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut log_file = Self::open(path).await?;
        log_file.file.seek(SeekFrom::End(0)).await?;
        Ok(log_file)
    }
}

impl FileSource for LogFile {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> Option<&Path> {
        Some(self.path.as_path())
    }

    async fn stat(&self) -> io::Result<SourceInfo> {
        let metadata = self.file.metadata().await?;
        Ok(SourceInfo::from_metadata(&metadata))
    }

    fn continuable(&self) -> bool {
        true
    }

    async fn current_offset(&mut self) -> Option<io::Result<u64>> {
        Some(self.file.stream_position().await)
    }
}
