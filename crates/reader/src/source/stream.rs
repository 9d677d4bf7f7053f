//! 유한 스트림 소스 (표준 입력 등)
//!
//! seek 할 수 없고 EOF 이후 데이터가 이어지지 않는 입력입니다.
//! 리더는 첫 EOF에서 재시도 없이 `EndOfStream`을 반환합니다.

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, Stdin};

use super::{FileSource, SourceInfo};

/// 표준 입력의 표시 이름
pub const STDIN_NAME: &str = "-";

/// 임의의 비동기 스트림을 감싼 재개 불가능 소스
#[derive(Debug)]
pub struct StreamSource<R> {
    name: String,
    inner: R,
}

impl<R> StreamSource<R> {
    pub fn new(name: impl Into<String>, inner: R) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl StreamSource<Stdin> {
    /// 표준 입력 소스를 생성합니다.
    pub fn stdin() -> Self {
        Self::new(STDIN_NAME, tokio::io::stdin())
    }
}

impl<R> FileSource for StreamSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn stat(&self) -> impl Future<Output = io::Result<SourceInfo>> + Send {
        let name = self.name.clone();
        async move {
            Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("stream source {name} has no file metadata"),
            ))
        }
    }

    fn continuable(&self) -> bool {
        false
    }
}
