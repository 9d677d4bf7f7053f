#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`source`]: 읽기 대상 추상화 ([`FileSource`]) 및 파일/스트림 구현
//! - [`reader`]: 오프셋 추적, EOF backoff, 종료 신호 분류 ([`PollingReader`])
//! - [`diagnostics`]: EOF 원인 판정 체인 (truncated > inactive > renamed > removed)
//! - [`backoff`]: 재시도 대기 계산 및 취소 가능한 대기
//! - [`config`]: 리더 정책 (core 설정 변환)
//! - [`error`]: 종료 신호 및 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! FileSource (LogFile | StreamSource) -> PollingReader -> caller
//!                                            |
//!                              diagnostics + backoff + cancel
//! ```

pub mod backoff;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod reader;
pub mod source;

// --- 주요 타입 re-export ---

// 리더
pub use reader::PollingReader;

// 설정
pub use config::{ReaderConfig, ReaderConfigBuilder};

// 에러
pub use error::{Disposition, ReadError};

// 소스
pub use source::{FileId, FileSource, LogFile, SourceInfo, StreamSource};

// 취소 토큰 (호출자가 같은 타입을 쓰도록 재노출)
pub use tokio_util::sync::CancellationToken;
