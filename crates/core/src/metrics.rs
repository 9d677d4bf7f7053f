//! 메트릭 이름 상수
//!
//! 리더가 `metrics::counter!()` 매크로로 기록하는 메트릭 이름을 중앙에서 정의합니다.
//! 레코더(exporter)가 설치되지 않으면 기록은 no-op 입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `harvester_`
//! - 접미어: `_total` (counter)

/// 종료 신호 레이블 키 (truncated, renamed, removed, inactive, eof)
pub const LABEL_SIGNAL: &str = "signal";

/// Reader: 호출자에게 전달된 전체 바이트 수 (counter)
pub const READER_BYTES_READ_TOTAL: &str = "harvester_reader_bytes_read_total";

/// Reader: EOF 이후 backoff 대기 횟수 (counter)
pub const READER_BACKOFF_WAITS_TOTAL: &str = "harvester_reader_backoff_waits_total";

/// Reader: 반환된 종료 신호 수 (counter, label: signal)
pub const READER_TERMINAL_SIGNALS_TOTAL: &str = "harvester_reader_terminal_signals_total";

/// Reader: 예기치 않은 I/O 에러 수 (counter)
pub const READER_IO_ERRORS_TOTAL: &str = "harvester_reader_io_errors_total";
