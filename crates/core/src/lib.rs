//! apkbom 공통 크레이트
//!
//! SBOM 생성 엔진과 이를 호출하는 빌드 파이프라인이 공유하는
//! 에러 계층, 설정, 로깅 초기화, 메트릭 이름을 정의합니다.
//!
//! # 모듈 구조
//!
//! - [`error`]: 최상위 에러 타입 (`ApkbomError`)과 도메인별 에러
//! - [`config`]: `apkbom.toml` 파싱 및 환경변수 오버라이드
//! - [`logging`]: `tracing-subscriber` 초기화
//! - [`metrics`]: 메트릭 이름 상수 및 설명 등록

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ApkbomError, ConfigError, SbomError};

// 설정
pub use config::{ApkbomConfig, GeneralConfig, SbomConfig};

// 로깅
pub use logging::init_tracing;
