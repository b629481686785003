//! SBOM 생성기 에러 타입
//!
//! [`SbomGeneratorError`]는 SBOM 생성 엔진 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<SbomGeneratorError> for ApkbomError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **식별 정보**: `Identity`
//! - **작업 환경**: `Environment`
//! - **파일 스캔**: `Hash`, `Scan`
//! - **빌드 SBOM 병합**: `Merge`, `Parse`
//! - **직렬화**: `Serialization`
//! - **설정**: `Config`
//! - **파일 I/O**: `Io`

use apkbom_core::error::{ApkbomError, ConfigError, SbomError};

/// SBOM 생성기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SbomGeneratorError {
    /// 패키지 식별 정보 누락 (I/O 이전에 발생)
    #[error("identity error: {0}")]
    Identity(String),

    /// 작업 디렉토리 또는 SBOM 디렉토리 준비 실패
    #[error("environment error: {path}: {reason}")]
    Environment {
        /// 관련 디렉토리 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 파일 다이제스트 계산 실패
    #[error("hashing {algorithm} file {path}: {source}")]
    Hash {
        /// 다이제스트 알고리즘 이름
        algorithm: &'static str,
        /// 패키지 내부 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 디렉토리 순회 또는 워커 풀 실패
    #[error("scan error: {0}")]
    Scan(String),

    /// 빌드 환경 SBOM 병합 실패
    #[error("merge error: {0}")]
    Merge(String),

    /// 빌드 환경 SBOM 파싱 실패
    #[error("parse error: {path}: {reason}")]
    Parse {
        /// 파싱 대상 파일 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// SPDX 문서 직렬화 실패
    #[error("serialization error: {0}")]
    Serialization(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명 또는 환경변수명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl From<SbomGeneratorError> for ApkbomError {
    fn from(err: SbomGeneratorError) -> Self {
        match err {
            SbomGeneratorError::Identity(msg) => ApkbomError::Sbom(SbomError::Identity(msg)),
            SbomGeneratorError::Environment { path, reason } => {
                ApkbomError::Sbom(SbomError::Environment(format!("{path}: {reason}")))
            }
            err @ (SbomGeneratorError::Hash { .. } | SbomGeneratorError::Scan(_)) => {
                ApkbomError::Sbom(SbomError::ScanFailed(err.to_string()))
            }
            err @ (SbomGeneratorError::Merge(_) | SbomGeneratorError::Parse { .. }) => {
                ApkbomError::Sbom(SbomError::MergeFailed(err.to_string()))
            }
            SbomGeneratorError::Serialization(msg) => {
                ApkbomError::Sbom(SbomError::Serialization(msg))
            }
            SbomGeneratorError::Config { field, reason } => {
                ApkbomError::Config(ConfigError::InvalidValue { field, reason })
            }
            SbomGeneratorError::Io { path, source } => ApkbomError::Io(std::io::Error::new(
                source.kind(),
                format!("{path}: {source}"),
            )),
        }
    }
}
