//! 에러 타입 -- 도메인별 에러 정의

/// apkbom 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum ApkbomError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// SBOM 생성 에러
    #[error("sbom error: {0}")]
    Sbom(#[from] SbomError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// 로깅 초기화 실패
    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

/// SBOM 생성 단계별 에러
///
/// 엔진 크레이트의 상세 에러가 이 분류로 변환되어 빌드 파이프라인에 전달됩니다.
#[derive(Debug, thiserror::Error)]
pub enum SbomError {
    /// 패키지 식별 정보 누락
    #[error("identity error: {0}")]
    Identity(String),

    /// 작업 디렉토리 / SBOM 디렉토리 문제
    #[error("environment error: {0}")]
    Environment(String),

    /// 파일 스캔 / 해시 계산 실패
    #[error("scan failed: {0}")]
    ScanFailed(String),

    /// 빌드 환경 SBOM 병합 실패
    #[error("merge failed: {0}")]
    MergeFailed(String),

    /// 문서 직렬화 / 쓰기 실패
    #[error("serialization failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_wraps_into_top_level() {
        let err: ApkbomError = ConfigError::InvalidValue {
            field: "sbom.scan_concurrency".to_owned(),
            reason: "must be 1-1024".to_owned(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.starts_with("config error"));
        assert!(msg.contains("sbom.scan_concurrency"));
    }

    #[test]
    fn sbom_error_wraps_into_top_level() {
        let err: ApkbomError = SbomError::MergeFailed("no root elements".to_owned()).into();
        assert!(matches!(err, ApkbomError::Sbom(SbomError::MergeFailed(_))));
        assert!(err.to_string().contains("no root elements"));
    }

    #[test]
    fn io_error_wraps_into_top_level() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ApkbomError = io.into();
        assert!(matches!(err, ApkbomError::Io(_)));
    }
}
