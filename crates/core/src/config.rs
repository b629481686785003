//! 설정 관리 -- apkbom.toml 파싱 및 런타임 설정
//!
//! [`ApkbomConfig`]는 로깅과 SBOM 생성 엔진 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 호출자가 직접 지정한 값 (최고 우선)
//! 2. 환경변수 (`APKBOM_SBOM_SCAN_CONCURRENCY=32` 형식)
//! 3. 설정 파일 (`apkbom.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), apkbom_core::error::ApkbomError> {
//! use apkbom_core::config::ApkbomConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ApkbomConfig::load("apkbom.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ApkbomConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApkbomError, ConfigError};

/// 스캔 동시성 상한
pub const MAX_SCAN_CONCURRENCY: usize = 1024;

/// apkbom 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApkbomConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// SBOM 생성 설정
    #[serde(default)]
    pub sbom: SbomConfig,
}

impl ApkbomConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ApkbomError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ApkbomError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ApkbomError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ApkbomError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ApkbomError> {
        toml::from_str(toml_str).map_err(|e| {
            ApkbomError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `APKBOM_{SECTION}_{FIELD}`
    /// 예: `APKBOM_SBOM_ORGANIZATION="Example, Inc"`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "APKBOM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "APKBOM_GENERAL_LOG_FORMAT");

        // SBOM
        override_usize(
            &mut self.sbom.scan_concurrency,
            "APKBOM_SBOM_SCAN_CONCURRENCY",
        );
        override_string(&mut self.sbom.namespace_uri, "APKBOM_SBOM_NAMESPACE_URI");
        override_string(&mut self.sbom.tool_name, "APKBOM_SBOM_TOOL_NAME");
        override_string(&mut self.sbom.tool_version, "APKBOM_SBOM_TOOL_VERSION");
        override_string(&mut self.sbom.organization, "APKBOM_SBOM_ORGANIZATION");
        override_string(
            &mut self.sbom.license_list_version,
            "APKBOM_SBOM_LICENSE_LIST_VERSION",
        );
        override_bool(&mut self.sbom.copy_build_sbom, "APKBOM_SBOM_COPY_BUILD_SBOM");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ApkbomError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.sbom.scan_concurrency == 0 || self.sbom.scan_concurrency > MAX_SCAN_CONCURRENCY {
            return Err(ConfigError::InvalidValue {
                field: "sbom.scan_concurrency".to_owned(),
                reason: format!("must be 1-{MAX_SCAN_CONCURRENCY}"),
            }
            .into());
        }

        if self.sbom.namespace_uri.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sbom.namespace_uri".to_owned(),
                reason: "namespace_uri must not be empty".to_owned(),
            }
            .into());
        }

        if self.sbom.tool_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sbom.tool_name".to_owned(),
                reason: "tool_name must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// SBOM 생성 설정
///
/// 생성되는 SPDX 문서의 출처 정보(creator, namespace)와
/// 파일 스캔 동시성을 결정합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SbomConfig {
    /// 동시에 해시를 계산할 파일 수 상한
    pub scan_concurrency: usize,
    /// SPDX `documentNamespace` 접두사
    pub namespace_uri: String,
    /// `creators`에 기록되는 도구 이름
    pub tool_name: String,
    /// `creators`에 기록되는 도구 버전
    pub tool_version: String,
    /// `creators`에 기록되는 조직 이름
    pub organization: String,
    /// SPDX 라이선스 목록 버전
    pub license_list_version: String,
    /// 빌드 환경 SBOM을 패키지 SBOM 디렉토리에 복사할지 여부
    pub copy_build_sbom: bool,
}

impl Default for SbomConfig {
    fn default() -> Self {
        Self {
            scan_concurrency: 64,
            namespace_uri: "https://spdx.org/spdxdocs/chainguard/melange/".to_owned(),
            tool_name: "melange".to_owned(),
            tool_version: env!("CARGO_PKG_VERSION").to_owned(),
            organization: "Chainguard, Inc".to_owned(),
            license_list_version: "3.18".to_owned(),
            copy_build_sbom: false,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}
