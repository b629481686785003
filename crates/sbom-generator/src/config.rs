//! SBOM 생성기 설정
//!
//! [`SbomGeneratorConfig`]는 core의 [`SbomConfig`](apkbom_core::config::SbomConfig)에서
//! 파생되며, 문서 출처 정보와 스캔 동시성을 엔진에 전달합니다.
//!
//! # 사용 예시
//!
//! ```
//! use apkbom_sbom_generator::SbomGeneratorConfig;
//!
//! // 기본값으로 생성
//! let config = SbomGeneratorConfig::default();
//! config.validate().unwrap();
//!
//! // 빌더로 생성
//! use apkbom_sbom_generator::SbomGeneratorConfigBuilder;
//!
//! let config = SbomGeneratorConfigBuilder::new()
//!     .scan_concurrency(16)
//!     .organization("Example Org")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.scan_concurrency, 16);
//! ```

use serde::{Deserialize, Serialize};

use apkbom_core::config::{MAX_SCAN_CONCURRENCY, SbomConfig};

use crate::error::SbomGeneratorError;

/// SBOM 생성기 설정
///
/// # 필드
///
/// - **scan_concurrency**: 동시에 해시를 계산할 파일 수 상한
/// - **namespace_uri**: SPDX `documentNamespace` 접두사
/// - **tool_name / tool_version**: `Tool: <name> (<version>)` creator
/// - **organization**: `Organization: <org>` creator
/// - **license_list_version**: SPDX 라이선스 목록 버전
/// - **copy_build_sbom**: 빌드 환경 SBOM을 패키지 안으로 복사할지 여부
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomGeneratorConfig {
    /// 동시에 해시를 계산할 파일 수 상한
    pub scan_concurrency: usize,
    /// SPDX `documentNamespace` 접두사
    pub namespace_uri: String,
    /// 도구 이름
    pub tool_name: String,
    /// 도구 버전
    pub tool_version: String,
    /// 조직 이름
    pub organization: String,
    /// SPDX 라이선스 목록 버전
    pub license_list_version: String,
    /// 빌드 환경 SBOM 복사 여부
    pub copy_build_sbom: bool,
}

impl Default for SbomGeneratorConfig {
    fn default() -> Self {
        Self::from_core(&SbomConfig::default())
    }
}

impl SbomGeneratorConfig {
    /// core의 `SbomConfig`에서 생성기 설정을 생성합니다.
    pub fn from_core(core: &SbomConfig) -> Self {
        Self {
            scan_concurrency: core.scan_concurrency,
            namespace_uri: core.namespace_uri.clone(),
            tool_name: core.tool_name.clone(),
            tool_version: core.tool_version.clone(),
            organization: core.organization.clone(),
            license_list_version: core.license_list_version.clone(),
            copy_build_sbom: core.copy_build_sbom,
        }
    }

    /// `creationInfo.creators`에 기록될 문자열 목록을 반환합니다.
    pub fn creators(&self) -> Vec<String> {
        vec![
            format!("Tool: {} ({})", self.tool_name, self.tool_version),
            format!("Organization: {}", self.organization),
        ]
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `scan_concurrency`: 1-1024
    /// - `namespace_uri`: 비어있으면 안 됨
    /// - `tool_name`: 비어있으면 안 됨
    pub fn validate(&self) -> Result<(), SbomGeneratorError> {
        if self.scan_concurrency == 0 || self.scan_concurrency > MAX_SCAN_CONCURRENCY {
            return Err(SbomGeneratorError::Config {
                field: "scan_concurrency".to_owned(),
                reason: format!("must be 1-{MAX_SCAN_CONCURRENCY}"),
            });
        }

        if self.namespace_uri.is_empty() {
            return Err(SbomGeneratorError::Config {
                field: "namespace_uri".to_owned(),
                reason: "namespace_uri must not be empty".to_owned(),
            });
        }

        if self.tool_name.is_empty() {
            return Err(SbomGeneratorError::Config {
                field: "tool_name".to_owned(),
                reason: "tool_name must not be empty".to_owned(),
            });
        }

        Ok(())
    }
}

/// [`SbomGeneratorConfig`] 빌더
///
/// 유연한 설정 구성 및 빌드 시 유효성 검증을 제공합니다.
#[derive(Default)]
pub struct SbomGeneratorConfigBuilder {
    config: SbomGeneratorConfig,
}

impl SbomGeneratorConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 스캔 동시성 상한을 설정합니다.
    pub fn scan_concurrency(mut self, limit: usize) -> Self {
        self.config.scan_concurrency = limit;
        self
    }

    /// 문서 네임스페이스 접두사를 설정합니다.
    pub fn namespace_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.namespace_uri = uri.into();
        self
    }

    /// 도구 이름과 버전을 설정합니다.
    pub fn tool(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.tool_name = name.into();
        self.config.tool_version = version.into();
        self
    }

    /// 조직 이름을 설정합니다.
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.config.organization = organization.into();
        self
    }

    /// SPDX 라이선스 목록 버전을 설정합니다.
    pub fn license_list_version(mut self, version: impl Into<String>) -> Self {
        self.config.license_list_version = version.into();
        self
    }

    /// 빌드 환경 SBOM 복사 여부를 설정합니다.
    pub fn copy_build_sbom(mut self, enabled: bool) -> Self {
        self.config.copy_build_sbom = enabled;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `SbomGeneratorError::Config` 반환
    pub fn build(self) -> Result<SbomGeneratorConfig, SbomGeneratorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SbomGeneratorConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let core = SbomConfig {
            scan_concurrency: 12,
            namespace_uri: "https://sbom.example.org/".to_owned(),
            tool_name: "pkgbuild".to_owned(),
            tool_version: "v1.2.3".to_owned(),
            organization: "Example Org".to_owned(),
            license_list_version: "3.22".to_owned(),
            copy_build_sbom: true,
        };
        let config = SbomGeneratorConfig::from_core(&core);
        assert_eq!(config.scan_concurrency, 12);
        assert_eq!(config.namespace_uri, "https://sbom.example.org/");
        assert_eq!(config.license_list_version, "3.22");
        assert!(config.copy_build_sbom);
    }

    #[test]
    fn creators_embed_tool_version_and_organization() {
        let config = SbomGeneratorConfigBuilder::new()
            .tool("melange", "v0.5.0")
            .organization("Chainguard, Inc")
            .build()
            .unwrap();
        assert_eq!(
            config.creators(),
            vec![
                "Tool: melange (v0.5.0)".to_owned(),
                "Organization: Chainguard, Inc".to_owned(),
            ]
        );
    }

    #[test]
    fn builder_rejects_zero_concurrency() {
        let err = SbomGeneratorConfigBuilder::new()
            .scan_concurrency(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("scan_concurrency"));
    }

    #[test]
    fn builder_rejects_empty_namespace() {
        let result = SbomGeneratorConfigBuilder::new().namespace_uri("").build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_empty_tool_name() {
        let result = SbomGeneratorConfigBuilder::new().tool("", "v1").build();
        assert!(result.is_err());
    }
}
