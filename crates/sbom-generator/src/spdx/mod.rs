//! SPDX 2.3 JSON 문서 모델
//!
//! 출력 문서의 직렬화 타입과 빌드 환경 SBOM 파싱에 쓰이는 역직렬화 타입을 겸합니다.
//! 필드 선언 순서가 곧 JSON 키 순서입니다.
//!
//! - [`build`]: 엔티티 그래프 -> [`SpdxDocument`] 변환
//! - [`merge`]: 빌드 환경 SBOM 패키지 병합
//! - [`writer`]: HTML 안전 이스케이프가 적용된 JSON 출력

pub mod build;
pub mod merge;
pub mod writer;

use serde::{Deserialize, Serialize};

/// SPDX 사양 버전
pub const SPDX_VERSION: &str = "SPDX-2.3";

/// 문서 메타데이터 라이선스
pub const DATA_LICENSE: &str = "CC0-1.0";

/// 문서 식별자 접두사
pub const DOCUMENT_ID_PREFIX: &str = "SPDXRef-DOCUMENT-";

/// 외부 참조 카테고리: 패키지 관리자
pub const CATEGORY_PACKAGE_MANAGER: &str = "PACKAGE_MANAGER";

/// 외부 참조 타입: purl
pub const REFERENCE_TYPE_PURL: &str = "purl";

/// SPDX 2.3 문서 루트
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpdxDocument {
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    pub name: String,
    pub spdx_version: String,
    pub creation_info: SpdxCreationInfo,
    pub data_license: String,
    pub document_namespace: String,
    pub document_describes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<SpdxFile>,
    pub packages: Vec<SpdxPackage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<SpdxRelationship>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_document_refs: Vec<SpdxExternalDocumentRef>,
}

impl SpdxDocument {
    /// 주어진 식별자를 가진 패키지나 파일이 문서에 있는지 확인합니다.
    pub fn has_element(&self, id: &str) -> bool {
        self.packages.iter().any(|p| p.spdx_id == id) || self.files.iter().any(|f| f.spdx_id == id)
    }
}

/// SPDX 생성 정보
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpdxCreationInfo {
    /// RFC3339 UTC 타임스탬프
    pub created: String,
    pub creators: Vec<String>,
    pub license_list_version: String,
}

/// SPDX 패키지
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version_info: String,
    pub files_analyzed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub has_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub license_info_from_files: Vec<String>,
    pub license_concluded: String,
    pub license_declared: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub originator: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub supplier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_info: String,
    pub download_location: String,
    pub copyright_text: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub primary_package_purpose: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checksums: Vec<SpdxChecksum>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_refs: Vec<SpdxExternalRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_verification_code: Option<SpdxPackageVerificationCode>,
}

/// 패키지 검증 코드
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpdxPackageVerificationCode {
    pub package_verification_code_value: String,
    /// SHA1 다이제스트가 없어 검증 코드에서 제외된 파일 식별자
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub package_verification_code_excluded_files: Vec<String>,
}

/// SPDX 파일
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpdxFile {
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    pub file_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub copyright_text: String,
    pub license_concluded: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_types: Vec<String>,
    pub license_info_in_files: Vec<String>,
    pub checksums: Vec<SpdxChecksum>,
}

/// SPDX 체크섬
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpdxChecksum {
    pub algorithm: String,
    pub checksum_value: String,
}

/// SPDX 외부 참조
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpdxExternalRef {
    pub reference_category: String,
    pub reference_locator: String,
    pub reference_type: String,
}

/// SPDX 관계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpdxRelationship {
    pub spdx_element_id: String,
    pub relationship_type: String,
    pub related_spdx_element: String,
}

/// 외부 SPDX 문서 참조
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpdxExternalDocumentRef {
    pub checksum: SpdxChecksum,
    pub external_document_id: String,
    pub spdx_document: String,
}
