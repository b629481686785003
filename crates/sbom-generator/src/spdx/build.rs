//! 엔티티 그래프를 SPDX 문서로 변환
//!
//! 최상위 [`Bom`]의 패키지와 파일을 재귀적으로 평탄화합니다. 관계는 기록된 순서대로
//! 순회하며, (source, kind, target) 조합이 이미 기록된 관계는 건너뜁니다.
//! 같은 조합을 재귀 이전에 기록하므로 순환 그래프도 종료됩니다.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, SecondsFormat, Utc};
use sha1::{Digest, Sha1};

use crate::config::SbomGeneratorConfig;
use crate::error::SbomGeneratorError;
use crate::model::{Bom, Checksums, File, NOASSERTION, Node, Package, Relationship, RelationshipType};
use crate::purl::{PackageUrl, TYPE_APK};
use crate::spec::Spec;

use super::{
    CATEGORY_PACKAGE_MANAGER, DATA_LICENSE, DOCUMENT_ID_PREFIX, REFERENCE_TYPE_PURL, SPDX_VERSION,
    SpdxChecksum, SpdxCreationInfo, SpdxDocument, SpdxExternalRef, SpdxFile, SpdxPackage,
    SpdxPackageVerificationCode, SpdxRelationship,
};

/// 재현 가능한 빌드를 위한 타임스탬프 환경변수
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// 현재 프로세스의 `SOURCE_DATE_EPOCH` 값을 읽습니다.
pub fn source_date_epoch() -> Option<String> {
    std::env::var_os(SOURCE_DATE_EPOCH).map(|v| v.to_string_lossy().into_owned())
}

/// 문서 생성 시각을 RFC3339 (초 단위, UTC) 문자열로 반환합니다.
///
/// `epoch`가 주어지면 그 정수 초 값을, 아니면 현재 시각을 사용합니다.
///
/// # Errors
///
/// `epoch`가 정수가 아니거나 표현 가능한 범위를 벗어나면 `SbomGeneratorError::Config`
pub fn creation_timestamp(epoch: Option<&str>) -> Result<String, SbomGeneratorError> {
    let Some(raw) = epoch else {
        return Ok(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
    };

    let seconds: i64 = raw.parse().map_err(|e| SbomGeneratorError::Config {
        field: SOURCE_DATE_EPOCH.to_owned(),
        reason: format!("failed to parse {raw:?}: {e}"),
    })?;
    let at = DateTime::from_timestamp(seconds, 0).ok_or_else(|| SbomGeneratorError::Config {
        field: SOURCE_DATE_EPOCH.to_owned(),
        reason: format!("{seconds} is out of range"),
    })?;
    Ok(at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// SPDX 패키지 검증 코드를 계산합니다.
///
/// 정렬된 SHA1 16진수 다이제스트를 이어 붙인 문자열의 SHA1입니다.
/// 입력 순서와 무관하며, 다이제스트가 없으면 `None`입니다.
pub fn compute_verification_code(sha1_digests: &[String]) -> Option<String> {
    if sha1_digests.is_empty() {
        return None;
    }
    let mut sorted: Vec<&str> = sha1_digests.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha1::new();
    for digest in sorted {
        hasher.update(digest.as_bytes());
    }
    Some(hex::encode(hasher.finalize()))
}

/// 알고리즘 이름 순으로 정렬된 SPDX 체크섬 목록
pub fn checksum_list(checksums: &Checksums) -> Vec<SpdxChecksum> {
    checksums
        .iter()
        .map(|(algorithm, value)| SpdxChecksum {
            algorithm: algorithm.clone(),
            checksum_value: value.clone(),
        })
        .collect()
}

/// 문서 네임스페이스: 접두사 + 문서 이름
fn document_namespace(prefix: &str, name: &str) -> String {
    if prefix.ends_with('/') {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}/{name}")
    }
}

/// 현재 환경의 `SOURCE_DATE_EPOCH`를 반영하여 문서를 생성합니다.
///
/// # Errors
///
/// `SOURCE_DATE_EPOCH`가 잘못된 값이면 `SbomGeneratorError::Config`
pub fn build_document(
    spec: &Spec,
    bom: &Bom,
    config: &SbomGeneratorConfig,
) -> Result<SpdxDocument, SbomGeneratorError> {
    let created = creation_timestamp(source_date_epoch().as_deref())?;
    Ok(build_document_at(spec, bom, config, created))
}

/// 주어진 생성 시각으로 문서를 생성합니다.
pub fn build_document_at(
    spec: &Spec,
    bom: &Bom,
    config: &SbomGeneratorConfig,
    created: String,
) -> SpdxDocument {
    let name = spec.document_name();
    let doc = SpdxDocument {
        spdx_id: format!("{DOCUMENT_ID_PREFIX}{name}"),
        document_namespace: document_namespace(&config.namespace_uri, &name),
        name,
        spdx_version: SPDX_VERSION.to_owned(),
        creation_info: SpdxCreationInfo {
            created,
            creators: config.creators(),
            license_list_version: config.license_list_version.clone(),
        },
        data_license: DATA_LICENSE.to_owned(),
        ..SpdxDocument::default()
    };

    let mut lowering = Lowering {
        doc,
        emitted: HashSet::new(),
        packages: HashMap::new(),
        files: HashSet::new(),
    };
    for package in &bom.packages {
        lowering.doc.document_describes.push(package.id());
        lowering.add_package(package);
    }
    for file in &bom.files {
        lowering.doc.document_describes.push(file.id());
        lowering.add_file(file);
    }
    lowering.doc
}

struct Lowering {
    doc: SpdxDocument,
    /// 이미 기록된 (source, kind, target) 관계
    emitted: HashSet<(String, RelationshipType, String)>,
    /// 문서에 추가된 패키지 식별자 -> `doc.packages` 인덱스
    packages: HashMap<String, usize>,
    /// 문서에 추가된 파일 식별자
    files: HashSet<String>,
}

impl Lowering {
    /// 같은 식별자를 다시 만나면 레코드는 한 번만 남기고 관계는 매번 순회합니다.
    /// 먼저 기록된 레코드에 파일이 없고 새 노드에 있으면 새 레코드로 교체합니다.
    fn add_package(&mut self, package: &Package) {
        let lowered = lower_package(package);
        match self.packages.get(&lowered.spdx_id) {
            Some(&index) => {
                let existing = &mut self.doc.packages[index];
                if existing.has_files.is_empty() && !lowered.has_files.is_empty() {
                    *existing = lowered;
                }
            }
            None => {
                self.packages
                    .insert(lowered.spdx_id.clone(), self.doc.packages.len());
                self.doc.packages.push(lowered);
            }
        }
        self.add_relationships(&package.relationships);
    }

    fn add_file(&mut self, file: &File) {
        if self.files.insert(file.id()) {
            self.doc.files.push(SpdxFile {
                spdx_id: file.id(),
                file_name: file.name.clone(),
                license_concluded: NOASSERTION.to_owned(),
                checksums: checksum_list(&file.checksums),
                ..SpdxFile::default()
            });
        }
        self.add_relationships(&file.relationships);
    }

    fn add_relationships(&mut self, relationships: &[Relationship]) {
        for rel in relationships {
            let target_id = rel.target.id();
            if !self
                .emitted
                .insert((rel.source.clone(), rel.kind, target_id.clone()))
            {
                continue;
            }

            match &rel.target {
                Node::Package(package) => self.add_package(package),
                Node::File(file) => self.add_file(file),
            }

            self.doc.relationships.push(SpdxRelationship {
                spdx_element_id: rel.source.clone(),
                relationship_type: rel.kind.as_str().to_owned(),
                related_spdx_element: target_id,
            });
        }
    }
}

fn or_noassertion(value: &str) -> String {
    if value.is_empty() {
        NOASSERTION.to_owned()
    } else {
        value.to_owned()
    }
}

fn lower_package(package: &Package) -> SpdxPackage {
    let mut has_files = Vec::new();
    let mut sha1_digests = Vec::new();
    let mut excluded = Vec::new();
    let mut seen = HashSet::new();

    for rel in &package.relationships {
        if rel.kind != RelationshipType::Contains {
            continue;
        }
        if let Node::File(file) = &rel.target {
            if !seen.insert(file.id()) {
                continue;
            }
            has_files.push(file.id());
            match file.checksums.get("SHA1") {
                Some(digest) => sha1_digests.push(digest.clone()),
                None => excluded.push(file.id()),
            }
        }
    }

    let package_verification_code =
        compute_verification_code(&sha1_digests).map(|value| SpdxPackageVerificationCode {
            package_verification_code_value: value,
            package_verification_code_excluded_files: excluded,
        });

    let mut external_refs = Vec::new();
    if !package.namespace.is_empty() {
        let purl = PackageUrl::new(TYPE_APK, &package.name)
            .with_namespace(&package.namespace)
            .with_version(&package.version)
            .with_qualifier("arch", &package.arch);
        external_refs.push(SpdxExternalRef {
            reference_category: CATEGORY_PACKAGE_MANAGER.to_owned(),
            reference_locator: purl.to_string(),
            reference_type: REFERENCE_TYPE_PURL.to_owned(),
        });
    }

    SpdxPackage {
        spdx_id: package.id(),
        name: package.name.clone(),
        version_info: package.version.clone(),
        files_analyzed: package.files_analyzed && package_verification_code.is_some(),
        has_files,
        license_concluded: or_noassertion(&package.license_concluded),
        license_declared: or_noassertion(&package.license_declared),
        download_location: NOASSERTION.to_owned(),
        copyright_text: package.copyright.clone(),
        checksums: checksum_list(&package.checksums),
        external_refs,
        package_verification_code,
        ..SpdxPackage::default()
    }
}
