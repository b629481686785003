//! 빌드 환경 SBOM 병합
//!
//! 빌드 이미지 SBOM에서 OS 패키지만 골라 패키지 문서에 추가합니다.
//! `purl` 외부 참조가 하나 이상 파싱되고 그 타입이 `oci`가 아닌 패키지만 대상이며,
//! 추가된 패키지마다 문서의 첫 번째 루트 요소로 `BUILD_DEPENDENCY_OF` 관계를 기록합니다.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use apkbom_core::metrics as m;

use crate::error::SbomGeneratorError;
use crate::model::RelationshipType;
use crate::purl::{PackageUrl, TYPE_OCI};

use super::{REFERENCE_TYPE_PURL, SpdxDocument, SpdxPackage, SpdxRelationship};

/// 빌드 환경 SBOM 파일을 읽어 `doc`에 병합합니다.
///
/// 추가된 패키지 수를 반환합니다. 문서에 이미 있는 식별자는 다시 추가하지 않습니다.
///
/// # Errors
///
/// - 문서에 루트 요소가 없음: `SbomGeneratorError::Merge`
/// - 파일 읽기 실패: `SbomGeneratorError::Merge`
/// - JSON 파싱 실패: `SbomGeneratorError::Parse`
pub async fn merge_build_sbom(
    doc: &mut SpdxDocument,
    path: &Path,
) -> Result<usize, SbomGeneratorError> {
    let root = doc
        .document_describes
        .first()
        .cloned()
        .ok_or_else(|| SbomGeneratorError::Merge("apk package sbom has no root elements".to_owned()))?;

    let data = tokio::fs::read(path).await.map_err(|e| {
        SbomGeneratorError::Merge(format!(
            "opening build environment SBOM from {}: {e}",
            path.display()
        ))
    })?;
    let build: SpdxDocument =
        serde_json::from_slice(&data).map_err(|e| SbomGeneratorError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let total = build.packages.len();
    let merged = merge_packages(doc, &root, build.packages);

    metrics::counter!(m::SBOM_BUILD_PACKAGES_MERGED_TOTAL).increment(merged as u64);
    info!(
        path = %path.display(),
        found = total,
        merged,
        "merged build environment packages"
    );
    Ok(merged)
}

/// 빌드 의존성 패키지를 `doc`에 추가하고 `root`로의 관계를 기록합니다.
pub fn merge_packages(doc: &mut SpdxDocument, root: &str, packages: Vec<SpdxPackage>) -> usize {
    let mut known: HashSet<String> = doc
        .packages
        .iter()
        .map(|p| p.spdx_id.clone())
        .chain(doc.files.iter().map(|f| f.spdx_id.clone()))
        .collect();

    let file_ids: HashSet<&str> = doc.files.iter().map(|f| f.spdx_id.as_str()).collect();
    let mut spliced = Vec::new();
    for mut package in packages {
        if !is_build_dependency(&package) {
            continue;
        }
        if !known.insert(package.spdx_id.clone()) {
            debug!(id = %package.spdx_id, "build package already present, skipping");
            continue;
        }

        // 빌드 환경 문서의 파일은 가져오지 않으므로 파일 참조를 이 문서 기준으로 거릅니다.
        package.has_files.retain(|id| file_ids.contains(id.as_str()));
        if let Some(code) = package.package_verification_code.as_mut() {
            code.package_verification_code_excluded_files
                .retain(|id| file_ids.contains(id.as_str()));
        }
        spliced.push(package);
    }

    let merged = spliced.len();
    for package in spliced {
        doc.relationships.push(SpdxRelationship {
            spdx_element_id: package.spdx_id.clone(),
            relationship_type: RelationshipType::BuildDependencyOf.as_str().to_owned(),
            related_spdx_element: root.to_owned(),
        });
        doc.packages.push(package);
    }
    merged
}

/// `purl` 참조 중 하나라도 파싱되고 `oci` 타입이 아니면 빌드 의존성으로 간주합니다.
fn is_build_dependency(package: &SpdxPackage) -> bool {
    for reference in &package.external_refs {
        if reference.reference_type != REFERENCE_TYPE_PURL {
            continue;
        }
        match reference.reference_locator.parse::<PackageUrl>() {
            Ok(purl) if purl.ty != TYPE_OCI => return true,
            Ok(_) => {}
            Err(e) => {
                warn!(
                    package = %package.name,
                    purl = %reference.reference_locator,
                    error = %e,
                    "skipping malformed purl in build environment SBOM"
                );
            }
        }
    }
    debug!(package = %package.name, "no usable package purl, not merged");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spdx::{SpdxExternalRef, SpdxFile, SpdxPackageVerificationCode};

    fn purl_ref(locator: &str) -> SpdxExternalRef {
        SpdxExternalRef {
            reference_category: "PACKAGE_MANAGER".to_owned(),
            reference_locator: locator.to_owned(),
            reference_type: "purl".to_owned(),
        }
    }

    fn package(id: &str, refs: Vec<SpdxExternalRef>) -> SpdxPackage {
        SpdxPackage {
            spdx_id: id.to_owned(),
            name: id.trim_start_matches("SPDXRef-Package-").to_owned(),
            external_refs: refs,
            ..SpdxPackage::default()
        }
    }

    fn apk_document() -> SpdxDocument {
        SpdxDocument {
            document_describes: vec!["SPDXRef-Package-hello-1".to_owned()],
            packages: vec![package("SPDXRef-Package-hello-1", vec![])],
            ..SpdxDocument::default()
        }
    }

    fn build_document() -> SpdxDocument {
        SpdxDocument {
            packages: vec![
                package(
                    "SPDXRef-Package-sha256-abc",
                    vec![purl_ref("pkg:oci/image@sha256%3Aabc?arch=amd64")],
                ),
                package(
                    "SPDXRef-Package-busybox",
                    vec![purl_ref("pkg:apk/wolfi/busybox@1.36.1-r0?arch=x86_64")],
                ),
                package("SPDXRef-Package-broken", vec![purl_ref("not a purl")]),
                package("SPDXRef-Package-norefs", vec![]),
                package(
                    "SPDXRef-Package-glibc",
                    vec![
                        purl_ref("::bad::"),
                        purl_ref("pkg:apk/wolfi/glibc@2.38-r0"),
                        purl_ref("pkg:apk/wolfi/glibc@2.38-r0?arch=x86_64"),
                    ],
                ),
            ],
            ..SpdxDocument::default()
        }
    }

    async fn write_json(dir: &Path, doc: &SpdxDocument) -> std::path::PathBuf {
        let path = dir.join("sbom-x86_64.spdx.json");
        tokio::fs::write(&path, serde_json::to_vec(doc).unwrap())
            .await
            .unwrap();
        path
    }

    #[test]
    fn filters_oci_malformed_and_refless_packages() {
        let mut doc = apk_document();
        let merged = merge_packages(
            &mut doc,
            "SPDXRef-Package-hello-1",
            build_document().packages,
        );

        assert_eq!(merged, 2);
        let ids: Vec<&str> = doc.packages.iter().map(|p| p.spdx_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "SPDXRef-Package-hello-1",
                "SPDXRef-Package-busybox",
                "SPDXRef-Package-glibc"
            ]
        );
        assert_eq!(doc.relationships.len(), 2);
        for rel in &doc.relationships {
            assert_eq!(rel.relationship_type, "BUILD_DEPENDENCY_OF");
            assert_eq!(rel.related_spdx_element, "SPDXRef-Package-hello-1");
        }
    }

    #[test]
    fn skips_packages_already_in_document() {
        let mut doc = apk_document();
        let dup = package(
            "SPDXRef-Package-hello-1",
            vec![purl_ref("pkg:apk/wolfi/hello@1")],
        );
        let merged = merge_packages(&mut doc, "SPDXRef-Package-hello-1", vec![dup]);
        assert_eq!(merged, 0);
        assert_eq!(doc.packages.len(), 1);
        assert!(doc.relationships.is_empty());
    }

    #[test]
    fn spliced_packages_drop_file_ids_from_other_documents() {
        let mut doc = apk_document();
        doc.files.push(SpdxFile {
            spdx_id: "SPDXRef-File-local".to_owned(),
            ..SpdxFile::default()
        });
        let mut busybox = package(
            "SPDXRef-Package-busybox",
            vec![purl_ref("pkg:apk/wolfi/busybox@1.36.1-r0")],
        );
        busybox.files_analyzed = true;
        busybox.has_files = vec![
            "SPDXRef-File-foreign".to_owned(),
            "SPDXRef-File-local".to_owned(),
        ];
        busybox.package_verification_code = Some(SpdxPackageVerificationCode {
            package_verification_code_value: "ab".repeat(20),
            package_verification_code_excluded_files: vec!["SPDXRef-File-foreign".to_owned()],
        });

        merge_packages(&mut doc, "SPDXRef-Package-hello-1", vec![busybox]);

        let spliced = &doc.packages[1];
        assert_eq!(spliced.has_files, vec!["SPDXRef-File-local"]);
        let code = spliced.package_verification_code.as_ref().unwrap();
        assert!(code.package_verification_code_excluded_files.is_empty());
        for id in spliced
            .has_files
            .iter()
            .chain(&code.package_verification_code_excluded_files)
        {
            assert!(doc.has_element(id), "dangling file id {id}");
        }
    }

    #[tokio::test]
    async fn merges_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), &build_document()).await;

        let mut doc = apk_document();
        let merged = merge_build_sbom(&mut doc, &path).await.unwrap();
        assert_eq!(merged, 2);
        assert_eq!(doc.packages.len(), 3);
    }

    #[tokio::test]
    async fn fails_without_root_element() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), &build_document()).await;

        let mut doc = SpdxDocument::default();
        let err = merge_build_sbom(&mut doc, &path).await.unwrap_err();
        assert!(matches!(err, SbomGeneratorError::Merge(_)));
        assert!(doc.packages.is_empty());
    }

    #[tokio::test]
    async fn fails_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = apk_document();
        let err = merge_build_sbom(&mut doc, &dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("absent.json"));
        assert!(matches!(err, SbomGeneratorError::Merge(_)));
    }

    #[tokio::test]
    async fn fails_on_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sbom-x86_64.spdx.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let mut doc = apk_document();
        let err = merge_build_sbom(&mut doc, &path).await.unwrap_err();
        assert!(matches!(err, SbomGeneratorError::Parse { .. }));
        assert_eq!(doc.packages.len(), 1);
    }
}
