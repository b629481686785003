//! SBOM 생성 요청 -- 빌드 파이프라인이 전달하는 패키지 정보와 경로

use std::path::PathBuf;

/// 패키지 루트 기준 SBOM 디렉토리
pub const SBOM_DIR: &str = "var/lib/db/sbom";

/// 단일 패키지의 SBOM 생성 요청
///
/// `path`는 패키지의 최종 파일 트리가 놓인 디렉토리입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spec {
    /// 패키지 파일 트리 루트
    pub path: PathBuf,
    /// 패키지 이름 (필수)
    pub package_name: String,
    /// 패키지 버전
    pub package_version: String,
    /// 선언된 라이선스 (비어 있으면 `NOASSERTION`)
    pub license: String,
    /// 저작권 문구
    pub copyright: String,
    /// purl 네임스페이스 (예: `wolfi`)
    pub namespace: String,
    /// 아키텍처 (예: `x86_64`)
    pub arch: String,
    /// 의존성 메타데이터를 읽을 언어 목록
    pub languages: Vec<String>,
    /// 빌드 환경 SBOM 디렉토리 (`sbom-<arch>.spdx.json`이 위치)
    pub build_image_sbom_dir: Option<PathBuf>,
}

impl Spec {
    /// 패키지 트리 안의 SBOM 디렉토리
    pub fn sbom_path(&self) -> PathBuf {
        self.path.join(SBOM_DIR)
    }

    /// 패키지 SBOM 출력 파일: `<sbom_path>/<name>-<version>.spdx.json`
    pub fn package_sbom(&self) -> PathBuf {
        self.sbom_path().join(format!(
            "{}-{}.spdx.json",
            self.package_name, self.package_version
        ))
    }

    /// 빌드 환경 SBOM 파일: `<build_image_sbom_dir>/sbom-<arch>.spdx.json`
    pub fn build_env_sbom(&self) -> Option<PathBuf> {
        self.build_image_sbom_dir
            .as_deref()
            .map(|dir| dir.join(format!("sbom-{}.spdx.json", self.arch)))
    }

    /// 패키지 안으로 복사되는 빌드 환경 SBOM 경로
    pub fn staged_build_env_sbom(&self) -> PathBuf {
        self.sbom_path()
            .join(format!("build-env-{}.spdx.json", self.arch))
    }

    /// 문서 이름: `apk-<name>-<version>`
    pub fn document_name(&self) -> String {
        format!("apk-{}-{}", self.package_name, self.package_version)
    }

    /// 패키지 루트의 절대 경로
    pub fn root(&self) -> std::io::Result<PathBuf> {
        std::path::absolute(&self.path)
    }
}
