//! SBOM 생성 오케스트레이터
//!
//! [`GeneratorImplementation`]은 생성 단계 하나하나를 정의하는 확장 포인트이고,
//! [`SbomGenerator`]는 단계들을 정해진 순서로 실행합니다.
//!
//! ```text
//! generate_document -> generate_apk_package -> check_environment (false면 종료)
//!   -> scan_files -> (패키지 추가) -> scan_licenses -> read_dependency_data (언어별)
//!   -> write_sbom (문서 변환, 빌드 SBOM 병합, 출력) -> copy_build_sbom (설정 시)
//! ```
//!
//! 식별 정보 검증은 파일 시스템을 건드리기 전에 수행됩니다.
//! 테스트에서는 단계 구현을 가짜 구현으로 교체할 수 있습니다.

use std::future::Future;
use std::io::ErrorKind;

use tracing::{debug, info};

use crate::config::SbomGeneratorConfig;
use crate::error::SbomGeneratorError;
use crate::model::{Bom, Package};
use crate::scan;
use crate::spdx::build::build_document;
use crate::spdx::merge::merge_build_sbom;
use crate::spdx::writer::write_document;
use crate::spec::Spec;

/// SBOM 생성 단계 구현 trait
///
/// 비동기 메서드는 `Send` future를 반환하므로 멀티스레드 런타임에서
/// 그대로 사용할 수 있습니다.
pub trait GeneratorImplementation: Send + Sync {
    /// 패키지 루트를 확인하고 SBOM 디렉토리를 준비합니다.
    ///
    /// 루트가 없으면 `Ok(false)`를 반환하며 생성은 건너뜁니다.
    fn check_environment(
        &self,
        spec: &Spec,
    ) -> impl Future<Output = Result<bool, SbomGeneratorError>> + Send;

    /// 빈 최상위 BOM을 생성합니다.
    fn generate_document(&self, spec: &Spec) -> Result<Bom, SbomGeneratorError>;

    /// 패키지 식별 정보로 [`Package`]를 생성합니다. I/O를 수행하지 않습니다.
    fn generate_apk_package(&self, spec: &Spec) -> Result<Package, SbomGeneratorError>;

    /// 패키지 트리를 스캔하여 파일을 `package`에 추가합니다.
    fn scan_files(
        &self,
        spec: &Spec,
        package: &mut Package,
    ) -> impl Future<Output = Result<(), SbomGeneratorError>> + Send;

    /// 라이선스 정보를 수집합니다.
    fn scan_licenses(&self, spec: &Spec, bom: &mut Bom) -> Result<(), SbomGeneratorError>;

    /// 언어별 의존성 메타데이터를 읽습니다.
    fn read_dependency_data(
        &self,
        spec: &Spec,
        bom: &mut Bom,
        language: &str,
    ) -> Result<(), SbomGeneratorError>;

    /// BOM을 SPDX 문서로 변환하여 패키지 SBOM 경로에 기록합니다.
    fn write_sbom(
        &self,
        spec: &Spec,
        bom: &Bom,
    ) -> impl Future<Output = Result<(), SbomGeneratorError>> + Send;

    /// 빌드 환경 SBOM을 패키지 SBOM 디렉토리로 복사합니다.
    fn copy_build_sbom(
        &self,
        spec: &Spec,
    ) -> impl Future<Output = Result<(), SbomGeneratorError>> + Send;
}

/// 파일 시스템 기반 기본 구현
#[derive(Debug, Clone, Default)]
pub struct DefaultGenerator {
    config: SbomGeneratorConfig,
}

impl DefaultGenerator {
    /// 설정으로 기본 구현을 생성합니다.
    pub fn new(config: SbomGeneratorConfig) -> Self {
        Self { config }
    }

    /// 현재 설정
    pub fn config(&self) -> &SbomGeneratorConfig {
        &self.config
    }
}

fn environment_error(path: &std::path::Path, reason: impl std::fmt::Display) -> SbomGeneratorError {
    SbomGeneratorError::Environment {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

impl GeneratorImplementation for DefaultGenerator {
    async fn check_environment(&self, spec: &Spec) -> Result<bool, SbomGeneratorError> {
        let root = spec
            .root()
            .map_err(|e| environment_error(&spec.path, format!("getting absolute directory path: {e}")))?;

        match tokio::fs::metadata(&root).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %root.display(), "working directory not found, probably apk is empty");
                return Ok(false);
            }
            Err(e) => {
                return Err(environment_error(
                    &root,
                    format!("checking if working directory exists: {e}"),
                ));
            }
        }

        let sbom_path = spec.sbom_path();
        match tokio::fs::metadata(&sbom_path).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let mut builder = tokio::fs::DirBuilder::new();
                builder.recursive(true);
                #[cfg(unix)]
                builder.mode(0o755);
                builder.create(&sbom_path).await.map_err(|e| {
                    environment_error(&sbom_path, format!("creating SBOM directory in apk filesystem: {e}"))
                })?;
                debug!(path = %sbom_path.display(), "created SBOM directory");
            }
            Err(e) => {
                return Err(environment_error(
                    &sbom_path,
                    format!("checking for sbom directory: {e}"),
                ));
            }
        }

        Ok(true)
    }

    fn generate_document(&self, _spec: &Spec) -> Result<Bom, SbomGeneratorError> {
        Ok(Bom::default())
    }

    fn generate_apk_package(&self, spec: &Spec) -> Result<Package, SbomGeneratorError> {
        if spec.package_name.is_empty() {
            return Err(SbomGeneratorError::Identity(
                "unable to generate package, name not specified".to_owned(),
            ));
        }

        let mut package = Package::new(&spec.package_name, &spec.package_version);
        package.copyright = spec.copyright.clone();
        package.namespace = spec.namespace.clone();
        package.arch = spec.arch.clone();
        if !spec.license.is_empty() {
            package.license_declared = spec.license.clone();
        }
        Ok(package)
    }

    async fn scan_files(&self, spec: &Spec, package: &mut Package) -> Result<(), SbomGeneratorError> {
        let root = spec
            .root()
            .map_err(|e| environment_error(&spec.path, format!("getting absolute directory path: {e}")))?;
        scan::scan_files(&root, package, self.config.scan_concurrency).await?;
        Ok(())
    }

    /// 라이선스 스캔은 아직 수집하는 정보가 없습니다.
    fn scan_licenses(&self, _spec: &Spec, _bom: &mut Bom) -> Result<(), SbomGeneratorError> {
        Ok(())
    }

    /// 언어별 의존성 메타데이터는 아직 수집하는 정보가 없습니다.
    fn read_dependency_data(
        &self,
        _spec: &Spec,
        _bom: &mut Bom,
        language: &str,
    ) -> Result<(), SbomGeneratorError> {
        debug!(language, "no dependency data reader for language");
        Ok(())
    }

    async fn write_sbom(&self, spec: &Spec, bom: &Bom) -> Result<(), SbomGeneratorError> {
        let mut doc = build_document(spec, bom, &self.config)?;

        if let Some(build_sbom) = spec.build_env_sbom() {
            merge_build_sbom(&mut doc, &build_sbom).await?;
        }

        write_document(&doc, &spec.package_sbom()).await
    }

    async fn copy_build_sbom(&self, spec: &Spec) -> Result<(), SbomGeneratorError> {
        let Some(source) = spec.build_env_sbom() else {
            debug!("no build image SBOM directory configured, nothing to copy");
            return Ok(());
        };
        let destination = spec.staged_build_env_sbom();

        let data = tokio::fs::read(&source)
            .await
            .map_err(|e| SbomGeneratorError::Io {
                path: source.display().to_string(),
                source: e,
            })?;
        tokio::fs::write(&destination, &data)
            .await
            .map_err(|e| SbomGeneratorError::Io {
                path: destination.display().to_string(),
                source: e,
            })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&destination, std::fs::Permissions::from_mode(0o644))
                .await
                .map_err(|e| SbomGeneratorError::Io {
                    path: destination.display().to_string(),
                    source: e,
                })?;
        }

        info!(
            from = %source.display(),
            to = %destination.display(),
            "copied build environment SBOM"
        );
        Ok(())
    }
}

/// SBOM 생성기
///
/// 단계 구현 `I`를 주입받아 패키지 하나의 SBOM을 생성합니다.
pub struct SbomGenerator<I = DefaultGenerator> {
    config: SbomGeneratorConfig,
    implementation: I,
}

impl SbomGenerator<DefaultGenerator> {
    /// 기본 구현으로 생성기를 만듭니다.
    ///
    /// # Errors
    ///
    /// 설정 검증 실패 시 `SbomGeneratorError::Config`
    pub fn new(config: SbomGeneratorConfig) -> Result<Self, SbomGeneratorError> {
        config.validate()?;
        Ok(Self {
            implementation: DefaultGenerator::new(config.clone()),
            config,
        })
    }
}

impl<I: GeneratorImplementation> SbomGenerator<I> {
    /// 단계 구현을 직접 지정하여 생성기를 만듭니다.
    pub fn with_implementation(config: SbomGeneratorConfig, implementation: I) -> Self {
        Self {
            config,
            implementation,
        }
    }

    /// 생성기 설정
    pub fn config(&self) -> &SbomGeneratorConfig {
        &self.config
    }

    /// 패키지 하나의 SBOM을 생성합니다.
    ///
    /// SBOM이 기록되면 `true`, 패키지 루트가 없어 건너뛰면 `false`를 반환합니다.
    /// 어느 단계든 실패하면 즉시 중단하며 이후 단계는 실행되지 않습니다.
    pub async fn generate_sbom(&self, spec: &Spec) -> Result<bool, SbomGeneratorError> {
        let imp = &self.implementation;

        let mut bom = imp.generate_document(spec)?;
        let mut package = imp.generate_apk_package(spec)?;

        if !imp.check_environment(spec).await? {
            info!(
                package = %spec.package_name,
                path = %spec.path.display(),
                "skipping SBOM generation"
            );
            return Ok(false);
        }

        info!(
            package = %spec.package_name,
            version = %spec.package_version,
            "generating SBOM"
        );

        imp.scan_files(spec, &mut package).await?;
        bom.packages.push(package);

        imp.scan_licenses(spec, &mut bom)?;
        for language in &spec.languages {
            imp.read_dependency_data(spec, &mut bom, language)?;
        }

        imp.write_sbom(spec, &bom).await?;

        if self.config.copy_build_sbom {
            imp.copy_build_sbom(spec).await?;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::SbomGeneratorConfigBuilder;
    use crate::model::{File, RelationshipType};

    /// 호출 순서를 기록하는 가짜 구현
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        environment_ready: bool,
        fail_scan: bool,
        written: Mutex<Option<Bom>>,
    }

    impl Recorder {
        fn ready() -> Self {
            Self {
                environment_ready: true,
                ..Self::default()
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl GeneratorImplementation for Recorder {
        async fn check_environment(&self, _spec: &Spec) -> Result<bool, SbomGeneratorError> {
            self.record("check_environment");
            Ok(self.environment_ready)
        }

        fn generate_document(&self, _spec: &Spec) -> Result<Bom, SbomGeneratorError> {
            self.record("generate_document");
            Ok(Bom::default())
        }

        fn generate_apk_package(&self, spec: &Spec) -> Result<Package, SbomGeneratorError> {
            self.record("generate_apk_package");
            DefaultGenerator::default().generate_apk_package(spec)
        }

        async fn scan_files(
            &self,
            _spec: &Spec,
            package: &mut Package,
        ) -> Result<(), SbomGeneratorError> {
            self.record("scan_files");
            if self.fail_scan {
                return Err(SbomGeneratorError::Scan("injected".to_owned()));
            }
            package.add_relationship(RelationshipType::Contains, File::new("/usr/bin/tool"));
            Ok(())
        }

        fn scan_licenses(&self, _spec: &Spec, _bom: &mut Bom) -> Result<(), SbomGeneratorError> {
            self.record("scan_licenses");
            Ok(())
        }

        fn read_dependency_data(
            &self,
            _spec: &Spec,
            _bom: &mut Bom,
            language: &str,
        ) -> Result<(), SbomGeneratorError> {
            self.record(format!("read_dependency_data:{language}"));
            Ok(())
        }

        async fn write_sbom(&self, _spec: &Spec, bom: &Bom) -> Result<(), SbomGeneratorError> {
            self.record("write_sbom");
            *self.written.lock().unwrap() = Some(bom.clone());
            Ok(())
        }

        async fn copy_build_sbom(&self, _spec: &Spec) -> Result<(), SbomGeneratorError> {
            self.record("copy_build_sbom");
            Ok(())
        }
    }

    fn spec() -> Spec {
        Spec {
            package_name: "tool".to_owned(),
            package_version: "1.0-r0".to_owned(),
            languages: vec!["go".to_owned(), "python".to_owned()],
            ..Spec::default()
        }
    }

    #[tokio::test]
    async fn runs_stages_in_order() {
        let generator =
            SbomGenerator::with_implementation(SbomGeneratorConfig::default(), Recorder::ready());

        assert!(generator.generate_sbom(&spec()).await.unwrap());
        assert_eq!(
            generator.implementation.calls(),
            vec![
                "generate_document",
                "generate_apk_package",
                "check_environment",
                "scan_files",
                "scan_licenses",
                "read_dependency_data:go",
                "read_dependency_data:python",
                "write_sbom",
            ]
        );

        let written = generator.implementation.written.lock().unwrap().clone().unwrap();
        assert_eq!(written.packages.len(), 1);
        assert_eq!(written.packages[0].relationships.len(), 1);
    }

    #[tokio::test]
    async fn copies_build_sbom_when_enabled() {
        let config = SbomGeneratorConfigBuilder::new()
            .copy_build_sbom(true)
            .build()
            .unwrap();
        let generator = SbomGenerator::with_implementation(config, Recorder::ready());

        generator.generate_sbom(&spec()).await.unwrap();
        assert_eq!(
            generator.implementation.calls().last().map(String::as_str),
            Some("copy_build_sbom")
        );
    }

    #[tokio::test]
    async fn skips_when_environment_not_ready() {
        let generator =
            SbomGenerator::with_implementation(SbomGeneratorConfig::default(), Recorder::default());

        assert!(!generator.generate_sbom(&spec()).await.unwrap());
        assert!(!generator.implementation.calls().contains(&"scan_files".to_owned()));
        assert!(generator.implementation.written.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn scan_failure_stops_before_write() {
        let generator = SbomGenerator::with_implementation(
            SbomGeneratorConfig::default(),
            Recorder {
                fail_scan: true,
                ..Recorder::ready()
            },
        );

        let err = generator.generate_sbom(&spec()).await.unwrap_err();
        assert!(matches!(err, SbomGeneratorError::Scan(_)));
        assert!(!generator.implementation.calls().contains(&"write_sbom".to_owned()));
    }

    #[tokio::test]
    async fn empty_name_fails_before_environment_check() {
        let generator =
            SbomGenerator::with_implementation(SbomGeneratorConfig::default(), Recorder::ready());
        let spec = Spec {
            package_name: String::new(),
            ..spec()
        };

        let err = generator.generate_sbom(&spec).await.unwrap_err();
        assert!(matches!(err, SbomGeneratorError::Identity(_)));
        assert!(!generator.implementation.calls().contains(&"check_environment".to_owned()));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = SbomGeneratorConfig {
            scan_concurrency: 0,
            ..SbomGeneratorConfig::default()
        };
        assert!(SbomGenerator::new(config).is_err());
    }

    #[test]
    fn apk_package_uses_spec_identity() {
        let spec = Spec {
            license: "Apache-2.0".to_owned(),
            copyright: "Copyright 2024 Example".to_owned(),
            namespace: "wolfi".to_owned(),
            arch: "x86_64".to_owned(),
            ..spec()
        };
        let package = DefaultGenerator::default().generate_apk_package(&spec).unwrap();
        assert_eq!(package.name, "tool");
        assert_eq!(package.version, "1.0-r0");
        assert_eq!(package.license_declared, "Apache-2.0");
        assert_eq!(package.license_concluded, "NOASSERTION");
        assert_eq!(package.copyright, "Copyright 2024 Example");
        assert_eq!(package.namespace, "wolfi");
        assert_eq!(package.arch, "x86_64");
        assert!(package.relationships.is_empty());
    }

    #[test]
    fn apk_package_defaults_license() {
        let package = DefaultGenerator::default().generate_apk_package(&spec()).unwrap();
        assert_eq!(package.license_declared, "NOASSERTION");
    }

    #[tokio::test]
    async fn check_environment_missing_root_is_false() {
        let dir = tempfile::tempdir().unwrap();
        let spec = Spec {
            path: dir.path().join("absent"),
            ..spec()
        };
        let ready = DefaultGenerator::default().check_environment(&spec).await.unwrap();
        assert!(!ready);
        assert!(!spec.sbom_path().exists());
    }

    #[tokio::test]
    async fn check_environment_creates_sbom_dir() {
        let dir = tempfile::tempdir().unwrap();
        let spec = Spec {
            path: dir.path().to_path_buf(),
            ..spec()
        };
        let ready = DefaultGenerator::default().check_environment(&spec).await.unwrap();
        assert!(ready);
        assert!(spec.sbom_path().is_dir());

        // 두 번째 호출도 성공
        assert!(DefaultGenerator::default().check_environment(&spec).await.unwrap());
    }

    #[tokio::test]
    async fn copy_build_sbom_stages_file() {
        let pkg_dir = tempfile::tempdir().unwrap();
        let build_dir = tempfile::tempdir().unwrap();
        std::fs::write(build_dir.path().join("sbom-aarch64.spdx.json"), b"{}\n").unwrap();
        let spec = Spec {
            path: pkg_dir.path().to_path_buf(),
            arch: "aarch64".to_owned(),
            build_image_sbom_dir: Some(build_dir.path().to_path_buf()),
            ..spec()
        };
        let generator = DefaultGenerator::default();
        assert!(generator.check_environment(&spec).await.unwrap());

        generator.copy_build_sbom(&spec).await.unwrap();

        let staged = spec.staged_build_env_sbom();
        assert_eq!(std::fs::read(&staged).unwrap(), b"{}\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&staged).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }

    #[tokio::test]
    async fn copy_build_sbom_missing_source_fails() {
        let pkg_dir = tempfile::tempdir().unwrap();
        let spec = Spec {
            path: pkg_dir.path().to_path_buf(),
            arch: "x86_64".to_owned(),
            build_image_sbom_dir: Some(pkg_dir.path().join("nope")),
            ..spec()
        };
        let err = DefaultGenerator::default()
            .copy_build_sbom(&spec)
            .await
            .unwrap_err();
        assert!(matches!(err, SbomGeneratorError::Io { .. }));
    }
}
