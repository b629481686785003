//! 엔티티 모델 -- SBOM 생성 전 단계의 패키지 그래프
//!
//! [`Package`], [`File`], [`Relationship`]으로 구성된 메모리 내 그래프입니다.
//! 패키지는 자신의 관계 목록을 소유하고, 관계는 대상 노드를 소유합니다.
//! SPDX 문서로 변환되면 그래프는 ID로만 연결된 평면 레코드가 됩니다.

use std::collections::BTreeMap;
use std::fmt;

use sha1::{Digest, Sha1};

/// 값이 제공되지 않았음을 나타내는 SPDX 값
pub const NOASSERTION: &str = "NOASSERTION";

/// 다이제스트 알고리즘 이름 -> 16진수 다이제스트
///
/// `BTreeMap`이므로 순회 순서가 알고리즘 이름 순으로 고정됩니다.
pub type Checksums = BTreeMap<String, String>;

/// 관계 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    /// 패키지가 파일(또는 하위 패키지)을 포함
    Contains,
    /// 빌드 시점 의존성
    BuildDependencyOf,
    /// 런타임 의존성
    DependsOn,
    /// 문서가 요소를 기술
    Describes,
}

impl RelationshipType {
    /// SPDX `relationshipType` 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "CONTAINS",
            Self::BuildDependencyOf => "BUILD_DEPENDENCY_OF",
            Self::DependsOn => "DEPENDS_ON",
            Self::Describes => "DESCRIBES",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 관계의 양 끝이 될 수 있는 그래프 노드
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// 패키지 노드
    Package(Box<Package>),
    /// 파일 노드
    File(File),
}

impl Node {
    /// 노드의 SPDX 식별자
    pub fn id(&self) -> String {
        match self {
            Self::Package(p) => p.id(),
            Self::File(f) => f.id(),
        }
    }

    /// 노드의 체크섬
    pub fn checksums(&self) -> &Checksums {
        match self {
            Self::Package(p) => &p.checksums,
            Self::File(f) => &f.checksums,
        }
    }

    /// 노드에서 나가는 관계 목록
    pub fn relationships(&self) -> &[Relationship] {
        match self {
            Self::Package(p) => &p.relationships,
            Self::File(f) => &f.relationships,
        }
    }
}

impl From<Package> for Node {
    fn from(p: Package) -> Self {
        Self::Package(Box::new(p))
    }
}

impl From<File> for Node {
    fn from(f: File) -> Self {
        Self::File(f)
    }
}

/// 방향이 있는 그래프 간선
///
/// (source id, kind, target id) 세 값이 관계를 유일하게 식별합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// 출발 노드 식별자
    pub source: String,
    /// 관계 종류
    pub kind: RelationshipType,
    /// 도착 노드
    pub target: Node,
}

impl Relationship {
    /// 새 관계를 생성합니다.
    pub fn new(source: impl Into<String>, kind: RelationshipType, target: impl Into<Node>) -> Self {
        Self {
            source: source.into(),
            kind,
            target: target.into(),
        }
    }
}

/// 기술 대상 패키지
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// 패키지 이름
    pub name: String,
    /// 패키지 버전
    pub version: String,
    /// 저작권 문구
    pub copyright: String,
    /// 선언된 라이선스
    pub license_declared: String,
    /// 결론 라이선스
    pub license_concluded: String,
    /// 패키지 생태계 네임스페이스 (예: `wolfi`)
    pub namespace: String,
    /// 아키텍처 (예: `x86_64`)
    pub arch: String,
    /// 패키지 자체 체크섬
    pub checksums: Checksums,
    /// 나가는 관계 (기록 순서 유지)
    pub relationships: Vec<Relationship>,
    /// 파일 스캔이 수행되었는지 여부
    pub files_analyzed: bool,
}

impl Package {
    /// 이름과 버전으로 패키지를 생성합니다. 라이선스는 `NOASSERTION`입니다.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            license_declared: NOASSERTION.to_owned(),
            license_concluded: NOASSERTION.to_owned(),
            ..Self::default()
        }
    }

    /// 결정론적 SPDX 식별자: `SPDXRef-Package-<name>-<version>`
    pub fn id(&self) -> String {
        format!(
            "SPDXRef-Package-{}-{}",
            sanitize_id_component(&self.name),
            sanitize_id_component(&self.version)
        )
    }

    /// 이 패키지를 출발점으로 하는 관계를 추가합니다.
    pub fn add_relationship(&mut self, kind: RelationshipType, target: impl Into<Node>) {
        let rel = Relationship::new(self.id(), kind, target);
        self.relationships.push(rel);
    }
}

/// 패키지 트리 안의 단일 파일
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    /// 패키지 루트 기준 절대 경로 (`/` 구분자)
    pub name: String,
    /// 알고리즘별 다이제스트
    pub checksums: Checksums,
    /// 나가는 관계 (보통 비어 있음)
    pub relationships: Vec<Relationship>,
}

impl File {
    /// 경로로 파일을 생성합니다.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 경로에서 파생된 SPDX 식별자: `SPDXRef-File-<sha1(path)>`
    pub fn id(&self) -> String {
        format!("SPDXRef-File-{}", hex::encode(Sha1::digest(self.name.as_bytes())))
    }
}

/// 문서로 변환되기 전의 최상위 SBOM
///
/// 여기에 담긴 패키지와 파일은 모두 문서의 기술 대상(`documentDescribes`)이 됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bom {
    /// 최상위 패키지
    pub packages: Vec<Package>,
    /// 최상위 파일
    pub files: Vec<File>,
}

/// SPDX 식별자에 허용되지 않는 문자(`[A-Za-z0-9.-]` 이외)를 `-`로 치환합니다.
fn sanitize_id_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_id_is_deterministic_and_sanitized() {
        let pkg = Package::new("py3_pip", "23.1+local-r0");
        assert_eq!(pkg.id(), "SPDXRef-Package-py3-pip-23.1-local-r0");
        assert_eq!(pkg.id(), Package::new("py3_pip", "23.1+local-r0").id());
    }

    #[test]
    fn new_package_defaults_licenses_to_noassertion() {
        let pkg = Package::new("zlib", "1.3-r0");
        assert_eq!(pkg.license_declared, NOASSERTION);
        assert_eq!(pkg.license_concluded, NOASSERTION);
        assert!(pkg.relationships.is_empty());
        assert!(!pkg.files_analyzed);
    }

    #[test]
    fn file_id_derives_from_path() {
        let a = File::new("/usr/bin/tool");
        let b = File::new("/usr/bin/tool");
        let c = File::new("/usr/bin/other");
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        // sha1("/usr/bin/tool") 40자리 16진수
        assert_eq!(a.id().len(), "SPDXRef-File-".len() + 40);
    }

    #[test]
    fn file_ids_do_not_collide_on_separator_lookalikes() {
        assert_ne!(File::new("/a-b").id(), File::new("/a/b").id());
    }

    #[test]
    fn add_relationship_records_source_id() {
        let mut pkg = Package::new("busybox", "1.36.1-r0");
        pkg.add_relationship(RelationshipType::Contains, File::new("/bin/sh"));
        let rel = &pkg.relationships[0];
        assert_eq!(rel.source, pkg.id());
        assert_eq!(rel.kind, RelationshipType::Contains);
        assert_eq!(rel.target.id(), File::new("/bin/sh").id());
    }

    #[test]
    fn node_dispatches_by_variant() {
        let mut file = File::new("/etc/os-release");
        file.checksums.insert("SHA1".to_owned(), "abc".to_owned());
        let node = Node::from(file);
        assert_eq!(node.checksums().get("SHA1").map(String::as_str), Some("abc"));
        assert!(node.relationships().is_empty());

        let node = Node::from(Package::new("glibc", "2.38-r0"));
        assert_eq!(node.id(), "SPDXRef-Package-glibc-2.38-r0");
    }

    #[test]
    fn relationship_type_strings() {
        assert_eq!(RelationshipType::Contains.to_string(), "CONTAINS");
        assert_eq!(
            RelationshipType::BuildDependencyOf.to_string(),
            "BUILD_DEPENDENCY_OF"
        );
        assert_eq!(RelationshipType::DependsOn.as_str(), "DEPENDS_ON");
    }
}
