//! Package URL (purl) 생성 및 파싱
//!
//! `pkg:<type>/<namespace>/<name>@<version>?<qualifiers>#<subpath>` 형식을 다룹니다.
//! 패키지 SBOM의 외부 참조 생성과 빌드 환경 SBOM의 패키지 분류에 사용됩니다.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// apk 패키지 purl 타입
pub const TYPE_APK: &str = "apk";

/// OCI 컨테이너 이미지 purl 타입
pub const TYPE_OCI: &str = "oci";

/// purl 파싱 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurlError {
    /// `pkg:` 스킴 누락
    #[error("purl must start with 'pkg:': {0}")]
    MissingScheme(String),

    /// 타입 누락 또는 허용되지 않는 문자
    #[error("invalid purl type: {0}")]
    InvalidType(String),

    /// 이름 누락
    #[error("purl has no name: {0}")]
    MissingName(String),

    /// 잘못된 퍼센트 인코딩
    #[error("invalid percent-encoding in purl: {0}")]
    InvalidEncoding(String),

    /// `key=value` 형식이 아닌 qualifier
    #[error("invalid qualifier '{0}'")]
    InvalidQualifier(String),
}

/// Package URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageUrl {
    /// 패키지 타입 (소문자)
    pub ty: String,
    /// 네임스페이스 (없을 수 있음)
    pub namespace: Option<String>,
    /// 패키지 이름
    pub name: String,
    /// 버전
    pub version: Option<String>,
    /// qualifier (키 순으로 정렬됨)
    pub qualifiers: BTreeMap<String, String>,
    /// 서브경로
    pub subpath: Option<String>,
}

impl PackageUrl {
    /// 타입과 이름으로 purl을 생성합니다.
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into().to_ascii_lowercase(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// 네임스페이스를 설정합니다. 빈 문자열은 무시됩니다.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.namespace = (!namespace.is_empty()).then_some(namespace);
        self
    }

    /// 버전을 설정합니다. 빈 문자열은 무시됩니다.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.version = (!version.is_empty()).then_some(version);
        self
    }

    /// qualifier를 추가합니다. 값이 비어 있으면 추가하지 않습니다.
    pub fn with_qualifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.qualifiers.insert(key.into().to_ascii_lowercase(), value);
        }
        self
    }
}

impl fmt::Display for PackageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkg:{}/", self.ty)?;
        if let Some(namespace) = &self.namespace {
            for segment in namespace.split('/').filter(|s| !s.is_empty()) {
                write!(f, "{}/", encode(segment))?;
            }
        }
        f.write_str(&encode(&self.name))?;
        if let Some(version) = &self.version {
            write!(f, "@{}", encode(version))?;
        }
        let mut sep = '?';
        for (key, value) in &self.qualifiers {
            write!(f, "{sep}{key}={}", encode(value))?;
            sep = '&';
        }
        if let Some(subpath) = &self.subpath {
            let segments: Vec<String> = subpath
                .split('/')
                .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                .map(encode)
                .collect();
            if !segments.is_empty() {
                write!(f, "#{}", segments.join("/"))?;
            }
        }
        Ok(())
    }
}

impl FromStr for PackageUrl {
    type Err = PurlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("pkg:")
            .ok_or_else(|| PurlError::MissingScheme(s.to_owned()))?;
        let rest = rest.trim_start_matches('/');

        let (rest, subpath) = match rest.split_once('#') {
            Some((head, sub)) => (head, Some(sub)),
            None => (rest, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((head, query)) => (head, Some(query)),
            None => (rest, None),
        };

        let (ty, rest) = rest
            .split_once('/')
            .ok_or_else(|| PurlError::MissingName(s.to_owned()))?;
        if !is_valid_type(ty) {
            return Err(PurlError::InvalidType(ty.to_owned()));
        }

        let rest = rest.trim_end_matches('/');
        let (path, version) = match rest.rsplit_once('@') {
            Some((path, version)) => (path, Some(decode(version)?)),
            None => (rest, None),
        };

        let (namespace, name) = match path.rsplit_once('/') {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, path),
        };
        let name = decode(name)?;
        if name.is_empty() {
            return Err(PurlError::MissingName(s.to_owned()));
        }
        let namespace = match namespace {
            Some(ns) => {
                let segments = ns
                    .split('/')
                    .filter(|seg| !seg.is_empty())
                    .map(decode)
                    .collect::<Result<Vec<_>, _>>()?;
                (!segments.is_empty()).then(|| segments.join("/"))
            }
            None => None,
        };

        let mut qualifiers = BTreeMap::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| PurlError::InvalidQualifier(pair.to_owned()))?;
                if key.is_empty() {
                    return Err(PurlError::InvalidQualifier(pair.to_owned()));
                }
                let value = decode(value)?;
                if !value.is_empty() {
                    qualifiers.insert(key.to_ascii_lowercase(), value);
                }
            }
        }

        let subpath = match subpath {
            Some(sub) => {
                let segments = sub
                    .split('/')
                    .filter(|seg| !seg.is_empty())
                    .map(decode)
                    .collect::<Result<Vec<_>, _>>()?;
                (!segments.is_empty()).then(|| segments.join("/"))
            }
            None => None,
        };

        Ok(Self {
            ty: ty.to_ascii_lowercase(),
            namespace,
            name,
            version: version.filter(|v| !v.is_empty()),
            qualifiers,
            subpath,
        })
    }
}

/// 타입은 ASCII 문자로 시작하고 영숫자 및 `.+-`만 허용합니다.
fn is_valid_type(ty: &str) -> bool {
    let mut chars = ty.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'))
}

fn encode(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'+' | b':')
        {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn decode(segment: &str) -> Result<String, PurlError> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| PurlError::InvalidEncoding(segment.to_owned()))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| PurlError::InvalidEncoding(segment.to_owned()))
}
