//! 파일 스캐너 -- 패키지 트리 순회와 병렬 다이제스트 계산
//!
//! 디렉토리를 한 번 순회해 정렬된 경로 목록을 만들고, 경로마다 하나의
//! 작업 단위를 상한이 있는 워커 풀에 제출합니다. 각 작업은 SHA1/SHA256/SHA512를
//! 계산해 동시성 안전한 저장소에 결과를 넣습니다.
//!
//! # 순서 보장
//!
//! 작업 완료 순서는 출력에 드러나지 않습니다. 풀이 모두 끝난 뒤 저장소의 키를
//! 다시 정렬하여 `CONTAINS` 관계를 기록합니다.
//!
//! # 에러
//!
//! 처음 실패한 작업의 에러만 보관하고, 진행 중인 나머지 작업은 끝까지 실행됩니다.
//! 모든 작업이 끝난 뒤 보관된 에러로 스캔 전체가 실패합니다.

use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use dashmap::DashMap;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use apkbom_core::metrics as m;

use crate::error::SbomGeneratorError;
use crate::model::{File, Package, Relationship, RelationshipType};

/// 파일 다이제스트 알고리즘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    /// SHA-1 (검증 코드 계산에 사용)
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// 스캔 시 계산하는 모든 알고리즘
    pub const ALL: [Self; 3] = [Self::Sha1, Self::Sha256, Self::Sha512];

    /// SPDX 체크섬 알고리즘 이름
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// 파일을 한 번 읽어 [`DigestAlgorithm::ALL`] 순서의 16진수 다이제스트를 반환합니다 (동기 I/O).
pub fn digest_file(path: &Path) -> io::Result<[String; 3]> {
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, std::fs::File::open(path)?);
    let mut sha1 = Sha1::new();
    let mut sha256 = Sha256::new();
    let mut sha512 = Sha512::new();

    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        sha1.update(chunk);
        sha256.update(chunk);
        sha512.update(chunk);
        let consumed = chunk.len();
        reader.consume(consumed);
    }

    Ok([
        hex::encode(sha1.finalize()),
        hex::encode(sha256.finalize()),
        hex::encode(sha512.finalize()),
    ])
}

/// 처음 기록된 에러 하나만 보관하는 슬롯
///
/// 취소 신호가 아닙니다. 기록 이후에도 다른 작업은 계속 실행됩니다.
#[derive(Debug, Default)]
struct FirstError {
    slot: Mutex<Option<SbomGeneratorError>>,
}

impl FirstError {
    /// 슬롯이 비어 있으면 에러를 기록하고 `true`를 반환합니다.
    fn record(&self, err: SbomGeneratorError) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            debug!(error = %err, "additional scan error suppressed");
            return false;
        }
        *slot = Some(err);
        true
    }

    fn take(&self) -> Option<SbomGeneratorError> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// 스캔 대상 파일 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// 루트 기준 절대 경로 (`/usr/bin/tool`). UTF-8이 아닌 이름은 손실 변환됩니다.
    pub name: String,
    /// 디스크상의 실제 경로
    pub path: PathBuf,
}

/// 디렉토리 트리의 일반 파일 목록을 이름순으로 정렬하여 반환합니다 (동기 I/O).
///
/// 디렉토리와 심볼릭 링크는 제외됩니다.
pub fn get_directory_tree(root: &Path) -> Result<Vec<TreeEntry>, SbomGeneratorError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry
            .map_err(|e| SbomGeneratorError::Scan(format!("building directory tree: {e}")))?;
        let file_type = entry.file_type();
        if file_type.is_dir() || file_type.is_symlink() {
            continue;
        }
        if !file_type.is_file() {
            debug!(path = %entry.path().display(), "skipping non-regular file");
            continue;
        }

        let relative = entry.path().strip_prefix(root).map_err(|e| {
            SbomGeneratorError::Scan(format!(
                "{} is outside of {}: {e}",
                entry.path().display(),
                root.display()
            ))
        })?;
        files.push(TreeEntry {
            name: canonical_path(relative),
            path: entry.path().to_path_buf(),
        });
    }

    files.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

fn canonical_path(relative: &Path) -> String {
    let mut out = String::new();
    for component in relative.components() {
        out.push('/');
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

/// 단일 파일의 모든 다이제스트를 계산합니다 (동기 I/O).
pub fn digest_entry(entry: &TreeEntry) -> Result<File, SbomGeneratorError> {
    let digests = digest_file(&entry.path).map_err(|source| SbomGeneratorError::Hash {
        algorithm: DigestAlgorithm::Sha1.name(),
        path: entry.name.clone(),
        source,
    })?;

    let mut file = File::new(entry.name.clone());
    for (algorithm, digest) in DigestAlgorithm::ALL.iter().zip(digests) {
        file.checksums.insert(algorithm.name().to_owned(), digest);
    }
    Ok(file)
}

/// 패키지 트리를 스캔하여 `package`에 `CONTAINS` 관계로 파일을 추가합니다.
///
/// 동시에 실행되는 다이제스트 작업은 `concurrency`개로 제한됩니다.
/// 성공 시 추가된 파일 수를 반환합니다.
///
/// # Errors
///
/// - 디렉토리 순회 실패: `SbomGeneratorError::Scan`
/// - 다이제스트 실패: 처음 기록된 `SbomGeneratorError::Hash`
pub async fn scan_files(
    root: &Path,
    package: &mut Package,
    concurrency: usize,
) -> Result<usize, SbomGeneratorError> {
    let started = Instant::now();

    let paths = {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || get_directory_tree(&root))
            .await
            .map_err(|e| SbomGeneratorError::Scan(format!("directory walk task failed: {e}")))?
    }?;

    debug!(
        root = %root.display(),
        files = paths.len(),
        concurrency,
        "scanning files and adding them to the package"
    );

    package.files_analyzed = true;

    let store: Arc<DashMap<String, File>> = Arc::new(DashMap::with_capacity(paths.len()));
    let first_error = Arc::new(FirstError::default());
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for entry in paths {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| SbomGeneratorError::Scan(format!("worker pool closed: {e}")))?;
        let store = Arc::clone(&store);
        let first_error = Arc::clone(&first_error);

        tasks.spawn_blocking(move || {
            let _permit = permit;
            match digest_entry(&entry) {
                Ok(file) => {
                    store.insert(entry.name, file);
                }
                Err(err) => {
                    first_error.record(err);
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            first_error.record(SbomGeneratorError::Scan(format!(
                "digest worker failed: {e}"
            )));
        }
    }

    if let Some(err) = first_error.take() {
        metrics::counter!(m::SBOM_SCAN_FAILURES_TOTAL).increment(1);
        warn!(root = %root.display(), error = %err, "file scan failed");
        return Err(err);
    }

    let mut keys: Vec<String> = store.iter().map(|entry| entry.key().clone()).collect();
    keys.sort();

    let source = package.id();
    for key in &keys {
        if let Some((_, file)) = store.remove(key) {
            package.relationships.push(Relationship::new(
                source.clone(),
                RelationshipType::Contains,
                file,
            ));
        }
    }

    let count = keys.len();
    metrics::counter!(m::SBOM_FILES_SCANNED_TOTAL).increment(count as u64);
    metrics::histogram!(m::SBOM_SCAN_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
    info!(
        package = %package.name,
        files = count,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "package files scanned"
    );

    Ok(count)
}
