//! 메트릭 상수 및 설명 등록
//!
//! SBOM 생성 엔진이 기록하는 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 엔진은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않은 경우 호출은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `apkbom_sbom_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── SBOM Generator 메트릭 ─────────────────────────────────────────

/// 해시 계산이 끝난 파일 수 (counter)
pub const SBOM_FILES_SCANNED_TOTAL: &str = "apkbom_sbom_files_scanned_total";

/// 실패한 파일 스캔 수 (counter)
pub const SBOM_SCAN_FAILURES_TOTAL: &str = "apkbom_sbom_scan_failures_total";

/// 파일 스캔 소요 시간 (histogram, 초)
pub const SBOM_SCAN_DURATION_SECONDS: &str = "apkbom_sbom_scan_duration_seconds";

/// 기록된 SBOM 문서 수 (counter, label: result)
pub const SBOM_DOCUMENTS_WRITTEN_TOTAL: &str = "apkbom_sbom_documents_written_total";

/// 빌드 환경 SBOM에서 병합된 패키지 수 (counter)
pub const SBOM_BUILD_PACKAGES_MERGED_TOTAL: &str = "apkbom_sbom_build_packages_merged_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 호스트 프로세스가 전역 레코더를 설치한 뒤 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        SBOM_FILES_SCANNED_TOTAL,
        "Total number of package files digested for SBOM generation"
    );
    describe_counter!(
        SBOM_SCAN_FAILURES_TOTAL,
        "Total number of package file scans that failed"
    );
    describe_histogram!(
        SBOM_SCAN_DURATION_SECONDS,
        "Time to scan and digest one package tree in seconds"
    );
    describe_counter!(
        SBOM_DOCUMENTS_WRITTEN_TOTAL,
        "Total number of SBOM documents written, by result"
    );
    describe_counter!(
        SBOM_BUILD_PACKAGES_MERGED_TOTAL,
        "Total number of build environment packages merged into package SBOMs"
    );
}
