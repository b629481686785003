//! apk 패키지용 SPDX 2.3 SBOM 생성 엔진
//!
//! 패키지 파일 트리를 스캔하여 파일별 다이제스트와 패키지 검증 코드를 계산하고,
//! 빌드 환경 SBOM의 OS 패키지를 빌드 의존성으로 병합한 뒤
//! 재현 가능한 SPDX JSON 문서를 패키지 안에 기록합니다.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`SbomGeneratorError`)
//! - [`config`]: Generator configuration (`SbomGeneratorConfig`, builder)
//! - [`spec`]: Generation request (`Spec`) and derived paths
//! - [`model`]: Entity graph (`Package`, `File`, `Relationship`, `Bom`)
//! - [`purl`]: Package URL formatting and parsing
//! - [`scan`]: Parallel file scanner
//! - [`spdx`]: SPDX document model, lowering, build SBOM merge, JSON writer
//! - [`generator`]: Stage trait (`GeneratorImplementation`) and orchestrator (`SbomGenerator`)
//!
//! # Architecture
//!
//! ```text
//! Spec --> generate_apk_package --> Package
//!                                      |
//!                 scan_files (Semaphore + JoinSet, DashMap store)
//!                                      |
//!                                     Bom --> build_document --> SpdxDocument
//!                                                                    |
//!                                      build env SBOM --> merge_build_sbom
//!                                                                    |
//!                                                             write_document
//!                                                                    |
//!                                          <root>/var/lib/db/sbom/<name>-<version>.spdx.json
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod model;
pub mod purl;
pub mod scan;
pub mod spdx;
pub mod spec;

// --- Public API Re-exports ---

// Orchestrator
pub use generator::{DefaultGenerator, GeneratorImplementation, SbomGenerator};

// Configuration
pub use config::{SbomGeneratorConfig, SbomGeneratorConfigBuilder};

// Error
pub use error::SbomGeneratorError;

// Request
pub use spec::Spec;

// Entity model
pub use model::{Bom, File, Node, Package, Relationship, RelationshipType};

// SPDX
pub use spdx::SpdxDocument;

// Package URL
pub use purl::PackageUrl;
