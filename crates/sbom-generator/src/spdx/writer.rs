//! SPDX JSON 출력
//!
//! 두 칸 들여쓰기, 끝 개행, HTML 안전 이스케이프(`<`, `>`, `&`, U+2028, U+2029)를
//! 적용합니다. 인코딩은 메모리에서 끝낸 뒤 파일을 생성하므로, 인코딩 실패 시
//! 출력 파일이 남지 않습니다.

use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use tracing::info;

use apkbom_core::metrics as m;

use crate::error::SbomGeneratorError;

use super::SpdxDocument;

/// HTML에서 문제가 되는 문자를 `\uXXXX`로 이스케이프하는 pretty formatter
pub struct HtmlSafeFormatter<'a> {
    inner: PrettyFormatter<'a>,
}

impl Default for HtmlSafeFormatter<'_> {
    fn default() -> Self {
        Self {
            inner: PrettyFormatter::with_indent(b"  "),
        }
    }
}

impl Formatter for HtmlSafeFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(&fragment.as_bytes()[start..i])?;
            writer.write_all(escaped.as_bytes())?;
            start = i + ch.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }
}

/// 값을 HTML 안전 pretty JSON으로 인코딩합니다. 끝에 개행이 붙습니다.
pub fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, SbomGeneratorError> {
    let mut out = Vec::with_capacity(16 * 1024);
    {
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, HtmlSafeFormatter::default());
        value
            .serialize(&mut serializer)
            .map_err(|e| SbomGeneratorError::Serialization(format!("encoding spdx sbom: {e}")))?;
    }
    out.push(b'\n');
    Ok(out)
}

/// SPDX 문서를 인코딩합니다.
pub fn encode_document(doc: &SpdxDocument) -> Result<Vec<u8>, SbomGeneratorError> {
    encode_json(doc)
}

/// SPDX 문서를 `path`에 기록합니다.
///
/// # Errors
///
/// - 인코딩 실패: `SbomGeneratorError::Serialization` (파일은 생성되지 않음)
/// - 파일 생성/쓰기 실패: `SbomGeneratorError::Io`
pub async fn write_document(doc: &SpdxDocument, path: &Path) -> Result<(), SbomGeneratorError> {
    let result = match encode_document(doc) {
        Ok(bytes) => tokio::fs::write(path, &bytes)
            .await
            .map(|()| bytes.len())
            .map_err(|source| SbomGeneratorError::Io {
                path: path.display().to_string(),
                source,
            }),
        Err(e) => Err(e),
    };
    let label = if result.is_ok() { "success" } else { "failure" };
    metrics::counter!(m::SBOM_DOCUMENTS_WRITTEN_TOTAL, m::LABEL_RESULT => label).increment(1);
    let bytes = result?;

    info!(
        path = %path.display(),
        bytes,
        packages = doc.packages.len(),
        files = doc.files.len(),
        "SBOM written"
    );
    Ok(())
}
