//! Serialize a workbook and hand it to a download sink.

use crate::book::Workbook;
use crate::error::Result;
use crate::{xls, xlsx};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// Binary spreadsheet flavor to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadsheetFormat {
    /// Legacy BIFF8 workbook
    Xls,
    /// Office Open XML workbook
    #[default]
    Xlsx,
}

impl SpreadsheetFormat {
    /// Pick the format from a "legacy" switch
    #[must_use]
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy {
            SpreadsheetFormat::Xls
        } else {
            SpreadsheetFormat::Xlsx
        }
    }

    /// File extension including the dot
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            SpreadsheetFormat::Xls => ".xls",
            SpreadsheetFormat::Xlsx => ".xlsx",
        }
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            SpreadsheetFormat::Xls => "application/vnd.ms-excel",
            SpreadsheetFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// Destination of an encoded workbook, e.g. an HTTP response
pub trait DownloadSink {
    fn set_header(&mut self, name: &str, value: &str);

    fn set_content_type(&mut self, value: &str);

    /// Writer receiving the encoded bytes
    fn body(&mut self) -> &mut dyn Write;
}

/// Sink that keeps the whole download in memory
#[derive(Debug, Default)]
pub struct BufferedDownload {
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl BufferedDownload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a header value (case-insensitive name)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}

impl DownloadSink for BufferedDownload {
    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn set_content_type(&mut self, value: &str) {
        self.content_type = Some(value.to_string());
    }

    fn body(&mut self) -> &mut dyn Write {
        &mut self.body
    }
}

/// Sink that streams the download into a file
#[derive(Debug)]
pub struct FileDownload {
    path: PathBuf,
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    writer: BufWriter<File>,
}

impl FileDownload {
    /// Create (or truncate) the target file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(FileDownload {
            path,
            headers: Vec::new(),
            content_type: None,
            writer: BufWriter::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

impl DownloadSink for FileDownload {
    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn set_content_type(&mut self, value: &str) {
        self.content_type = Some(value.to_string());
    }

    fn body(&mut self) -> &mut dyn Write {
        &mut self.writer
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Serialize a workbook in the requested format
///
/// # Errors
///
/// Returns error if the encoder fails.
pub fn encode_workbook(book: &Workbook, format: SpreadsheetFormat) -> Result<Vec<u8>> {
    match format {
        SpreadsheetFormat::Xls => xls::encode(book),
        SpreadsheetFormat::Xlsx => xlsx::encode(book),
    }
}

/// Download file name for a title
#[must_use]
pub fn file_name(title: &str, format: SpreadsheetFormat) -> String {
    format!("{title}{}", format.extension())
}

/// `attachment; filename*=UTF-8''...` with the file name percent-encoded
#[must_use]
pub fn content_disposition(title: &str, format: SpreadsheetFormat) -> String {
    format!(
        "attachment; filename*=UTF-8''{}{}",
        urlencoding::encode(title),
        format.extension()
    )
}

/// Encode the workbook and write it, with its headers, to the sink.
///
/// Returns the number of body bytes written.
///
/// # Errors
///
/// Returns error if encoding or writing fails. The error is logged before
/// it is returned.
pub fn send_workbook<S: DownloadSink + ?Sized>(
    title: &str,
    book: &Workbook,
    format: SpreadsheetFormat,
    sink: &mut S,
) -> Result<u64> {
    let result = write_download(title, book, format, sink);
    match &result {
        Ok(bytes) => tracing::info!("Sent '{}' ({} bytes)", file_name(title, format), bytes),
        Err(e) => tracing::error!("Failed to send '{}': {}", file_name(title, format), e),
    }
    result
}

fn write_download<S: DownloadSink + ?Sized>(
    title: &str,
    book: &Workbook,
    format: SpreadsheetFormat,
    sink: &mut S,
) -> Result<u64> {
    let bytes = encode_workbook(book, format)?;

    sink.set_header(CONTENT_DISPOSITION, &content_disposition(title, format));
    sink.set_content_type(format.content_type());

    let body = sink.body();
    body.write_all(&bytes)?;
    body.flush()?;

    Ok(bytes.len() as u64)
}
