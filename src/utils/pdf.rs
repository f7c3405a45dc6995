//! PDF text extraction.
//!
//! Features:
//! - Prefer external `pdftotext` (quiet, UTF-8) when available with stderr suppressed.
//!   Its stdout is read as it is produced and split into pages on form feed,
//!   each page cleaned at the byte level.
//! - Fallback to `pdf-extract`, one page at a time from a single loaded document,
//!   with stderr suppressed on Unix to avoid glyph warnings and panics from
//!   malformed documents turned into errors.
//! - Progress is reported as soon as each page has been extracted.
//! - Pages are concatenated in order without a separator; a page without
//!   extractable text contributes an empty string.

use std::{
    fmt,
    io::{self, BufRead, BufReader},
    panic::{self, AssertUnwindSafe},
    path::Path,
    process::{Child, ChildStdout, Command, Stdio},
    str::FromStr,
};

use pdf_extract::{Document, PlainTextOutput};
use tracing::{debug, warn};

use super::unicode::clean_utf8;
use crate::error::{Result, StudyError};

const FORM_FEED: u8 = 0x0C;

/// Which extractor to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfBackend {
    /// `pdftotext` if installed, else `pdf-extract`.
    #[default]
    Auto,
    Pdftotext,
    Native,
}

impl FromStr for PdfBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "pdftotext" | "poppler" => Ok(Self::Pdftotext),
            "native" | "pdf-extract" => Ok(Self::Native),
            other => Err(format!("unknown PDF backend '{}' (expected auto, pdftotext or native)", other)),
        }
    }
}

/// Per-page progress, reported after each page has been extracted and appended.
/// `total` is 0 when the page count could not be determined up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub page: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.page as f32 / self.total as f32
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return write!(f, "page {}", self.page);
        }
        write!(f, "page {}/{} ({:.0}%)", self.page, self.total, self.fraction() * 100.0)
    }
}

/// Extract the text of the PDF at `file_path`.
///
/// Any failure (missing or unreadable file, corrupt or encrypted document) is
/// reported as [`StudyError::Extraction`] for the whole document.
pub fn extract_pdf_text<F>(file_path: &Path, backend: PdfBackend, mut on_progress: F) -> Result<String>
where
    F: FnMut(Progress),
{
    if !file_path.exists() {
        return Err(StudyError::Extraction(format!(
            "PDF file '{}' does not exist",
            file_path.display()
        )));
    }
    if !file_path.is_file() {
        return Err(StudyError::Extraction(format!("'{}' is not a file", file_path.display())));
    }

    match backend {
        PdfBackend::Pdftotext => pdftotext_text(file_path, &mut on_progress),
        PdfBackend::Native => native_text(&read_pdf(file_path)?, &mut on_progress),
        PdfBackend::Auto => match pdftotext_text(file_path, &mut on_progress) {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!(error = %e, "pdftotext unavailable, falling back to pdf-extract");
                native_text(&read_pdf(file_path)?, &mut on_progress)
            }
        },
    }
}

/// Extract text from PDF bytes already in memory, using `pdf-extract`.
pub fn extract_pdf_text_from_mem<F>(bytes: &[u8], mut on_progress: F) -> Result<String>
where
    F: FnMut(Progress),
{
    native_text(bytes, &mut on_progress)
}

/// Join page texts in order, reporting progress after each page.
pub fn concat_pages<S, F>(pages: &[S], on_progress: F) -> String
where
    S: AsRef<str>,
    F: FnMut(Progress),
{
    let mut joiner = PageJoiner::new(pages.len(), on_progress);
    for page in pages {
        joiner.push(page.as_ref());
    }
    joiner.finish()
}

/// Pulls pages one at a time from `pages`, appending each and reporting
/// progress before the next one is extracted.
fn join_extracted<I, F>(total: usize, pages: I, on_progress: F) -> Result<String>
where
    I: IntoIterator<Item = Result<String>>,
    F: FnMut(Progress),
{
    let mut joiner = PageJoiner::new(total, on_progress);
    for page in pages {
        joiner.push(&page?);
    }
    Ok(joiner.finish())
}

struct PageJoiner<F> {
    text: String,
    page: usize,
    total: usize,
    on_progress: F,
}

impl<F: FnMut(Progress)> PageJoiner<F> {
    fn new(total: usize, on_progress: F) -> Self {
        Self { text: String::new(), page: 0, total, on_progress }
    }

    fn push(&mut self, page: &str) {
        self.page += 1;
        debug!(page = self.page, chars = page.chars().count(), "page extracted");
        self.text.push_str(page);
        (self.on_progress)(Progress { page: self.page, total: self.total });
    }

    fn finish(self) -> String {
        self.text
    }
}

fn read_pdf(file_path: &Path) -> Result<Vec<u8>> {
    std::fs::read(file_path).map_err(|e| {
        StudyError::Extraction(format!("could not read '{}': {}", file_path.display(), e))
    })
}

// ---------- pdftotext ----------

fn pdftotext_text(file_path: &Path, on_progress: &mut dyn FnMut(Progress)) -> Result<String> {
    // `-q` quiet, `-enc UTF-8` output encoding, "-" writes to stdout.
    let mut child = Command::new("pdftotext")
        .arg("-q")
        .arg("-enc")
        .arg("UTF-8")
        .arg(file_path)
        .arg("-")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| StudyError::Extraction(format!("could not run pdftotext: {}", e)))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| StudyError::Extraction("pdftotext stdout was not captured".into()))?;

    let total = page_count(file_path).unwrap_or(0);
    let pages = PdftotextPages {
        pages: FormFeedPages::new(BufReader::new(stdout)),
        child,
        file_path,
        exited: false,
    };
    join_extracted(total, pages, on_progress)
}

/// Page count from the document catalog, used as the progress total.
fn page_count(file_path: &Path) -> Option<usize> {
    let loaded = panic::catch_unwind(|| Document::load(file_path)).ok()?;
    match loaded {
        Ok(doc) => Some(doc.get_pages().len()),
        Err(e) => {
            debug!(error = %e, "could not count pages");
            None
        }
    }
}

/// Pages of a running `pdftotext`; checks the exit status once stdout is drained.
struct PdftotextPages<'a> {
    pages: FormFeedPages<BufReader<ChildStdout>>,
    child: Child,
    file_path: &'a Path,
    exited: bool,
}

impl Iterator for PdftotextPages<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exited {
            return None;
        }
        match self.pages.next() {
            Some(Ok(page)) => Some(Ok(page)),
            Some(Err(e)) => {
                self.exited = true;
                let _ = self.child.kill();
                let _ = self.child.wait();
                Some(Err(StudyError::Extraction(format!("could not read pdftotext output: {}", e))))
            }
            None => {
                self.exited = true;
                match self.child.wait() {
                    Ok(status) if status.success() => None,
                    Ok(status) => Some(Err(StudyError::Extraction(format!(
                        "pdftotext failed on '{}' ({})",
                        self.file_path.display(),
                        status
                    )))),
                    Err(e) => Some(Err(StudyError::Extraction(format!("pdftotext did not finish: {}", e)))),
                }
            }
        }
    }
}

/// Splits a byte stream into cleaned pages. Every page ends with a form feed,
/// so nothing after the last one is a page unless it has content.
struct FormFeedPages<R> {
    reader: R,
    finished: bool,
}

impl<R: BufRead> FormFeedPages<R> {
    fn new(reader: R) -> Self {
        Self { reader, finished: false }
    }
}

impl<R: BufRead> Iterator for FormFeedPages<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut buf = Vec::new();
        match self.reader.read_until(FORM_FEED, &mut buf) {
            Ok(0) => {
                self.finished = true;
                None
            }
            Ok(_) => {
                if buf.last() == Some(&FORM_FEED) {
                    buf.pop();
                } else {
                    self.finished = true;
                }
                Some(Ok(clean_utf8(&buf)))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

// ---------- pdf-extract ----------

fn native_text(bytes: &[u8], on_progress: &mut dyn FnMut(Progress)) -> Result<String> {
    let pages = NativePages::load(bytes)?;
    join_extracted(pages.total(), pages, on_progress)
}

/// A loaded document whose pages are rendered to text on demand.
struct NativePages {
    doc: Document,
    numbers: std::vec::IntoIter<u32>,
}

impl NativePages {
    fn load(bytes: &[u8]) -> Result<Self> {
        let doc = guarded(|| {
            let mut doc = Document::load_mem(bytes).map_err(|e| StudyError::Extraction(e.to_string()))?;
            if doc.is_encrypted() {
                doc.decrypt("")
                    .map_err(|e| StudyError::Extraction(format!("encrypted PDF: {}", e)))?;
            }
            Ok(doc)
        })?;
        let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        Ok(Self { doc, numbers: numbers.into_iter() })
    }

    fn total(&self) -> usize {
        self.numbers.len()
    }
}

impl Iterator for NativePages {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let page_num = self.numbers.next()?;
        let doc = &self.doc;
        let rendered = guarded(|| {
            let mut text = String::new();
            {
                let mut output = PlainTextOutput::new(&mut text);
                pdf_extract::output_doc_page(doc, &mut output, page_num)
                    .map_err(|e| StudyError::Extraction(e.to_string()))?;
            }
            Ok(text)
        });
        // An unreadable page is a page without text.
        Some(Ok(rendered.unwrap_or_else(|e| {
            warn!(page = page_num, error = %e, "no text extracted from page");
            String::new()
        })))
    }
}

/// Run a pdf-extract call with stderr silenced, turning a panic into an error.
fn guarded<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match with_stderr_suppressed(|| panic::catch_unwind(AssertUnwindSafe(f))) {
        Ok(result) => result,
        Err(_) => Err(StudyError::Extraction(
            "PDF parser panicked (malformed document)".into(),
        )),
    }
}

#[cfg(unix)]
fn with_stderr_suppressed<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    use std::fs::OpenOptions;
    use std::os::unix::io::AsRawFd;

    extern "C" {
        fn dup(fd: i32) -> i32;
        fn dup2(oldfd: i32, newfd: i32) -> i32;
        fn close(fd: i32) -> i32;
    }

    let null = match OpenOptions::new().write(true).open("/dev/null") {
        Ok(null) => null,
        Err(e) => {
            warn!(error = %e, "could not silence stderr for pdf-extract");
            return f();
        }
    };
    let null_fd = null.as_raw_fd();

    unsafe {
        let stderr_fd = 2;
        let saved = dup(stderr_fd);
        if saved == -1 {
            warn!(error = %io::Error::last_os_error(), "could not silence stderr for pdf-extract");
            return f();
        }

        if dup2(null_fd, stderr_fd) == -1 {
            warn!(error = %io::Error::last_os_error(), "could not silence stderr for pdf-extract");
            let _ = close(saved);
            return f();
        }

        let result = f();

        let _ = dup2(saved, stderr_fd);
        let _ = close(saved);

        result
    }
}

#[cfg(not(unix))]
fn with_stderr_suppressed<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    f()
}
