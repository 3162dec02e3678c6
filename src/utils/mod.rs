//! Helpers shared by the loader, the page renderers and the session template.

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use std::fmt::Debug;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use zstd::stream::read::Decoder;

// ----------------------------------------------------------------------------
// Decompression
// ----------------------------------------------------------------------------

/// Supported compression formats for the fallback decode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decompress {
    Zst,
}

impl FromStr for Decompress {
    type Err = Report;
    fn from_str(s: &str) -> Result<Self, Report> {
        match s {
            "zst" | "tsz" | "tszip" => Ok(Decompress::Zst),
            _ext => Err(eyre!("Decompression for {_ext:?} is not implemented yet.")),
        }
    }
}

impl Decompress {
    /// Detects the compression format from the leading bytes of a file.
    ///
    /// ```rust
    /// use tsqc::utils::Decompress;
    /// let bytes = zstd::encode_all(&b"tree sequence"[..], 0)?;
    /// assert_eq!(Decompress::detect(&bytes), Some(Decompress::Zst));
    /// assert_eq!(Decompress::detect(b"plain"), None);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        const ZSTD_MAGIC: [u8; 4] = [0x28, 0xb5, 0x2f, 0xfd];
        bytes.starts_with(&ZSTD_MAGIC).then_some(Decompress::Zst)
    }
}

/// Decompress a file into memory, leaving the file itself untouched.
///
/// ## Arguments
///
/// - `path` - Input file path.
///
/// ## Examples
///
/// ```rust
/// use tsqc::utils::decompress_file;
/// let dir  = tempfile::tempdir()?;
/// let path = dir.path().join("message.zst");
/// std::fs::write(&path, zstd::encode_all(&b"hello"[..], 0)?)?;
///
/// assert_eq!(decompress_file(&path)?, b"hello");
/// assert!(path.exists());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn decompress_file<P>(path: &P) -> Result<Vec<u8>, Report>
where
    P: AsRef<Path> + Debug,
{
    let bytes = std::fs::read(path).wrap_err(format!("Failed to open: {path:?}"))?;

    // prefer the magic number, the extension is only a hint
    let format = match Decompress::detect(&bytes) {
        Some(format) => format,
        None => {
            let ext = path.as_ref().extension().and_then(|ext| ext.to_str()).unwrap_or_default();
            Decompress::from_str(ext).suggestion("Supported compression formats: zstd")?
        }
    };

    match format {
        Decompress::Zst => {
            let mut decoder =
                Decoder::new(bytes.as_slice()).wrap_err(format!("Failed to decode: {path:?}"))?;
            let mut buffer = Vec::new();
            decoder.read_to_end(&mut buffer).wrap_err(format!("Failed to decompress: {path:?}"))?;
            Ok(buffer)
        }
    }
}

// ----------------------------------------------------------------------------
// Text
// ----------------------------------------------------------------------------

/// Escape text for inclusion in HTML.
///
/// ```rust
/// use tsqc::utils::escape_html;
/// assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Remove ANSI escape sequences, such as the colors of an error report.
///
/// ```rust
/// use tsqc::utils::strip_ansi;
/// assert_eq!(strip_ansi("\u{1b}[31mred\u{1b}[0m text"), "red text");
/// ```
pub fn strip_ansi(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            // parameters and intermediates run until the final byte
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        } else {
            plain.push(c);
        }
    }
    plain
}

/// Format a float for display, trimming it to a readable precision.
///
/// ```rust
/// use tsqc::utils::format_float;
/// assert_eq!(format_float(2.0), "2");
/// assert_eq!(format_float(0.123456789), "0.1235");
/// assert_eq!(format_float(f64::NAN), "NaN");
/// ```
pub fn format_float(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{value:.0}");
    }
    let formatted = format!("{value:.4}");
    formatted.trim_end_matches('0').trim_end_matches('.').to_string()
}
