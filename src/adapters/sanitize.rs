//! Log sanitization: keeps clinical values out of log files.
//!
//! Attribute assignments such as `age=71`, `CRP: 9.0` or
//! `History of falls = 1` are rewritten to `age=[REDACTED]`, and record
//! identifiers (MRNs, e-mail addresses) are masked.
//!
//! This is a fallback. Services log probabilities and counts, never the
//! record itself.

use regex::Regex;
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

/// Default cap on bytes scanned per call; override with
/// `FRAILSIGHT_SANITIZE_MAX_BYTES`.
const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();

fn patterns() -> &'static [(Regex, &'static str)] {
    PATTERNS.get_or_init(|| {
        let rules: [(&str, &str); 3] = [
            (
                r"(?i)\b(age|gender|bmi|smoke|smoking|ftsst|adl|pa|physical activity|complications|fall|falls|history of falls|crp|bl_crp|hgb|bl_hgb|hemoglobin)(\s*[=:]\s*)-?\d+(?:\.\d+)?",
                "${1}${2}[REDACTED]",
            ),
            (r"(?i)\bMRN[:#\s]?\s*\d{5,12}\b", "[REDACTED-MRN]"),
            (
                r"(?i)\b[a-z0-9._%+-]{1,64}@[a-z0-9-]{1,63}(?:\.[a-z0-9-]{1,63})*\.[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
        ];
        rules
            .into_iter()
            .map(|(p, r)| (Regex::new(p).expect("Valid regex"), r))
            .collect()
    })
}

fn max_sanitize_bytes() -> usize {
    std::env::var("FRAILSIGHT_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact clinical values and identifiers from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for (regex, replacement) in patterns() {
        if regex.is_match(&result) {
            result = regex.replace_all(&result, *replacement).into_owned();
        }
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Whether `input` contains anything [`sanitize`] would redact.
#[must_use]
pub fn contains_sensitive(input: &str) -> bool {
    let (prefix, _) = truncate_to_char_boundary(input, max_sanitize_bytes());
    patterns().iter().any(|(regex, _)| regex.is_match(prefix))
}

/// `MakeWriter` wrapper that sanitizes each formatted log line before it
/// reaches the sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let text = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&text).as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter that never emits a newline must not grow the buffer forever.
        if self.buffer.len() > max_sanitize_bytes().saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_redacts_attribute_assignments() {
        let out = sanitize("submitted age=71 bmi: 26.0 CRP = 9.5 pa=2");
        assert_eq!(
            out,
            "submitted age=[REDACTED] bmi: [REDACTED] CRP = [REDACTED] pa=[REDACTED]"
        );
    }

    #[test]
    fn test_redacts_display_names() {
        let out = sanitize("History of falls = 1, HGB: 150");
        assert!(!out.contains("= 1"));
        assert!(!out.contains("150"));
    }

    #[test]
    fn test_leaves_probabilities_alone() {
        let line = "assessment complete probability=0.41 risk_factors=2";
        assert_eq!(sanitize(line), line);
        assert!(!contains_sensitive(line));
    }

    #[test]
    fn test_redacts_identifiers() {
        let out = sanitize("patient MRN:1234567 contact nurse@clinic.org");
        assert!(out.contains("[REDACTED-MRN]"));
        assert!(out.contains("[REDACTED-EMAIL]"));
        assert!(contains_sensitive("MRN 99887766"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let out = sanitize_with_limit("age=71 and a long tail of text", 8);
        assert!(out.ends_with("[TRUNCATED]"));
        assert!(!out.contains("71"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut sink);
            writer.write_all(b"first age=").expect("Should write");
            writer
                .write_all(b"80\nsecond line\n")
                .expect("Should write");
            writer.flush().expect("Should flush");
        }
        let text = String::from_utf8(sink).expect("Should be utf8");
        assert_eq!(text, "first age=[REDACTED]\nsecond line\n");
    }
}
