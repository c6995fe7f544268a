//! Best-effort capability discovery from permission callback source text.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScanError};
use crate::registry::{CallableTarget, SourceSpan};

/// `current_user_can( 'cap' ...`
static CURRENT_USER_CAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"current_user_can\s*\(\s*['"]([^'"]+)['"]"#).unwrap());

/// `user_can( $user, 'cap' ...`
static USER_CAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"user_can\s*\([^,]+,\s*['"]([^'"]+)['"]"#).unwrap());

/// Finds the capability names a callable checks.
pub trait CapabilitySource: Send + Sync {
    /// Capability names tested by the routine, deduplicated in discovery
    /// order. An empty result means nothing recognizable was found.
    fn scan(&self, target: &CallableTarget, span: Option<&SourceSpan>) -> Result<Vec<String>>;
}

/// Never finds anything. Disables source scanning.
pub struct NoopSource;

impl CapabilitySource for NoopSource {
    fn scan(&self, _target: &CallableTarget, _span: Option<&SourceSpan>) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Reads the routine's line range from disk and matches capability-check
/// call sites with string-literal capability names.
#[derive(Debug, Default)]
pub struct SourceFileScanner {
    base_dir: Option<PathBuf>,
}

impl SourceFileScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative span paths against `dir`.
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn resolve(&self, span: &SourceSpan) -> PathBuf {
        match &self.base_dir {
            Some(base) if span.file.is_relative() => base.join(&span.file),
            _ => span.file.clone(),
        }
    }
}

impl CapabilitySource for SourceFileScanner {
    fn scan(&self, target: &CallableTarget, span: Option<&SourceSpan>) -> Result<Vec<String>> {
        let source_error = |message: String| ScanError::Source {
            callable: target.to_string(),
            message,
        };

        let span = span.ok_or_else(|| source_error("no source location".into()))?;
        if span.start_line == 0 || span.end_line < span.start_line {
            return Err(source_error(format!(
                "invalid line range {}..{}",
                span.start_line, span.end_line
            )));
        }

        let path = self.resolve(span);
        let bytes = std::fs::read(&path)
            .map_err(|e| source_error(format!("{}: {e}", path.display())))?;
        let content = String::from_utf8_lossy(&bytes);

        let body: String = content
            .lines()
            .skip(span.start_line - 1)
            .take(span.end_line - span.start_line + 1)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(capabilities_in(&body))
    }
}

/// Capability names passed as string literals to `current_user_can` or
/// `user_can`. First-pattern matches come first; duplicates keep their first
/// position.
pub fn capabilities_in(body: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    let captures = CURRENT_USER_CAN_RE
        .captures_iter(body)
        .chain(USER_CAN_RE.captures_iter(body));
    for cap in captures {
        if let Some(m) = cap.get(1) {
            if !found.iter().any(|c| c == m.as_str()) {
                found.push(m.as_str().to_string());
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn method() -> CallableTarget {
        CallableTarget::Method {
            class: "Acme_Api".into(),
            method: "can".into(),
        }
    }

    #[test]
    fn finds_current_user_can_literals() {
        let body = r#"return current_user_can( 'edit_posts' ) && current_user_can("read");"#;
        assert_eq!(capabilities_in(body), vec!["edit_posts", "read"]);
    }

    #[test]
    fn finds_user_can_literals_after_current_user_can() {
        let body = r#"
            if ( user_can( $user, 'manage_options' ) ) { return true; }
            return current_user_can('edit_posts');
        "#;
        assert_eq!(capabilities_in(body), vec!["edit_posts", "manage_options"]);
    }

    #[test]
    fn deduplicates_keeping_first() {
        let body = "current_user_can('read'); current_user_can('edit_posts'); current_user_can('read');";
        assert_eq!(capabilities_in(body), vec!["read", "edit_posts"]);
    }

    #[test]
    fn ignores_non_literal_arguments() {
        let body = "return current_user_can( $this->capability );";
        assert!(capabilities_in(body).is_empty());
    }

    #[test]
    fn scans_only_the_span_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "<?php").unwrap();
        writeln!(file, "function other() {{ return current_user_can('manage_options'); }}").unwrap();
        writeln!(file, "function check() {{").unwrap();
        writeln!(file, "    return current_user_can('edit_posts');").unwrap();
        writeln!(file, "}}").unwrap();

        let span = SourceSpan {
            file: file.path().to_path_buf(),
            start_line: 3,
            end_line: 5,
        };
        let caps = SourceFileScanner::new().scan(&method(), Some(&span)).unwrap();
        assert_eq!(caps, vec!["edit_posts"]);
    }

    #[test]
    fn tolerates_latin1_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"// r\xe9sum\xe9 check\nreturn current_user_can('edit_pages');\n")
            .unwrap();
        let span = SourceSpan {
            file: file.path().to_path_buf(),
            start_line: 1,
            end_line: 2,
        };
        let caps = SourceFileScanner::new().scan(&method(), Some(&span)).unwrap();
        assert_eq!(caps, vec!["edit_pages"]);
    }

    #[test]
    fn resolves_relative_paths_against_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cb.php"), "current_user_can('read');\n").unwrap();
        let span = SourceSpan {
            file: PathBuf::from("cb.php"),
            start_line: 1,
            end_line: 1,
        };
        let caps = SourceFileScanner::with_base_dir(dir.path())
            .scan(&method(), Some(&span))
            .unwrap();
        assert_eq!(caps, vec!["read"]);
    }

    #[test]
    fn missing_file_is_source_error() {
        let span = SourceSpan {
            file: PathBuf::from("/nonexistent/permscan/cb.php"),
            start_line: 1,
            end_line: 2,
        };
        let err = SourceFileScanner::new().scan(&method(), Some(&span)).unwrap_err();
        assert!(matches!(err, ScanError::Source { .. }));
    }

    #[test]
    fn missing_span_and_bad_range_are_source_errors() {
        let scanner = SourceFileScanner::new();
        assert!(scanner.scan(&method(), None).is_err());

        let span = SourceSpan {
            file: PathBuf::from("x.php"),
            start_line: 9,
            end_line: 3,
        };
        assert!(scanner.scan(&method(), Some(&span)).is_err());
    }

    #[test]
    fn noop_finds_nothing() {
        assert!(NoopSource.scan(&method(), None).unwrap().is_empty());
    }
}
