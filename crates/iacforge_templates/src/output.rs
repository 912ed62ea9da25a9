//! Post-formatting and persistence of rendered output.

use std::fs;
use std::io;
use std::path::Path;

use iacforge_model::TemplateFormat;

/// Canonicalises rendered text before it is written.
pub trait OutputFormatter: Send + Sync {
    /// Return the formatted text. Implementations return the input unchanged
    /// when it cannot be formatted.
    fn format(&self, format: TemplateFormat, content: &str) -> String;
}

/// Formatter that leaves output untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFormatter;

impl OutputFormatter for PassthroughFormatter {
    fn format(&self, _format: TemplateFormat, content: &str) -> String {
        content.to_string()
    }
}

/// Persists rendered output.
#[cfg_attr(test, mockall::automock)]
pub trait OutputWriter: Send + Sync {
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;
}

/// Writes to the local file system, creating parent directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsWriter;

impl OutputWriter for FsWriter {
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fs_writer_creates_parents() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested/out/main.tf");

        FsWriter.write(&path, b"content").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "content");
    }
}
