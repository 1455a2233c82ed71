use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::diagnostic::Location;
use crate::pattern::Span;

/// A pattern-definition file held in memory.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let content = String::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
        Ok(Self::from_string(path.to_path_buf(), content))
    }

    pub fn from_string(path: PathBuf, content: String) -> Self {
        let line_starts = compute_line_starts(content.as_bytes());
        Self {
            path,
            content,
            line_starts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }

    /// Convert a byte offset into a (1-indexed line, 0-indexed column) pair.
    /// Column counts characters, not bytes.
    pub fn offset_to_line_col(&self, byte_offset: usize) -> (usize, usize) {
        let byte_offset = byte_offset.min(self.content.len());
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_bytes = &self.content.as_bytes()[self.line_starts[line_idx]..byte_offset];
        // Non-continuation bytes are character starts.
        let col = line_bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count();
        (line_idx + 1, col)
    }

    pub fn location(&self, span: Span) -> Location {
        let (line, column) = self.offset_to_line_col(span.start);
        Location { line, column }
    }

    /// The full line containing `byte_offset`, without its newline.
    pub fn line_text(&self, byte_offset: usize) -> &str {
        let (line, _) = self.offset_to_line_col(byte_offset);
        let start = self.line_starts[line - 1];
        let end = self.content[start..]
            .find('\n')
            .map_or(self.content.len(), |i| start + i);
        &self.content[start..end]
    }
}

fn compute_line_starts(content: &[u8]) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, &byte) in content.iter().enumerate() {
        if byte == b'\n' && i + 1 < content.len() {
            starts.push(i + 1);
        }
    }
    starts
}
