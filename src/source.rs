use std::collections::HashMap;
use std::path::PathBuf;

/// Lazily loaded source lines, one read per file.
///
/// Only used to inspect the declaration line of a symbol, so a file that
/// cannot be read is remembered as missing rather than treated as an error.
#[derive(Debug)]
pub struct LineCache {
    root: PathBuf,
    files: HashMap<String, Option<Vec<String>>>,
}

impl LineCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: HashMap::new(),
        }
    }

    /// Returns the text of a zero-based line of a project file.
    ///
    /// Invalid UTF-8 is replaced, matching the text the server is given.
    pub async fn line(&mut self, file: &str, line: u32) -> Option<&str> {
        if !self.files.contains_key(file) {
            let lines = match tokio::fs::read(self.root.join(file)).await {
                Ok(bytes) => Some(
                    String::from_utf8_lossy(&bytes)
                        .lines()
                        .map(str::to_string)
                        .collect(),
                ),
                Err(e) => {
                    tracing::debug!(file = %file, error = %e, "source not readable");
                    None
                }
            };
            self.files.insert(file.to_string(), lines);
        }
        self.files
            .get(file)?
            .as_ref()?
            .get(line as usize)
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_lines_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.py"), "import os\nclass Foo:\n    pass\n").unwrap();
        let mut cache = LineCache::new(dir.path());

        assert_eq!(cache.line("a.py", 1).await, Some("class Foo:"));
        std::fs::remove_file(dir.path().join("a.py")).unwrap();
        assert_eq!(cache.line("a.py", 0).await, Some("import os"));
        assert_eq!(cache.line("a.py", 10).await, None);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut cache = LineCache::new(dir.path());
        assert_eq!(cache.line("nope.py", 0).await, None);
    }

    #[tokio::test]
    async fn test_non_utf8_lines_are_replaced() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("x.py"), b"# caf\xe9\ndef foo():\n").unwrap();
        let mut cache = LineCache::new(dir.path());
        assert_eq!(cache.line("x.py", 1).await, Some("def foo():"));
        assert_eq!(cache.line("x.py", 0).await, Some("# caf\u{FFFD}"));
    }
}
