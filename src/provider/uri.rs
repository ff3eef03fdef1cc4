use std::path::{Path, PathBuf};

/// Converts an absolute path into a `file://` URI, percent-encoding every
/// byte outside the unreserved set and `/`.
pub fn path_to_uri(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut uri = String::from("file://");
    if !raw.starts_with('/') {
        uri.push('/');
    }
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                uri.push(byte as char)
            }
            b'\\' => uri.push('/'),
            _ => uri.push_str(&format!("%{:02X}", byte)),
        }
    }
    uri
}

/// Converts a `file://` URI back into a path. Returns `None` for other
/// schemes and malformed escapes.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    // Drop an authority component such as `localhost`.
    let rest = &rest[rest.find('/')?..];

    let bytes = rest.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = rest.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(decoded).ok().map(PathBuf::from)
}

/// Converts a URI into a file id relative to `root`, using `/` separators.
///
/// Returns `None` for locations outside the project.
pub fn uri_to_file_id(uri: &str, root: &Path) -> Option<String> {
    let path = uri_to_path(uri)?;
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_to_uri_escapes() {
        assert_eq!(
            path_to_uri(Path::new("/home/me/my proj/a.py")),
            "file:///home/me/my%20proj/a.py"
        );
    }

    #[test]
    fn test_uri_round_trip() {
        let path = Path::new("/tmp/ünï code/b#c.py");
        assert_eq!(uri_to_path(&path_to_uri(path)).unwrap(), path);
    }

    #[test]
    fn test_uri_to_path_accepts_lowercase_escapes_and_authority() {
        assert_eq!(
            uri_to_path("file://localhost/a%2fb").unwrap(),
            PathBuf::from("/a/b")
        );
        assert!(uri_to_path("https://example.com/a").is_none());
        assert!(uri_to_path("file:///a%zz").is_none());
    }

    #[test]
    fn test_uri_to_file_id() {
        let root = Path::new("/work/proj");
        assert_eq!(
            uri_to_file_id("file:///work/proj/pkg/a.py", root).as_deref(),
            Some("pkg/a.py")
        );
        assert_eq!(uri_to_file_id("file:///usr/lib/x.py", root), None);
    }
}
