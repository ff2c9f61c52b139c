// Startup content loader
//
// Scans the public directory once and pulls every qualifying HTML file into
// memory. The policy is to refuse to start rather than serve unsafe or empty
// content, so every failure here is fatal to the process.

use hyper::body::Bytes;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::ContentTable;

/// Fatal content-loading failures
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("content directory '{dir}' is not readable: {source}")]
    DirUnreadable {
        dir: String,
        #[source]
        source: io::Error,
    },
    #[error("unsafe filename '{name}' in content directory")]
    UnsafeName { name: String },
    #[error("'{path}' resolves outside the content directory")]
    OutsideBase { path: PathBuf },
    #[error("failed to read '{path}': {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no HTML files found in content directory '{dir}'")]
    Empty { dir: String },
}

/// Scan `dir` and build the content table.
///
/// Only direct children are considered. A `.html` filename must be a single
/// safe component; a dangerous name anywhere in the directory aborts the scan
/// rather than being skipped.
pub fn load_content(dir: &str) -> Result<ContentTable, LoadError> {
    let base = Path::new(dir);
    let base_canonical = base
        .canonicalize()
        .map_err(|source| LoadError::DirUnreadable {
            dir: dir.to_string(),
            source,
        })?;

    let read_dir = fs::read_dir(base).map_err(|source| LoadError::DirUnreadable {
        dir: dir.to_string(),
        source,
    })?;

    let mut entries = HashMap::new();
    for entry in read_dir {
        let entry = entry.map_err(|source| LoadError::DirUnreadable {
            dir: dir.to_string(),
            source,
        })?;

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            return Err(LoadError::UnsafeName {
                name: file_name.to_string_lossy().into_owned(),
            });
        };

        // Path separators cannot appear in a directory entry name, but the
        // check is part of the loader's contract, as is refusing `..`.
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(LoadError::UnsafeName {
                name: name.to_string(),
            });
        }

        let path = entry.path();
        if path.is_dir() {
            continue;
        }

        let Some(stem) = name.strip_suffix(".html") else {
            continue; // non-HTML files are not content
        };
        if stem.is_empty() || !is_safe_name(name) {
            return Err(LoadError::UnsafeName {
                name: name.to_string(),
            });
        }

        // A symlink may carry a safe name and still point elsewhere.
        let canonical = path
            .canonicalize()
            .map_err(|source| LoadError::FileUnreadable {
                path: path.clone(),
                source,
            })?;
        if !canonical.starts_with(&base_canonical) {
            return Err(LoadError::OutsideBase { path: canonical });
        }

        let contents = fs::read(&path).map_err(|source| LoadError::FileUnreadable {
            path: path.clone(),
            source,
        })?;
        entries.insert(stem.to_string(), Bytes::from(contents));
    }

    if entries.is_empty() {
        return Err(LoadError::Empty {
            dir: dir.to_string(),
        });
    }

    Ok(ContentTable { entries })
}

/// Filename safety: ASCII alphanumerics plus `_`, `.`, `-` only
fn is_safe_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_safe_name_pattern() {
        assert!(is_safe_name("index.html"));
        assert!(is_safe_name("about-us_v2.html"));
        assert!(is_safe_name("page.1.html"));
        assert!(!is_safe_name("page one.html"));
        assert!(!is_safe_name("page/one.html"));
        assert!(!is_safe_name("pägé.html"));
    }

    #[test]
    fn test_load_qualifying_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(dir.path().join("about.html"), "<h1>about</h1>").unwrap();
        fs::write(dir.path().join("notes.txt"), "skipped").unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();

        let table = load_content(dir.path().to_str().unwrap()).expect("load");
        assert_eq!(table.len(), 2);
        assert_eq!(table.route_names(), vec!["about", "index"]);
        assert_eq!(table.get("index").unwrap().as_ref(), b"<h1>home</h1>");
        assert!(table.get("notes").is_none());
    }

    #[test]
    fn test_dotdot_name_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("ok.html"), "<p>ok</p>").unwrap();
        fs::write(dir.path().join("evil..html"), "<p>evil</p>").unwrap();

        let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LoadError::UnsafeName { name } if name == "evil..html"));
    }

    #[test]
    fn test_unsafe_char_in_html_name_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("bad name.html"), "<p>bad</p>").unwrap();

        let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LoadError::UnsafeName { .. }));
    }

    #[test]
    fn test_empty_directory_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("readme.md"), "no html here").unwrap();

        let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let err = load_content("/no/such/content/dir").unwrap_err();
        assert!(matches!(err, LoadError::DirUnreadable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_is_fatal() {
        let outside = tempfile::tempdir().expect("tempdir");
        fs::write(outside.path().join("secret.html"), "<p>secret</p>").unwrap();

        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("ok.html"), "<p>ok</p>").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.html"),
            dir.path().join("leak.html"),
        )
        .unwrap();

        let err = load_content(dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, LoadError::OutsideBase { .. }));
    }
}
