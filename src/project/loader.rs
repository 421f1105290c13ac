//! Reading input files from disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Extension of Weave source files.
pub const EXTENSION: &str = "wv";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot list '{}': {source}", .path.display())]
    Walk { path: PathBuf, source: walkdir::Error },
}

/// Expand directory arguments into the source files below them.
///
/// Files named directly are kept as given, even without the `.wv`
/// extension. Each directory contributes its `.wv` files sorted by path.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, LoadError> {
    let mut paths = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).follow_links(true) {
            let entry = entry.map_err(|source| LoadError::Walk {
                path: input.clone(),
                source,
            })?;

            if entry.file_type().is_file() && is_source(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        paths.extend(found);
    }

    Ok(paths)
}

fn is_source(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some(EXTENSION)
}

/// Read a file and normalize it for the lexer.
///
/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn load(path: &Path) -> Result<String, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_owned(),
        source,
    })?;
    Ok(normalize(&String::from_utf8_lossy(&bytes)))
}

/// Turn CRLF line endings into LF and tabs into single spaces.
pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\t', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("a\r\nb", "a\nb")]
    #[case("\tx = 1", " x = 1")]
    #[case("a\r\n\t\tb\r\n", "a\n  b\n")]
    #[case("plain", "plain")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn test_load_normalizes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.wv");
        fs::write(&path, "func main() {\r\n\treturn 0\r\n}").unwrap();

        assert_eq!(load(&path).unwrap(), "func main() {\n return 0\n}");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let error = load(&dir.path().join("absent.wv")).unwrap_err();
        assert!(matches!(error, LoadError::Read { .. }));
        assert!(error.to_string().starts_with("cannot read"));
    }

    #[test]
    fn test_expand_directory_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.wv"), "").unwrap();
        fs::write(dir.path().join("a.wv"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("nested").join("c.wv"), "").unwrap();

        let single = dir.path().join("notes.txt");
        let paths = expand_inputs(&[single.clone(), dir.path().to_owned()]).unwrap();

        assert_eq!(
            paths,
            vec![
                single,
                dir.path().join("a.wv"),
                dir.path().join("b.wv"),
                dir.path().join("nested").join("c.wv"),
            ]
        );
    }
}
