//! The set of input files of one compilation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::base::FileId;

/// Maps input paths to [`FileId`]s and holds their loaded text.
///
/// Ids are assigned in the order paths are added, so the id order is the
/// input order. Contents are written concurrently by the load stage.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<FileSetInner>,
}

#[derive(Debug, Default)]
struct FileSetInner {
    /// Path → FileId mapping
    path_to_id: IndexMap<PathBuf, FileId>,
    /// FileId → Path mapping (reverse lookup)
    id_to_path: IndexMap<FileId, PathBuf>,
    /// FileId → normalized text
    contents: IndexMap<FileId, Arc<str>>,
    next_id: u32,
}

impl FileSet {
    /// Create a new empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from paths, in order.
    pub fn from_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        let files = Self::new();
        for path in paths {
            files.file_id(path.as_ref());
        }
        files
    }

    /// Get or create a FileId for a path.
    ///
    /// A path added twice keeps its first id.
    pub fn file_id(&self, path: &Path) -> FileId {
        // Fast path: read lock
        {
            let inner = self.inner.read();
            if let Some(&id) = inner.path_to_id.get(path) {
                return id;
            }
        }

        let mut inner = self.inner.write();

        // Double-check
        if let Some(&id) = inner.path_to_id.get(path) {
            return id;
        }

        let id = FileId::new(inner.next_id);
        inner.next_id += 1;
        inner.path_to_id.insert(path.to_owned(), id);
        inner.id_to_path.insert(id, path.to_owned());
        id
    }

    /// Get the path for a FileId.
    pub fn path(&self, file: FileId) -> Option<PathBuf> {
        self.inner.read().id_to_path.get(&file).cloned()
    }

    /// Path of `file` for messages, or its id when unknown.
    pub fn display(&self, file: FileId) -> String {
        match self.path(file) {
            Some(path) => path.display().to_string(),
            None => file.to_string(),
        }
    }

    /// Set the contents of a file.
    pub fn set_contents(&self, file: FileId, contents: impl Into<Arc<str>>) {
        self.inner.write().contents.insert(file, contents.into());
    }

    /// Get the contents of a file.
    pub fn contents(&self, file: FileId) -> Option<Arc<str>> {
        self.inner.read().contents.get(&file).cloned()
    }

    /// Get the number of files.
    pub fn len(&self) -> usize {
        self.inner.read().path_to_id.len()
    }

    /// Check if the file set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All file ids, in input order.
    pub fn files(&self) -> Vec<FileId> {
        self.inner.read().id_to_path.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_set_id_assignment() {
        let files = FileSet::new();

        let id1 = files.file_id(Path::new("/a.wv"));
        let id2 = files.file_id(Path::new("/b.wv"));
        let id3 = files.file_id(Path::new("/a.wv"));

        assert_ne!(id1, id2);
        assert_eq!(id1, id3);
        assert!(id1 < id2);
    }

    #[test]
    fn test_from_paths_keeps_input_order() {
        let files = FileSet::from_paths(["/z.wv", "/a.wv", "/m.wv"]);

        assert_eq!(files.len(), 3);
        assert_eq!(files.files(), vec![FileId::new(0), FileId::new(1), FileId::new(2)]);
        assert_eq!(files.path(FileId::new(0)).as_deref(), Some(Path::new("/z.wv")));
        assert_eq!(files.display(FileId::new(2)), "/m.wv");
    }

    #[test]
    fn test_file_set_contents() {
        let files = FileSet::new();
        let id = files.file_id(Path::new("/test.wv"));

        assert!(files.contents(id).is_none());

        files.set_contents(id, "type Foo {}");

        assert_eq!(files.contents(id).as_deref(), Some("type Foo {}"));
    }
}
