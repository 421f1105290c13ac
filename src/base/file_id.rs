//! Numbering of the input files of a compilation.

use std::fmt;

/// Position of a source file in the input list.
///
/// The loader numbers files in the order they were named on the command
/// line, directories expanded in path order. A smaller id is an earlier
/// input, which is what merge precedence and diagnostic order follow. Paths
/// and text live in [`FileSet`](crate::project::FileSet).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct FileId(u32);

impl FileId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Zero-based position in the input list.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::FileSet;

    #[test]
    fn test_ids_follow_input_order() {
        let files = FileSet::from_paths(["b.wv", "a.wv", "c.wv"]);
        let ids = files.files();

        assert_eq!(ids.iter().map(|id| id.index()).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(ids[0] < ids[1]);
        assert_eq!(files.display(ids[0]), "b.wv");
    }

    #[test]
    fn test_unknown_file_displays_its_number() {
        let files = FileSet::new();
        assert_eq!(format!("{}", FileId::new(3)), "file#3");
        assert_eq!(files.display(FileId::new(3)), "file#3");
    }
}
