//! File access used by the scanner.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Lists and reads migration files.
pub trait SourceFiles {
    /// List the regular files below `path`, sorted.
    fn list_files(&self, path: &Path, recursive: bool) -> io::Result<Vec<PathBuf>>;

    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

impl<T: SourceFiles + ?Sized> SourceFiles for &T {
    fn list_files(&self, path: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
        (**self).list_files(path, recursive)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }
}

/// [`SourceFiles`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl SourceFiles for LocalFiles {
    fn list_files(&self, path: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", path.display()),
            ));
        }

        let mut walker = WalkDir::new(path).min_depth(1).follow_links(true);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
