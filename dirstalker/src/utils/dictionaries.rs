//! Resolution of dictionary names to wordlist files.
//!
//! Dictionaries live in a single directory as `<name>.txt`. Naming a
//! dictionary that does not exist is not an error here: opening it fails
//! later and only that dictionary is skipped.
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::Error;

/// A named wordlist file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    pub name: String,
    pub path: PathBuf,
}

/// The ordered set of dictionaries for one run.
#[derive(Debug, Clone, Default)]
pub struct DictionarySet {
    dictionaries: Vec<Dictionary>,
}

impl DictionarySet {
    /// Maps each of `names` to `<dir>/<name>.txt`, keeping the given order.
    /// With no names, every `*.txt` file in `dir` is used, sorted by name.
    ///
    /// # Errors
    /// [`Error::DictionaryDir`] when `dir` cannot be read.
    pub fn resolve(dir: impl AsRef<Path>, names: &[String]) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let read_dir = |source: io::Error| Error::DictionaryDir {
            path: dir.to_path_buf(),
            source,
        };

        if !fs::metadata(dir).map_err(read_dir)?.is_dir() {
            return Err(read_dir(io::Error::new(
                io::ErrorKind::NotADirectory,
                "not a directory",
            )));
        }

        if !names.is_empty() {
            let dictionaries = names
                .iter()
                .map(|name| Dictionary {
                    name: name.clone(),
                    path: dir.join(format!("{name}.txt")),
                })
                .collect();
            return Ok(Self { dictionaries });
        }

        let mut dictionaries = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_dir)? {
            let path = entry.map_err(read_dir)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    dictionaries.push(Dictionary {
                        name: stem.to_string(),
                        path: path.clone(),
                    });
                }
            }
        }
        dictionaries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self { dictionaries })
    }

    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let dictionaries = paths
            .into_iter()
            .map(|path| Dictionary {
                name: path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path,
            })
            .collect();
        Self { dictionaries }
    }

    pub fn len(&self) -> usize {
        self.dictionaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dictionary> {
        self.dictionaries.iter()
    }
}

impl<'a> IntoIterator for &'a DictionarySet {
    type Item = &'a Dictionary;
    type IntoIter = std::slice::Iter<'a, Dictionary>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_named_dictionaries_keeps_order() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let set = DictionarySet::resolve(dir, &["web".to_string(), "api".to_string()]).unwrap();

        let names: Vec<_> = set.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["web", "api"]);
        assert_eq!(set.iter().next().unwrap().path, dir.join("web.txt"));
    }

    #[test]
    fn test_resolve_discovers_txt_files_sorted() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("zeta.txt"), "a\n").unwrap();
        fs::write(dir.join("alpha.txt"), "b\n").unwrap();
        fs::write(dir.join("notes.md"), "c\n").unwrap();

        let set = DictionarySet::resolve(dir, &[]).unwrap();
        let names: Vec<_> = set.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn test_resolve_missing_directory_is_fatal() {
        let tmp = tempdir().unwrap();
        let err = DictionarySet::resolve(tmp.path().join("missing"), &[]).unwrap_err();
        assert!(matches!(err, Error::DictionaryDir { .. }));
    }

    #[test]
    fn test_resolve_file_instead_of_directory_is_fatal() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("common.txt");
        fs::write(&file, "admin\n").unwrap();

        let err = DictionarySet::resolve(&file, &[]).unwrap_err();
        assert!(matches!(err, Error::DictionaryDir { .. }));
    }
}
