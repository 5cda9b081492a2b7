//! Case-insensitive note lookup over a folder snapshot

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use super::models::{normalize_key, NoteId, NoteRecord};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Note folder not found: {0}")]
    FolderNotFound(PathBuf),

    #[error("No note named '{0}'")]
    NotFound(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ResolveError>;

/// Which files count as notes when the folder is scanned
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Accepted extensions, compared case-insensitively and without the dot
    pub extensions: Vec<String>,
    /// Descend into sub-folders
    pub recursive: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "markdown".to_string()],
            recursive: false,
        }
    }
}

/// Snapshot of a note folder, keyed by case-folded file stem.
///
/// The folder is listed once when the index is built. Entries are visited in
/// file-name order, so when two files differ only by case the one that sorts
/// first wins.
pub struct NoteIndex {
    folder: PathBuf,
    extensions: Vec<String>,
    entries: HashMap<String, PathBuf>,
}

impl NoteIndex {
    /// List `folder` and build the lookup table
    pub fn build(folder: &Path, options: &IndexOptions) -> Result<Self> {
        if !folder.is_dir() {
            return Err(ResolveError::FolderNotFound(folder.to_path_buf()));
        }

        let extensions: Vec<String> = options
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();

        let max_depth = if options.recursive { usize::MAX } else { 1 };
        let mut entries: HashMap<String, PathBuf> = HashMap::new();

        let walker = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase());
            if !extension.map(|e| extensions.contains(&e)).unwrap_or(false) {
                continue;
            }

            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };

            let key = normalize_key(&stem);
            if let Some(existing) = entries.get(&key) {
                log::warn!(
                    "Notes '{}' and '{}' differ only by case; using the first",
                    existing.display(),
                    path.display()
                );
                continue;
            }
            entries.insert(key, path.to_path_buf());
        }

        log::debug!("Indexed {} notes in {}", entries.len(), folder.display());

        Ok(Self {
            folder: folder.to_path_buf(),
            extensions,
            entries,
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the file for a note name.
    ///
    /// `folder/Note` resolves by its last segment, and a trailing note
    /// extension (`Note.md`) is ignored.
    pub fn locate(&self, id: &NoteId) -> Option<&Path> {
        let name = id.as_str().rsplit('/').next().unwrap_or_default();
        let key = normalize_key(name);

        if let Some(path) = self.entries.get(&key) {
            return Some(path.as_path());
        }

        let (stem, extension) = key.rsplit_once('.')?;
        if self.extensions.iter().any(|e| e == extension) {
            return self.entries.get(stem).map(PathBuf::as_path);
        }

        None
    }

    /// Key naming the note `id` resolves to, so every spelling of a link
    /// to one file (`Topic`, `topic.md`, `dir/Topic`) shares a key.
    /// Names matching no file key on themselves.
    pub fn identity(&self, id: &NoteId) -> String {
        match self.locate(id) {
            Some(path) => format!("path:{}", path.display()),
            None => format!("name:{}", id.key()),
        }
    }

    /// Resolve a note name and read the file
    pub fn resolve(&self, id: &NoteId) -> Result<NoteRecord> {
        let path = self
            .locate(id)
            .ok_or_else(|| ResolveError::NotFound(id.to_string()))?;

        let content = fs::read_to_string(path).map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let title = path
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| id.to_string());

        Ok(NoteRecord {
            id: NoteId::new(title),
            path: path.to_path_buf(),
            content,
        })
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir, write};
    use tempfile::TempDir;

    fn index(tmp: &TempDir) -> NoteIndex {
        NoteIndex::build(tmp.path(), &IndexOptions::default()).unwrap()
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path().join("My Note.md"), "content").unwrap();

        let index = index(&tmp);
        let lower = index.resolve(&NoteId::from("my note")).unwrap();
        let exact = index.resolve(&NoteId::from("My Note")).unwrap();

        assert_eq!(lower.id.as_str(), "My Note");
        assert_eq!(lower.path, exact.path);
        assert_eq!(lower.content, "content");
    }

    #[test]
    fn test_resolve_not_found() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path().join("Present.md"), "").unwrap();

        let err = index(&tmp).resolve(&NoteId::from("Absent")).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(name) if name == "Absent"));
    }

    #[test]
    fn test_index_filters_extensions_and_hidden() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path().join("a.md"), "").unwrap();
        write(tmp.path().join("b.MARKDOWN"), "").unwrap();
        write(tmp.path().join("c.txt"), "").unwrap();
        write(tmp.path().join(".hidden.md"), "").unwrap();
        create_dir(tmp.path().join(".obsidian")).unwrap();
        write(tmp.path().join(".obsidian").join("d.md"), "").unwrap();

        let index = index(&tmp);
        assert_eq!(index.len(), 2);
        assert!(index.locate(&NoteId::from("a")).is_some());
        assert!(index.locate(&NoteId::from("B")).is_some());
        assert!(index.locate(&NoteId::from("c")).is_none());
        assert!(index.locate(&NoteId::from("d")).is_none());
    }

    #[test]
    fn test_index_recursive_option() {
        let tmp = TempDir::new().unwrap();
        create_dir(tmp.path().join("sub")).unwrap();
        write(tmp.path().join("sub").join("Deep.md"), "deep").unwrap();

        assert!(index(&tmp).locate(&NoteId::from("Deep")).is_none());

        let options = IndexOptions {
            recursive: true,
            ..IndexOptions::default()
        };
        let index = NoteIndex::build(tmp.path(), &options).unwrap();
        assert!(index.locate(&NoteId::from("deep")).is_some());
        assert!(index.locate(&NoteId::from("sub/Deep")).is_some());
    }

    #[test]
    fn test_locate_strips_note_extension() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path().join("Topic.md"), "").unwrap();

        let index = index(&tmp);
        assert!(index.locate(&NoteId::from("Topic.md")).is_some());
        assert!(index.locate(&NoteId::from("topic.MD")).is_some());
        assert!(index.locate(&NoteId::from("Topic.txt")).is_none());
    }

    #[test]
    fn test_identity_is_shared_by_link_spellings() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path().join("Topic.md"), "").unwrap();

        let index = index(&tmp);
        let key = index.identity(&NoteId::from("Topic"));
        assert_eq!(index.identity(&NoteId::from("topic.md")), key);
        assert_eq!(index.identity(&NoteId::from("dir/TOPIC")), key);
        assert_ne!(index.identity(&NoteId::from("Missing")), key);
        assert_eq!(
            index.identity(&NoteId::from("Missing")),
            index.identity(&NoteId::from("missing"))
        );
    }

    #[test]
    fn test_missing_folder() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let err = NoteIndex::build(&missing, &IndexOptions::default()).err().unwrap();
        assert!(matches!(err, ResolveError::FolderNotFound(_)));
    }

    #[test]
    fn test_unreadable_note_is_io_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path().join("Binary.md"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let err = index(&tmp).resolve(&NoteId::from("Binary")).unwrap_err();
        assert!(matches!(err, ResolveError::Io { .. }));
    }
}
