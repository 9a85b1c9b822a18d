use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

use crate::editing::Document;
use crate::io::{GatewayError, NoteId, PersistenceGateway, decode};

const NOTE_EXTENSION: &str = "json";

/// Gateway storing each note as `<note-id>.json` under a notes directory
#[derive(Debug, Clone)]
pub struct FileGateway {
    notes_root: PathBuf,
}

impl FileGateway {
    /// Use an existing notes directory
    pub fn new(notes_root: impl Into<PathBuf>) -> Result<Self, GatewayError> {
        let notes_root = notes_root.into();
        validate_notes_dir(&notes_root)?;
        Ok(Self { notes_root })
    }

    pub fn notes_root(&self) -> &Path {
        &self.notes_root
    }

    /// Path of a note relative to the notes root
    pub fn relative_path(note_id: &NoteId) -> RelativePathBuf {
        RelativePath::new(note_id.as_str()).with_extension(NOTE_EXTENSION)
    }

    /// Notes present in the directory, sorted
    pub fn list_notes(&self) -> Result<Vec<NoteId>, GatewayError> {
        let mut notes = Vec::new();
        for entry in fs::read_dir(&self.notes_root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(ext) = path.extension()
                && ext == NOTE_EXTENSION
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && let Ok(note_id) = NoteId::parse(stem)
            {
                notes.push(note_id);
            }
        }
        notes.sort();
        Ok(notes)
    }

    fn absolute_path(&self, note_id: &NoteId) -> PathBuf {
        Self::relative_path(note_id).to_path(&self.notes_root)
    }
}

impl PersistenceGateway for FileGateway {
    fn load(&self, note_id: &NoteId) -> Result<Document, GatewayError> {
        let path = self.absolute_path(note_id);
        if !path.exists() {
            return Err(GatewayError::NotFound(note_id.clone()));
        }
        let raw = fs::read_to_string(&path)?;
        decode(note_id, &raw)
    }

    /// Write to a sibling temp file then rename over the note, so a crash
    /// mid-write never leaves a half-written note behind.
    fn save(&mut self, note_id: &NoteId, document: &Document) -> Result<(), GatewayError> {
        let path = self.absolute_path(note_id);
        let json = document.to_json()?;
        let tmp = path.with_extension(format!("{NOTE_EXTENSION}.tmp"));
        fs::write(&tmp, json)?;
        if let Err(err) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }
}

pub fn validate_notes_dir(path: &Path) -> Result<(), GatewayError> {
    if !path.is_dir() {
        return Err(GatewayError::InvalidNotesDir(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::BlockType;
    use crate::tests::{create_test_file, create_test_notes_dir};
    use pretty_assertions::assert_eq;

    fn note(raw: &str) -> NoteId {
        NoteId::parse(raw).unwrap()
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let notes_dir = create_test_notes_dir();
        let mut gateway = FileGateway::new(notes_dir.path()).unwrap();
        let mut doc = Document::new();
        doc.insert(Document::create_block(BlockType::List, Some("a\nb")), 0);

        gateway.save(&note("shopping"), &doc).unwrap();

        assert!(notes_dir.path().join("shopping.json").exists());
        assert_eq!(gateway.load(&note("shopping")).unwrap(), doc);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let notes_dir = create_test_notes_dir();
        let mut gateway = FileGateway::new(notes_dir.path()).unwrap();
        gateway.save(&note("n"), &Document::new()).unwrap();

        let names: Vec<_> = fs::read_dir(notes_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("n.json")]);
    }

    #[test]
    fn test_save_overwrites_existing() {
        let notes_dir = create_test_notes_dir();
        let mut gateway = FileGateway::new(notes_dir.path()).unwrap();
        gateway.save(&note("n"), &Document::new()).unwrap();
        gateway
            .save(&note("n"), &Document::with_default_block())
            .unwrap();
        assert_eq!(gateway.load(&note("n")).unwrap().len(), 1);
    }

    #[test]
    fn test_load_not_found() {
        let notes_dir = create_test_notes_dir();
        let gateway = FileGateway::new(notes_dir.path()).unwrap();
        assert!(matches!(
            gateway.load(&note("absent")),
            Err(GatewayError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_corrupt_file() {
        let notes_dir = create_test_notes_dir();
        create_test_file(&notes_dir, "bad.json", "{ truncated");
        let gateway = FileGateway::new(notes_dir.path()).unwrap();
        assert!(matches!(
            gateway.load(&note("bad")),
            Err(GatewayError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_list_notes_ignores_other_files() {
        let notes_dir = create_test_notes_dir();
        create_test_file(&notes_dir, "b.json", "{}");
        create_test_file(&notes_dir, "a.json", "{}");
        create_test_file(&notes_dir, "readme.md", "# hi");
        create_test_file(&notes_dir, "bad name.json", "{}");
        fs::create_dir(notes_dir.path().join("dir.json")).unwrap();

        let gateway = FileGateway::new(notes_dir.path()).unwrap();

        assert_eq!(gateway.list_notes().unwrap(), vec![note("a"), note("b")]);
    }

    #[test]
    fn test_invalid_notes_directory() {
        let result = FileGateway::new("/this/path/does/not/exist");
        assert!(matches!(result, Err(GatewayError::InvalidNotesDir(_))));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(FileGateway::relative_path(&note("inbox")).as_str(), "inbox.json");
    }
}
