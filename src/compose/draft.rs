use std::path::Path;

use crate::catalog::{Record, RecordFields, RecordId};
use crate::search::SearchCandidate;

/// What a draft becomes when committed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DraftTarget {
    New,
    Existing(RecordId),
}

/// The draft field that receives typed text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DraftField {
    #[default]
    Lyrics,
    Story,
    Photo,
}

impl DraftField {
    pub fn next(self) -> Self {
        match self {
            Self::Lyrics => Self::Story,
            Self::Story => Self::Photo,
            Self::Photo => Self::Lyrics,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Lyrics => "lyrics",
            Self::Story => "story",
            Self::Photo => "photo",
        }
    }
}

/// An uncommitted record being composed or edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub target: DraftTarget,
    pub title: String,
    pub artist: String,
    pub album_art: String,
    pub lyrics: String,
    pub story: String,
    pub photo: Option<Vec<u8>>,
    /// Path typed into the photo field; loaded with `load_photo`.
    pub photo_path: String,
    pub focus: DraftField,
}

impl Draft {
    /// A fresh draft for a picked search candidate, with nothing personal yet.
    pub fn from_candidate(candidate: &SearchCandidate) -> Self {
        Self {
            target: DraftTarget::New,
            title: candidate.title.clone(),
            artist: candidate.artist.clone(),
            album_art: candidate.album_art_url.clone(),
            lyrics: String::new(),
            story: String::new(),
            photo: None,
            photo_path: String::new(),
            focus: DraftField::default(),
        }
    }

    /// A draft pre-filled from an existing record.
    pub fn from_record(record: &Record) -> Self {
        Self {
            target: DraftTarget::Existing(record.id),
            title: record.title.clone(),
            artist: record.artist.clone(),
            album_art: record.album_art.clone(),
            lyrics: record.lyrics.clone().unwrap_or_default(),
            story: record.story.clone().unwrap_or_default(),
            photo: record.photo.clone(),
            photo_path: String::new(),
            focus: DraftField::default(),
        }
    }

    pub fn to_fields(&self) -> RecordFields {
        RecordFields {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album_art: self.album_art.clone(),
            lyrics: Some(self.lyrics.clone()),
            story: Some(self.story.clone()),
            photo: self.photo.clone(),
        }
        .normalized()
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    fn focused_text(&mut self) -> &mut String {
        match self.focus {
            DraftField::Lyrics => &mut self.lyrics,
            DraftField::Story => &mut self.story,
            DraftField::Photo => &mut self.photo_path,
        }
    }

    pub fn push_char(&mut self, c: char) {
        // Paths are single-line.
        if c == '\n' && self.focus == DraftField::Photo {
            return;
        }
        self.focused_text().push(c);
    }

    pub fn pop_char(&mut self) {
        self.focused_text().pop();
    }

    /// Read the image at `photo_path` into the draft.
    pub fn load_photo(&mut self) -> std::io::Result<usize> {
        let path = self.photo_path.trim();
        let bytes = std::fs::read(Path::new(path))?;
        let len = bytes.len();
        self.photo = Some(bytes);
        Ok(len)
    }

    pub fn clear_photo(&mut self) {
        self.photo = None;
        self.photo_path.clear();
    }
}
