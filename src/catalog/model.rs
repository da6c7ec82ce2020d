use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::error::CatalogError;

/// Stable identity of a record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// One persisted diary entry for a song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub artist: String,
    /// Album art URL or cache key.
    pub album_art: String,
    pub lyrics: Option<String>,
    pub story: Option<String>,
    pub photo: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

impl Record {
    /// Build a stored record from validated `fields`.
    pub(super) fn from_fields(id: RecordId, fields: RecordFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: fields.title,
            artist: fields.artist,
            album_art: fields.album_art,
            lyrics: fields.lyrics,
            story: fields.story,
            photo: fields.photo,
            created_at,
        }
    }

    /// `"<title> - <artist>"`, used for share payloads and headings.
    pub fn title_line(&self) -> String {
        format!("{} - {}", self.title, self.artist)
    }

    /// The editable part of this record.
    pub fn fields(&self) -> RecordFields {
        RecordFields {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album_art: self.album_art.clone(),
            lyrics: self.lyrics.clone(),
            story: self.story.clone(),
            photo: self.photo.clone(),
        }
    }
}

/// The user-editable fields of a record, as submitted by a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFields {
    pub title: String,
    pub artist: String,
    pub album_art: String,
    pub lyrics: Option<String>,
    pub story: Option<String>,
    pub photo: Option<Vec<u8>>,
}

impl RecordFields {
    /// Trim the identifying fields and collapse blank lyrics/story to `None`.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.artist = self.artist.trim().to_string();
        self.lyrics = non_blank(self.lyrics);
        self.story = non_blank(self.story);
        self.photo = self.photo.filter(|p| !p.is_empty());
        self
    }

    /// Reject records without a title or an artist.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::ValidationFailure("title is required".to_string()));
        }
        if self.artist.trim().is_empty() {
            return Err(CatalogError::ValidationFailure("artist is required".to_string()));
        }
        Ok(())
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Change notifications published after a successful mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    Created { id: RecordId, revision: u64 },
    Updated { id: RecordId, revision: u64 },
    Deleted { id: RecordId, revision: u64 },
}

impl CatalogEvent {
    pub fn revision(&self) -> u64 {
        match *self {
            Self::Created { revision, .. }
            | Self::Updated { revision, .. }
            | Self::Deleted { revision, .. } => revision,
        }
    }
}
