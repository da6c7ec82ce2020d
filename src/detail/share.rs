use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Span;
use ratatui::widgets::{Paragraph, Widget, Wrap};
use thiserror::Error;
use tracing::info;

use crate::catalog::Record;
use crate::ui;

/// Width in cells of an exported snapshot card.
pub const SNAPSHOT_WIDTH: u16 = 60;

/// Upper bound on card body rows; longer lyrics are cut off.
const SNAPSHOT_MAX_ROWS: u16 = 1000;

/// What gets handed to a share target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    /// `"<title> - <artist>"`.
    pub title_line: String,
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    #[error("share failed: {0}")]
    Failed(String),
}

impl From<std::io::Error> for ShareError {
    fn from(e: std::io::Error) -> Self {
        Self::Failed(e.to_string())
    }
}

/// Somewhere a snapshot can be sent. Returns a human-readable location.
pub trait ShareTarget {
    fn share(&self, payload: &SharePayload) -> Result<String, ShareError>;
}

/// Writes each snapshot as a text file into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryShare {
    dir: PathBuf,
}

impl DirectoryShare {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl ShareTarget for DirectoryShare {
    fn share(&self, payload: &SharePayload) -> Result<String, ShareError> {
        fs::create_dir_all(&self.dir)?;
        let name = format!(
            "{}-{}.txt",
            file_stem(&payload.title_line),
            Utc::now().format("%Y%m%d-%H%M%S%3f")
        );
        let path = self.dir.join(name);
        fs::write(&path, &payload.image)?;
        info!(path = %path.display(), bytes = payload.image.len(), "snapshot exported");
        Ok(path.display().to_string())
    }
}

fn file_stem(title_line: &str) -> String {
    let stem: String = title_line
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "record".to_string()
    } else {
        stem.to_string()
    }
}

/// Render the detail card for `record` off-screen and return it as UTF-8 text.
///
/// The body is first laid out into a tall scratch buffer to find how many rows
/// the wrapped text needs; the card is then drawn at exactly that height.
pub fn render_snapshot(record: &Record) -> Vec<u8> {
    let inner_width = SNAPSHOT_WIDTH - 2;
    let lines = ui::detail_lines(record);
    let bound: usize = lines.iter().map(|l| l.width().max(1)).sum();
    let scratch_height = u16::try_from(bound)
        .unwrap_or(SNAPSHOT_MAX_ROWS)
        .clamp(1, SNAPSHOT_MAX_ROWS);

    let scratch_area = Rect::new(0, 0, inner_width, scratch_height);
    let mut scratch = Buffer::empty(scratch_area);
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(scratch_area, &mut scratch);
    let used = (0..scratch_height)
        .rev()
        .find(|&y| !row_text(&scratch, y).trim().is_empty())
        .map_or(1, |y| y + 1);

    let area = Rect::new(0, 0, SNAPSHOT_WIDTH, used + 2);
    let mut buf = Buffer::empty(area);
    ui::detail_card(record).render(area, &mut buf);

    let mut out = String::new();
    for y in 0..area.height {
        out.push_str(row_text(&buf, y).trim_end());
        out.push('\n');
    }
    out.into_bytes()
}

fn row_text(buf: &Buffer, y: u16) -> String {
    let mut row = String::new();
    let mut x = 0;
    while x < buf.area.width {
        let Some(cell) = buf.cell((x, y)) else {
            break;
        };
        let symbol = cell.symbol();
        row.push_str(symbol);
        // Wide glyphs occupy the following cell(s) too.
        let width = Span::raw(symbol).width().max(1);
        x = x.saturating_add(width as u16);
    }
    row
}
