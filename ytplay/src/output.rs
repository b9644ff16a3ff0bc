//! Rendering command results as text or JSON, to stdout or a file.

use crate::Error;
use crate::duration::format_seconds;
use crate::models::{
    CredentialReport, CredentialStatus, DeletionReport, PlaylistSummary, SortedPlaylistReport,
    VideoListing, playlist_url,
};
use eyre::Context;
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Longest description shown in a playlist summary, in characters.
const SUMMARY_DESCRIPTION_LIMIT: usize = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Aligned, human-readable columns.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Human-readable rendering of a command result.
pub trait Render {
    /// Renders `self` as text, ending in a newline.
    fn render_text(&self) -> String;
}

/// Where and how command results are written.
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub format: Format,
    /// Write to this file instead of stdout.
    pub path: Option<PathBuf>,
}

impl Output {
    pub fn new(format: Format, path: Option<PathBuf>) -> Self {
        Self { format, path }
    }

    pub fn render<T>(&self, value: &T) -> eyre::Result<String>
    where
        T: Serialize + Render + ?Sized,
    {
        match self.format {
            Format::Text => Ok(value.render_text()),
            Format::Json => {
                let mut json = serde_json::to_string_pretty(value).context("serialize output")?;
                json.push('\n');
                Ok(json)
            }
        }
    }

    /// Renders `value` and writes it out.
    pub async fn emit<T>(&self, value: &T) -> eyre::Result<()>
    where
        T: Serialize + Render + ?Sized,
    {
        let rendered = self.render(value)?;
        match &self.path {
            Some(path) => {
                tokio::fs::write(path, rendered)
                    .await
                    .map_err(|e| Error::io(path, e))
                    .context("write output file")?;
                eprintln!("Output written to {}", path.display());
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout
                    .write_all(rendered.as_bytes())
                    .await
                    .map_err(|e| Error::io("<stdout>", e))
                    .context("write output")?;
                stdout
                    .flush()
                    .await
                    .map_err(|e| Error::io("<stdout>", e))
                    .context("flush output")?;
            }
        }
        Ok(())
    }
}

/// Left-aligned columns separated by two spaces.
struct Table {
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &'static [&'static str]) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let headers: Vec<String> = self.headers.iter().map(|h| h.to_string()).collect();
        let mut out = String::new();
        for row in std::iter::once(&headers).chain(&self.rows) {
            let mut line = String::new();
            for (i, (cell, width)) in row.iter().zip(&widths).enumerate() {
                if i > 0 {
                    line.push_str("  ");
                }
                line.push_str(cell);
                if i + 1 < row.len() {
                    let pad = width - cell.chars().count();
                    line.extend(std::iter::repeat_n(' ', pad));
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

/// `key: value` lines with the values lined up.
fn key_values(rows: &[(&str, String)]) -> String {
    let width = rows
        .iter()
        .map(|(key, _)| key.chars().count() + 1)
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (key, value) in rows {
        let line = format!("{:<width$} {value}", format!("{key}:"));
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl Render for Vec<PlaylistSummary> {
    fn render_text(&self) -> String {
        if self.is_empty() {
            return "No playlists found.\n".to_string();
        }
        let mut table = Table::new(&["#", "ID", "VIDEOS", "PRIVACY", "TITLE"]);
        for (i, playlist) in self.iter().enumerate() {
            table.push(vec![
                (i + 1).to_string(),
                playlist.id.clone(),
                playlist.item_count.to_string(),
                or_dash(playlist.privacy),
                playlist.title.clone(),
            ]);
        }
        table.render()
    }
}

impl Render for PlaylistSummary {
    fn render_text(&self) -> String {
        let description = if self.description.is_empty() {
            "(none)".to_string()
        } else if self.description.chars().count() > SUMMARY_DESCRIPTION_LIMIT {
            let mut truncated: String = self
                .description
                .chars()
                .take(SUMMARY_DESCRIPTION_LIMIT)
                .collect();
            truncated.push_str("...");
            truncated
        } else {
            self.description.clone()
        };
        // descriptions may span lines; keep the block one line per key
        let description = description.replace(['\r', '\n'], " ");

        key_values(&[
            ("Title", self.title.clone()),
            ("ID", self.id.clone()),
            ("Description", description),
            ("Videos", self.item_count.to_string()),
            ("Created", self.published_at.to_string()),
            ("Privacy", or_dash(self.privacy)),
            ("URL", playlist_url(&self.id)),
        ])
    }
}

impl Render for VideoListing {
    fn render_text(&self) -> String {
        if self.videos.is_empty() {
            return format!("No videos in playlist {}.\n", self.playlist_id);
        }

        let with_durations = self.total_duration_seconds.is_some();
        let mut table = if with_durations {
            Table::new(&["#", "VIDEO ID", "POSITION", "CHANNEL", "DURATION", "TITLE"])
        } else {
            Table::new(&["#", "VIDEO ID", "POSITION", "CHANNEL", "TITLE"])
        };
        for (i, video) in self.videos.iter().enumerate() {
            let mut row = vec![
                (i + 1).to_string(),
                video.video_id.clone(),
                video.position.to_string(),
                or_dash(video.channel.as_deref()),
            ];
            if with_durations {
                row.push(or_dash(video.duration_seconds.map(format_seconds)));
            }
            row.push(video.title.clone());
            table.push(row);
        }

        let mut out = table.render();
        if let Some(total) = self.total_duration_seconds {
            out.push_str(&format!("\nTotal duration: {}", format_seconds(total)));
            let unknown = self
                .videos
                .iter()
                .filter(|video| video.duration_seconds.is_none())
                .count();
            match unknown {
                0 => {}
                1 => out.push_str(" (1 video without a known duration)"),
                n => out.push_str(&format!(" ({n} videos without a known duration)")),
            }
            out.push('\n');
        }
        out
    }
}

impl Render for SortedPlaylistReport {
    fn render_text(&self) -> String {
        let direction = if self.reverse {
            "descending"
        } else {
            "ascending"
        };
        key_values(&[
            ("Created playlist", self.title.clone()),
            ("ID", self.playlist_id.clone()),
            ("URL", self.url()),
            ("Sorted by", format!("{} ({direction})", self.sort_by)),
            ("Videos added", self.video_count.to_string()),
            ("Privacy", self.privacy.to_string()),
            (
                "Source",
                format!("{} ({})", self.source_title, self.source_playlist_id),
            ),
        ])
    }
}

impl Render for DeletionReport {
    fn render_text(&self) -> String {
        if self.deleted {
            format!("Deleted playlist '{}' ({}).\n", self.title, self.playlist_id)
        } else {
            format!(
                "Cancelled; playlist '{}' ({}) was not deleted.\n",
                self.title, self.playlist_id
            )
        }
    }
}

impl Render for CredentialReport {
    fn render_text(&self) -> String {
        let state = match self.state {
            CredentialStatus::Authenticated => "authenticated",
            CredentialStatus::Rejected => "credentials rejected (run `ytplay login --force`)",
            CredentialStatus::LoggedOut => "logged out",
        };
        key_values(&[
            ("Status", state.to_string()),
            ("Token file", self.token_path.display().to_string()),
        ])
    }
}
