//! Ordering the videos of a playlist.

use crate::models::VideoEntry;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// What to order videos by.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Video length; videos of unknown length come after all others.
    #[default]
    Duration,
    /// Video title, ignoring case.
    Title,
    /// When the video was published.
    #[value(alias = "upload_date")]
    UploadDate,
    /// The uploading channel's name, ignoring case.
    Channel,
    /// Position in the source playlist.
    Position,
}

impl SortKey {
    /// Whether sorting by this key needs video durations looked up.
    pub fn needs_durations(self) -> bool {
        self == SortKey::Duration
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Duration => "duration",
            SortKey::Title => "title",
            SortKey::UploadDate => "upload date",
            SortKey::Channel => "channel",
            SortKey::Position => "position",
        })
    }
}

/// Returns the videos ordered by `key`, descending if `reverse` is set.
///
/// The sort is stable in both directions: videos with equal keys keep their relative order.
/// Descending order flips the comparison rather than the output, which is what keeps ties in
/// place.
pub fn sorted(videos: &[VideoEntry], key: SortKey, reverse: bool) -> Vec<VideoEntry> {
    let mut videos = videos.to_vec();
    match key {
        // precompute lowercase keys instead of allocating on every comparison
        SortKey::Title | SortKey::Channel => {
            let mut keyed: Vec<_> = videos
                .into_iter()
                .map(|video| {
                    let text = if key == SortKey::Title {
                        Some(video.title.as_str())
                    } else {
                        video.channel.as_deref()
                    };
                    (text.map(str::to_lowercase), video)
                })
                .collect();
            keyed.sort_by(|(a_key, a), (b_key, b)| {
                let ordering = known_first(a_key.as_ref(), b_key.as_ref())
                    .then_with(|| match key {
                        SortKey::Title => a.title.cmp(&b.title),
                        _ => a.channel.cmp(&b.channel),
                    });
                directed(ordering, reverse)
            });
            keyed.into_iter().map(|(_, video)| video).collect()
        }
        SortKey::Duration => {
            videos.sort_by(|a, b| {
                directed(
                    known_first(a.duration_seconds.as_ref(), b.duration_seconds.as_ref()),
                    reverse,
                )
            });
            videos
        }
        SortKey::UploadDate => {
            videos.sort_by(|a, b| {
                directed(
                    known_first(a.published_at.as_ref(), b.published_at.as_ref()),
                    reverse,
                )
            });
            videos
        }
        SortKey::Position => {
            videos.sort_by(|a, b| directed(a.position.cmp(&b.position), reverse));
            videos
        }
    }
}

/// Orders known values by value, and unknown ones after all known ones.
fn known_first<T: Ord>(a: Option<&T>, b: Option<&T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn directed(ordering: Ordering, reverse: bool) -> Ordering {
    if reverse { ordering.reverse() } else { ordering }
}
