use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Series,
    Anime,
    Music,
    Audiobook,
    Ebook,
}

impl MediaType {
    pub const ALL: [MediaType; 6] = [
        MediaType::Movie,
        MediaType::Series,
        MediaType::Anime,
        MediaType::Music,
        MediaType::Audiobook,
        MediaType::Ebook,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
            MediaType::Anime => "anime",
            MediaType::Music => "music",
            MediaType::Audiobook => "audiobook",
            MediaType::Ebook => "ebook",
        }
    }

    pub fn emits_sidecar(self) -> bool {
        self == MediaType::Movie
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    /// Accepts singular and plural labels ("Movies", "Animes", "eBooks").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let singular = lower.strip_suffix('s').unwrap_or(&lower);
        match (lower.as_str(), singular) {
            ("series", _) => Ok(MediaType::Series),
            ("music", _) => Ok(MediaType::Music),
            (_, "movie") => Ok(MediaType::Movie),
            (_, "anime") => Ok(MediaType::Anime),
            (_, "audiobook") => Ok(MediaType::Audiobook),
            (_, "ebook") => Ok(MediaType::Ebook),
            _ => Err(format!("unknown media type: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub media_type: MediaType,
}

impl MediaAsset {
    pub fn new(path: impl Into<PathBuf>, media_type: MediaType) -> Self {
        Self {
            path: path.into(),
            media_type,
        }
    }
}

/// Track facts read from the container. Empty strings mean "no such track".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub audio_channels: String,
    pub video_resolution: String,
    pub codec: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFields {
    pub title: Option<String>,
    pub year: Option<String>,
    pub season: Option<String>,
    pub episode: Option<String>,
    pub artist: Option<String>,
    pub author: Option<String>,
}

impl DetailFields {
    /// Copy with every key that does not apply to `media_type` cleared.
    pub fn relevant_to(&self, media_type: MediaType) -> DetailFields {
        let keep = |wanted: bool, value: &Option<String>| {
            if wanted {
                normalize(value.clone())
            } else {
                None
            }
        };
        let (year, season, episode, artist, author) = match media_type {
            MediaType::Movie => (true, false, false, false, false),
            MediaType::Series | MediaType::Anime => (true, true, true, false, false),
            MediaType::Music => (false, false, false, true, false),
            MediaType::Audiobook => (false, false, false, false, true),
            MediaType::Ebook => (true, false, false, false, true),
        };

        DetailFields {
            title: keep(true, &self.title),
            year: keep(year, &self.year),
            season: keep(season, &self.season),
            episode: keep(episode, &self.episode),
            artist: keep(artist, &self.artist),
            author: keep(author, &self.author),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.year.is_none()
            && self.season.is_none()
            && self.episode.is_none()
            && self.artist.is_none()
            && self.author.is_none()
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// The container extension of `path`. A dotted tail holding anything other
/// than ASCII letters and digits ("Mr. Robot") belongs to the name.
pub fn media_extension(path: &Path) -> Option<&str> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_fields() -> DetailFields {
        DetailFields {
            title: Some(" Dune ".to_string()),
            year: Some("2021".to_string()),
            season: Some("1".to_string()),
            episode: Some("2".to_string()),
            artist: Some("Zimmer".to_string()),
            author: Some("Herbert".to_string()),
        }
    }

    #[test]
    fn media_type_parses_plural_labels() {
        assert_eq!("Movies".parse::<MediaType>(), Ok(MediaType::Movie));
        assert_eq!("Animes".parse::<MediaType>(), Ok(MediaType::Anime));
        assert_eq!("eBooks".parse::<MediaType>(), Ok(MediaType::Ebook));
        assert_eq!("Audiobooks".parse::<MediaType>(), Ok(MediaType::Audiobook));
        assert_eq!("series".parse::<MediaType>(), Ok(MediaType::Series));
        assert_eq!("Music".parse::<MediaType>(), Ok(MediaType::Music));
        assert!("podcast".parse::<MediaType>().is_err());
    }

    #[test]
    fn relevant_to_movie_keeps_title_and_year_only() {
        let fields = all_fields().relevant_to(MediaType::Movie);
        assert_eq!(fields.title.as_deref(), Some("Dune"));
        assert_eq!(fields.year.as_deref(), Some("2021"));
        assert_eq!(fields.season, None);
        assert_eq!(fields.artist, None);
        assert_eq!(fields.author, None);
    }

    #[test]
    fn relevant_to_series_keeps_episode_numbers() {
        let fields = all_fields().relevant_to(MediaType::Series);
        assert_eq!(fields.season.as_deref(), Some("1"));
        assert_eq!(fields.episode.as_deref(), Some("2"));
        assert_eq!(fields.author, None);
    }

    #[test]
    fn relevant_to_drops_blank_values() {
        let fields = DetailFields {
            title: Some("   ".to_string()),
            ..DetailFields::default()
        };
        assert!(fields.relevant_to(MediaType::Music).is_empty());
    }

    #[test]
    fn media_extension_ignores_dotted_titles() {
        assert_eq!(media_extension(Path::new("/w/movie.mkv")), Some("mkv"));
        assert_eq!(media_extension(Path::new("/w/Mr. Robot")), None);
        assert_eq!(media_extension(Path::new("/w/Mr. Robot.mp4")), Some("mp4"));
        assert_eq!(media_extension(Path::new("/w/README")), None);
    }
}
