//! Track facts for a media asset, read through the `mediainfo` or `ffprobe`
//! command-line tools.

use crate::error::MetadataReadError;
use crate::media::MediaMetadata;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::debug;

pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<MediaMetadata, MetadataReadError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeBackend {
    /// mediainfo first, ffprobe when mediainfo is unavailable or fails.
    #[default]
    Auto,
    MediaInfo,
    Ffprobe,
}

#[derive(Debug, Clone, Default)]
pub struct MediaProbe {
    backend: ProbeBackend,
}

impl MediaProbe {
    pub fn new(backend: ProbeBackend) -> Self {
        Self { backend }
    }
}

impl MetadataExtractor for MediaProbe {
    fn extract(&self, path: &Path) -> Result<MediaMetadata, MetadataReadError> {
        // tools report a missing file as an opaque failure
        std::fs::metadata(path).map_err(|source| MetadataReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match self.backend {
            ProbeBackend::MediaInfo => probe_with_mediainfo(path),
            ProbeBackend::Ffprobe => probe_with_ffprobe(path),
            ProbeBackend::Auto => probe_with_mediainfo(path).or_else(|err| {
                debug!(path = %path.display(), error = %err, "mediainfo failed, trying ffprobe");
                probe_with_ffprobe(path)
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MediaInfoOutput {
    media: Option<MediaInfoMedia>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoMedia {
    #[serde(default)]
    track: Vec<MediaInfoTrack>,
}

#[derive(Debug, Deserialize)]
struct MediaInfoTrack {
    #[serde(rename = "@type")]
    track_type: String,
    #[serde(rename = "Format")]
    format: Option<String>,
    #[serde(rename = "Height")]
    height: Option<String>,
    #[serde(rename = "Channels")]
    channels: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    height: Option<u32>,
    channels: Option<u32>,
}

pub fn probe_with_mediainfo(path: &Path) -> Result<MediaMetadata, MetadataReadError> {
    let stdout = run_tool("mediainfo", &["--Output=JSON"], path)?;
    parse_mediainfo_json(&stdout)
}

pub fn probe_with_ffprobe(path: &Path) -> Result<MediaMetadata, MetadataReadError> {
    let stdout = run_tool(
        "ffprobe",
        &["-v", "quiet", "-print_format", "json", "-show_streams"],
        path,
    )?;
    parse_ffprobe_json(&stdout)
}

fn run_tool(tool: &'static str, args: &[&str], path: &Path) -> Result<String, MetadataReadError> {
    let output = Command::new(tool)
        .args(args)
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MetadataReadError::ToolNotFound { tool }
            } else {
                MetadataReadError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

    if !output.status.success() {
        return Err(MetadataReadError::ToolFailed {
            tool,
            path: path.to_path_buf(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| MetadataReadError::Parse {
        tool,
        message: format!("invalid UTF-8: {e}"),
    })
}

/// mediainfo reports every value as a string, e.g. `"Height": "1080"`.
pub fn parse_mediainfo_json(json: &str) -> Result<MediaMetadata, MetadataReadError> {
    let output: MediaInfoOutput =
        serde_json::from_str(json).map_err(|e| MetadataReadError::Parse {
            tool: "mediainfo",
            message: e.to_string(),
        })?;
    let media = output.media.ok_or_else(|| MetadataReadError::Parse {
        tool: "mediainfo",
        message: "no media section (unsupported container)".to_string(),
    })?;

    let audio = media.track.iter().find(|t| t.track_type == "Audio");
    let video = media.track.iter().find(|t| t.track_type == "Video");

    Ok(MediaMetadata {
        audio_channels: audio
            .and_then(|t| t.channels.as_deref())
            .and_then(parse_numeric::<u32>)
            .map(|c| c.to_string())
            .unwrap_or_default(),
        video_resolution: video
            .and_then(|t| t.height.as_deref())
            .and_then(parse_numeric::<u32>)
            .map(|h| format!("{h}p"))
            .unwrap_or_default(),
        codec: video
            .and_then(|t| t.format.clone())
            .unwrap_or_default(),
    })
}

pub fn parse_ffprobe_json(json: &str) -> Result<MediaMetadata, MetadataReadError> {
    let output: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| MetadataReadError::Parse {
            tool: "ffprobe",
            message: e.to_string(),
        })?;

    let audio = output.streams.iter().find(|s| s.codec_type == "audio");
    let video = output.streams.iter().find(|s| s.codec_type == "video");

    Ok(MediaMetadata {
        audio_channels: audio
            .and_then(|s| s.channels)
            .map(|c| c.to_string())
            .unwrap_or_default(),
        video_resolution: video
            .and_then(|s| s.height)
            .map(|h| format!("{h}p"))
            .unwrap_or_default(),
        codec: video
            .and_then(|s| s.codec_name.as_deref())
            .map(ffprobe_codec_label)
            .unwrap_or_default(),
    })
}

/// Maps ffprobe codec ids onto mediainfo's format names so a file gets the
/// same `{codec_details}` whichever tool read it.
fn ffprobe_codec_label(codec_name: &str) -> String {
    let label = match codec_name {
        "h264" => "AVC",
        "hevc" => "HEVC",
        "av1" => "AV1",
        "vp8" => "VP8",
        "vp9" => "VP9",
        "mpeg4" => "MPEG-4 Visual",
        "mpeg2video" => "MPEG Video",
        "mpeg1video" => "MPEG Video",
        "vc1" => "VC-1",
        "prores" => "ProRes",
        "theora" => "Theora",
        other => return other.to_ascii_uppercase(),
    };
    label.to_string()
}

fn parse_numeric<T: std::str::FromStr>(s: &str) -> Option<T> {
    // "1 080 pixels" style values
    let digits: String = s
        .split_whitespace()
        .take_while(|part| part.chars().all(|c| c.is_ascii_digit()))
        .collect();
    digits.parse().ok()
}
