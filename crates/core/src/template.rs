use crate::error::PatternError;
use crate::media::{DetailFields, MediaMetadata};
use crate::sanitize::{sanitize_stem, truncate_stem_if_needed};

pub const DEFAULT_PATTERN: &str =
    "{title} ({year})_{audio_channels}_{video_resolution}_{codec_details}_{language}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternPart {
    Literal(String),
    Placeholder(Placeholder),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Title,
    Year,
    Season,
    Episode,
    Artist,
    Author,
    AudioChannels,
    VideoResolution,
    CodecDetails,
    Language,
}

impl Placeholder {
    pub const ALL: [Placeholder; 10] = [
        Placeholder::Title,
        Placeholder::Year,
        Placeholder::Season,
        Placeholder::Episode,
        Placeholder::Artist,
        Placeholder::Author,
        Placeholder::AudioChannels,
        Placeholder::VideoResolution,
        Placeholder::CodecDetails,
        Placeholder::Language,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Title => "title",
            Placeholder::Year => "year",
            Placeholder::Season => "season",
            Placeholder::Episode => "episode",
            Placeholder::Artist => "artist",
            Placeholder::Author => "author",
            Placeholder::AudioChannels => "audio_channels",
            Placeholder::VideoResolution => "video_resolution",
            Placeholder::CodecDetails => "codec_details",
            Placeholder::Language => "language",
        }
    }

    fn parse(name: &str) -> Result<Placeholder, PatternError> {
        Placeholder::ALL
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| PatternError::UnknownPlaceholder(name.to_string()))
    }
}

/// A validated naming pattern. Only constructible through [`parse_pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPattern {
    source: String,
    parts: Vec<PatternPart>,
}

impl NamingPattern {
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn parts(&self) -> &[PatternPart] {
        &self.parts
    }
}

/// Values for every placeholder, resolved once per asset.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderTable {
    values: [String; 10],
}

impl PlaceholderTable {
    pub fn new(details: &DetailFields, metadata: &MediaMetadata, language: &str) -> Self {
        let field = |v: &Option<String>| v.as_deref().unwrap_or_default().trim().to_string();
        Self {
            values: [
                field(&details.title),
                field(&details.year),
                field(&details.season),
                field(&details.episode),
                field(&details.artist),
                field(&details.author),
                metadata.audio_channels.trim().to_string(),
                metadata.video_resolution.trim().to_string(),
                metadata.codec.trim().to_string(),
                language.trim().to_string(),
            ],
        }
    }

    pub fn get(&self, placeholder: Placeholder) -> &str {
        &self.values[placeholder as usize]
    }
}

pub fn validate_pattern(input: &str) -> Result<(), PatternError> {
    parse_pattern(input).map(|_| ())
}

/// `{{` and `}}` produce literal braces.
pub fn parse_pattern(input: &str) -> Result<NamingPattern, PatternError> {
    if input.trim().is_empty() {
        return Err(PatternError::Empty);
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                if !literal.is_empty() {
                    parts.push(PatternPart::Literal(std::mem::take(&mut literal)));
                }
                let mut name = String::new();
                let mut found_close = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        found_close = true;
                        break;
                    }
                    if next == '{' {
                        return Err(PatternError::UnbalancedBraces);
                    }
                    name.push(next);
                }
                if !found_close || name.trim().is_empty() {
                    return Err(PatternError::UnbalancedBraces);
                }
                parts.push(PatternPart::Placeholder(Placeholder::parse(name.trim())?));
            }
            '}' => return Err(PatternError::UnbalancedBraces),
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        parts.push(PatternPart::Literal(literal));
    }

    Ok(NamingPattern {
        source: input.to_string(),
        parts,
    })
}

pub fn render_pattern(pattern: &NamingPattern, table: &PlaceholderTable) -> String {
    let mut output = String::new();
    for part in pattern.parts() {
        match part {
            PatternPart::Literal(s) => output.push_str(s),
            PatternPart::Placeholder(p) => output.push_str(table.get(*p)),
        }
    }
    output
}

/// Renders and sanitizes a file stem; `extension_with_dot` only counts
/// against `max_filename_len` (bytes). Literal pattern text is kept as typed.
pub fn format_stem(
    pattern: &NamingPattern,
    table: &PlaceholderTable,
    extension_with_dot: &str,
    max_filename_len: usize,
) -> Result<String, PatternError> {
    let rendered = render_pattern(pattern, table);
    let sanitized = sanitize_stem(&rendered)?;
    Ok(truncate_stem_if_needed(
        &sanitized,
        extension_with_dot,
        max_filename_len,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inception() -> (DetailFields, MediaMetadata) {
        let details = DetailFields {
            title: Some("Inception".to_string()),
            year: Some("2010".to_string()),
            ..DetailFields::default()
        };
        let metadata = MediaMetadata {
            audio_channels: "6".to_string(),
            video_resolution: "1080p".to_string(),
            codec: "H264".to_string(),
        };
        (details, metadata)
    }

    #[test]
    fn parse_pattern_ok() {
        let parsed = parse_pattern(DEFAULT_PATTERN).expect("must parse");
        assert_eq!(parsed.as_str(), DEFAULT_PATTERN);
        assert!(parsed
            .parts()
            .contains(&PatternPart::Placeholder(Placeholder::CodecDetails)));
    }

    #[test]
    fn parse_pattern_rejects_unknown_placeholder() {
        let err = parse_pattern("{title}_{director}").expect_err("must fail");
        assert_eq!(err, PatternError::UnknownPlaceholder("director".to_string()));
    }

    #[test]
    fn parse_pattern_rejects_unbalanced_braces() {
        assert_eq!(
            parse_pattern("{title").expect_err("must fail"),
            PatternError::UnbalancedBraces
        );
        assert_eq!(
            parse_pattern("title}").expect_err("must fail"),
            PatternError::UnbalancedBraces
        );
        assert_eq!(
            parse_pattern("{}").expect_err("must fail"),
            PatternError::UnbalancedBraces
        );
    }

    #[test]
    fn parse_pattern_rejects_blank() {
        assert_eq!(parse_pattern("  ").expect_err("must fail"), PatternError::Empty);
    }

    #[test]
    fn doubled_braces_are_literals() {
        let parsed = parse_pattern("{{{title}}}").expect("must parse");
        let (details, metadata) = inception();
        let table = PlaceholderTable::new(&details, &metadata, "English");
        assert_eq!(render_pattern(&parsed, &table), "{Inception}");
    }

    #[test]
    fn renders_inception_scenario() {
        let parsed = parse_pattern(DEFAULT_PATTERN).expect("must parse");
        let (details, metadata) = inception();
        let table = PlaceholderTable::new(&details, &metadata, "English");
        let stem = format_stem(&parsed, &table, ".mkv", 240).expect("must format");
        assert_eq!(stem, "Inception (2010)_6_1080p_H264_English");
    }

    #[test]
    fn missing_fields_render_empty() {
        let parsed = parse_pattern("{title}-{artist}-{season}").expect("must parse");
        let (details, _) = inception();
        let table = PlaceholderTable::new(&details, &MediaMetadata::default(), "");
        assert_eq!(render_pattern(&parsed, &table), "Inception--");
    }

    #[test]
    fn empty_field_leaves_literal_separators_untouched() {
        let parsed =
            parse_pattern("{title}__{year}_{audio_channels}_{video_resolution}").expect("parse");
        let (details, mut metadata) = inception();
        metadata.audio_channels = String::new();
        let table = PlaceholderTable::new(&details, &metadata, "English");
        let stem = format_stem(&parsed, &table, ".mkv", 240).expect("must format");
        assert_eq!(stem, "Inception__2010__1080p");
    }

    #[test]
    fn separators_in_fields_are_escaped() {
        let parsed = parse_pattern("{title}").expect("must parse");
        let details = DetailFields {
            title: Some("../../etc/passwd".to_string()),
            ..DetailFields::default()
        };
        let table = PlaceholderTable::new(&details, &MediaMetadata::default(), "");
        let stem = format_stem(&parsed, &table, ".mkv", 240).expect("must format");
        assert!(!stem.contains('/'));
        assert!(!stem.contains('\\'));
        assert_ne!(stem, "..");
    }

    #[test]
    fn dot_dot_stem_is_rejected() {
        let parsed = parse_pattern("{title}").expect("must parse");
        let details = DetailFields {
            title: Some("..".to_string()),
            ..DetailFields::default()
        };
        let table = PlaceholderTable::new(&details, &MediaMetadata::default(), "");
        let err = format_stem(&parsed, &table, ".mkv", 240).expect_err("must fail");
        assert!(matches!(err, PatternError::UnsafeStem(_)));
    }
}
