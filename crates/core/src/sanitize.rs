use crate::error::PatternError;

const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Escapes characters that cannot appear in a file name and refuses stems
/// that would not name a file inside the asset's own directory.
pub fn sanitize_stem(value: &str) -> Result<String, PatternError> {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if is_disallowed_char(ch) {
            out.push('_');
        } else {
            out.push(ch);
        }
    }

    let mut out = out.trim_end_matches([' ', '.']).trim().to_string();

    if out.is_empty() || out == "." || out == ".." {
        return Err(PatternError::UnsafeStem(value.to_string()));
    }

    if is_windows_reserved(&out) {
        out.push_str("_file");
    }

    Ok(out)
}

/// Shortens `stem` so stem plus extension fit in `limit` bytes, dropping
/// whole `_`-separated tokens from the end before cutting characters.
pub fn truncate_stem_if_needed(stem: &str, extension_with_dot: &str, limit: usize) -> String {
    let budget = limit.saturating_sub(extension_with_dot.len());
    if stem.len() <= budget {
        return stem.to_string();
    }

    let mut tokens: Vec<&str> = stem.split('_').collect();
    while tokens.len() > 1 {
        tokens.pop();
        let candidate = tokens.join("_");
        if !candidate.is_empty() && candidate.len() <= budget {
            return candidate;
        }
    }

    let mut end = budget.min(stem.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    stem[..end].to_string()
}

fn is_disallowed_char(ch: char) -> bool {
    matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        || ch == '\0'
        || ch.is_control()
}

fn is_windows_reserved(value: &str) -> bool {
    let stem = value
        .split('.')
        .next()
        .unwrap_or(value)
        .to_ascii_uppercase();
    WINDOWS_RESERVED_NAMES
        .iter()
        .any(|reserved| reserved == &stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_repeated_separators() {
        assert_eq!(
            sanitize_stem("Inception__2010__1080p").expect("sanitize"),
            "Inception__2010__1080p"
        );
    }

    #[test]
    fn sanitize_escapes_separators_and_invalid_chars() {
        let value = sanitize_stem("AC/DC: Live?").expect("sanitize");
        assert_eq!(value, "AC_DC_ Live_");
    }

    #[test]
    fn sanitize_suffixes_reserved_device_names() {
        assert_eq!(sanitize_stem("AUX").expect("sanitize"), "AUX_file");
    }

    #[test]
    fn sanitize_rejects_dot_segments_and_empty() {
        assert!(matches!(sanitize_stem(".."), Err(PatternError::UnsafeStem(_))));
        assert!(matches!(sanitize_stem("."), Err(PatternError::UnsafeStem(_))));
        assert!(matches!(sanitize_stem("   "), Err(PatternError::UnsafeStem(_))));
    }

    #[test]
    fn truncate_drops_trailing_tokens_first() {
        let stem = "Inception (2010)_6_1080p_H264_English";
        let truncated = truncate_stem_if_needed(stem, ".mkv", 30);
        assert_eq!(truncated, "Inception (2010)_6_1080p");
        assert!(truncated.len() + 4 <= 30);
    }

    #[test]
    fn truncate_counts_bytes_and_respects_char_boundaries() {
        let stem = "é".repeat(100);
        let truncated = truncate_stem_if_needed(&stem, ".mkv", 100);
        assert_eq!(truncated.len(), 96);
        assert_eq!(truncated.chars().count(), 48);

        let odd = truncate_stem_if_needed(&stem, ".mkv", 101);
        assert_eq!(odd.len(), 96);
    }
}
