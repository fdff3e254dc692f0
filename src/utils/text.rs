/// Splits the free-text keyword field into the list the gateway expects.
///
/// Separators are newline, ASCII comma and full-width comma. Surrounding
/// whitespace is trimmed and empty segments are dropped, so trailing
/// separators and blank lines are harmless.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(['\n', ',', '，'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_all_separators() {
        let raw = "零食供应链\nOEM 代工,食品安全，出口资质";
        assert_eq!(
            split_keywords(raw),
            vec!["零食供应链", "OEM 代工", "食品安全", "出口资质"]
        );
    }

    #[test]
    fn test_blank_segments_are_dropped() {
        assert_eq!(split_keywords("  a  \n\n , ,b,"), vec!["a", "b"]);
        assert!(split_keywords("").is_empty());
        assert!(split_keywords(" \n , ，").is_empty());
    }

    #[test]
    fn test_windows_line_endings() {
        assert_eq!(split_keywords("a\r\nb"), vec!["a", "b"]);
    }
}
