/// Whole-word, case-insensitive attribution rule for feed records.
///
/// A vulnerability record is attributed to a subject only when the
/// subject's name appears in the record description with non-alphanumeric
/// characters (or the text boundary) on both sides: "openssl" matches
/// "...the openssl package before 1.1.1k...", while "ssl" does not match
/// inside "openssl".
///
/// This is a deliberately conservative, false-positive-tolerant heuristic
/// carried over from the matching contract: it performs no version-range
/// exploitability check and must not be treated as authoritative
/// identification.
pub fn name_matches_description(name: &str, description: &str) -> bool {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return false;
    }
    let haystack = description.to_lowercase();

    let mut start = 0;
    while let Some(idx) = haystack[start..].find(&name) {
        let begin = start + idx;
        let end = begin + name.len();

        let left_ok = begin == 0
            || !haystack[..begin]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let right_ok = end == haystack.len()
            || !haystack[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric());

        if left_ok && right_ok {
            return true;
        }
        // Advance past the first char of this occurrence (char-boundary safe)
        start = begin + name.chars().next().map_or(1, char::len_utf8);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word_match() {
        let desc = "A flaw in the openssl package before 1.1.1k allows...";
        assert!(name_matches_description("openssl", desc));
    }

    #[test]
    fn test_substring_of_longer_word_does_not_match() {
        let desc = "A flaw in the openssl package before 1.1.1k allows...";
        assert!(!name_matches_description("ssl", desc));
        assert!(!name_matches_description("open", desc));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(name_matches_description("OpenSSL", "OPENSSL 1.0.2 is affected"));
        assert!(name_matches_description("curl", "cURL could be tricked into..."));
    }

    #[test]
    fn test_match_at_text_boundaries() {
        assert!(name_matches_description("curl", "curl is affected"));
        assert!(name_matches_description("curl", "affects curl"));
        assert!(name_matches_description("curl", "curl"));
    }

    #[test]
    fn test_punctuation_counts_as_boundary() {
        assert!(name_matches_description("zlib", "bundled copies (zlib, libpng)"));
        assert!(name_matches_description("musl", "musl's resolver"));
    }

    #[test]
    fn test_hyphenated_names() {
        // '-' is not alphanumeric, so hyphen-adjacent occurrences are
        // boundaries; "apt" still matches inside "apt-get"
        assert!(name_matches_description("apt", "a bug in apt-get install"));
        assert!(name_matches_description("apt-get", "a bug in apt-get install"));
    }

    #[test]
    fn test_later_occurrence_matches_after_rejected_prefix() {
        // First occurrence is embedded, second stands alone
        let desc = "libcurl and curl are both affected";
        assert!(name_matches_description("curl", desc));
    }

    #[test]
    fn test_empty_name_never_matches() {
        assert!(!name_matches_description("", "anything"));
        assert!(!name_matches_description("  ", "anything"));
    }

    #[test]
    fn test_no_match() {
        assert!(!name_matches_description("wget", "a flaw in curl"));
    }
}
