//! The `v1, v2, …` tag namespace (§4.7): monotonic across the repo's life,
//! regardless of how many tags a rollback or prune has since removed.

/// Parses a tag of the shape `v<digits>`, returning its numeric value.
pub fn parse_tag(tag: &str) -> Option<u64> {
    tag.strip_prefix('v')?.parse().ok()
}

/// The next tag to assign, one past the highest existing `vN` tag (or `v1`
/// if none exist yet).
pub fn next_tag(existing: &[String]) -> String {
    let max = existing.iter().filter_map(|t| parse_tag(t)).max().unwrap_or(0);
    format!("v{}", max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_suffix() {
        assert_eq!(parse_tag("v12"), Some(12));
        assert_eq!(parse_tag("release-1"), None);
        assert_eq!(parse_tag("v"), None);
    }

    #[test]
    fn next_tag_is_one_past_the_max() {
        assert_eq!(next_tag(&[]), "v1");
        assert_eq!(next_tag(&["v1".into(), "v3".into(), "v2".into()]), "v4");
    }

    #[test]
    fn next_tag_ignores_unrelated_tags() {
        assert_eq!(next_tag(&["release-1".into(), "v5".into()]), "v6");
    }
}
