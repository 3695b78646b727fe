use std::cmp::Ordering;

use semver::Version;

/// Strips one leading `v` from a tag.
pub fn normalize(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

/// Parses a tag as a strict `MAJOR.MINOR.PATCH[-PRE][+BUILD]` version, accepting a leading `v`.
///
/// # Examples
///
/// ```
/// use regsync_registry::version::parse_version;
///
/// assert!(parse_version("v1.2.3").is_some());
/// assert!(parse_version("1.2").is_none());
/// assert!(parse_version("not-a-version").is_none());
/// ```
pub fn parse_version(tag: &str) -> Option<Version> {
    Version::parse(normalize(tag)).ok()
}

pub fn is_valid(tag: &str) -> bool {
    parse_version(tag).is_some()
}

/// Descending semantic-version order. Unparsable versions sort after all valid ones,
/// by string.
pub fn compare_desc(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => vb.cmp(&va),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("v1.0.0"), "1.0.0");
        assert_eq!(normalize("1.0.0"), "1.0.0");
        assert_eq!(normalize("vv1"), "v1");
    }

    #[test]
    fn test_compare_desc() {
        let mut versions = vec![
            "1.0.0",
            "garbage",
            "1.10.0",
            "1.2.0",
            "2.0.0-rc.1",
            "2.0.0",
            "abc",
        ];
        versions.sort_by(|a, b| compare_desc(a, b));
        assert_eq!(
            versions,
            vec!["2.0.0", "2.0.0-rc.1", "1.10.0", "1.2.0", "1.0.0", "abc", "garbage"]
        );
    }
}
