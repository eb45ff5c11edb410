//! Version reference classification and range matching.
//!
//! References coming out of a manifest are exact versions, version
//! ranges, URLs, or local paths. The helpers here tell those apart and
//! evaluate ranges with the semver crate, normalizing the one piece of
//! npm range syntax it does not accept directly (hyphen ranges).

use semver::{Version, VersionReq};

/// True when the reference parses as one concrete version.
pub fn is_exact(reference: &str) -> bool {
    Version::parse(reference).is_ok()
}

/// Parse a version range. Returns `None` for strings that are not
/// ranges at all (URLs, local paths, garbage).
pub fn parse_range(range: &str) -> Option<VersionReq> {
    let range = range.trim();
    if range.is_empty() {
        return None;
    }

    // Hyphen ranges: "1.0.0 - 2.0.0" means ">=1.0.0, <=2.0.0"
    if let Some((start, end)) = split_hyphen_range(range) {
        return VersionReq::parse(&format!(">={start}, <={end}")).ok();
    }

    VersionReq::parse(range).ok()
}

fn split_hyphen_range(range: &str) -> Option<(&str, &str)> {
    let (start, end) = range.split_once(" - ")?;
    let (start, end) = (start.trim(), end.trim());
    (!start.is_empty() && !end.is_empty()).then_some((start, end))
}

/// True when `version` is a concrete version satisfying `range`.
pub fn satisfies(version: &str, range: &str) -> bool {
    match (Version::parse(version), parse_range(range)) {
        (Ok(version), Some(req)) => req.matches(&version),
        _ => false,
    }
}

/// Maximum published version satisfying `range`, under standard semver
/// ordering. `None` when nothing satisfies (or the range is invalid).
pub fn max_satisfying(versions: &[String], range: &str) -> Option<String> {
    let req = parse_range(range)?;
    versions
        .iter()
        .filter_map(|v| Version::parse(v).ok())
        .filter(|v| req.matches(v))
        .max()
        .map(|v| v.to_string())
}
