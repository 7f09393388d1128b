//! Revert detection from free-text edit comments.

/// Markers matched against the lower-cased comment. One set for every call site.
pub const REVERT_MARKERS: &[&str] = &["revert", "undid", "rv ", "rvv"];

/// コメントが差し戻し（revert）らしければ `true` を返す。コメントなしは常に `false`。
#[must_use]
pub fn is_revert(comment: Option<&str>) -> bool {
    let Some(comment) = comment else {
        return false;
    };
    let lowered = comment.to_lowercase();
    REVERT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("Reverted edits by Example (talk) to last version by Bot"), true)]
    #[case(Some("Undid revision 1234567 by Vandal"), true)]
    #[case(Some("rv vandalism"), true)]
    #[case(Some("RVV"), true)]
    #[case(Some("Rv unsourced claim"), true)]
    #[case(Some("Partial REVERT of lead"), true)]
    #[case(Some("copyedit"), false)]
    #[case(Some("rv"), false)]
    #[case(Some("server move"), false)]
    #[case(Some(""), false)]
    #[case(None, false)]
    fn is_revert_matches_markers_case_insensitively(
        #[case] comment: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(is_revert(comment), expected);
    }
}
