//! Exact Match Union Patterns

use crate::regex::regex_wrapper::RegexWrapperPattern;

/// Create a union pattern of exact matches.
///
/// This will always be a [`RegexWrapperPattern::Basic`] variant.
/// Alternatives keep their input order, so overlapping literals resolve
/// leftmost-first in that order.
///
/// ## Arguments
/// * `alts` - A slice of string-like alternatives to union; empty strings are skipped.
///
/// ## Returns
/// `None` if there are no non-empty alternatives.
pub fn exact_match_union_regex_pattern<S: AsRef<str>>(alts: &[S]) -> Option<RegexWrapperPattern> {
    let parts = alts
        .iter()
        .map(|s| s.as_ref())
        .filter(|s| !s.is_empty())
        .map(regex::escape)
        .collect::<Vec<_>>();

    if parts.is_empty() {
        return None;
    }
    Some(RegexWrapperPattern::Basic(format!("({})", parts.join("|"))))
}
