//! # Regex Utilities
//!
//! Pre-tokenization needs a look-ahead (``\s+(?!\S)``), which only `fancy_regex`
//! supports; special-token splitting only needs literal alternation,
//! which the faster `regex` crate handles.

mod exact_match_union;
mod patterns;
mod regex_wrapper;

#[doc(inline)]
pub use exact_match_union::exact_match_union_regex_pattern;
#[doc(inline)]
pub use patterns::PRETOKEN_PATTERN;
#[doc(inline)]
pub use regex_wrapper::{ErrorWrapper, MatchesWrapper, RegexWrapper, RegexWrapperPattern};
