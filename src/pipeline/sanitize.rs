//! Output Sanitization
//!
//! The presenter stage is instructed to lead its reply with a sentinel
//! marker. Everything before and including the marker is scaffolding and
//! must not reach the user.

use crate::constants::pipeline::PRESENTER_MARKER;

/// Strip the presenter sentinel and any preamble before it.
///
/// If the marker is absent the text passes through unmodified; models do
/// not always follow the marker instruction.
pub fn strip_presenter_marker(text: &str) -> String {
    match text.split_once(PRESENTER_MARKER) {
        Some((_, rest)) => rest.trim().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_marker_and_preamble_removed() {
        let raw = "Sure, here is the result.\nPRESENT TO USER: A polished prompt.";
        assert_eq!(strip_presenter_marker(raw), "A polished prompt.");
    }

    #[test]
    fn test_marker_absent_passes_through() {
        let raw = "A reply without the marker.";
        assert_eq!(strip_presenter_marker(raw), raw);
    }

    #[test]
    fn test_marker_at_start() {
        assert_eq!(
            strip_presenter_marker("PRESENT TO USER:\n\n  final text  "),
            "final text"
        );
    }

    #[test]
    fn test_only_first_marker_splits() {
        let raw = "PRESENT TO USER: keep PRESENT TO USER: this tail";
        assert_eq!(
            strip_presenter_marker(raw),
            "keep PRESENT TO USER: this tail"
        );
    }

    proptest! {
        // Stripping twice is the same as stripping once, for inputs whose
        // tail does not itself contain the marker.
        #[test]
        fn test_strip_idempotent(preamble in ".{0,64}", tail in "[a-zA-Z0-9 .,!?\n]{0,128}") {
            prop_assume!(!tail.contains(PRESENTER_MARKER));
            let input = format!("{preamble}{PRESENTER_MARKER}{tail}");
            let once = strip_presenter_marker(&input);
            let twice = strip_presenter_marker(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
