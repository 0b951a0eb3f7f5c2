//! Raw reply sanitation
//!
//! Best-effort, lossy cleanup of the text the move-generation service
//! returns before it is treated as candidate movetext. The service has
//! historically wrapped replies in line breaks and appended `*`, the PGN
//! marker for an unfinished game. No structural validation happens here —
//! that is the reconciler's job.

/// Strip formatting noise from a raw reply
///
/// Line breaks become single spaces (so a move split across lines stays
/// two tokens), every `*` is dropped, and surrounding whitespace is
/// trimmed.
pub fn clean_reply(raw: &str) -> String {
    raw.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .filter(|&c| c != '*')
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_newlines_and_asterisk() {
        assert_eq!(clean_reply("1. e4 e5\n*"), "1. e4 e5");
    }

    #[test]
    fn test_newline_inside_movetext_keeps_tokens_apart() {
        assert_eq!(clean_reply("1. e4\ne5"), "1. e4 e5");
    }

    #[test]
    fn test_trims_surrounding_whitespace() {
        assert_eq!(clean_reply("  1. e4  \r\n"), "1. e4");
    }

    #[test]
    fn test_clean_reply_is_not_validation() {
        // Garbage stays garbage; the reconciler decides
        assert_eq!(clean_reply("no move today"), "no move today");
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(clean_reply("\n*\n"), "");
    }
}
