/*
 * Responsibility
 * - Post / Reply 本文の形式チェック (client は送信前、server は最終判断)
 * - DELETE /discussions/reply/{id}/{reply} の {reply} 解釈
 */
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

pub const POST_CONTENT_MAX_CHARS: usize = 500;
pub const REPLY_CONTENT_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("content is required")]
    Empty,
    #[error("content must be at most {max} characters")]
    TooLong { max: usize },
}

fn validate(content: &str, max: usize) -> Result<(), ContentError> {
    if content.trim().is_empty() {
        return Err(ContentError::Empty);
    }
    // characters, not bytes
    if content.chars().count() > max {
        return Err(ContentError::TooLong { max });
    }
    Ok(())
}

pub fn validate_post_content(content: &str) -> Result<(), ContentError> {
    validate(content, POST_CONTENT_MAX_CHARS)
}

pub fn validate_reply_content(content: &str) -> Result<(), ContentError> {
    validate(content, REPLY_CONTENT_MAX_CHARS)
}

/// Addresses one reply of a post.
///
/// `Id` is the stable form. `Index` is the positional form kept for clients
/// that still address replies by their place in the sequence; a position is
/// only meaningful against the state it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyRef {
    Id(Uuid),
    Index(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid reply reference: {0}")]
pub struct ReplyRefError(pub String);

impl FromStr for ReplyRef {
    type Err = ReplyRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = Uuid::parse_str(s) {
            return Ok(Self::Id(id));
        }
        s.parse::<i64>()
            .map(Self::Index)
            .map_err(|_| ReplyRefError(s.to_string()))
    }
}

impl fmt::Display for ReplyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplyRef::Id(id) => write!(f, "{id}"),
            ReplyRef::Index(index) => write!(f, "{index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", ContentError::Empty)]
    #[case("   \n\t", ContentError::Empty)]
    fn rejects_blank_content(#[case] content: &str, #[case] expected: ContentError) {
        assert_eq!(validate_post_content(content), Err(expected));
        assert_eq!(validate_reply_content(content), Err(expected));
    }

    #[test]
    fn post_limit_is_500_characters() {
        let at_limit = "a".repeat(POST_CONTENT_MAX_CHARS);
        let over = "a".repeat(POST_CONTENT_MAX_CHARS + 1);

        assert!(validate_post_content(&at_limit).is_ok());
        assert_eq!(
            validate_post_content(&over),
            Err(ContentError::TooLong { max: 500 })
        );
    }

    #[test]
    fn reply_limit_is_300_characters() {
        let over = "a".repeat(REPLY_CONTENT_MAX_CHARS + 1);
        assert_eq!(
            validate_reply_content(&over),
            Err(ContentError::TooLong { max: 300 })
        );
        // fits a post, not a reply
        assert!(validate_post_content(&over).is_ok());
    }

    #[test]
    fn counts_characters_not_bytes() {
        let wide = "é".repeat(REPLY_CONTENT_MAX_CHARS);
        assert!(wide.len() > REPLY_CONTENT_MAX_CHARS);
        assert!(validate_reply_content(&wide).is_ok());
    }

    #[rstest]
    #[case("0", ReplyRef::Index(0))]
    #[case("-1", ReplyRef::Index(-1))]
    #[case("7", ReplyRef::Index(7))]
    fn parses_positional_reply_refs(#[case] raw: &str, #[case] expected: ReplyRef) {
        assert_eq!(raw.parse::<ReplyRef>(), Ok(expected));
    }

    #[test]
    fn parses_reply_ids_and_round_trips_display() {
        let id = Uuid::new_v4();
        let parsed: ReplyRef = id.to_string().parse().unwrap();
        assert_eq!(parsed, ReplyRef::Id(id));
        assert_eq!(parsed.to_string(), id.to_string());
    }

    #[test]
    fn rejects_garbage_reply_refs() {
        assert!("first".parse::<ReplyRef>().is_err());
    }
}
