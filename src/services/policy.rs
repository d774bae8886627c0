//! Ownership rule for posts and replies.
//!
//! The same predicate gates the client's edit/delete affordances and the
//! server's mutation handlers. Only the server-side check is a security
//! boundary; the client copy just hides actions that would be refused.
use crate::domain::Principal;

/// True iff `user_id` authored the entity.
pub fn is_owner(user_id: &str, entity_author_id: &str) -> bool {
    user_id == entity_author_id
}

/// True iff a principal is present and authored the entity.
/// Anonymous visitors never own anything.
pub fn can_mutate(principal: Option<&Principal>, entity_author_id: &str) -> bool {
    principal.is_some_and(|p| is_owner(&p.user_id, entity_author_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("u1", "u1", true)]
    #[case("u1", "u2", false)]
    #[case("U1", "u1", false)]
    fn owner_is_exact_user_id_match(
        #[case] user_id: &str,
        #[case] author_id: &str,
        #[case] expected: bool,
    ) {
        let principal = Principal::new(user_id, "someone");
        assert_eq!(can_mutate(Some(&principal), author_id), expected);
        assert_eq!(is_owner(user_id, author_id), expected);
    }

    #[test]
    fn anonymous_cannot_mutate() {
        assert!(!can_mutate(None, "u1"));
    }

    #[test]
    fn display_name_is_irrelevant() {
        let principal = Principal::new("u2", "Ada");
        assert!(!can_mutate(Some(&principal), "Ada"));
    }
}
