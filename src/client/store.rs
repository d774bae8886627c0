//! Client-side cache of the posts on the current page.
use crate::client::sorting::{SortCriterion, sort};
use crate::domain::Post;

/// Sole owner of UI-visible forum state.
///
/// Posts are kept in the order they were observed (fetch order, then newly
/// created ones); [`ForumStore::view`] applies the current criterion on top.
/// Entries are only ever replaced with server responses.
#[derive(Debug, Clone, Default)]
pub struct ForumStore {
    posts: Vec<Post>,
    criterion: SortCriterion,
}

impl ForumStore {
    pub fn new(criterion: SortCriterion) -> Self {
        Self {
            posts: Vec::new(),
            criterion,
        }
    }

    pub fn criterion(&self) -> SortCriterion {
        self.criterion
    }

    pub fn set_criterion(&mut self, criterion: SortCriterion) {
        self.criterion = criterion;
    }

    /// Posts in display order.
    pub fn view(&self) -> Vec<Post> {
        sort(&self.posts, self.criterion)
    }

    pub fn get(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Replaces everything with a fresh listing.
    pub fn replace_all(&mut self, posts: Vec<Post>) {
        self.posts = posts;
    }

    pub fn clear(&mut self) {
        self.posts.clear();
    }

    /// Replaces the post with the same id in place, or records it as the most
    /// recently observed post.
    pub fn upsert(&mut self, post: Post) {
        match self.posts.iter_mut().find(|p| p.id == post.id) {
            Some(slot) => *slot = post,
            None => self.posts.push(post),
        }
    }

    /// Replaces an existing post only. Returns false if it is no longer
    /// cached (deleted meanwhile), in which case the response is dropped.
    pub fn replace(&mut self, post: Post) -> bool {
        match self.posts.iter_mut().find(|p| p.id == post.id) {
            Some(slot) => {
                *slot = post;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Post> {
        let position = self.posts.iter().position(|p| p.id == id)?;
        Some(self.posts.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn post(id: &str, minutes: i64, votes: u64) -> Post {
        Post {
            id: id.into(),
            content: "c".into(),
            author: "Ada".into(),
            author_id: "u1".into(),
            timestamp: DateTime::<Utc>::UNIX_EPOCH + Duration::minutes(minutes),
            votes,
            replies: Vec::new(),
        }
    }

    fn view_ids(store: &ForumStore) -> Vec<String> {
        store.view().into_iter().map(|p| p.id).collect()
    }

    #[test]
    fn view_follows_the_criterion() {
        let mut store = ForumStore::new(SortCriterion::Newest);
        store.replace_all(vec![post("a", 1, 3), post("b", 2, 1)]);

        assert_eq!(view_ids(&store), vec!["b", "a"]);

        store.set_criterion(SortCriterion::MostVoted);
        assert_eq!(view_ids(&store), vec!["a", "b"]);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut store = ForumStore::default();
        store.replace_all(vec![post("a", 1, 0), post("b", 1, 0)]);

        store.upsert(post("a", 1, 4));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").map(|p| p.votes), Some(4));
        // same timestamp: "b" was still observed after "a"
        assert_eq!(view_ids(&store), vec!["b", "a"]);
    }

    #[test]
    fn upsert_of_unknown_post_is_most_recently_observed() {
        let mut store = ForumStore::default();
        store.replace_all(vec![post("a", 1, 0)]);

        store.upsert(post("new", 1, 0));

        assert_eq!(view_ids(&store), vec!["new", "a"]);
    }

    #[test]
    fn replace_does_not_resurrect_removed_posts() {
        let mut store = ForumStore::default();
        store.replace_all(vec![post("a", 1, 0)]);
        store.remove("a");

        assert!(!store.replace(post("a", 1, 1)));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_and_clear() {
        let mut store = ForumStore::default();
        store.replace_all(vec![post("a", 1, 0), post("b", 2, 0)]);

        assert_eq!(store.remove("a").map(|p| p.id), Some("a".to_string()));
        assert!(store.remove("a").is_none());

        store.clear();
        assert!(store.is_empty());
    }
}
