//! Post feed assembly.
//!
//! Produces cursor-paginated post listings enriched with aggregate
//! reaction counts, comment counts, and - when a viewer is known - that
//! viewer's own reaction. This is the only component composing multiple
//! store queries into one shaped result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ReactionType;
use crate::error::DomainError;
use crate::ports::{CommentRepository, PageBoundary, PostRepository, ReactionRepository};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 50;

/// Options for a feed listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedOptions {
    /// Page size, 1..=50. Defaults to [`DEFAULT_PAGE_SIZE`].
    pub limit: Option<u64>,
    /// Exclusive cursor: id of the last post of the previous page.
    pub cursor: Option<Uuid>,
    /// When set, `my_reaction` is attached to every item.
    pub viewer_id: Option<Uuid>,
}

/// One post in the feed, with aggregates joined on.
///
/// `my_reaction` is a double `Option`: the outer level distinguishes the
/// public view (absent from the JSON entirely) from the authenticated view
/// (`null` when the viewer has not reacted).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub like_count: u64,
    pub dislike_count: u64,
    pub comment_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_reaction: Option<Option<ReactionType>>,
}

/// A page of the feed. `next_cursor` is `null` on the last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<FeedItem>,
    pub next_cursor: Option<Uuid>,
}

impl FeedPage {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }
}

/// Assembles feed pages from the post, comment, and reaction stores.
pub struct FeedService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    reactions: Arc<dyn ReactionRepository>,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        reactions: Arc<dyn ReactionRepository>,
    ) -> Self {
        Self {
            posts,
            comments,
            reactions,
        }
    }

    /// List one feed page.
    ///
    /// The reads here are separate queries without a transaction: they are
    /// read-only and a reaction added between them only shows up on the
    /// next request (relaxed-consistency read). Any failing query fails
    /// the whole request; no partial pages are returned.
    pub async fn list(&self, opts: FeedOptions) -> Result<FeedPage, DomainError> {
        let limit = opts.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(DomainError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let boundary = match opts.cursor {
            None => None,
            Some(cursor) => match self.posts.find_by_id(cursor).await? {
                Some(post) => Some(PageBoundary::from(&post)),
                // Cursor post deleted since the previous page: the stream
                // ends at that boundary rather than erroring.
                None => return Ok(FeedPage::empty()),
            },
        };

        // Overfetch by one row to learn whether a next page exists.
        let mut rows = self.posts.page_after(boundary, limit + 1).await?;
        let next_cursor = if rows.len() as u64 > limit {
            rows.truncate(limit as usize);
            rows.last().map(|p| p.id)
        } else {
            None
        };

        if rows.is_empty() {
            return Ok(FeedPage::empty());
        }

        let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
        let reaction_counts = self.reactions.counts_by_post(&ids).await?;
        let comment_counts = self.comments.count_by_post(&ids).await?;
        let viewer_reactions = match opts.viewer_id {
            Some(viewer) => Some(self.reactions.find_for_viewer(viewer, &ids).await?),
            None => None,
        };

        let items = rows
            .into_iter()
            .map(|post| {
                let counts = reaction_counts.get(&post.id).copied().unwrap_or_default();
                let comment_count = comment_counts.get(&post.id).copied().unwrap_or(0);
                let my_reaction = viewer_reactions
                    .as_ref()
                    .map(|mine| mine.get(&post.id).copied());
                FeedItem {
                    id: post.id,
                    title: post.title,
                    content: post.content,
                    created_at: post.created_at,
                    updated_at: post.updated_at,
                    like_count: counts.likes,
                    dislike_count: counts.dislikes,
                    comment_count,
                    my_reaction,
                }
            })
            .collect();

        Ok(FeedPage { items, next_cursor })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeDelta;

    use super::*;
    use crate::domain::{Comment, CommentWithAuthor, Post, Reaction, ReactionCounts};
    use crate::error::RepoError;

    #[derive(Default)]
    struct FakeStore {
        posts: Mutex<Vec<Post>>,
        comments: Mutex<Vec<Comment>>,
        reactions: Mutex<Vec<Reaction>>,
    }

    #[async_trait]
    impl PostRepository for FakeStore {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
            Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
        }

        async fn insert(&self, post: Post) -> Result<Post, RepoError> {
            self.posts.lock().unwrap().push(post.clone());
            Ok(post)
        }

        async fn update(&self, _post: Post) -> Result<Post, RepoError> {
            unimplemented!("not exercised by feed tests")
        }

        async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
            self.posts.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }

        async fn page_after(
            &self,
            boundary: Option<PageBoundary>,
            limit: u64,
        ) -> Result<Vec<Post>, RepoError> {
            let mut rows: Vec<Post> = self.posts.lock().unwrap().clone();
            rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            if let Some(b) = boundary {
                rows.retain(|p| (p.created_at, p.id) < (b.created_at, b.id));
            }
            rows.truncate(limit as usize);
            Ok(rows)
        }
    }

    #[async_trait]
    impl CommentRepository for FakeStore {
        async fn insert(&self, _comment: Comment) -> Result<CommentWithAuthor, RepoError> {
            unimplemented!("not exercised by feed tests")
        }

        async fn list_by_post(&self, _post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
            unimplemented!("not exercised by feed tests")
        }

        async fn count_by_post(
            &self,
            post_ids: &[Uuid],
        ) -> Result<HashMap<Uuid, u64>, RepoError> {
            let mut map = HashMap::new();
            for comment in self.comments.lock().unwrap().iter() {
                if post_ids.contains(&comment.post_id) {
                    *map.entry(comment.post_id).or_insert(0) += 1;
                }
            }
            Ok(map)
        }
    }

    #[async_trait]
    impl ReactionRepository for FakeStore {
        async fn upsert(&self, reaction: Reaction) -> Result<Reaction, RepoError> {
            let mut rows = self.reactions.lock().unwrap();
            rows.retain(|r| !(r.user_id == reaction.user_id && r.post_id == reaction.post_id));
            rows.push(reaction.clone());
            Ok(reaction)
        }

        async fn delete(&self, user_id: Uuid, post_id: Uuid) -> Result<bool, RepoError> {
            let mut rows = self.reactions.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| !(r.user_id == user_id && r.post_id == post_id));
            Ok(rows.len() != before)
        }

        async fn counts_by_post(
            &self,
            post_ids: &[Uuid],
        ) -> Result<HashMap<Uuid, ReactionCounts>, RepoError> {
            let mut map: HashMap<Uuid, ReactionCounts> = HashMap::new();
            for reaction in self.reactions.lock().unwrap().iter() {
                if post_ids.contains(&reaction.post_id) {
                    let counts = map.entry(reaction.post_id).or_default();
                    match reaction.reaction_type {
                        ReactionType::Like => counts.likes += 1,
                        ReactionType::Dislike => counts.dislikes += 1,
                    }
                }
            }
            Ok(map)
        }

        async fn find_for_viewer(
            &self,
            viewer_id: Uuid,
            post_ids: &[Uuid],
        ) -> Result<HashMap<Uuid, ReactionType>, RepoError> {
            Ok(self
                .reactions
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.user_id == viewer_id && post_ids.contains(&r.post_id))
                .map(|r| (r.post_id, r.reaction_type))
                .collect())
        }
    }

    fn post_at(seconds: i64, title: &str) -> Post {
        let mut post = Post::new(title.to_string(), "content".to_string());
        post.created_at = DateTime::UNIX_EPOCH + TimeDelta::seconds(seconds);
        post.updated_at = post.created_at;
        post
    }

    async fn seed_posts(store: &FakeStore, n: i64) -> Vec<Post> {
        let mut posts = Vec::new();
        for i in 0..n {
            let post = PostRepository::insert(store, post_at(i, &format!("Post {i}")))
                .await
                .unwrap();
            posts.push(post);
        }
        posts
    }

    fn service(store: Arc<FakeStore>) -> FeedService {
        FeedService::new(store.clone(), store.clone(), store)
    }

    #[tokio::test]
    async fn limit_outside_bounds_is_rejected() {
        let feed = service(Arc::new(FakeStore::default()));

        for bad in [0, 51, 1000] {
            let result = feed
                .list(FeedOptions {
                    limit: Some(bad),
                    ..Default::default()
                })
                .await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn default_limit_is_ten() {
        let store = Arc::new(FakeStore::default());
        seed_posts(&store, 15).await;

        let page = service(store).list(FeedOptions::default()).await.unwrap();

        assert_eq!(page.items.len(), 10);
        assert!(page.next_cursor.is_some());
    }

    #[tokio::test]
    async fn next_cursor_is_null_iff_no_overflow_row() {
        let store = Arc::new(FakeStore::default());
        seed_posts(&store, 5).await;
        let feed = service(store);

        // Exactly limit rows: no next page.
        let exact = feed
            .list(FeedOptions {
                limit: Some(5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(exact.items.len(), 5);
        assert!(exact.next_cursor.is_none());

        // One fewer than limit: no next page either.
        let under = feed
            .list(FeedOptions {
                limit: Some(6),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(under.items.len(), 5);
        assert!(under.next_cursor.is_none());

        // Overflow row present: next cursor points at the last page item.
        let over = feed
            .list(FeedOptions {
                limit: Some(4),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(over.items.len(), 4);
        assert_eq!(over.next_cursor, Some(over.items[3].id));
    }

    #[tokio::test]
    async fn cursor_chaining_is_exhaustive_and_non_repeating() {
        let store = Arc::new(FakeStore::default());
        let posts = seed_posts(&store, 25).await;
        let feed = service(store);

        let mut visited = Vec::new();
        let mut cursor = None;
        loop {
            let page = feed
                .list(FeedOptions {
                    limit: Some(7),
                    cursor,
                    ..Default::default()
                })
                .await
                .unwrap();
            visited.extend(page.items.iter().map(|i| i.id));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        // Every post exactly once, newest first.
        let mut expected: Vec<_> = posts.iter().collect();
        expected.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        let expected_ids: Vec<Uuid> = expected.iter().map(|p| p.id).collect();
        assert_eq!(visited, expected_ids);
    }

    #[tokio::test]
    async fn created_at_ties_break_by_id_deterministically() {
        let store = Arc::new(FakeStore::default());
        for i in 0..6 {
            PostRepository::insert(store.as_ref(), post_at(42, &format!("Tied {i}")))
                .await
                .unwrap();
        }
        let feed = service(store);

        let first = feed
            .list(FeedOptions {
                limit: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = feed
            .list(FeedOptions {
                limit: Some(3),
                cursor: first.next_cursor,
                ..Default::default()
            })
            .await
            .unwrap();

        let mut all: Vec<Uuid> = first.items.iter().chain(&second.items).map(|i| i.id).collect();
        assert_eq!(all.len(), 6);
        let ordered = all.clone();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 6, "pages overlap: {ordered:?}");
    }

    #[tokio::test]
    async fn missing_cursor_yields_empty_page() {
        let store = Arc::new(FakeStore::default());
        seed_posts(&store, 3).await;
        let feed = service(store);

        let page = feed
            .list(FeedOptions {
                cursor: Some(Uuid::new_v4()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn cursor_deleted_mid_scroll_ends_the_stream() {
        let store = Arc::new(FakeStore::default());
        seed_posts(&store, 8).await;
        let feed = service(store.clone());

        let first = feed
            .list(FeedOptions {
                limit: Some(4),
                ..Default::default()
            })
            .await
            .unwrap();
        let cursor = first.next_cursor.unwrap();

        PostRepository::delete(store.as_ref(), cursor).await.unwrap();

        let second = feed
            .list(FeedOptions {
                limit: Some(4),
                cursor: Some(cursor),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(second.items.is_empty());
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn zero_counts_fill_in_for_untouched_posts() {
        let store = Arc::new(FakeStore::default());
        seed_posts(&store, 2).await;

        let page = service(store).list(FeedOptions::default()).await.unwrap();

        for item in &page.items {
            assert_eq!(item.like_count, 0);
            assert_eq!(item.dislike_count, 0);
            assert_eq!(item.comment_count, 0);
        }
    }

    #[tokio::test]
    async fn aggregates_are_grouped_per_post() {
        let store = Arc::new(FakeStore::default());
        let posts = seed_posts(&store, 2).await;
        let (liked, other) = (&posts[1], &posts[0]);

        for _ in 0..2 {
            store
                .upsert(Reaction {
                    user_id: Uuid::new_v4(),
                    post_id: liked.id,
                    reaction_type: ReactionType::Like,
                })
                .await
                .unwrap();
        }
        store
            .upsert(Reaction {
                user_id: Uuid::new_v4(),
                post_id: liked.id,
                reaction_type: ReactionType::Dislike,
            })
            .await
            .unwrap();
        store
            .comments
            .lock()
            .unwrap()
            .push(Comment::new(liked.id, Uuid::new_v4(), "hi".into()));

        let page = service(store).list(FeedOptions::default()).await.unwrap();

        let liked_item = page.items.iter().find(|i| i.id == liked.id).unwrap();
        assert_eq!(liked_item.like_count, 2);
        assert_eq!(liked_item.dislike_count, 1);
        assert_eq!(liked_item.comment_count, 1);

        let other_item = page.items.iter().find(|i| i.id == other.id).unwrap();
        assert_eq!(other_item.like_count, 0);
        assert_eq!(other_item.comment_count, 0);
    }

    #[tokio::test]
    async fn my_reaction_present_iff_viewer_supplied() {
        let store = Arc::new(FakeStore::default());
        let posts = seed_posts(&store, 2).await;
        let viewer = Uuid::new_v4();
        store
            .upsert(Reaction {
                user_id: viewer,
                post_id: posts[1].id,
                reaction_type: ReactionType::Dislike,
            })
            .await
            .unwrap();
        let feed = service(store);

        let public = feed.list(FeedOptions::default()).await.unwrap();
        for item in &public.items {
            assert!(item.my_reaction.is_none());
            // Omitted from the wire format entirely, not serialized as null.
            let json = serde_json::to_value(item).unwrap();
            assert!(json.get("myReaction").is_none());
        }

        let authed = feed
            .list(FeedOptions {
                viewer_id: Some(viewer),
                ..Default::default()
            })
            .await
            .unwrap();
        let reacted = authed.items.iter().find(|i| i.id == posts[1].id).unwrap();
        assert_eq!(reacted.my_reaction, Some(Some(ReactionType::Dislike)));

        let unreacted = authed.items.iter().find(|i| i.id == posts[0].id).unwrap();
        assert_eq!(unreacted.my_reaction, Some(None));
        let json = serde_json::to_value(unreacted).unwrap();
        assert!(json.get("myReaction").is_some_and(|v| v.is_null()));
    }
}
