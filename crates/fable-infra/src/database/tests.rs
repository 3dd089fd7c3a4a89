#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use fable_core::domain::{Comment, Post, Reaction, ReactionType, Role, User};
    use fable_core::error::RepoError;
    use fable_core::ports::{
        CommentRepository, PostRepository, ReactionRepository, UserRepository,
    };

    use crate::database::InMemoryStore;
    use crate::database::entity::post;
    use crate::database::postgres_repo::{
        PostgresPostRepository, PostgresReactionRepository, mask_email,
    };

    #[test]
    fn mask_email_hides_the_local_part() {
        assert_eq!(mask_email("reader@mail.com"), "r***@mail.com");
        assert_eq!(mask_email("a@mail.com"), "***@mail.com");
        assert_eq!(mask_email("not-an-email"), "***");
    }

    #[test]
    fn mask_email_handles_multibyte_first_char() {
        // 'é' spans two bytes; masking must not split it.
        assert_eq!(mask_email("émile@x.com"), "é***@x.com");
        assert_eq!(mask_email("é@x.com"), "***@x.com");
    }

    #[tokio::test]
    async fn test_find_post_by_id() {
        let post_id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![post::Model {
                id: post_id,
                title: "Test Post".to_owned(),
                content: "Content".to_owned(),
                created_at: now.into(),
                updated_at: now.into(),
            }]])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

        assert!(result.is_some());
        let found = result.unwrap();
        assert_eq!(found.title, "Test Post");
        assert_eq!(found.id, post_id);
    }

    #[tokio::test]
    async fn test_delete_post_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let repo = PostgresPostRepository::new(db);

        let result = repo.delete(Uuid::new_v4()).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_reaction_reports_whether_row_existed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        let repo = PostgresReactionRepository::new(db);
        let (user_id, post_id) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(repo.delete(user_id, post_id).await.unwrap());
        assert!(!repo.delete(user_id, post_id).await.unwrap());
    }

    // Invariant tests against the in-memory store, which must behave like
    // the Postgres schema's constraints.

    #[tokio::test]
    async fn memory_duplicate_email_surfaces_constraint() {
        let store = InMemoryStore::new();
        let first = User::new("a@x.com".into(), "hash".into(), Role::User);
        UserRepository::insert(&store, first).await.unwrap();

        let dup = User::new("a@x.com".into(), "other".into(), Role::User);
        let result = UserRepository::insert(&store, dup).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn memory_reaction_upsert_keeps_one_row_per_user_post() {
        let store = InMemoryStore::new();
        let (user_id, post_id) = (Uuid::new_v4(), Uuid::new_v4());

        for _ in 0..3 {
            store
                .upsert(Reaction {
                    user_id,
                    post_id,
                    reaction_type: ReactionType::Like,
                })
                .await
                .unwrap();
        }
        let counts = store.counts_by_post(&[post_id]).await.unwrap();
        assert_eq!(counts[&post_id].likes, 1);
        assert_eq!(counts[&post_id].dislikes, 0);

        // Differing type overwrites rather than accumulating.
        store
            .upsert(Reaction {
                user_id,
                post_id,
                reaction_type: ReactionType::Dislike,
            })
            .await
            .unwrap();
        let counts = store.counts_by_post(&[post_id]).await.unwrap();
        assert_eq!(counts[&post_id].likes, 0);
        assert_eq!(counts[&post_id].dislikes, 1);
    }

    #[tokio::test]
    async fn memory_delete_missing_reaction_is_not_an_error() {
        let store = InMemoryStore::new();
        let existed = ReactionRepository::delete(&store, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        assert!(!existed);
    }

    #[tokio::test]
    async fn memory_post_delete_cascades_to_children() {
        let store = InMemoryStore::new();
        let author = UserRepository::insert(
            &store,
            User::new("c@x.com".into(), "hash".into(), Role::User),
        )
        .await
        .unwrap();
        let post = PostRepository::insert(&store, Post::new("Title".into(), "Content".into()))
            .await
            .unwrap();
        CommentRepository::insert(&store, Comment::new(post.id, author.id, "hello".into()))
            .await
            .unwrap();
        store
            .upsert(Reaction {
                user_id: author.id,
                post_id: post.id,
                reaction_type: ReactionType::Like,
            })
            .await
            .unwrap();

        PostRepository::delete(&store, post.id).await.unwrap();

        assert!(store.list_by_post(post.id).await.unwrap().is_empty());
        assert!(store.counts_by_post(&[post.id]).await.unwrap().is_empty());
        assert!(
            store
                .find_for_viewer(author.id, &[post.id])
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn memory_comments_list_ascending_with_author_projection() {
        let store = InMemoryStore::new();
        let author = UserRepository::insert(
            &store,
            User::new("c@x.com".into(), "hash".into(), Role::User),
        )
        .await
        .unwrap();
        let post = PostRepository::insert(&store, Post::new("Title".into(), "Content".into()))
            .await
            .unwrap();

        let mut first = Comment::new(post.id, author.id, "first".into());
        first.created_at = first.created_at - chrono::TimeDelta::seconds(5);
        CommentRepository::insert(&store, first).await.unwrap();
        CommentRepository::insert(&store, Comment::new(post.id, author.id, "second".into()))
            .await
            .unwrap();

        let listed = store.list_by_post(post.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].body, "first");
        assert_eq!(listed[1].body, "second");
        assert_eq!(listed[0].author.email, "c@x.com");
    }
}
