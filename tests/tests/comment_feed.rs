use topika_api::{CommentId, NewComment, Store};
use topika_client::{CommentComposer, CommentFeed, CommentFeedConfig, FeedError};
use topika_mock_server::{Failure, MockServer};

use tests::{gen_text, server_with_topic};

fn feed_for(server: &MockServer, topic: topika_api::TopicId) -> CommentFeed<MockServer> {
    CommentFeed::new(server.clone(), topic, CommentFeedConfig::default())
}

#[tokio::test]
async fn twelve_comments_in_windows_of_six() -> anyhow::Result<()> {
    let (server, topic, _) = server_with_topic(12).await?;
    let mut feed = feed_for(&server, topic);

    feed.open().await;
    assert_eq!(feed.items().len(), 6);
    assert!(feed.has_more());
    assert_eq!(feed.total_count(), 12);
    // newest first: the last inserted comment leads the window
    assert_eq!(feed.items()[0].id, CommentId(12));

    assert!(feed.load_more().await);
    assert_eq!(feed.items().len(), 12);
    // knife-edge: the second window came back full, so the heuristic still
    // says more
    assert!(feed.has_more());

    assert!(feed.load_more().await);
    assert_eq!(feed.items().len(), 12);
    assert!(!feed.has_more());

    // exhausted feeds stop issuing requests
    assert!(!feed.load_more().await);
    assert!(feed.take_error().is_none());
    Ok(())
}

#[tokio::test]
async fn unauthenticated_submission_changes_nothing() -> anyhow::Result<()> {
    let (server, topic, _) = server_with_topic(3).await?;
    server.sign_out();

    let mut feed = feed_for(&server, topic);
    feed.open().await;
    let before = feed.state().clone();

    let mut composer = CommentComposer::new();
    composer.set_content("hello");
    assert_eq!(
        feed.submit(&mut composer).await,
        Err(FeedError::AuthRequired)
    );
    assert_eq!(*feed.state(), before);
    // the draft is kept for after sign-in
    assert_eq!(composer.content(), "hello");
    Ok(())
}

#[tokio::test]
async fn exactly_one_create_request_per_submission() -> anyhow::Result<()> {
    let (server, topic, _) = server_with_topic(0).await?;
    let me = server.current_identity().await?.unwrap();
    let mut feed = feed_for(&server, topic);
    feed.open().await;

    let requests_before = server.test_insert_requests();
    let pending = feed.begin_insert(Some(&me), "first").unwrap();
    // a second submit while the first is in flight is rejected client-side
    assert_eq!(
        feed.begin_insert(Some(&me), "second"),
        Err(FeedError::DuplicateSubmission)
    );

    let res = server.insert_comment(pending.to_insert(topic)).await;
    feed.apply_insert(pending, res)?;
    assert_eq!(server.test_insert_requests(), requests_before + 1);
    Ok(())
}

#[tokio::test]
async fn failed_create_rolls_back_and_keeps_the_draft() -> anyhow::Result<()> {
    let (server, topic, _) = server_with_topic(5).await?;
    let mut feed = feed_for(&server, topic);
    feed.open().await;
    let items_before = feed.items().to_vec();
    let total_before = feed.total_count();

    server.fail_next(Failure::Insert);
    let mut composer = CommentComposer::new();
    composer.set_content("doomed");
    let res = feed.submit(&mut composer).await;
    assert!(matches!(res, Err(FeedError::CreateFailed(_))));

    assert_eq!(feed.items(), &items_before[..]);
    assert_eq!(feed.total_count(), total_before);
    assert_eq!(composer.content(), "doomed");

    // the retry goes through and clears the draft
    feed.submit(&mut composer).await?;
    assert!(composer.content().is_empty());
    assert_eq!(feed.total_count(), total_before + 1);
    Ok(())
}

#[tokio::test]
async fn total_count_tracks_the_collection_not_the_window() -> anyhow::Result<()> {
    let (server, topic, _) = server_with_topic(12).await?;
    let mut feed = feed_for(&server, topic);
    feed.open().await;
    assert_eq!(feed.items().len(), 6);
    assert_eq!(feed.total_count(), 12);

    let mut composer = CommentComposer::new();
    composer.set_content(gen_text());
    feed.submit(&mut composer).await?;
    assert_eq!(feed.total_count(), 13);

    let victim = feed.items()[0].id;
    feed.delete(victim).await?;
    assert_eq!(feed.total_count(), 12);
    Ok(())
}

#[tokio::test]
async fn rows_added_behind_the_window_never_duplicate() -> anyhow::Result<()> {
    let (server, topic, _) = server_with_topic(12).await?;
    let mut feed = feed_for(&server, topic);
    feed.open().await;

    // a 13th comment lands server-side and shifts every offset by one
    server
        .insert_comment(NewComment {
            topic_id: topic,
            content: gen_text(),
        })
        .await?;

    feed.load_more().await;
    let mut ids: Vec<i64> = feed.items().iter().map(|c| c.id.0).collect();
    let len_before_dedup = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), len_before_dedup);
    Ok(())
}

#[tokio::test]
async fn deletion_is_pessimistic_and_author_scoped() -> anyhow::Result<()> {
    let (server, topic, author) = server_with_topic(4).await?;
    let mut feed = feed_for(&server, topic);
    feed.open().await;

    // a stranger cannot delete the author's comment
    let stranger = server.admin_create_user("stranger@example.com");
    server.sign_in(stranger);
    let victim = feed.items()[0].id;
    let res = feed.delete(victim).await;
    assert!(matches!(res, Err(FeedError::DeleteFailed(_))));
    assert!(feed.items().iter().any(|c| c.id == victim));

    // the author can
    server.sign_in(author);
    feed.delete(victim).await?;
    assert!(feed.items().iter().all(|c| c.id != victim));
    assert_eq!(feed.total_count(), 3);

    // deleting an id that is long gone is a no-op
    let before = feed.state().clone();
    feed.delete(victim).await?;
    assert_eq!(feed.state().items, before.items);
    Ok(())
}

#[tokio::test]
async fn failed_page_fetch_keeps_prior_state() -> anyhow::Result<()> {
    let (server, topic, _) = server_with_topic(12).await?;
    let mut feed = feed_for(&server, topic);
    feed.open().await;
    let before = feed.items().to_vec();

    server.fail_next(Failure::Fetch);
    assert!(feed.load_more().await);
    assert_eq!(feed.items(), &before[..]);
    assert!(matches!(feed.take_error(), Some(FeedError::Fetch(_))));

    // the feed stays interactive after the notice
    assert!(feed.load_more().await);
    assert_eq!(feed.items().len(), 12);
    Ok(())
}

#[tokio::test]
async fn deletes_for_distinct_ids_may_overlap() -> anyhow::Result<()> {
    let (server, topic, _) = server_with_topic(2).await?;
    let a = CommentId(1);
    let b = CommentId(2);
    let (ra, rb) = futures::join!(server.delete_comment(a), server.delete_comment(b));
    ra?;
    rb?;
    assert_eq!(server.comments_count(topic).await?, 0);
    Ok(())
}

#[tokio::test]
async fn identity_feed_reports_session_changes() -> anyhow::Result<()> {
    let (server, _, author) = server_with_topic(0).await?;
    let mut sessions = server.identity_feed();

    server.sign_out();
    assert_eq!(sessions.recv().await, Some(None));

    server.sign_in(author);
    let update = sessions.recv().await.unwrap().unwrap();
    assert_eq!(update.id, author);
    Ok(())
}
