use topika_api::{SortBy, Store, TopicStatus};
use topika_client::{Drafts, FeedError, TopicEditor, TopicFeed, TopicView, TOPICS_PER_PAGE};
use topika_mock_server::{Failure, MockServer};

use tests::{full_patch, init_tracing, publish_topic};

async fn server_with_author() -> (MockServer, topika_api::UserId) {
    init_tracing();
    let server = MockServer::new();
    let author = server.admin_create_user("author@example.com");
    server.sign_in(author);
    (server, author)
}

#[tokio::test]
async fn feed_shows_published_topics_newest_first() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    let older = publish_topic(&server, author, "dev").await?;
    let newer = publish_topic(&server, author, "design").await?;
    // drafts and fresh empty rows stay out of the feed
    let draft = server.create_topic(author).await?;
    server
        .update_topic(draft.id, full_patch("dev", TopicStatus::Temp))
        .await?;
    server.create_topic(author).await?;

    let mut feed = TopicFeed::new(server.clone());
    feed.refresh().await;
    let page = feed.current_page();
    assert_eq!(page.total_pages, 1);
    assert_eq!(
        page.topics.iter().map(|t| t.id).collect::<Vec<_>>(),
        vec![newer.id, older.id]
    );
    Ok(())
}

#[tokio::test]
async fn sorting_by_views_follows_the_counter() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    let quiet = publish_topic(&server, author, "dev").await?;
    let busy = publish_topic(&server, author, "dev").await?;
    for _ in 0..3 {
        server.increment_views(busy.id).await?;
    }

    let mut feed = TopicFeed::new(server.clone());
    feed.set_sort(SortBy::Views).await;
    let page = feed.current_page();
    assert_eq!(page.topics[0].id, busy.id);
    assert_eq!(page.topics[1].id, quiet.id);
    Ok(())
}

#[tokio::test]
async fn category_switch_resets_sort_search_and_page() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    publish_topic(&server, author, "dev").await?;
    publish_topic(&server, author, "design").await?;

    let mut feed = TopicFeed::new(server.clone());
    feed.set_sort(SortBy::Views).await;
    feed.search("lorem ipsum").await.ok();

    feed.set_category(Some(String::from("design"))).await;
    assert_eq!(feed.sort(), SortBy::Latest);
    let page = feed.current_page();
    assert_eq!(page.page, 1);
    assert!(page.topics.iter().all(|t| t.category.as_deref() == Some("design")));
    Ok(())
}

#[tokio::test]
async fn search_needs_two_characters_and_filters_by_title() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    let t = publish_topic(&server, author, "dev").await?;
    server
        .update_topic(
            t.id,
            topika_api::TopicPatch {
                title: Some(String::from("Understanding ownership")),
                ..Default::default()
            },
        )
        .await?;
    publish_topic(&server, author, "dev").await?;

    let mut feed = TopicFeed::new(server.clone());
    feed.refresh().await;
    assert_eq!(feed.search(" a ").await, Err(FeedError::SearchTooShort));

    feed.search("OWNERSHIP").await?;
    let page = feed.current_page();
    assert_eq!(page.topics.len(), 1);
    assert_eq!(page.topics[0].id, t.id);

    feed.clear_search();
    assert_eq!(feed.current_page().topics.len(), 2);
    Ok(())
}

#[tokio::test]
async fn pagination_windows_are_fixed_and_clamped() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    for _ in 0..25 {
        publish_topic(&server, author, "dev").await?;
    }

    let mut feed = TopicFeed::new(server.clone());
    feed.refresh().await;
    let page = feed.current_page();
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.topics.len(), TOPICS_PER_PAGE);

    feed.set_page(3);
    assert_eq!(feed.current_page().topics.len(), 5);

    // navigation never leaves the valid span
    feed.next_page();
    assert_eq!(feed.current_page().page, 3);
    feed.set_page(0);
    assert_eq!(feed.current_page().page, 1);
    feed.prev_page();
    assert_eq!(feed.current_page().page, 1);
    Ok(())
}

#[tokio::test]
async fn drafts_are_listed_probed_and_deleted() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    let drafts = Drafts::new(server.clone());
    assert!(!drafts.has_any(author).await?);

    let mut editor = TopicEditor::create(server.clone()).await?;
    editor.title = String::from("Work in progress");
    editor.content = String::from("[]");
    editor.category = String::from("dev");
    editor.thumbnail = Some(String::from("https://files.example.com/t.png"));
    editor.save().await?;

    assert!(drafts.has_any(author).await?);
    let listed = drafts.list(author).await?;
    assert_eq!(listed.len(), 1);
    assert!(listed[0].is_draft());

    // another user's probe sees nothing
    let other = server.admin_create_user("other@example.com");
    assert!(!drafts.has_any(other).await?);

    drafts.delete(editor.id()).await?;
    assert!(!drafts.has_any(author).await?);
    Ok(())
}

#[tokio::test]
async fn publishing_requires_every_field() -> anyhow::Result<()> {
    let (server, _) = server_with_author().await;
    let mut editor = TopicEditor::create(server.clone()).await?;
    editor.title = String::from("Almost there");

    assert_eq!(
        editor.publish().await,
        Err(FeedError::MissingFields(vec![
            "content",
            "category",
            "thumbnail"
        ]))
    );

    editor.content = String::from("[]");
    editor.category = String::from("dev");
    editor.thumbnail = Some(String::from("https://files.example.com/t.png"));
    editor.publish().await?;

    let stored = server.fetch_topic(editor.id()).await?;
    assert!(stored.is_published());
    Ok(())
}

#[tokio::test]
async fn editor_requires_a_signed_in_author() -> anyhow::Result<()> {
    let (server, _) = server_with_author().await;
    server.sign_out();
    assert!(matches!(
        TopicEditor::create(server.clone()).await,
        Err(FeedError::AuthRequired)
    ));
    Ok(())
}

#[tokio::test]
async fn opening_the_detail_view_counts_a_view() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    let topic = publish_topic(&server, author, "dev").await?;

    let view = TopicView::open(server.clone(), topic.id).await?;
    assert_eq!(view.topic().views, 1);
    let view = TopicView::open(server.clone(), topic.id).await?;
    assert_eq!(view.topic().views, 2);
    Ok(())
}

#[tokio::test]
async fn failed_view_increment_rolls_back() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    let topic = publish_topic(&server, author, "dev").await?;

    server.fail_next(Failure::Rpc);
    let mut view = TopicView::open(server.clone(), topic.id).await?;
    assert_eq!(view.topic().views, 0);
    assert!(matches!(view.take_error(), Some(FeedError::RpcFailed(_))));
    assert_eq!(server.fetch_topic(topic.id).await?.views, 0);
    Ok(())
}

#[tokio::test]
async fn like_toggle_round_trips_through_the_rpc() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    let topic = publish_topic(&server, author, "dev").await?;
    let me = server.current_identity().await?.unwrap();

    let mut view = TopicView::open(server.clone(), topic.id).await?;
    assert_eq!(view.likes_count(), 0);

    view.toggle_like().await?;
    assert_eq!(view.likes_count(), 1);
    assert!(view.is_liked_by(Some(&me)));
    assert_eq!(view.topic().likes, 1);

    view.toggle_like().await?;
    assert_eq!(view.likes_count(), 0);
    assert!(!view.is_liked_by(Some(&me)));
    Ok(())
}

#[tokio::test]
async fn liking_needs_a_session() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    let topic = publish_topic(&server, author, "dev").await?;
    let mut view = TopicView::open(server.clone(), topic.id).await?;

    server.sign_out();
    assert_eq!(view.toggle_like().await, Err(FeedError::AuthRequired));
    Ok(())
}

#[tokio::test]
async fn only_the_author_deletes_a_topic() -> anyhow::Result<()> {
    let (server, author) = server_with_author().await;
    let topic = publish_topic(&server, author, "dev").await?;

    let stranger = server.admin_create_user("stranger@example.com");
    server.sign_in(stranger);
    let mut view = TopicView::open(server.clone(), topic.id).await?;
    let stranger_id = server.current_identity().await?.unwrap();
    assert!(!view.can_delete(Some(&stranger_id)));
    assert!(matches!(
        view.delete().await,
        Err(FeedError::DeleteFailed(_))
    ));

    server.sign_in(author);
    view.delete().await?;
    assert!(matches!(
        server.fetch_topic(topic.id).await,
        Err(topika_api::Error::NotFound)
    ));
    Ok(())
}
