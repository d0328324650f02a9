use rand::Rng;

use topika_api::{NewComment, Store, Topic, TopicId, TopicPatch, TopicStatus, UserId};
use topika_mock_server::MockServer;

/// Once-per-process tracing init so failing tests come with their logs
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt().with_test_writer().init();
    });
}

/// Short random body for generated comments and topics
pub fn gen_text() -> String {
    let words = rand::thread_rng().gen_range(5..20);
    lipsum::lipsum(words)
}

/// Patch that fills in everything publishing requires
pub fn full_patch(category: &str, status: TopicStatus) -> TopicPatch {
    TopicPatch {
        title: Some(lipsum::lipsum_title()),
        content: Some(gen_text()),
        category: Some(String::from(category)),
        thumbnail: Some(String::from("https://files.example.com/thumb.png")),
        status: Some(status),
    }
}

/// Creates and publishes one topic for `author`, who must be signed in
pub async fn publish_topic(
    server: &MockServer,
    author: UserId,
    category: &str,
) -> anyhow::Result<Topic> {
    let topic = server.create_topic(author).await?;
    server
        .update_topic(topic.id, full_patch(category, TopicStatus::Publish))
        .await?;
    Ok(server.fetch_topic(topic.id).await?)
}

/// A server with a signed-in author and one published topic carrying
/// `n_comments` comments
pub async fn server_with_topic(
    n_comments: usize,
) -> anyhow::Result<(MockServer, TopicId, UserId)> {
    init_tracing();
    let server = MockServer::new();
    let author = server.admin_create_user("author@example.com");
    server.sign_in(author);
    let topic = publish_topic(&server, author, "dev").await?;
    for _ in 0..n_comments {
        server
            .insert_comment(NewComment {
                topic_id: topic.id,
                content: gen_text(),
            })
            .await?;
    }
    Ok((server, topic.id, author))
}
