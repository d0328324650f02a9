use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::{
    Comment, CommentId, Error, Identity, NewComment, OrderType, PageRange, Store, Topic,
    TopicFilter, TopicId, TopicPatch, UserId,
};

/// Connection settings for the hosted backend
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct RestConfig {
    /// Project base url, e.g. `https://abcdefgh.example.com`
    pub base_url: String,
    /// Project api key sent with every request
    pub api_key: String,
    /// Bearer token of the signed-in session, if any
    pub token: Option<String>,
}

/// `Store` over the hosted backend's PostgREST-style HTTP surface: equality
/// filters and ordering as query parameters, inclusive `Range` headers for
/// pages, `Prefer` headers for returned representations and exact counts,
/// `/rpc/<name>` posts for the atomic procedures.
pub struct RestStore {
    client: reqwest::Client,
    config: RestConfig,
}

fn net_err(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

async fn send(req: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
    let resp = req.send().await.map_err(net_err)?;
    if resp.status().is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.map_err(net_err)?;
    Err(Error::parse(&body))
}

async fn fetch<R: DeserializeOwned>(req: reqwest::RequestBuilder) -> Result<R, Error> {
    send(req).await?.json().await.map_err(net_err)
}

#[derive(serde::Deserialize)]
struct WireUser {
    id: UserId,
    email: Option<String>,
}

#[derive(serde::Deserialize)]
struct WireLiker {
    user_id: UserId,
}

impl RestStore {
    pub fn new(config: RestConfig) -> RestStore {
        RestStore {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Swaps the session token, e.g. after a sign-in or token refresh
    pub fn set_token(&mut self, token: Option<String>) {
        self.config.token = token;
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.config.base_url, path))
            .header("apikey", &self.config.api_key);
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        req
    }

    fn table(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        self.request(method, &format!("/rest/v1/{table}"))
    }

    fn rpc(&self, name: &str, args: serde_json::Value) -> reqwest::RequestBuilder {
        self.request(Method::POST, &format!("/rest/v1/rpc/{name}"))
            .json(&args)
    }

    fn filter_params(filter: &TopicFilter) -> Vec<(&'static str, String)> {
        let mut params = vec![("select", String::from("*"))];
        if let Some(status) = filter.status {
            params.push(("status", format!("eq.{}", status.as_str())));
        }
        if let Some(category) = &filter.category {
            params.push(("category", format!("eq.{category}")));
        }
        if let Some(author) = filter.author {
            params.push(("author", format!("eq.{}", author.0)));
        }
        params
    }
}

#[async_trait]
impl Store for RestStore {
    async fn current_identity(&self) -> Result<Option<Identity>, Error> {
        if self.config.token.is_none() {
            return Ok(None);
        }
        let resp = self
            .request(Method::GET, "/auth/v1/user")
            .send()
            .await
            .map_err(net_err)?;
        // an expired session is "nobody signed in", not a failure
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let body = resp.bytes().await.map_err(net_err)?;
            return Err(Error::parse(&body));
        }
        let user: WireUser = resp.json().await.map_err(net_err)?;
        Ok(Some(Identity {
            id: user.id,
            email: user.email,
        }))
    }

    async fn fetch_topic(&self, id: TopicId) -> Result<Topic, Error> {
        let rows: Vec<Topic> = fetch(self.table(Method::GET, "topic").query(&[
            ("select", String::from("*")),
            ("id", format!("eq.{}", id.0)),
        ]))
        .await?;
        rows.into_iter().next().ok_or(Error::NotFound)
    }

    async fn fetch_topics(&self, filter: TopicFilter) -> Result<Vec<Topic>, Error> {
        fetch(
            self.table(Method::GET, "topic")
                .query(&Self::filter_params(&filter)),
        )
        .await
    }

    async fn create_topic(&self, author: UserId) -> Result<Topic, Error> {
        let rows: Vec<Topic> = fetch(
            self.table(Method::POST, "topic")
                .header("Prefer", "return=representation")
                .json(&json!({ "author": author })),
        )
        .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Unknown(String::from("insert returned no representation")))
    }

    async fn update_topic(&self, id: TopicId, patch: TopicPatch) -> Result<(), Error> {
        patch.validate()?;
        send(
            self.table(Method::PATCH, "topic")
                .query(&[("id", format!("eq.{}", id.0))])
                .json(&patch),
        )
        .await?;
        Ok(())
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), Error> {
        send(
            self.table(Method::DELETE, "topic")
                .query(&[("id", format!("eq.{}", id.0))]),
        )
        .await?;
        Ok(())
    }

    async fn has_drafts(&self, author: UserId) -> Result<bool, Error> {
        let rows: Vec<serde_json::Value> = fetch(self.table(Method::GET, "topic").query(&[
            ("select", String::from("id")),
            ("author", format!("eq.{}", author.0)),
            ("status", String::from("eq.temp")),
            ("limit", String::from("1")),
        ]))
        .await?;
        Ok(!rows.is_empty())
    }

    async fn comments_page(
        &self,
        topic: TopicId,
        order: OrderType,
        range: PageRange,
    ) -> Result<Vec<Comment>, Error> {
        let direction = match order {
            OrderType::Asc => "created_at.asc",
            OrderType::Desc => "created_at.desc",
        };
        fetch(
            self.table(Method::GET, "comment_user_view")
                .query(&[
                    ("select", String::from("*")),
                    ("topic_id", format!("eq.{}", topic.0)),
                    ("order", String::from(direction)),
                ])
                .header("Range-Unit", "items")
                .header("Range", format!("{}-{}", range.from, range.to)),
        )
        .await
    }

    async fn comments_count(&self, topic: TopicId) -> Result<u64, Error> {
        let resp = send(
            self.table(Method::GET, "comment")
                .query(&[
                    ("select", String::from("id")),
                    ("topic_id", format!("eq.{}", topic.0)),
                ])
                .header("Prefer", "count=exact")
                .header("Range", "0-0"),
        )
        .await?;
        // total row count rides on the content-range header, `<win>/<total>`
        resp.headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or_else(|| Error::Unknown(String::from("store response carried no row count")))
    }

    async fn insert_comment(&self, new: NewComment) -> Result<Comment, Error> {
        new.validate()?;
        let rows: Vec<Comment> = fetch(
            self.table(Method::POST, "comment")
                .header("Prefer", "return=representation")
                .json(&new),
        )
        .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Unknown(String::from("insert returned no representation")))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        send(
            self.table(Method::DELETE, "comment")
                .query(&[("id", format!("eq.{}", id.0))]),
        )
        .await?;
        Ok(())
    }

    async fn topic_likers(&self, topic: TopicId) -> Result<Vec<UserId>, Error> {
        let rows: Vec<WireLiker> = fetch(self.table(Method::GET, "topic_likes").query(&[
            ("select", String::from("user_id")),
            ("topic_id", format!("eq.{}", topic.0)),
        ]))
        .await?;
        Ok(rows.into_iter().map(|r| r.user_id).collect())
    }

    async fn toggle_like(&self, topic: TopicId) -> Result<(), Error> {
        send(self.rpc("toggle_topic_like", json!({ "p_topic_id": topic }))).await?;
        Ok(())
    }

    async fn increment_views(&self, topic: TopicId) -> Result<i64, Error> {
        fetch(self.rpc("increment_topic_views", json!({ "topic_id": topic }))).await
    }
}
