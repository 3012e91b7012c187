use std::rc::Rc;

use serde::de::DeserializeOwned;
use url::Url;

use crate::connection::{Body, Method, Request, Response, Transport};
use crate::error::ClientError;
use crate::records::{Comment, NewComment, NewPost, Post, PostId};

/// Thin request layer over a [`Transport`].
///
/// Every request carries `Authorization: Bearer <token>` when the session has
/// a token; without one the server treats the caller as anonymous. A non-2xx
/// status comes back as [`ClientError::Http`], never as a panic.
#[derive(Clone)]
pub struct ApiClient {
    transport: Rc<dyn Transport>,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(transport: Rc<dyn Transport>, base: Url, token: Option<String>) -> Self {
        ApiClient {
            transport,
            base,
            token,
        }
    }

    /// `base` + path segments, each segment percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let mut url = self.endpoint(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let response = self.send(Method::Get, url.clone(), Body::Empty).await?;
        serde_json::from_str(&response.body).map_err(|source| ClientError::Json {
            url: url.to_string(),
            source,
        })
    }

    /// The response body is not read: only the status decides success.
    pub async fn post(&self, segments: &[&str], body: Body) -> Result<(), ClientError> {
        let url = self.endpoint(segments);
        self.send(Method::Post, url, body).await?;
        Ok(())
    }

    pub async fn delete(&self, segments: &[&str]) -> Result<(), ClientError> {
        let url = self.endpoint(segments);
        self.send(Method::Delete, url, Body::Empty).await?;
        Ok(())
    }

    async fn send(&self, method: Method, url: Url, body: Body) -> Result<Response, ClientError> {
        let request = Request {
            method,
            url: url.clone(),
            bearer: self.token.clone(),
            body,
        };

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(ClientError::Http {
                status: response.status,
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    pub async fn list_posts(&self, page: u32) -> Result<Vec<Post>, ClientError> {
        self.get(&["posts"], &[("page", page.to_string().as_str())]).await
    }

    pub async fn search_posts(&self, query: &str) -> Result<Vec<Post>, ClientError> {
        self.get(&["posts", "search"], &[("q", query)]).await
    }

    pub async fn create_post(&self, post: NewPost) -> Result<(), ClientError> {
        self.post(&["posts"], Body::Form(post.into_form())).await
    }

    pub async fn delete_post(&self, post_id: PostId) -> Result<(), ClientError> {
        self.delete(&["posts", post_id.to_string().as_str()]).await
    }

    pub async fn list_comments(&self, post_id: PostId) -> Result<Vec<Comment>, ClientError> {
        self.get(&["comments", post_id.to_string().as_str()], &[]).await
    }

    pub async fn create_comment(&self, post_id: PostId, text: &str) -> Result<(), ClientError> {
        let id = post_id.to_string();
        let segments = ["comments", id.as_str()];
        let body = serde_json::to_string(&NewComment {
            comment: text.to_owned(),
        })
        .map_err(|source| ClientError::Json {
            url: self.endpoint(&segments).to_string(),
            source,
        })?;

        self.post(&segments, Body::Json(body)).await
    }
}
