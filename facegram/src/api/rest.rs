use super::image::{decode_data_url, ImageData};
use super::types::*;
use super::ApiError;
use crate::compose::PostUpload;
use crate::session::Session;
use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct FacegramRest {
    client: Client,
    base_url: String,
}

impl FacegramRest {
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Exchange credentials for a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        let req = self
            .client
            .post(self.url("v1/auth/login"))
            .json(&LoginRequest { username, password });
        let resp: LoginResponse = send_json(req).await?;
        tracing::info!(username, "logged in");
        Ok(Session::new(username, resp.token))
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        let req = self.client.post(self.url("v1/auth/register")).json(request);
        send_expect_success(req).await?;
        tracing::info!(username = %request.username, "registered");
        Ok(())
    }

    /// End the session on the server. The session is consumed even when the
    /// server call fails.
    pub async fn logout(&self, session: Session) -> Result<(), ApiError> {
        let req = self
            .client
            .post(self.url("v1/auth/logout"))
            .bearer_auth(session.token())
            .json(&LogoutRequest {
                username: session.username(),
            });
        send_expect_success(req).await?;
        tracing::info!(username = session.username(), "logged out");
        Ok(())
    }

    /// One page of the home feed.
    pub async fn list_posts(
        &self,
        session: &Session,
        page: u32,
        size: u32,
    ) -> Result<Vec<Post>, ApiError> {
        let req = self
            .client
            .get(self.url("v1/posts"))
            .bearer_auth(session.token())
            .query(&[("page", page), ("size", size)]);
        let resp: PostsResponse = send_json(req).await?;
        Ok(resp.posts)
    }

    pub async fn list_users(&self, session: &Session) -> Result<Vec<UserSummary>, ApiError> {
        let req = self
            .client
            .get(self.url("v1/users"))
            .bearer_auth(session.token());
        let resp: UsersResponse = send_json(req).await?;
        Ok(resp.users)
    }

    pub async fn get_profile(
        &self,
        session: &Session,
        username: &str,
    ) -> Result<UserProfile, ApiError> {
        let req = self
            .client
            .get(self.url(&format!("v1/users/{}", username)))
            .bearer_auth(session.token());
        send_json(req).await
    }

    pub async fn delete_post(&self, session: &Session, post_id: u64) -> Result<(), ApiError> {
        let req = self
            .client
            .delete(self.url(&format!("v1/posts/{}", post_id)))
            .bearer_auth(session.token());
        send_expect_success(req).await?;
        tracing::info!(post_id, "post deleted");
        Ok(())
    }

    /// Upload a validated draft as multipart form data.
    pub async fn create_post(&self, session: &Session, upload: PostUpload) -> Result<(), ApiError> {
        let file_count = upload.files.len();
        let mut form = Form::new().text("caption", upload.caption);
        for file in upload.files {
            let part = Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(file.mime)
                .map_err(|e| ApiError::InvalidRequest(format!("attachment type {}: {}", file.mime, e)))?;
            form = form.part("attachments[]", part);
        }

        let req = self
            .client
            .post(self.url("v1/posts"))
            .bearer_auth(session.token())
            .multipart(form);
        send_expect_success(req).await?;
        tracing::info!(files = file_count, "post created");
        Ok(())
    }

    /// Fetch and decode an attachment image.
    pub async fn fetch_image(
        &self,
        session: &Session,
        storage_path: &str,
    ) -> Result<ImageData, ApiError> {
        let req = self
            .client
            .get(self.url(&format!("v1/image/{}", storage_path)))
            .bearer_auth(session.token());
        let resp: ImageResponse = send_json(req).await?;
        decode_data_url(&resp.base64).map_err(|e| ApiError::Server {
            status: 200,
            message: format!("{:#}", e),
        })
    }
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
    let resp = req.send().await.map_err(ApiError::Network)?;
    let status = resp.status().as_u16();
    let body = read_success_body(resp).await?;
    serde_json::from_str(&body).map_err(|source| ApiError::Decode { status, source })
}

async fn send_expect_success(req: RequestBuilder) -> Result<(), ApiError> {
    let resp = req.send().await.map_err(ApiError::Network)?;
    read_success_body(resp).await.map(|_| ())
}

async fn read_success_body(resp: Response) -> Result<String, ApiError> {
    let status = resp.status();
    let body = resp.text().await.map_err(ApiError::Network)?;
    if !status.is_success() {
        let err = error_from_body(status.as_u16(), &body);
        tracing::warn!(status = status.as_u16(), error = %err, "API request failed");
        return Err(err);
    }
    Ok(body)
}

fn error_from_body(status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    if status == 422 {
        return ApiError::Validation {
            message: parsed.message.unwrap_or_else(|| "Invalid field".to_string()),
            errors: parsed.errors,
        };
    }

    let message = parsed
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let text = body.trim();
            if text.is_empty() {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text.to_string()
            }
        });
    ApiError::Server { status, message }
}
