//! reqwest implementation of [`NotificationApi`].
//!
//! Every call builds exactly one request against `{base}/notifications...`,
//! attaches the bearer token, normalises and validates the JSON body, and maps
//! failures onto [`ApiError`].

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::schema::{self, Shape};
use super::NotificationApi;
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{AuthToken, CreateNotification, Notification, NotificationPage};

pub struct HttpNotificationApi {
    base: Url,
    http: Client,
}

impl HttpNotificationApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("market-notify/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(base_url, http)
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ApiError> {
        Self::new(&cfg.api_url, cfg.http_timeout())
    }

    pub fn with_client(base_url: &str, http: Client) -> Result<Self, ApiError> {
        // A trailing slash makes `Url::join` append instead of replacing the last segment.
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn request(&self, method: Method, url: Url, token: &AuthToken) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(token.expose())
            .header("Accept", "application/json")
            .header("x-request-id", uuid::Uuid::new_v4().to_string())
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status,
                body: body.chars().take(512).collect(),
            });
        }
        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(resp: Response, shape: Shape) -> Result<T, ApiError> {
        let body = resp.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        let value = schema::validate(shape, value)?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn get_notifications(
        &self,
        page: u32,
        page_size: u32,
        token: &AuthToken,
    ) -> Result<NotificationPage, ApiError> {
        let mut url = self.url("notifications")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &page_size.to_string());

        debug!(page, page_size, "fetching notifications");
        let resp = self.send(self.request(Method::GET, url, token)).await?;
        Self::decode(resp, Shape::Page).await
    }

    async fn create_notification(
        &self,
        input: &CreateNotification,
        token: &AuthToken,
    ) -> Result<Notification, ApiError> {
        let url = self.url("notifications")?;
        let resp = self
            .send(self.request(Method::POST, url, token).json(input))
            .await?;
        Self::decode(resp, Shape::Notification).await
    }

    async fn mark_as_read(&self, id: &str, token: &AuthToken) -> Result<Notification, ApiError> {
        let url = self.url(&format!("notifications/{}/read", urlencoding::encode(id)))?;
        let resp = self.send(self.request(Method::POST, url, token)).await?;
        Self::decode(resp, Shape::Notification).await
    }

    async fn delete_notification(&self, id: &str, token: &AuthToken) -> Result<(), ApiError> {
        let url = self.url(&format!("notifications/{}", urlencoding::encode(id)))?;
        self.send(self.request(Method::DELETE, url, token)).await?;
        Ok(())
    }

    async fn delete_all_notifications(&self, token: &AuthToken) -> Result<(), ApiError> {
        let url = self.url("notifications")?;
        self.send(self.request(Method::DELETE, url, token)).await?;
        Ok(())
    }
}
