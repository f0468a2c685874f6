//! The HTTP seam underneath [crate::Client].

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Status and body of a completed HTTP exchange. The body is always read in
/// full so errors can carry it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, decoded as text.
    pub body: String,
}

impl HttpResponse {
    /// Build a response from a status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The two kinds of requests the Formlabs client needs to make.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST an `application/x-www-form-urlencoded` body.
    async fn post_form(&self, url: &str, form: &[(&str, &str)], timeout: Duration) -> Result<HttpResponse>;

    /// GET a JSON resource with the given `Authorization` header value.
    async fn get(&self, url: &str, authorization: &str, timeout: Duration) -> Result<HttpResponse>;
}

/// [Transport] backed by a shared [reqwest::Client].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wrap an existing reqwest client, sharing its connection pool.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_form(&self, url: &str, form: &[(&str, &str)], timeout: Duration) -> Result<HttpResponse> {
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status().as_u16();
        Ok(HttpResponse::new(status, resp.text().await?))
    }

    async fn get(&self, url: &str, authorization: &str, timeout: Duration) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status().as_u16();
        Ok(HttpResponse::new(status, resp.text().await?))
    }
}
