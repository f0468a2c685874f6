use std::{fmt, sync::Arc, time::Duration};

use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error, ReqwestTransport, Result, Token, TokenCache, Transport, DEFAULT_BASE_URL, PRINTERS_PATH, TOKEN_PATH,
};

const TOKEN_TIMEOUT: Duration = Duration::from_secs(20);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// OAuth2 client credentials for the developer api.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The client id issued by the Formlabs dashboard.
    pub client_id: String,

    /// The matching client secret.
    pub client_secret: String,
}

impl Credentials {
    /// Create a new set of credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Client is a connection to the Formlabs developer api.
///
/// Clones share the same transport and token cache.
#[derive(Clone)]
pub struct Client {
    credentials: Credentials,
    base_url: String,
    transport: Arc<dyn Transport>,
    token: Arc<TokenCache>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new handle to the developer api at [DEFAULT_BASE_URL].
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_owned(),
            transport: Arc::new(ReqwestTransport::default()),
            token: Arc::new(TokenCache::new()),
        }
    }

    /// Point the client at a different api root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Swap the HTTP transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Return the api root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Return the credentials this client authenticates with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return the cached access token, performing the client-credentials
    /// exchange if there is none.
    pub async fn get_token(&self) -> Result<Token> {
        self.token.get_or_fetch(|| self.fetch_token()).await
    }

    /// Forget the cached access token.
    pub async fn invalidate_token(&self) {
        self.token.invalidate().await
    }

    async fn fetch_token(&self) -> Result<Token> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        tracing::debug!(url = %url, "requesting access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];
        let resp = self.transport.post_form(&url, &form, TOKEN_TIMEOUT).await?;

        if resp.status != 200 {
            tracing::warn!(status = resp.status, "token exchange rejected");
            return Err(Error::Authentication {
                status: resp.status,
                body: resp.body,
            });
        }

        let Ok(payload) = serde_json::from_str::<TokenResponse>(&resp.body) else {
            return Err(Error::Authentication {
                status: resp.status,
                body: resp.body,
            });
        };

        match payload.access_token.filter(|token| !token.is_empty()) {
            Some(access_token) => Ok(Token::new(access_token, payload.token_type)),
            None => Err(Error::Authentication {
                status: resp.status,
                body: resp.body,
            }),
        }
    }

    /// Perform an authenticated GET and decode the JSON body.
    ///
    /// A 401 or 403 drops the cached token before the error is returned, so
    /// the following call starts with a fresh exchange. The cache is only
    /// cleared if it still holds the token that was rejected. Nothing is
    /// retried here.
    async fn request(&self, path: &str) -> Result<Value> {
        let token = self.get_token().await?;
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "requesting");

        let resp = self.transport.get(&url, &token.authorization(), REQUEST_TIMEOUT).await?;

        if resp.status >= 400 {
            if matches!(resp.status, 401 | 403) {
                self.token.invalidate_if(&token).await;
            }
            return Err(Error::Api {
                status: resp.status,
                path: path.to_owned(),
                body: resp.body,
            });
        }

        serde_json::from_str(&resp.body).map_err(|source| Error::Decode {
            path: path.to_owned(),
            source,
        })
    }

    /// List every printer registered to the account. Each printer is
    /// returned exactly as the api sent it.
    pub async fn list_printers(&self) -> Result<Vec<Value>> {
        match self.request(PRINTERS_PATH).await? {
            Value::Array(printers) => Ok(printers),
            _ => Err(Error::UnexpectedShape {
                path: PRINTERS_PATH.to_owned(),
                expected: "a JSON array of printers",
            }),
        }
    }

    /// Check the credentials with a full round trip: token exchange, then a
    /// printer listing. Returns how many printers the account can see.
    pub async fn validate(&self) -> Result<usize> {
        self.get_token().await?;
        Ok(self.list_printers().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testresult::TestResult;
    use tokio::sync::Notify;

    use super::*;
    use crate::HttpResponse;

    /// Scripted transport. Queued responses are handed out in order; once a
    /// queue runs dry a successful default is returned.
    #[derive(Default)]
    struct MockTransport {
        token_responses: Mutex<VecDeque<HttpResponse>>,
        get_responses: Mutex<VecDeque<HttpResponse>>,
        token_calls: AtomicUsize,
        get_calls: AtomicUsize,
        forms: Mutex<Vec<Vec<(String, String)>>>,
        requests: Mutex<Vec<(String, String)>>,
        /// When set, the next GET waits for this before answering.
        held_get: Mutex<Option<Arc<Notify>>>,
    }

    impl MockTransport {
        fn push_token(&self, resp: HttpResponse) {
            self.token_responses.lock().unwrap().push_back(resp);
        }

        fn push_get(&self, resp: HttpResponse) {
            self.get_responses.lock().unwrap().push_back(resp);
        }

        fn token_calls(&self) -> usize {
            self.token_calls.load(Ordering::SeqCst)
        }

        fn get_calls(&self) -> usize {
            self.get_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn post_form(&self, url: &str, form: &[(&str, &str)], _timeout: Duration) -> Result<HttpResponse> {
            let n = self.token_calls.fetch_add(1, Ordering::SeqCst);
            assert!(url.ends_with(TOKEN_PATH), "unexpected token url {}", url);
            self.forms
                .lock()
                .unwrap()
                .push(form.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect());

            Ok(self.token_responses.lock().unwrap().pop_front().unwrap_or_else(|| {
                HttpResponse::new(
                    200,
                    json!({"access_token": format!("token-{}", n), "token_type": "Bearer"}).to_string(),
                )
            }))
        }

        async fn get(&self, url: &str, authorization: &str, _timeout: Duration) -> Result<HttpResponse> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((url.to_owned(), authorization.to_owned()));

            let held = self.held_get.lock().unwrap().take();
            if let Some(gate) = held {
                gate.notified().await;
            }

            Ok(self
                .get_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| HttpResponse::new(200, "[]")))
        }
    }

    fn client(transport: &Arc<MockTransport>) -> Client {
        Client::new(Credentials::new("id", "secret"))
            .with_base_url("https://api.example.test/developer/v1/")
            .with_transport(transport.clone())
    }

    #[tokio::test]
    async fn test_token_is_reused_without_second_request() -> TestResult {
        let transport = Arc::new(MockTransport::default());
        let client = client(&transport);

        let first = client.get_token().await?;
        let second = client.get_token().await?;

        assert_eq!(first, second);
        assert_eq!(transport.token_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_token_request_is_a_client_credentials_grant() -> TestResult {
        let transport = Arc::new(MockTransport::default());
        client(&transport).get_token().await?;

        let forms = transport.forms.lock().unwrap().clone();
        assert_eq!(
            forms,
            vec![vec![
                ("grant_type".to_owned(), "client_credentials".to_owned()),
                ("client_id".to_owned(), "id".to_owned()),
                ("client_secret".to_owned(), "secret".to_owned()),
            ]]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_token_server_error_is_authentication_error() {
        let transport = Arc::new(MockTransport::default());
        transport.push_token(HttpResponse::new(500, "upstream exploded"));

        let err = client(&transport).get_token().await.unwrap_err();
        match &err {
            Error::Authentication { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body, "upstream exploded");
            }
            other => panic!("expected authentication error, got {:?}", other),
        }
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[tokio::test]
    async fn test_token_response_without_access_token_is_rejected() {
        let transport = Arc::new(MockTransport::default());
        transport.push_token(HttpResponse::new(200, r#"{"token_type": "Bearer"}"#));
        transport.push_token(HttpResponse::new(200, r#"{"access_token": ""}"#));
        transport.push_token(HttpResponse::new(200, "not json"));

        let client = client(&transport);
        for _ in 0..3 {
            assert!(matches!(
                client.get_token().await,
                Err(Error::Authentication { status: 200, .. })
            ));
        }
        assert_eq!(transport.token_calls(), 3);
    }

    #[tokio::test]
    async fn test_token_type_is_used_in_authorization_header() -> TestResult {
        let transport = Arc::new(MockTransport::default());
        transport.push_token(HttpResponse::new(200, r#"{"access_token": "xyz", "token_type": "bearer"}"#));

        client(&transport).list_printers().await?;

        let requests = transport.requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![(
                "https://api.example.test/developer/v1/printers/".to_owned(),
                "bearer xyz".to_owned()
            )]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_list_printers_returns_raw_objects() -> TestResult {
        let transport = Arc::new(MockTransport::default());
        let printers = json!([
            {"serial": "Form4-A", "printer_status": {"status": "IDLE"}},
            {"serial": "Form3-B", "cartridge_status": []},
        ]);
        transport.push_get(HttpResponse::new(200, printers.to_string()));

        let listed = client(&transport).list_printers().await?;
        assert_eq!(Value::Array(listed), printers);
        Ok(())
    }

    #[tokio::test]
    async fn test_unauthorized_listing_clears_token() -> TestResult {
        let transport = Arc::new(MockTransport::default());
        transport.push_get(HttpResponse::new(401, "token expired"));
        let client = client(&transport);

        let err = client.list_printers().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(transport.token_calls(), 1);
        assert_eq!(transport.get_calls(), 1);

        // The failing call does not retry on its own.
        assert_eq!(client.token.cached().await, None);

        // The next caller re-authenticates.
        let token = client.get_token().await?;
        assert_eq!(token.access_token(), "token-1");
        assert_eq!(transport.token_calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_forbidden_listing_clears_token() {
        let transport = Arc::new(MockTransport::default());
        transport.push_get(HttpResponse::new(403, "nope"));
        let client = client(&transport);

        assert!(client.list_printers().await.is_err());
        assert_eq!(client.token.cached().await, None);
    }

    #[tokio::test]
    async fn test_late_rejection_keeps_refreshed_token() -> TestResult {
        let transport = Arc::new(MockTransport::default());
        let gate = Arc::new(Notify::new());
        *transport.held_get.lock().unwrap() = Some(gate.clone());
        transport.push_get(HttpResponse::new(401, "token expired"));
        let client = Arc::new(client(&transport));

        let pending = tokio::spawn({
            let client = client.clone();
            async move { client.list_printers().await }
        });
        while transport.get_calls() == 0 {
            tokio::task::yield_now().await;
        }

        // Another caller refreshes while the first request is in flight.
        client.invalidate_token().await;
        let fresh = client.get_token().await?;
        assert_eq!(fresh.access_token(), "token-1");

        gate.notify_one();
        let err = pending.await?.unwrap_err();
        assert!(err.is_unauthorized());

        assert_eq!(client.token.cached().await, Some(fresh));
        assert_eq!(transport.token_calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_server_error_keeps_token() -> TestResult {
        let transport = Arc::new(MockTransport::default());
        transport.push_get(HttpResponse::new(502, "bad gateway"));
        let client = client(&transport);

        match client.list_printers().await {
            Err(Error::Api { status, path, body }) => {
                assert_eq!(status, 502);
                assert_eq!(path, "/printers/");
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected api error, got {:?}", other),
        }

        assert!(client.token.cached().await.is_some());
        client.list_printers().await?;
        assert_eq!(transport.token_calls(), 1);
        assert_eq!(transport.get_calls(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_array_listing_is_rejected() {
        let transport = Arc::new(MockTransport::default());
        transport.push_get(HttpResponse::new(200, r#"{"results": []}"#));
        transport.push_get(HttpResponse::new(200, "<html>"));
        let client = client(&transport);

        assert!(matches!(
            client.list_printers().await,
            Err(Error::UnexpectedShape { .. })
        ));
        assert!(matches!(client.list_printers().await, Err(Error::Decode { .. })));
    }

    #[tokio::test]
    async fn test_validate_round_trip() -> TestResult {
        let transport = Arc::new(MockTransport::default());
        transport.push_get(HttpResponse::new(200, r#"[{"serial": "A"}, {"serial": "B"}]"#));

        assert_eq!(client(&transport).validate().await?, 2);
        assert_eq!(transport.token_calls(), 1);
        assert_eq!(transport.get_calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_validate_fails_on_bad_credentials() {
        let transport = Arc::new(MockTransport::default());
        transport.push_token(HttpResponse::new(401, r#"{"error": "invalid_client"}"#));

        assert!(matches!(
            client(&transport).validate().await,
            Err(Error::Authentication { status: 401, .. })
        ));
        assert_eq!(transport.get_calls(), 0);
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let debug = format!("{:?}", Credentials::new("id", "hunter2"));
        assert!(debug.contains("id"));
        assert!(!debug.contains("hunter2"));
    }
}
