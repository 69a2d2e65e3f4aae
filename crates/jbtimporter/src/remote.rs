//! HTTP client for Jira's Jelly runner
//!
//! Jira offers no API for this kind of import, so the client posts the same
//! forms a browser would and hands the returned pages to
//! [`jbtimporter_core::jelly`] for scanning. The two capabilities are traits so
//! the orchestrator can run against recorded behaviour in tests, or against a
//! real API client later.

use std::time::Duration;

use jbtimporter_core::config::ProxySettings;
use jbtimporter_core::jelly::{
    extract_token, parse_submission_response, ResponseError, ScriptOutcome, SecurityToken,
    FILE_FIELD, PASSWORD_FIELD, RUNNER_PATH, SCRIPT_FIELD, TOKEN_FIELD, TOKEN_PATH,
    USERNAME_FIELD,
};
use log::{debug, warn};

/// Jira login sent with every form.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed response from {url}: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: ResponseError,
    },
}

/// Obtains the security token required by script submissions.
#[allow(async_fn_in_trait)]
pub trait TokenProvider {
    async fn obtain_token(&self, credentials: &Credentials)
        -> Result<SecurityToken, TransportError>;
}

/// Submits one issue payload as a Jelly script.
#[allow(async_fn_in_trait)]
pub trait SubmissionClient {
    async fn submit(
        &self,
        token: &SecurityToken,
        credentials: &Credentials,
        payload: &str,
    ) -> Result<ScriptOutcome, TransportError>;
}

/// Talks to a Jira instance through its Jelly runner admin page.
///
/// The underlying client keeps cookies, so the token and the submissions that
/// use it travel in the same Jira session.
#[derive(Debug, Clone)]
pub struct JellyRunnerClient {
    client: reqwest::Client,
    base_url: String,
}

impl JellyRunnerClient {
    /// `base_url` must end with `/`; the Jelly runner paths are appended to it.
    pub fn new(
        base_url: &str,
        proxy: Option<&ProxySettings>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .user_agent(concat!("jbtimporter/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = proxy {
            debug!("Using proxy {}", proxy.url());
            builder = builder.proxy(reqwest::Proxy::all(proxy.url())?);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Post a form and return the page body.
    async fn post_form(
        &self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<String, TransportError> {
        let request_error = |source| TransportError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .map_err(request_error)?;

        // Jira renders its errors as regular pages, so the body is scanned either way.
        if !response.status().is_success() {
            warn!("{url} answered with HTTP {}", response.status());
        }

        response.text().await.map_err(request_error)
    }
}

impl TokenProvider for JellyRunnerClient {
    async fn obtain_token(
        &self,
        credentials: &Credentials,
    ) -> Result<SecurityToken, TransportError> {
        let url = self.url(TOKEN_PATH);
        let page = self
            .post_form(
                &url,
                &[
                    (USERNAME_FIELD, credentials.username.as_str()),
                    (PASSWORD_FIELD, credentials.password.as_str()),
                ],
            )
            .await?;

        Ok(extract_token(&page))
    }
}

impl SubmissionClient for JellyRunnerClient {
    async fn submit(
        &self,
        token: &SecurityToken,
        credentials: &Credentials,
        payload: &str,
    ) -> Result<ScriptOutcome, TransportError> {
        let url = self.url(RUNNER_PATH);
        let page = self
            .post_form(
                &url,
                &[
                    (USERNAME_FIELD, credentials.username.as_str()),
                    (PASSWORD_FIELD, credentials.password.as_str()),
                    (TOKEN_FIELD, token.as_str()),
                    (FILE_FIELD, ""),
                    (SCRIPT_FIELD, payload),
                ],
            )
            .await?;

        debug!("{url} returned {} bytes", page.len());

        parse_submission_response(&page)
            .map_err(|source| TransportError::MalformedResponse { url, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::http::{header, HeaderMap};
    use axum::response::{Html, IntoResponse};
    use axum::routing::post;
    use axum::{Form, Router};
    use jbtimporter_core::jelly::ScriptOutcomeKind;

    const SESSION_COOKIE: &str = "JSESSIONID=F00D";

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{address}/")
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        }
    }

    fn client(base_url: &str) -> JellyRunnerClient {
        JellyRunnerClient::new(base_url, None, Duration::from_secs(5)).unwrap()
    }

    async fn token_page(Form(fields): Form<HashMap<String, String>>) -> impl IntoResponse {
        let authenticated = fields.get(USERNAME_FIELD).map(String::as_str) == Some("admin")
            && fields.get(PASSWORD_FIELD).map(String::as_str) == Some("secret");

        let page = if authenticated {
            r#"<form><input type="hidden" name="atl_token" value="tok-123" /></form>"#
        } else {
            r#"<form action="login.jsp"><input name="os_username" /></form>"#
        };

        (
            [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
            Html(page),
        )
    }

    async fn runner_page(
        headers: HeaderMap,
        Form(fields): Form<HashMap<String, String>>,
    ) -> Html<String> {
        let has_session = headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|cookie| cookie.contains(SESSION_COOKIE));
        let token_ok = fields.get(TOKEN_FIELD).map(String::as_str) == Some("tok-123");
        let file_empty = fields.get(FILE_FIELD).map(String::as_str) == Some("");
        let script = fields.get(SCRIPT_FIELD).cloned().unwrap_or_default();

        let output = if has_session && token_ok && file_empty {
            format!("received {} bytes", script.len())
        } else {
            "rejected".to_string()
        };

        Html(format!(
            "<pre>&lt;JiraJelly xmlns:j='jelly:core'&gt;{output}&lt;/JiraJelly&gt;</pre>"
        ))
    }

    fn router() -> Router {
        Router::new()
            .route(&format!("/{TOKEN_PATH}"), post(token_page))
            .route(&format!("/{RUNNER_PATH}"), post(runner_page))
    }

    #[tokio::test]
    async fn test_obtain_token() {
        let base_url = serve(router()).await;

        let token = client(&base_url).obtain_token(&credentials()).await.unwrap();

        assert_eq!(token.as_str(), "tok-123");
    }

    #[tokio::test]
    async fn test_obtain_token_bad_login_gives_empty_token() {
        let base_url = serve(router()).await;
        let wrong = Credentials {
            username: "admin".to_string(),
            password: "wrong".to_string(),
        };

        let token = client(&base_url).obtain_token(&wrong).await.unwrap();

        assert!(token.is_empty());
    }

    #[tokio::test]
    async fn test_submit_reuses_session_and_token() {
        let base_url = serve(router()).await;
        let jira = client(&base_url);
        let token = jira.obtain_token(&credentials()).await.unwrap();

        let outcome = jira
            .submit(&token, &credentials(), "<JiraJelly/>")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ScriptOutcome::new(ScriptOutcomeKind::Executed, "received 12 bytes")
        );
    }

    #[tokio::test]
    async fn test_submit_malformed_page() {
        let router = Router::new().route(
            &format!("/{RUNNER_PATH}"),
            post(|| async { Html("<pre>&lt;JiraJelly xmlns:j='jelly:core'&gt;cut off") }),
        );
        let base_url = serve(router).await;

        let result = client(&base_url)
            .submit(&SecurityToken::new("t"), &credentials(), "<x/>")
            .await;

        assert!(matches!(
            result,
            Err(TransportError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let result = client(&format!("http://{address}/"))
            .obtain_token(&credentials())
            .await;

        assert!(matches!(result, Err(TransportError::Request { .. })));
    }
}
