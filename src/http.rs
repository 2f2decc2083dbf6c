//! Outbound HTTP seam shared by the Graph and Twilio clients.
//!
//! Every provider call is described as an [`HttpRequest`] and handed to an
//! [`HttpTransport`]. Production uses [`ReqwestTransport`]; tests swap in an
//! in-memory transport that records requests and replays scripted responses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// How a request authenticates against the provider.
#[derive(Clone, PartialEq, Eq)]
pub enum HttpAuth {
    None,
    Bearer(String),
    Basic { user: String, password: String },
}

impl std::fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpAuth::None => f.write_str("None"),
            HttpAuth::Bearer(_) => f.write_str("Bearer(***)"),
            HttpAuth::Basic { user, .. } => write!(f, "Basic({user}:***)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    Empty,
    Form(Vec<(String, String)>),
    Json(Value),
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub auth: HttpAuth,
    pub body: HttpBody,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            auth: HttpAuth::None,
            body: HttpBody::Empty,
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = HttpAuth::Bearer(token.into());
        self
    }

    pub fn basic(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = HttpAuth::Basic {
            user: user.into(),
            password: password.into(),
        };
        self
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = HttpBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = HttpBody::Json(body);
        self
    }

    /// Value of a form field, if the body is form-encoded and carries it.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            HttpBody::Form(fields) => fields
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Raw provider response. Status is kept so callers can build provider errors.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Build the shared client with a fixed timeout. Provider calls such as
    /// bundle creation can be slow, so the timeout is generous.
    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::new(http))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let mut builder = self.http.request(request.method.clone(), &request.url);

        builder = match &request.auth {
            HttpAuth::None => builder,
            HttpAuth::Bearer(token) => builder.bearer_auth(token),
            HttpAuth::Basic { user, password } => builder.basic_auth(user, Some(password)),
        };

        builder = match &request.body {
            HttpBody::Empty => builder,
            HttpBody::Form(fields) => builder.form(fields),
            HttpBody::Json(value) => builder.json(value),
        };

        let target = log_target(&request.url);
        let response = builder.send().await.map_err(|err| {
            let err = err.without_url();
            tracing::error!(method = %request.method, url = %target, "Provider request failed: {err}");
            AppError::Http(err)
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::Http(err.without_url()))?;
        tracing::debug!(method = %request.method, url = %target, status, "Provider responded");

        Ok(HttpResponse { status, body })
    }
}

/// URL without its query string. Graph calls carry secrets and tokens in
/// the query, so only this form is logged.
fn log_target(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.split('?').next().unwrap_or_default().to_string(),
    }
}

/// Append query parameters to a URL, percent-encoding the values.
pub fn with_query<'a>(
    base: &str,
    params: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<String, AppError> {
    let url = url::Url::parse_with_params(base, params)
        .map_err(|err| AppError::validation(format!("Invalid provider URL `{base}`: {err}")))?;
    Ok(url.into())
}

#[cfg(test)]
pub mod mock {
    //! Scripted transport for service tests.

    use std::sync::{Arc, Mutex};

    use super::*;

    struct Rule {
        method: Method,
        fragment: String,
        status: u16,
        body: String,
        used: bool,
    }

    /// Answers requests from a list of rules matched on method and URL
    /// substring, preferring the longest matching fragment. Rules sharing a
    /// fragment answer in order, and the last one keeps answering once all
    /// are consumed. Unmatched requests get a 404.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        rules: Arc<Mutex<Vec<Rule>>>,
        captured: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on(self, method: Method, fragment: &str, status: u16, body: Value) -> Self {
            self.on_raw(method, fragment, status, &body.to_string())
        }

        pub fn on_raw(self, method: Method, fragment: &str, status: u16, body: &str) -> Self {
            self.rules.lock().unwrap().push(Rule {
                method,
                fragment: fragment.to_string(),
                status,
                body: body.to_string(),
                used: false,
            });
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.captured.lock().unwrap().clone()
        }

        pub fn count(&self) -> usize {
            self.captured.lock().unwrap().len()
        }

        /// Requests whose URL contains `fragment`.
        pub fn matching(&self, fragment: &str) -> Vec<HttpRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.url.contains(fragment))
                .collect()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
            self.captured.lock().unwrap().push(request.clone());

            let mut rules = self.rules.lock().unwrap();
            let matches = |r: &Rule| r.method == request.method && request.url.contains(&r.fragment);

            let longest = rules
                .iter()
                .filter(|r| matches(r))
                .map(|r| r.fragment.len())
                .max();
            let candidate = |r: &Rule| matches(r) && Some(r.fragment.len()) == longest;

            let index = rules
                .iter()
                .position(|r| !r.used && candidate(r))
                .or_else(|| rules.iter().rposition(|r| candidate(r)));

            match index {
                Some(i) => {
                    let rule = &mut rules[i];
                    rule.used = true;
                    Ok(HttpResponse {
                        status: rule.status,
                        body: rule.body.clone(),
                    })
                }
                None => Ok(HttpResponse {
                    status: 404,
                    body: format!(
                        "{{\"message\":\"no mock for {} {}\"}}",
                        request.method, request.url
                    ),
                }),
            }
        }
    }
}
