use std::sync::Arc;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tracing::debug;

use crate::config::Config;

const MAX_RESPONSE_BYTES: usize = 5_000_000;
const MAX_REDIRECTS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request failed: status {0}")]
    Status(u16),

    #[error("response too large (>{} bytes)", MAX_RESPONSE_BYTES)]
    TooLarge,

    #[error("blocked: host {0:?} not allowed")]
    ForeignHost(String),
}

/// Async GET capability used by every remote lookup.
///
/// Non-2xx responses are errors. Redirects are the implementation's concern.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TransportError>;
}

impl<T: Transport> Transport for Arc<T> {
    async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TransportError> {
        (**self).get(url, params).await
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/json;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pl,en;q=0.9"));

        let http = Client::builder()
            .user_agent(crate::USER_AGENT)
            .default_headers(headers)
            .connect_timeout(config.http_timeout)
            .timeout(config.http_timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { http })
    }

    #[cfg(test)]
    pub(crate) fn with_client(http: Client) -> Self {
        Self { http }
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<String, TransportError> {
        let target = build_url(url, params)?;
        let response = self.http.get(target).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length()
            && len as usize > MAX_RESPONSE_BYTES
        {
            return Err(TransportError::TooLarge);
        }

        let final_url = response.url().to_string();
        let mut body = Vec::new();
        let mut stream = response;
        while let Some(chunk) = stream.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() > MAX_RESPONSE_BYTES {
                return Err(TransportError::TooLarge);
            }
        }

        debug!(url = %final_url, bytes = body.len(), "response received");
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

fn build_url(url: &str, params: &[(&str, &str)]) -> Result<url::Url, url::ParseError> {
    if params.is_empty() {
        url::Url::parse(url)
    } else {
        url::Url::parse_with_params(url, params)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays canned responses in order and records every requested URL.
    /// Once the script is exhausted every call fails with status 503.
    pub(crate) struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, TransportError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<String, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing() -> Self {
            Self::new(Vec::new())
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str, _params: &[(&str, &str)]) -> Result<String, TransportError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::Status(503)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_encodes_params() {
        let url = build_url("https://example.com/search/", &[("term", "a b&c")]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/search/?term=a+b%26c");
    }

    #[test]
    fn build_url_without_params_keeps_url_verbatim() {
        let url = build_url("https://example.com/search/?term=cat", &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/search/?term=cat");
    }

    #[test]
    fn build_url_rejects_garbage() {
        assert!(build_url("not a url", &[]).is_err());
    }
}
