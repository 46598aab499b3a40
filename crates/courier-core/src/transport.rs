//! The transport seam.
//!
//! A [`Transport`] sends a fully built request and reports the raw response.
//! Pooling, retries and timeouts belong to the transport, not to courier.

/// Called exactly once with the outcome of a request.
pub type Completion = Box<dyn FnOnce(Result<http::Response<Vec<u8>>, TransportError>) + Send>;

/// Sends requests over the network.
pub trait Transport: Send + Sync + 'static {
    fn execute(&self, request: http::Request<Vec<u8>>, done: Completion);
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: http::Request<Vec<u8>>, done: Completion) {
        (**self).execute(request, done)
    }
}

/// A request that produced no HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use std::time::Duration;

    use tokio::runtime::Handle;

    use super::{Completion, Transport, TransportError};
    use crate::config::ClientConfig;

    /// [`Transport`] backed by `reqwest`, executing on a Tokio runtime.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
        runtime: Handle,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client, runtime: Handle) -> Self {
            Self { client, runtime }
        }

        /// Build a `reqwest` client from configuration, on the current runtime.
        ///
        /// Must be called from within a Tokio runtime.
        pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
            let runtime =
                Handle::try_current().map_err(|e| TransportError::Unavailable(e.to_string()))?;

            let mut builder =
                reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs));
            if let Some(user_agent) = &config.user_agent {
                builder = builder.user_agent(user_agent);
            }
            let client = builder
                .build()
                .map_err(|e| TransportError::Unavailable(e.to_string()))?;

            Ok(Self::new(client, runtime))
        }
    }

    impl Transport for ReqwestTransport {
        fn execute(&self, request: http::Request<Vec<u8>>, done: Completion) {
            let client = self.client.clone();
            self.runtime.spawn(async move {
                done(send(client, request).await);
            });
        }
    }

    async fn send(
        client: reqwest::Client,
        request: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, TransportError> {
        let request = reqwest::Request::try_from(request)
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let response = client.execute(request).await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Connection(e.to_string())
            }
        })?;

        let mut builder = http::Response::builder().status(response.status());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(response.headers().clone());
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        builder
            .body(body.to_vec())
            .map_err(|e| TransportError::Body(e.to_string()))
    }

    #[cfg(test)]
    mod tests {
        use wiremock::matchers::{header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        use super::*;

        #[tokio::test]
        async fn test_round_trip_against_mock_server() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/users/7"))
                .and(query_param("fields", "name"))
                .and(header("x-api-key", "secret"))
                .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"name":"Ada"}"#))
                .mount(&server)
                .await;

            let transport = ReqwestTransport::from_config(&ClientConfig::default()).unwrap();
            let request = http::Request::builder()
                .method("GET")
                .uri(format!("{}/users/7?fields=name", server.uri()))
                .header("x-api-key", "secret")
                .body(Vec::new())
                .unwrap();

            let (tx, rx) = tokio::sync::oneshot::channel();
            transport.execute(
                request,
                Box::new(move |result| {
                    let _ = tx.send(result);
                }),
            );

            let response = rx.await.unwrap().unwrap();
            assert_eq!(response.status(), 200);
            assert_eq!(response.body(), br#"{"name":"Ada"}"#);
        }

        #[test]
        fn test_from_config_requires_runtime() {
            let err = ReqwestTransport::from_config(&ClientConfig::default()).unwrap_err();
            assert!(matches!(err, TransportError::Unavailable(_)));
        }
    }
}
