//! Dispatching compiled descriptors through a transport.

use std::marker::PhantomData;
use std::sync::Arc;

use http::HeaderMap;
use serde::de::DeserializeOwned;
use url::Url;

use crate::callback::Callback;
use crate::config::{ClientConfig, ConfigLoadError};
use crate::descriptor::RequestDescriptor;
use crate::error::ClientError;
use crate::request::{Argument, build_request};
use crate::transport::{Transport, TransportError};

/// The runtime half of a generated client.
///
/// Holds the transport and the settings shared by every call. Cloning is
/// cheap; clones share the transport.
#[derive(Debug)]
pub struct RestClient<T> {
    transport: Arc<T>,
    base_url: Url,
    default_headers: HeaderMap,
    config: ClientConfig,
}

impl<T> Clone for RestClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            base_url: self.base_url.clone(),
            default_headers: self.default_headers.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T: Transport> RestClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Result<Self, ConfigLoadError> {
        let base_url = config.parsed_base_url()?;
        let default_headers = config.header_map()?;

        Ok(Self {
            transport: Arc::new(transport),
            base_url,
            default_headers,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request for one call without sending it.
    pub fn prepare(
        &self,
        descriptor: &RequestDescriptor,
        arguments: Vec<Argument>,
    ) -> Result<http::Request<Vec<u8>>, ClientError> {
        build_request(&self.base_url, descriptor, arguments, &self.default_headers)
    }

    /// Build, send, and complete `callback` with the decoded response.
    pub fn invoke<R, C>(&self, descriptor: &RequestDescriptor, arguments: Vec<Argument>, callback: C)
    where
        R: DeserializeOwned + 'static,
        C: Callback<R>,
    {
        let request = match self.prepare(descriptor, arguments) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(
                    method = %descriptor.method_name(),
                    error = %error,
                    "failed to build request"
                );
                callback.on_failure(error);
                return;
            }
        };

        let url = request.uri().to_string();
        tracing::debug!(
            method = %descriptor.method_name(),
            http_method = %request.method(),
            url = %url,
            "sending request"
        );

        let completion = Completion::<R, C> {
            url,
            callback,
            _payload: PhantomData,
        };
        self.transport
            .execute(request, Box::new(move |result| completion.finish(result)));
    }
}

/// Decodes a transport result and completes the caller's callback.
struct Completion<R, C> {
    url: String,
    callback: C,
    _payload: PhantomData<fn() -> R>,
}

impl<R, C> Completion<R, C>
where
    R: DeserializeOwned,
    C: Callback<R>,
{
    fn finish(self, result: Result<http::Response<Vec<u8>>, TransportError>) {
        let outcome = decode(&self.url, result);
        if let Err(error) = &outcome {
            tracing::debug!(url = %self.url, status = error.status(), error = %error, "request failed");
        }
        self.callback.complete(outcome);
    }
}

fn decode<R: DeserializeOwned>(
    url: &str,
    result: Result<http::Response<Vec<u8>>, TransportError>,
) -> Result<R, ClientError> {
    let response = result.map_err(|e| ClientError::local(url, e))?;
    let status = response.status();

    if !status.is_success() {
        let body = String::from_utf8_lossy(response.body()).trim().to_string();
        let message = if body.is_empty() {
            status.canonical_reason().map(str::to_string)
        } else {
            Some(body)
        };
        return Err(ClientError::new(url, message, status.as_u16()));
    }

    // An empty body decodes as `null`, so `()` and `Option<T>` payloads work.
    let body: &[u8] = if response.body().iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        response.body()
    };

    serde_json::from_slice(body).map_err(|e| {
        ClientError::new(
            url,
            Some(format!("failed to decode response: {e}")),
            status.as_u16(),
        )
    })
}
