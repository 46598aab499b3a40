//! Building concrete requests from a descriptor and call arguments.

use std::fmt::Display;

use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

use crate::descriptor::{ParamRole, RequestDescriptor};
use crate::error::ClientError;

/// Characters escaped when a value is substituted into a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// A runtime argument, index-aligned with a descriptor's roles.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A value rendered as text (path, query or header)
    Text(String),
    /// An optional value that was `None`
    Absent,
    /// A serialized request body, or the serialization error
    Json(Result<Vec<u8>, String>),
    /// An argument that takes no part in the request (the completion handler)
    Skip,
}

impl Argument {
    pub fn text(value: &impl Display) -> Self {
        Argument::Text(value.to_string())
    }

    pub fn optional<T: Display>(value: Option<&T>) -> Self {
        value.map_or(Argument::Absent, |v| Argument::text(v))
    }

    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Self {
        Argument::Json(serde_json::to_vec(value).map_err(|e| e.to_string()))
    }
}

/// Join a base URL and a relative path template.
fn join(base_url: &Url, path: &str) -> String {
    let base = base_url.as_str().trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Build a request for one call.
///
/// `default_headers` are applied first, so header parameters override them.
pub fn build_request(
    base_url: &Url,
    descriptor: &RequestDescriptor,
    arguments: Vec<Argument>,
    default_headers: &HeaderMap,
) -> Result<http::Request<Vec<u8>>, ClientError> {
    let template = descriptor.relative_url();
    let fail = |message: String| ClientError::local(join(base_url, template), message);

    if arguments.len() != descriptor.roles().len() {
        return Err(fail(format!(
            "{} expects {} arguments, got {}",
            descriptor.method_name(),
            descriptor.roles().len(),
            arguments.len()
        )));
    }

    let mut path = template.to_string();
    let mut query: Vec<(&str, String)> = Vec::new();
    let mut headers = default_headers.clone();
    let mut body = Vec::new();

    for (role, argument) in descriptor.roles().iter().zip(arguments) {
        match (role, argument) {
            (ParamRole::Unclassified, _) | (_, Argument::Skip) => {}
            (ParamRole::Path(name), Argument::Text(value)) => {
                if value == "." || value == ".." {
                    return Err(fail(format!(
                        "invalid value `{value}` for path parameter `{name}`"
                    )));
                }
                let encoded = utf8_percent_encode(&value, PATH_SEGMENT).to_string();
                path = path.replace(&format!("{{{name}}}"), &encoded);
            }
            (ParamRole::Path(name), _) => {
                return Err(fail(format!("missing value for path parameter `{name}`")));
            }
            (ParamRole::Query(name), Argument::Text(value)) => query.push((name.as_str(), value)),
            (ParamRole::Header(name), Argument::Text(value)) => {
                let header_name = HeaderName::try_from(name.as_str())
                    .map_err(|e| fail(format!("invalid header name `{name}`: {e}")))?;
                let header_value = HeaderValue::try_from(value)
                    .map_err(|e| fail(format!("invalid value for header `{name}`: {e}")))?;
                headers.insert(header_name, header_value);
            }
            (ParamRole::Query(_) | ParamRole::Header(_), _) => {}
            (ParamRole::Body, Argument::Json(Ok(bytes))) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                body = bytes;
            }
            (ParamRole::Body, Argument::Json(Err(e))) => {
                return Err(fail(format!("failed to serialize request body: {e}")));
            }
            (ParamRole::Body, _) => {
                return Err(fail("request body must be JSON".to_string()));
            }
        }
    }

    let mut url = Url::parse(&join(base_url, &path))
        .map_err(|e| fail(format!("invalid request url: {e}")))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    let mut builder = http::Request::builder()
        .method(descriptor.http_method().clone())
        .uri(url.as_str());
    if let Some(request_headers) = builder.headers_mut() {
        request_headers.extend(headers);
    }

    builder
        .body(body)
        .map_err(|e| ClientError::local(url.as_str(), e))
}
