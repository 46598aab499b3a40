//! Configuration errors and the per-call client error value.

use std::fmt;

use crate::descriptor::RoleKind;

/// A misconfigured client method, detected when descriptors are compiled.
///
/// These are programming errors: a client whose interface fails to compile
/// is never constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {kind}", self.location())]
pub struct ConfigError {
    /// Name of the declaring interface
    pub owner: String,
    /// Offending method, if the error is tied to one
    pub method: Option<String>,
    pub kind: ConfigErrorKind,
}

impl ConfigError {
    pub fn new(owner: impl Into<String>, method: impl Into<String>, kind: ConfigErrorKind) -> Self {
        Self {
            owner: owner.into(),
            method: Some(method.into()),
            kind,
        }
    }

    /// An error about the interface as a whole.
    pub fn interface(owner: impl Into<String>, kind: ConfigErrorKind) -> Self {
        Self {
            owner: owner.into(),
            method: None,
            kind,
        }
    }

    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }

    /// `Owner.method`, or just `Owner`.
    pub fn location(&self) -> String {
        match &self.method {
            Some(method) => format!("{}.{}", self.owner, method),
            None => self.owner.clone(),
        }
    }
}

/// What is wrong with a method declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigErrorKind {
    #[error("missing verb annotation (expected one of: {expected})")]
    MissingVerbAnnotation { expected: String },

    #[error("failed to extract string path from #[{annotation}] annotation")]
    MalformedVerbAnnotation { annotation: String },

    #[error("only one verb annotation is allowed, found #[{first}] and #[{second}]")]
    MultipleVerbAnnotations { first: String, second: String },

    #[error("no parameters declared, a completion handler must be the last parameter")]
    MissingParameters,

    #[error("last parameter must be a completion handler, found `{found}`")]
    InvalidLastParameter { found: String },

    #[error("duplicate {role} parameter name `{name}`")]
    DuplicateParameterName { role: RoleKind, name: String },

    #[error("parameter `{param}` has conflicting role annotations #[{first}] and #[{second}]")]
    ConflictingParameterRoles {
        param: String,
        first: RoleKind,
        second: RoleKind,
    },

    #[error("only one body parameter is allowed, found `{first}` and `{second}`")]
    MultipleBodyParameters { first: String, second: String },

    #[error("failed to extract string name from #[{role}] annotation on parameter `{param}`")]
    MalformedParameterAnnotation { param: String, role: RoleKind },

    #[error("`{verb}` is not a valid HTTP method")]
    UnknownHttpMethod { verb: String },
}

/// Error delivered to a completion handler when a call fails.
///
/// Covers transport failures (status 0), non-success responses and
/// (de)serialization failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    url: String,
    message: Option<String>,
    status: u16,
}

impl ClientError {
    pub fn new(url: impl Into<String>, message: Option<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            message,
            status,
        }
    }

    /// A failure that never produced an HTTP status.
    pub fn local(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::new(url, Some(message.to_string()), 0)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The error message, or `""` when none was supplied.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    /// HTTP status code; 0 when the request never got a response.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_transport(&self) -> bool {
        self.status == 0
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request failed")?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        write!(f, " (status code {}) for {}", self.status, self.url)
    }
}

impl std::error::Error for ClientError {}
