//! Core types and runtime for courier.
//!
//! This crate turns method signatures into validated [`RequestDescriptor`]s and
//! executes them through a [`Transport`]. The `#[rest_client]` macro generates
//! code against it, but everything here works without the macro too.

pub mod callback;
pub mod client;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod request;
pub mod signature;
pub mod transport;
pub mod types;
pub mod verb;

pub use callback::Callback;
pub use client::RestClient;
pub use compiler::{DescriptorCompiler, compile};
pub use config::{ClientConfig, ConfigLoadError};
pub use descriptor::{ParamRole, RequestDescriptor, RoleKind, placeholders};
pub use error::{ClientError, ConfigError, ConfigErrorKind};
pub use request::{Argument, build_request};
pub use signature::{Annotation, AnnotationValue, MethodSignature, ParamSlot};
pub use transport::{Completion, Transport, TransportError};
pub use types::{HandlerHierarchy, TypeRef};
pub use verb::{PathExtractor, VerbRegistry, VerbRule};

#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;

pub use http;
