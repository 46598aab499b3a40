//! Courier - declarative REST clients for Rust
//!
//! Courier takes an **interface-first** approach: declare the API as a trait,
//! annotate each method with its verb, path and parameter roles, and
//! `#[rest_client]` generates a client that implements it.
//!
//! # Quick Start
//!
//! ```ignore
//! use courier::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[rest_client]
//! pub trait UserApi {
//!     /// Get user by ID
//!     #[get("/users/{id}")]
//!     fn get_user(&self, #[path] id: u64, cb: impl Callback<User>);
//!
//!     /// Search users
//!     #[get("/users")]
//!     fn search(&self, #[query("q")] term: String, #[query] limit: Option<u32>, cb: impl Callback<Vec<User>>);
//! }
//!
//! let config = ClientConfig::load("client.toml")?.with_env_overrides()?;
//! let transport = ReqwestTransport::from_config(&config)?;
//! let api = UserApiClient::new(RestClient::new(config, transport)?)?;
//!
//! api.get_user(7, |result: Result<User, ClientError>| match result {
//!     Ok(user) => println!("{}", user.name),
//!     Err(err) => eprintln!("{err}"),
//! });
//! ```
//!
//! # How It Works
//!
//! Each method is compiled into a [`RequestDescriptor`]: the HTTP method,
//! the path template, the response payload type and one [`ParamRole`] per
//! parameter. Compilation happens when the macro expands (so mistakes are
//! compile errors) and again when the client is constructed. Every call
//! then builds its request from the descriptor and the argument values,
//! sends it through a [`Transport`] and completes the [`Callback`].
//!
//! | Annotation | Effect |
//! |------------|--------|
//! | `#[get("/path")]`, `#[post(..)]`, ... | HTTP method and path template |
//! | `#[path("name")]` | substituted into `{name}` |
//! | `#[query("name")]` | appended as `?name=value` |
//! | `#[header("Name")]` | sent as a request header |
//! | `#[body]` | serialized as the JSON body |
//!
//! # Without the Macro
//!
//! The compiler works on plain [`MethodSignature`]s, so interfaces can also
//! be described at runtime:
//!
//! ```
//! use courier::{Annotation, MethodSignature, ParamRole, ParamSlot, TypeRef, compile};
//!
//! let signature = MethodSignature::new("UserApi", "get_user")
//!     .annotate(Annotation::new("get", "/users/{id}"))
//!     .param(ParamSlot::new("id", TypeRef::named("u64")).annotate(Annotation::new("path", "id")))
//!     .param(ParamSlot::new("cb", TypeRef::generic("Callback", [TypeRef::named("User")])));
//!
//! let descriptor = compile(&signature).unwrap();
//! assert_eq!(descriptor.relative_url(), "/users/{id}");
//! assert_eq!(descriptor.roles()[0], ParamRole::Path("id".into()));
//! assert_eq!(descriptor.response_type(), Some(&TypeRef::named("User")));
//! ```
//!
//! # Features
//!
//! - `config` (default): load [`ClientConfig`] from TOML files
//! - `reqwest`: `ReqwestTransport`, a [`Transport`] running on Tokio

pub use courier_macros::rest_client;

// Re-export core types
pub use courier_core::*;

// Re-export serde for user payload types
pub use serde;
pub use serde_json;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::rest_client;

    pub use super::{
        Callback, ClientConfig, ClientError, ConfigError, RequestDescriptor, RestClient, Transport,
        TransportError,
    };

    #[cfg(feature = "reqwest")]
    pub use super::ReqwestTransport;

    pub use serde::{Deserialize, Serialize};
}
