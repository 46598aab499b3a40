//! Proc macros for courier.
//!
//! This crate provides the `#[rest_client]` attribute, which turns an annotated
//! trait into a typed HTTP client.

use courier_parse::ClientArgs;
use proc_macro::TokenStream;
use syn::{ItemTrait, parse_macro_input};

mod client;

/// Generate an HTTP client from a trait.
///
/// # Basic Usage
///
/// ```ignore
/// use courier::prelude::*;
///
/// #[rest_client]
/// pub trait UserApi {
///     #[get("/users/{id}")]
///     fn get_user(&self, #[path] id: u64, cb: impl Callback<User>);
///
///     #[get("/users")]
///     fn search(&self, #[query("q")] term: String, #[query] page: Option<u32>, cb: impl Callback<Vec<User>>);
///
///     #[post("/users")]
///     fn create_user(&self, #[header] auth_token: String, #[body] user: NewUser, cb: impl Callback<User>);
/// }
/// ```
///
/// Each method takes `&self`, returns `()` and names exactly one verb
/// (`get`, `post`, `put`, `delete`, `patch`, `head`, `options`). The last
/// parameter is the completion handler; its type argument is the response
/// payload.
///
/// # Parameter Roles
///
/// - `#[path("name")]` fills `{name}` in the path template
/// - `#[query("name")]` appends `?name=value`; `None` is skipped
/// - `#[header("Name")]` sets a request header; `None` is skipped
/// - `#[body]` serializes the value as the JSON request body
///
/// Without a name, `path` and `query` use the parameter name and `header`
/// its Train-Case form (`auth_token` → `Auth-Token`).
///
/// # Options
///
/// ```ignore
/// // Rename the generated struct (default: `{Trait}Client`)
/// #[rest_client(client = "GitHub")]
///
/// // Register extension verbs
/// #[rest_client(verbs(purge = "PURGE"))]
/// pub trait CacheApi {
///     #[purge("/cache/{key}")]
///     fn purge(&self, #[path] key: String, cb: impl Callback<()>);
/// }
/// ```
///
/// # Generated Items
///
/// - `UserApiClient<T: Transport>`, implementing `UserApi`
/// - `UserApiClient::new(RestClient<T>) -> Result<Self, ConfigError>`
/// - `signatures()`, `compiler()`, `descriptors()`, `descriptor(name)`
///
/// Misconfigured methods (missing verb, duplicate parameter names, a last
/// parameter that is not a completion handler, ...) are compile errors.
#[proc_macro_attribute]
pub fn rest_client(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ClientArgs);
    let item = parse_macro_input!(item as ItemTrait);

    match client::expand_rest_client(args, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
