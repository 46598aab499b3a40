//! Descriptor compilation through the public API.

use courier::prelude::*;
use courier::{
    Annotation, ConfigErrorKind, DescriptorCompiler, HandlerHierarchy, MethodSignature,
    ParamRole, ParamSlot, RoleKind, TypeRef, compile, http,
};

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: u64,
}

#[rest_client]
pub trait UserApi {
    #[get("/users/{id}")]
    fn get_user(&self, #[path("id")] id: u64, cb: impl Callback<User>);

    #[post("/users")]
    fn create_user(
        &self,
        #[body] user: serde_json::Value,
        #[header("Auth")] token: String,
        cb: impl Callback<()>,
    );
}

fn callback(payload: TypeRef) -> ParamSlot {
    ParamSlot::new("cb", TypeRef::generic("Callback", [payload]))
}

fn method(verb: &str, path: &str) -> MethodSignature {
    MethodSignature::new("Api", "call").annotate(Annotation::new(verb, path))
}

#[test]
fn test_every_default_verb_compiles() {
    let verbs = [
        ("get", http::Method::GET),
        ("post", http::Method::POST),
        ("put", http::Method::PUT),
        ("delete", http::Method::DELETE),
        ("patch", http::Method::PATCH),
        ("head", http::Method::HEAD),
        ("options", http::Method::OPTIONS),
    ];

    for (verb, expected) in verbs {
        let signature = method(verb, "/things/{id}")
            .param(ParamSlot::new("id", TypeRef::named("u64")).annotate(Annotation::new("path", "id")))
            .param(callback(TypeRef::named("Thing")));

        let descriptor = compile(&signature).unwrap();
        assert_eq!(descriptor.http_method(), &expected, "verb {verb}");
        assert_eq!(descriptor.relative_url(), "/things/{id}");
    }
}

#[test]
fn test_generated_signatures_match_hand_written_ones() {
    let signatures = UserApiClient::<NoTransport>::signatures();

    let get_user = MethodSignature::new("UserApi", "get_user")
        .annotate(Annotation::new("get", "/users/{id}"))
        .param(ParamSlot::new("id", TypeRef::named("u64")).annotate(Annotation::new("path", "id")))
        .param(ParamSlot::new(
            "cb",
            TypeRef::bounded([TypeRef::generic("Callback", [TypeRef::named("User")])]),
        ));

    assert_eq!(signatures[0], get_user);
    assert_eq!(compile(&signatures[0]), compile(&get_user));
}

#[test]
fn test_body_header_and_handler_roles() {
    let descriptor = compile(&UserApiClient::<NoTransport>::signatures()[1]).unwrap();

    assert_eq!(descriptor.http_method(), http::Method::POST);
    assert_eq!(
        descriptor.roles(),
        &[
            ParamRole::Body,
            ParamRole::Header("Auth".into()),
            ParamRole::Unclassified
        ]
    );
    assert_eq!(descriptor.response_type(), Some(&TypeRef::named("()")));
    assert_eq!(descriptor.to_string(), "UserApi.create_user: POST /users");
}

#[test]
fn test_query_names_may_repeat_path_names() {
    let signature = method("get", "/users/{sort}")
        .param(ParamSlot::new("a", TypeRef::named("String")).annotate(Annotation::new("path", "sort")))
        .param(ParamSlot::new("b", TypeRef::named("String")).annotate(Annotation::new("query", "sort")))
        .param(callback(TypeRef::named("User")));
    assert!(compile(&signature).is_ok());

    let signature = method("get", "/users")
        .param(ParamSlot::new("a", TypeRef::named("String")).annotate(Annotation::new("query", "sort")))
        .param(ParamSlot::new("b", TypeRef::named("String")).annotate(Annotation::new("query", "sort")))
        .param(callback(TypeRef::named("User")));
    let err = compile(&signature).unwrap_err();
    assert_eq!(
        err.kind(),
        &ConfigErrorKind::DuplicateParameterName {
            role: RoleKind::Query,
            name: "sort".into(),
        }
    );
    assert_eq!(
        err.to_string(),
        "Api.call: duplicate query parameter name `sort`"
    );
}

#[test]
fn test_handler_subtypes() {
    // trait PageCallback<T>: Callback<Page<T>>
    let handlers = HandlerHierarchy::default().extend(
        "PageCallback",
        &["T"],
        TypeRef::generic("Callback", [TypeRef::generic("Page", [TypeRef::named("T")])]),
    );
    let compiler = DescriptorCompiler::default().with_handlers(handlers);

    let signature = method("get", "/users").param(ParamSlot::new(
        "cb",
        TypeRef::generic("PageCallback", [TypeRef::named("User")]),
    ));
    let descriptor = compiler.compile(&signature).unwrap();
    assert_eq!(
        descriptor.response_type(),
        Some(&TypeRef::generic("Page", [TypeRef::named("User")]))
    );

    let raw = method("get", "/users").param(ParamSlot::new("cb", TypeRef::named("PageCallback")));
    assert_eq!(compiler.compile(&raw).unwrap().response_type(), None);

    // Unknown to the default hierarchy.
    assert!(matches!(
        compile(&signature).unwrap_err().kind(),
        ConfigErrorKind::InvalidLastParameter { .. }
    ));
}

struct NoTransport;

impl Transport for NoTransport {
    fn execute(&self, _request: http::Request<Vec<u8>>, done: courier::Completion) {
        done(Err(TransportError::Unavailable("offline".into())));
    }
}
