//! End-to-end tests against a mock HTTP server.

#![cfg(feature = "reqwest")]

use courier::prelude::*;
use tokio::sync::oneshot;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    pub name: String,
    pub stars: u32,
}

#[rest_client(client = "GitHub")]
pub trait RepoApi {
    #[get("/repos/{owner}")]
    fn list_repos(
        &self,
        #[path] owner: String,
        #[query] per_page: Option<u32>,
        cb: impl Callback<Vec<Repo>>,
    );

    #[put("/repos/{owner}/{name}")]
    fn save_repo(
        &self,
        #[path] owner: String,
        #[path] name: String,
        #[body] repo: Repo,
        cb: impl Callback<Repo>,
    );
}

async fn github(server: &MockServer) -> GitHub<ReqwestTransport> {
    let config = ClientConfig::new(server.uri()).with_header("x-api-key", "secret");
    let transport = ReqwestTransport::from_config(&config).unwrap();
    GitHub::new(RestClient::new(config, transport).unwrap()).unwrap()
}

#[tokio::test]
async fn test_list_repos() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/rhi-zone"))
        .and(query_param("per_page", "2"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "courier", "stars": 12},
            {"name": "relay", "stars": 3},
        ])))
        .mount(&server)
        .await;

    let api = github(&server).await;
    let (tx, rx) = oneshot::channel();
    api.list_repos("rhi-zone".into(), Some(2), move |result: Result<Vec<Repo>, ClientError>| {
        let _ = tx.send(result);
    });

    let repos = rx.await.unwrap().unwrap();
    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].name, "courier");
}

#[tokio::test]
async fn test_save_repo_sends_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/repos/rhi-zone/courier"))
        .and(body_json(serde_json::json!({"name": "courier", "stars": 13})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "courier",
            "stars": 13,
        })))
        .mount(&server)
        .await;

    let api = github(&server).await;
    let (tx, rx) = oneshot::channel();
    api.save_repo(
        "rhi-zone".into(),
        "courier".into(),
        Repo {
            name: "courier".into(),
            stars: 13,
        },
        move |result: Result<Repo, ClientError>| {
            let _ = tx.send(result);
        },
    );

    assert_eq!(rx.await.unwrap().unwrap().stars, 13);
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let api = github(&server).await;
    let (tx, rx) = oneshot::channel();
    api.list_repos("rhi-zone".into(), None, move |result: Result<Vec<Repo>, ClientError>| {
        let _ = tx.send(result);
    });

    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(err.status(), 503);
    assert_eq!(err.message(), "maintenance");
}
