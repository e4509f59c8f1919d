//! End-to-end tests for the repository passthrough endpoints
//!
//! Unlike the catalog, repositories are not mirrored locally: every request
//! goes straight to the upstream.

mod common;

use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn repos_are_served_from_the_upstream() {
    let server = TestServer::spawn().await;
    server.upstream.add_repo(repo_json("mirror-server"));
    server.upstream.add_repo(repo_json("dotfiles"));
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_repos().await;
    assert_eq!(response.status(), StatusCode::OK);
    let repos: Value = response.json().await.unwrap();
    assert_eq!(repos.as_array().unwrap().len(), 2);
    assert_eq!(repos[0]["name"], "mirror-server");
    assert_eq!(repos[0]["url"], "https://github.test/owner-1/mirror-server");
    assert_eq!(repos[0]["stars"], 12);
    assert_eq!(repos[0]["forks"], 3);
    assert_eq!(repos[1]["name"], "dotfiles");

    // No local mirror, a second read goes upstream again
    let response = client.get_repos().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        server
            .upstream
            .counters
            .repo_list_fetches
            .load(Ordering::SeqCst),
        2
    );
}

#[tokio::test]
async fn repo_languages_are_served_per_repo() {
    let server = TestServer::spawn().await;
    server.upstream.add_repo_languages(
        "owner-1",
        "mirror-server",
        json!({"Rust": 123_456, "Shell": 2_000}),
    );
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_repo_languages("owner-1", "mirror-server").await;
    assert_eq!(response.status(), StatusCode::OK);
    let languages: Value = response.json().await.unwrap();
    assert_eq!(languages["Rust"], 123_456);
    assert_eq!(languages["Shell"], 2_000);
    assert_eq!(
        server
            .upstream
            .counters
            .language_fetches
            .load(Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn unknown_repo_languages_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get_repo_languages("owner-1", "does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
