//! Integration tests for README retrieval against a mocked GitHub contents API

use core::time::Duration;
use repo_harvest::facts::hosting::Client;
use repo_harvest::facts::readme::ContentFetcher;
use repo_harvest::facts::{
    BatchRunner, BatchSettings, FetchOutcome, HostKind, NoProgress, RateLimiter, RepoSpec, RetryOrchestrator, RetryPolicy,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ALL_HOSTS: &[HostKind] = &[HostKind::GitHub, HostKind::GitLab];

fn client(server: &MockServer) -> Client {
    Client::new(Some("test-token"), server.uri(), Duration::from_secs(5), Duration::from_secs(5))
        .expect("client")
        .with_secondary_limit_wait(Duration::from_millis(20))
}

fn orchestrator(client: Client) -> RetryOrchestrator<Client> {
    RetryOrchestrator::new(
        RateLimiter::new(Duration::from_millis(10), Duration::from_millis(50)),
        client,
        RetryPolicy {
            max_attempts: 3,
            transient_delay: Duration::from_millis(10),
        },
    )
}

fn spec(url: &str) -> RepoSpec {
    RepoSpec::parse(url, ALL_HOSTS).expect("valid repository URL")
}

async fn mount_listing(server: &MockServer, owner: &str, repo: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{owner}/{repo}/contents/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_inline_readme_content() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "octo",
        "hello",
        json!([
            {"name": "src", "path": "src", "type": "dir"},
            {"name": "README.md", "path": "README.md", "type": "file",
             "encoding": "base64", "content": "IyBIZWxsbywgd29y\nbGQ7IGJ5ZQ==\n"}
        ]),
    )
    .await;

    let client = client(&server);
    let mut orchestrator = orchestrator(client.clone());
    let outcome = orchestrator
        .execute(&ContentFetcher::new(client), &spec("https://github.com/octo/hello"), &NoProgress)
        .await;

    match outcome {
        FetchOutcome::Success(text) => assert_eq!(text, "README_start\n# Hello  world  bye\nREADME_end"),
        other => panic!("expected a README, got {other:?}"),
    }
}

#[tokio::test]
async fn test_readme_through_download_link() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "octo",
        "linked",
        json!([
            {"name": "readme.rst", "path": "readme.rst", "type": "file",
             "download_url": format!("{}/raw/octo/linked/readme.rst", server.uri())}
        ]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/raw/octo/linked/readme.rst"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Linked;text"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut orchestrator = orchestrator(client.clone());
    let outcome = orchestrator
        .execute(&ContentFetcher::new(client), &spec("https://github.com/octo/linked"), &NoProgress)
        .await;

    assert!(matches!(outcome, FetchOutcome::Success(ref text) if text == "README_start\nLinked text\nREADME_end"));
}

#[tokio::test]
async fn test_missing_repository_is_skipped_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/gone/contents/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut orchestrator = orchestrator(client.clone());
    let outcome = orchestrator
        .execute(&ContentFetcher::new(client), &spec("https://github.com/octo/gone"), &NoProgress)
        .await;

    assert!(matches!(outcome, FetchOutcome::Skipped(_)));
}

#[tokio::test]
async fn test_repository_without_readme_is_skipped() {
    let server = MockServer::start().await;
    mount_listing(&server, "octo", "bare", json!([{"name": "main.c", "path": "main.c", "type": "file"}])).await;

    let client = client(&server);
    let mut orchestrator = orchestrator(client.clone());
    let outcome = orchestrator
        .execute(&ContentFetcher::new(client), &spec("https://github.com/octo/bare"), &NoProgress)
        .await;

    assert!(matches!(outcome, FetchOutcome::Skipped(ref reason) if reason.contains("no README")));
}

#[tokio::test]
async fn test_empty_repository_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/empty/contents/"))
        .respond_with(ResponseTemplate::new(409).set_body_string("Git Repository is empty."))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut orchestrator = orchestrator(client.clone());
    let outcome = orchestrator
        .execute(&ContentFetcher::new(client), &spec("https://github.com/octo/empty"), &NoProgress)
        .await;

    assert!(matches!(outcome, FetchOutcome::Skipped(_)));
}

#[tokio::test]
async fn test_server_errors_are_retried_until_attempts_run_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/flaky/contents/"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut orchestrator = orchestrator(client.clone());
    let outcome = orchestrator
        .execute(&ContentFetcher::new(client), &spec("https://github.com/octo/flaky"), &NoProgress)
        .await;

    assert!(matches!(outcome, FetchOutcome::Failed(_)));
}

#[tokio::test]
async fn test_rate_limited_response_waits_for_reset_then_succeeds() {
    let server = MockServer::start().await;

    // Reset already in the past, so the wait is just the safety margin.
    let reset = chrono::Utc::now().timestamp() - 5;
    Mock::given(method("GET"))
        .and(path("/repos/octo/busy/contents/"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str()),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        "octo",
        "busy",
        json!([{"name": "README", "path": "README", "type": "file", "encoding": "base64", "content": "b2s="}]),
    )
    .await;

    let client = client(&server);
    let mut orchestrator = orchestrator(client.clone());
    let outcome = orchestrator
        .execute(&ContentFetcher::new(client), &spec("https://github.com/octo/busy"), &NoProgress)
        .await;

    assert!(matches!(outcome, FetchOutcome::Success(ref text) if text == "README_start\nok\nREADME_end"));
    assert!(orchestrator.limiter().state().is_none());
}

#[tokio::test]
async fn test_secondary_rate_limit_with_quota_left_is_retried() {
    let server = MockServer::start().await;

    let reset = chrono::Utc::now().timestamp() + 3600;
    Mock::given(method("GET"))
        .and(path("/repos/octo/abuse/contents/"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "4000")
                .insert_header("x-ratelimit-reset", reset.to_string().as_str())
                .set_body_string("You have exceeded a secondary rate limit. Please wait a few minutes before you try again."),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        "octo",
        "abuse",
        json!([{"name": "README.md", "path": "README.md", "type": "file", "encoding": "base64", "content": "b2s="}]),
    )
    .await;

    let client = client(&server);
    let mut orchestrator = orchestrator(client.clone());
    let outcome = orchestrator
        .execute(&ContentFetcher::new(client), &spec("https://github.com/octo/abuse"), &NoProgress)
        .await;

    assert!(matches!(outcome, FetchOutcome::Success(ref text) if text == "README_start\nok\nREADME_end"));
}

#[tokio::test]
async fn test_batch_keeps_row_indexes_and_skips_gitlab() {
    let server = MockServer::start().await;
    for repo in ["one", "three"] {
        mount_listing(
            &server,
            "octo",
            repo,
            json!([{"name": "README.md", "path": "README.md", "type": "file", "encoding": "base64", "content": "aGk="}]),
        )
        .await;
    }

    let client = client(&server);
    let mut runner = BatchRunner::new(
        orchestrator(client.clone()),
        BatchSettings {
            pacing_delay: Duration::ZERO,
            ..BatchSettings::default()
        },
    );

    let urls = [
        "https://github.com/octo/one",
        "https://gitlab.com/octo/two",
        "https://github.com/octo/three",
        "not a url",
    ];
    let results = runner.run(&ContentFetcher::new(client), &urls, &NoProgress).await;

    let rows: Vec<usize> = results.iter().map(|(row, _)| row).collect();
    assert_eq!(rows, vec![0, 2]);
    assert_eq!(results.summary().skipped, 2);
    assert_eq!(results.get(2).map(String::as_str), Some("README_start\nhi\nREADME_end"));
}
