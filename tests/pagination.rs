//! Pagination driver behaviour against a mock GitHub API.

mod support;

use std::time::{Duration, Instant};

use gh_search::paginate::paginate;
use gh_search::rate_limit::REMAINING_HEADER;
use gh_search::{QueryResults, RepoQueryResults, SearchError};
use reqwest::StatusCode;
use rstest::rstest;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{code_page, factory, next_link, params, repo_page, transport};

#[tokio::test]
async fn response_without_link_header_is_the_last_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(code_page(&[("org/x", "a.rs"), ("org/y", "b.rs")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let requests = factory(&server);
    let params = params("needle");
    let mut results = QueryResults::default();
    paginate(
        &transport(),
        &CancellationToken::new(),
        |page| requests.code_search(&params.with_page(page)),
        &mut results,
    )
    .await
    .expect("single page should succeed");

    assert_eq!(results.repository_hits, 2);
    assert_eq!(results.file_hits, 2);
}

#[tokio::test]
async fn next_link_page_is_followed_instead_of_incrementing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(repo_page(&["org/a"]))
                .insert_header("Link", next_link(&server, "/search/repositories", 5).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_page(&["org/wrong"])))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("page", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_page(&["org/b"])))
        .expect(1)
        .mount(&server)
        .await;

    let requests = factory(&server);
    let params = params("needle");
    let mut pages = Vec::new();
    let mut repos = RepoQueryResults::default();
    paginate(
        &transport(),
        &CancellationToken::new(),
        |page| {
            pages.push(page);
            requests.repo_search(&params.with_page(page))
        },
        &mut repos,
    )
    .await
    .expect("pagination should succeed");

    assert_eq!(pages, vec![1, 5]);
    assert_eq!(repos.repositories(), ["org/a", "org/b"]);
}

#[tokio::test]
async fn same_repository_on_two_pages_merges_paths_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(code_page(&[("org/x", "one.rs"), ("org/y", "two.rs")]))
                .insert_header("Link", next_link(&server, "/search/code", 2).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(code_page(&[("org/x", "three.rs")])))
        .mount(&server)
        .await;

    let requests = factory(&server);
    let params = params("needle");
    let mut results = QueryResults::default();
    paginate(
        &transport(),
        &CancellationToken::new(),
        |page| requests.code_search(&params.with_page(page)),
        &mut results,
    )
    .await
    .expect("pagination should succeed");

    assert_eq!(results.repository_hits, 2);
    assert_eq!(results.file_hits, 3);
    assert_eq!(results.repositories["org/x"], vec!["one.rs", "three.rs"]);
}

#[rstest]
#[case(403)]
#[case(404)]
#[case(422)]
#[case(500)]
#[tokio::test]
async fn non_success_status_aborts_with_code_and_body(#[case] status: u16) {
    let server = MockServer::start().await;
    let body = r#"{"message":"Validation Failed"}"#;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header(REMAINING_HEADER, "5")
                .set_body_string(body),
        )
        .expect(1)
        .mount(&server)
        .await;

    let requests = factory(&server);
    let params = params("needle");
    let mut results = QueryResults::default();
    let err = paginate(
        &transport(),
        &CancellationToken::new(),
        |page| requests.code_search(&params.with_page(page)),
        &mut results,
    )
    .await
    .unwrap_err();

    match err {
        SearchError::Page { page: 1, source } => match *source {
            SearchError::Status {
                status: got,
                body: got_body,
            } => {
                assert_eq!(got, StatusCode::from_u16(status).unwrap());
                assert_eq!(got_body, body);
            }
            other => panic!("unexpected error: {other}"),
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn undecodable_body_on_later_page_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(code_page(&[("org/x", "a.rs")]))
                .insert_header("Link", next_link(&server, "/search/code", 2).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let requests = factory(&server);
    let params = params("needle");
    let mut results = QueryResults::default();
    let err = paginate(
        &transport(),
        &CancellationToken::new(),
        |page| requests.code_search(&params.with_page(page)),
        &mut results,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SearchError::Page { page: 2, ref source } if matches!(**source, SearchError::Decode(_))
    ));
}

#[tokio::test]
async fn unparseable_link_page_is_an_error() {
    let server = MockServer::start().await;
    let link = format!(
        "<{}/search/code?q=needle&page=12345678901234>; rel=\"next\"",
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(code_page(&[]))
                .insert_header("Link", link.as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let requests = factory(&server);
    let params = params("needle");
    let mut results = QueryResults::default();
    let err = paginate(
        &transport(),
        &CancellationToken::new(),
        |page| requests.code_search(&params.with_page(page)),
        &mut results,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SearchError::Page { page: 1, ref source }
            if matches!(**source, SearchError::LinkPage { .. })
    ));
}

#[tokio::test]
async fn builder_failure_aborts_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut results = QueryResults::default();
    let err = paginate(
        &transport(),
        &CancellationToken::new(),
        |_| Err(SearchError::MissingToken),
        &mut results,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SearchError::Page { page: 1, ref source } if matches!(**source, SearchError::MissingToken)
    ));
}

#[tokio::test]
async fn cancelled_token_stops_before_first_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(code_page(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let requests = factory(&server);
    let params = params("needle");
    let mut results = QueryResults::default();
    let err = paginate(
        &transport(),
        &cancel,
        |page| requests.code_search(&params.with_page(page)),
        &mut results,
    )
    .await
    .unwrap_err();

    assert!(err.is_cancelled());
}

#[tokio::test]
async fn cancellation_mid_request_on_later_page_aborts_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(code_page(&[("org/x", "a.rs")]))
                .insert_header("Link", next_link(&server, "/search/code", 2).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/code"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(code_page(&[("org/y", "b.rs")]))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let requests = factory(&server);
    let params = params("needle");
    let mut results = QueryResults::default();
    let started = Instant::now();
    let err = paginate(
        &transport(),
        &cancel,
        |page| requests.code_search(&params.with_page(page)),
        &mut results,
    )
    .await
    .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(10));
}
