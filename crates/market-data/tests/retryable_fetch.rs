use std::time::{Duration, Instant};

use reqwest::Method;
use tradeboard_market_data::{MarketDataError, RequestOptions, RetryPolicy, RetryableFetch};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Short delays so retry tests stay fast.
fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, 10, 50, 2.0)
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

#[tokio::test]
async fn always_500_makes_exactly_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let fetch = RetryableFetch::new();
    let result = fetch
        .fetch_with_retry(
            &format!("{}/quote", server.uri()),
            &RequestOptions::get(),
            Some(&fast_policy(3)),
        )
        .await;

    match result {
        Err(MarketDataError::RetriesExhausted {
            attempts,
            last_failure,
        }) => {
            assert_eq!(attempts, 3);
            assert!(last_failure.contains("500"));
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn bad_request_fails_after_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let fetch = RetryableFetch::new();
    let result = fetch
        .fetch_with_retry(
            &format!("{}/quote", server.uri()),
            &RequestOptions::get(),
            Some(&fast_policy(5)),
        )
        .await;

    assert!(matches!(
        result,
        Err(MarketDataError::RequestFailed { status: 400, .. })
    ));
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn not_found_and_unauthorized_are_not_retried() {
    for status in [401u16, 403, 404, 422] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let result = RetryableFetch::new()
            .fetch_with_retry(&server.uri(), &RequestOptions::get(), Some(&fast_policy(4)))
            .await;

        match result {
            Err(MarketDataError::RequestFailed { status: got, .. }) => assert_eq!(got, status),
            other => panic!("expected RequestFailed for {}, got {:?}", status, other),
        }
        assert_eq!(request_count(&server).await, 1);
    }
}

#[tokio::test]
async fn rate_limit_honors_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
        .mount(&server)
        .await;

    let started = Instant::now();
    let response = RetryableFetch::new()
        .fetch_with_retry(
            &format!("{}/quote", server.uri()),
            &RequestOptions::get(),
            Some(&fast_policy(3)),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(request_count(&server).await, 2);
    // Computed backoff would have been 10ms; the server asked for a full second
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn rate_limit_without_retry_after_uses_computed_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let policy = RetryPolicy::new(3, 300, 1_000, 2.0);
    let started = Instant::now();
    let response = RetryableFetch::new()
        .fetch_with_retry(&server.uri(), &RequestOptions::get(), Some(&policy))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(request_count(&server).await, 2);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn empty_retry_after_is_not_a_zero_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", ""))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let policy = RetryPolicy::new(2, 250, 250, 1.0);
    let started = Instant::now();
    RetryableFetch::new()
        .fetch_with_retry(&server.uri(), &RequestOptions::get(), Some(&policy))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(250));
}

#[tokio::test]
async fn request_timeout_status_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(408))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .mount(&server)
        .await;

    let response = RetryableFetch::new()
        .fetch_with_retry(&server.uri(), &RequestOptions::get(), Some(&fast_policy(3)))
        .await
        .unwrap();

    assert_eq!(response.body, "done");
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn query_params_keep_declared_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/quote"))
        .and(query_param("key1", "value1"))
        .and(query_param("key2", "value2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::get()
        .param("key1", "value1")
        .param("key2", "value2");
    let response = RetryableFetch::new()
        .fetch_with_retry(&format!("{}/quote", server.uri()), &options, None)
        .await
        .unwrap();

    assert!(response.url.ends_with("/quote?key1=value1&key2=value2"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("key1=value1&key2=value2"));
}

#[tokio::test]
async fn method_headers_and_body_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .and(header("x-api-key", "secret"))
        .and(body_string("{\"symbol\":\"AAPL\"}"))
        .respond_with(ResponseTemplate::new(201).set_body_string("{\"id\":7}"))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::post("{\"symbol\":\"AAPL\"}").header("x-api-key", "secret");
    let response = RetryableFetch::new()
        .fetch_with_retry(&format!("{}/orders", server.uri()), &options, None)
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["id"], 7);
}

#[tokio::test]
async fn deadline_stops_before_a_long_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let policy = RetryPolicy::new(5, 2_000, 2_000, 2.0);
    let options = RequestOptions::get().deadline(Duration::from_millis(200));

    let started = Instant::now();
    let result = RetryableFetch::new()
        .fetch_with_retry(&server.uri(), &options, Some(&policy))
        .await;

    match result {
        Err(MarketDataError::DeadlineExceeded {
            attempts,
            last_failure,
        }) => {
            assert_eq!(attempts, 1);
            assert!(last_failure.unwrap().contains("503"));
        }
        other => panic!("expected DeadlineExceeded, got {:?}", other),
    }
    assert_eq!(request_count(&server).await, 1);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn deadline_cuts_off_a_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let options = RequestOptions::get().deadline(Duration::from_millis(200));

    let started = Instant::now();
    let result = RetryableFetch::new()
        .fetch_with_retry(&server.uri(), &options, Some(&fast_policy(3)))
        .await;

    match result {
        Err(MarketDataError::DeadlineExceeded {
            attempts,
            last_failure,
        }) => {
            assert_eq!(attempts, 1);
            assert!(last_failure.is_none());
        }
        other => panic!("expected DeadlineExceeded, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn deadline_during_a_retry_keeps_the_earlier_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let options = RequestOptions::get().deadline(Duration::from_millis(300));

    let started = Instant::now();
    let result = RetryableFetch::new()
        .fetch_with_retry(&server.uri(), &options, Some(&fast_policy(3)))
        .await;

    match result {
        Err(MarketDataError::DeadlineExceeded {
            attempts,
            last_failure,
        }) => {
            assert_eq!(attempts, 2);
            assert!(last_failure.unwrap().contains("502"));
        }
        other => panic!("expected DeadlineExceeded, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn per_call_policy_overrides_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let fetch = RetryableFetch::with_timeout(fast_policy(4), Duration::from_secs(5));

    let result = fetch
        .fetch_with_retry(&server.uri(), &RequestOptions::get(), None)
        .await;
    assert!(matches!(
        result,
        Err(MarketDataError::RetriesExhausted { attempts: 4, .. })
    ));

    let result = fetch
        .fetch_with_retry(
            &server.uri(),
            &RequestOptions::get(),
            Some(&RetryPolicy::single_attempt()),
        )
        .await;
    assert!(matches!(
        result,
        Err(MarketDataError::RetriesExhausted { attempts: 1, .. })
    ));

    assert_eq!(request_count(&server).await, 5);
}

#[tokio::test]
async fn explicit_method_is_used() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = RetryableFetch::new()
        .fetch_with_retry(
            &server.uri(),
            &RequestOptions::new().method(Method::DELETE),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.status, 204);
    assert!(response.body.is_empty());
}
