/// Integration tests for request execution against mock HTTP targets
use segi9::logging::NoopSink;
use segi9::{ConfigCell, EffectiveConfig, ErrorKind, ExportError, RequestExecutor};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::{
    matchers::{basic_auth, bearer_token, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const KEY: &str = "segi9.http";

fn executor(timeout_seconds: u64) -> RequestExecutor {
    let config = EffectiveConfig {
        timeout_seconds,
        skip_tls_verify: false,
    };
    RequestExecutor::new(Arc::new(ConfigCell::new(config)), Arc::new(NoopSink))
}

fn params(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Target with open, basic-protected and bearer-protected routes
async fn setup_target() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/basic"))
        .and(basic_auth("user", "pass"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/basic"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"bad credentials"}"#))
        .with_priority(10)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bearer"))
        .and(bearer_token("token123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bearer"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"bad token"}"#))
        .with_priority(10)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_no_auth_returns_body_and_sends_json_content_type() {
    let server = setup_target().await;
    let url = format!("{}/status", server.uri());

    let body = executor(5).execute(KEY, &params(&[&url])).await.unwrap();
    assert_eq!(body, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn test_basic_auth_round_trip() {
    let server = setup_target().await;
    let url = format!("{}/basic", server.uri());

    let body = executor(5)
        .execute(KEY, &params(&[&url, "basic", "user", "pass"]))
        .await
        .unwrap();
    assert_eq!(body, r#"{"status":"ok"}"#);

    // Rejected credentials are still a successful export of the 401 body
    let body = executor(5)
        .execute(KEY, &params(&[&url, "Basic", "wrong", "wrong"]))
        .await
        .unwrap();
    assert_eq!(body, r#"{"error":"bad credentials"}"#);
}

#[tokio::test]
async fn test_bearer_auth_round_trip() {
    let server = setup_target().await;
    let url = format!("{}/bearer", server.uri());

    let body = executor(5)
        .execute(KEY, &params(&[&url, "bearer", "token123"]))
        .await
        .unwrap();
    assert_eq!(body, r#"{"status":"ok"}"#);

    let body = executor(5)
        .execute(KEY, &params(&[&url, "BEARER", "nope"]))
        .await
        .unwrap();
    assert_eq!(body, r#"{"error":"bad token"}"#);
}

#[tokio::test]
async fn test_server_error_body_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let body = executor(5).execute(KEY, &params(&[&server.uri()])).await.unwrap();
    assert_eq!(body, "maintenance");
}

#[tokio::test]
async fn test_non_utf8_body_is_decoded_lossily() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'o', b'k', 0xff]))
        .mount(&server)
        .await;

    let body = executor(5).execute(KEY, &params(&[&server.uri()])).await.unwrap();
    assert!(body.starts_with("ok"));
}

#[tokio::test]
async fn test_parameter_errors_precede_network() {
    let exec = executor(5);

    let err = exec.execute(KEY, &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParams);

    let err = exec.execute(KEY, &params(&[""])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParams);

    // No server is needed: the mode is rejected before any connection
    let err = exec
        .execute(KEY, &params(&["http://127.0.0.1:1/", "digest", "user", "secret-pass"]))
        .await
        .unwrap_err();
    match &err {
        ExportError::UnsupportedAuth { mode } => assert_eq!(mode, "digest"),
        other => panic!("expected UnsupportedAuth, got {:?}", other),
    }
    assert!(!err.to_string().contains("secret-pass"));
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let start = Instant::now();
    let err = executor(1)
        .execute(KEY, &params(&[&server.uri()]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert!(err.to_string().contains("timed out"), "got: {}", err);
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = executor(2)
        .execute(KEY, &params(&[&format!("http://{}/", addr)]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkError);
}

#[tokio::test]
async fn test_truncated_body_is_read_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf).await;
        // Promise 100 bytes, deliver 7, then hang up
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
            .await
            .unwrap();
        stream.flush().await.unwrap();
    });

    let err = executor(5)
        .execute(KEY, &params(&[&format!("http://{}/", addr)]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReadError);
}

#[tokio::test]
async fn test_concurrent_exports_do_not_block_each_other() {
    let server = MockServer::start().await;
    for route in ["/a", "/b", "/c"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(route)
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;
    }

    let cell = Arc::new(ConfigCell::default());
    let exec = Arc::new(RequestExecutor::new(cell.clone(), Arc::new(NoopSink)));

    let start = Instant::now();
    let mut handles = Vec::new();
    for route in ["/a", "/b", "/c"] {
        let exec = exec.clone();
        let url = format!("{}{}", server.uri(), route);
        handles.push(tokio::spawn(async move {
            exec.execute(KEY, &[url]).await
        }));
    }

    // A reconfigure in the middle only swaps the shared value
    cell.set(EffectiveConfig {
        timeout_seconds: 3,
        skip_tls_verify: false,
    });

    for (handle, route) in handles.into_iter().zip(["/a", "/b", "/c"]) {
        assert_eq!(handle.await.unwrap().unwrap(), route);
    }
    assert!(
        start.elapsed() < Duration::from_millis(2000),
        "exports ran serially: {:?}",
        start.elapsed()
    );
    assert_eq!(cell.get().timeout_seconds, 3);
}
