//! Integration tests for fetch and validation chains against a local HTTP
//! responder.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use reqwest::Client;
use sequent_fetch::{
  FetchError, JsonSink, ValidationDocument, ValidationKind, ValidatorEndpoints, fetch_chain,
  fetch_json, validate, validation_chain,
};
use sequent_runner::{RunCallbacks, RunOutcome, SequentialRunner};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A request as seen by the test server.
#[derive(Debug, Clone)]
struct Recorded {
  method: String,
  path: String,
  content_type: Option<String>,
  body: String,
}

struct TestServer {
  addr: SocketAddr,
  requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
  fn url(&self, path: &str) -> String {
    format!("http://{}{}", self.addr, path)
  }

  fn requests(&self) -> Vec<Recorded> {
    self.requests.lock().unwrap().clone()
  }
}

/// Serve canned responses: `/posts/<n>` returns JSON, `/broken` returns
/// invalid JSON, `/nu/` and `/css-validator/validator` answer with a
/// validator verdict, anything else is a 404.
async fn spawn_server() -> TestServer {
  let listener = TcpListener::bind("127.0.0.1:0")
    .await
    .expect("failed to bind test server");
  let addr = listener.local_addr().expect("listener has an address");
  let requests: Arc<Mutex<Vec<Recorded>>> = Arc::default();
  let log = requests.clone();

  tokio::spawn(async move {
    loop {
      let Ok((mut socket, _)) = listener.accept().await else {
        return;
      };
      let log = log.clone();
      tokio::spawn(async move {
        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        let header_end = loop {
          if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
          }
          match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
          }
        };

        let head = String::from_utf8_lossy(&request[..header_end]).to_string();
        let header = |name: &str| {
          head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key
              .trim()
              .eq_ignore_ascii_case(name)
              .then(|| value.trim().to_string())
          })
        };
        let content_length: usize = header("content-length")
          .and_then(|value| value.parse().ok())
          .unwrap_or(0);
        while request.len() < header_end + content_length {
          match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
          }
        }

        let mut request_line = head.split_whitespace();
        let method = request_line.next().unwrap_or("GET").to_string();
        let path = request_line.next().unwrap_or("/").to_string();
        let body = &request[header_end..header_end + content_length];
        let body = String::from_utf8_lossy(body).to_string();
        log.lock().unwrap().push(Recorded {
          method,
          path: path.clone(),
          content_type: header("content-type"),
          body,
        });

        let route = path.split('?').next().unwrap_or("/");
        let (status, body) = if let Some(id) = route.strip_prefix("/posts/") {
          ("200 OK", format!(r#"{{"id":{id},"title":"post {id}"}}"#))
        } else if route == "/broken" {
          ("200 OK", "not json".to_string())
        } else if route == "/nu/" {
          ("200 OK", r#"{"messages":[]}"#.to_string())
        } else if route == "/css-validator/validator" {
          ("200 OK", r#"{"cssvalidation":{"validity":true}}"#.to_string())
        } else {
          ("404 Not Found", String::new())
        };

        let response = format!(
          "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
          body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
      });
    }
  });

  TestServer { addr, requests }
}

fn test_client() -> Client {
  Client::builder()
    .no_proxy()
    .build()
    .expect("failed to build client")
}

fn collecting_sink() -> (JsonSink, Arc<Mutex<Vec<(String, serde_json::Value)>>>) {
  let received: Arc<Mutex<Vec<(String, serde_json::Value)>>> = Arc::default();
  let r = received.clone();
  let sink: JsonSink = Arc::new(move |url: &str, body: serde_json::Value| {
    r.lock().unwrap().push((url.to_string(), body));
  });
  (sink, received)
}

#[tokio::test]
async fn test_fetch_json_success() {
  let addr = spawn_server().await.addr;
  let body = fetch_json(&test_client(), &format!("http://{addr}/posts/7"))
    .await
    .expect("fetch should succeed");

  assert_eq!(body["id"], 7);
  assert_eq!(body["title"], "post 7");
}

#[tokio::test]
async fn test_fetch_json_status_error() {
  let addr = spawn_server().await.addr;
  let url = format!("http://{addr}/missing");
  let err = fetch_json(&test_client(), &url).await.unwrap_err();

  assert!(matches!(err, FetchError::Status { status: 404, .. }));
  assert_eq!(
    err.to_string(),
    format!("failed to fetch from {url} with status: 404")
  );
}

#[tokio::test]
async fn test_fetch_json_decode_error() {
  let addr = spawn_server().await.addr;
  let err = fetch_json(&test_client(), &format!("http://{addr}/broken"))
    .await
    .unwrap_err();

  assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn test_fetch_json_invalid_url() {
  let err = fetch_json(&test_client(), "not a url").await.unwrap_err();
  assert!(matches!(err, FetchError::Request { .. }));
}

#[tokio::test]
async fn test_chain_fetches_in_order() {
  let addr = spawn_server().await.addr;
  let urls: Vec<String> = (1..=3)
    .map(|id| format!("http://{addr}/posts/{id}"))
    .collect();
  let (sink, received) = collecting_sink();

  let tasks = fetch_chain(&test_client(), urls.clone(), sink);
  let report = SequentialRunner::default()
    .run(tasks, RunCallbacks::new(|| {}).on_error(|_, _| {}))
    .expect("failed to start run")
    .wait()
    .await
    .expect("run should finish");

  assert_eq!(report.outcome, RunOutcome::Completed);
  let received = received.lock().unwrap().clone();
  let fetched: Vec<String> = received.iter().map(|(url, _)| url.clone()).collect();
  assert_eq!(fetched, urls);
  assert_eq!(received[2].1["id"], 3);
}

#[tokio::test]
async fn test_chain_stops_on_first_failure() {
  let addr = spawn_server().await.addr;
  let urls = vec![
    format!("http://{addr}/posts/1"),
    format!("http://{addr}/missing"),
    format!("http://{addr}/posts/3"),
  ];
  let (sink, received) = collecting_sink();
  let failures: Arc<Mutex<Vec<usize>>> = Arc::default();

  let f = failures.clone();
  let tasks = fetch_chain(&test_client(), urls, sink);
  let report = SequentialRunner::default()
    .run(
      tasks,
      RunCallbacks::new(|| {}).on_error(move |_, index| f.lock().unwrap().push(index)),
    )
    .expect("failed to start run")
    .wait()
    .await
    .expect("run should finish");

  assert!(matches!(report.outcome, RunOutcome::Failed { index: 1, .. }));
  assert_eq!(report.items_invoked, 2);
  assert_eq!(received.lock().unwrap().len(), 1);
  assert_eq!(failures.lock().unwrap().clone(), vec![1]);
}

fn local_endpoints(server: &TestServer) -> ValidatorEndpoints {
  ValidatorEndpoints {
    markup: server.url("/nu/?out=json"),
    css: server.url("/css-validator/validator?output=json"),
  }
}

#[tokio::test]
async fn test_validate_html_posts_markup() {
  let server = spawn_server().await;
  let html = "<!DOCTYPE html><title>t</title>";

  let verdict = validate(
    &test_client(),
    &server.url("/nu/?out=json"),
    ValidationKind::Html,
    html,
  )
  .await
  .expect("validation should succeed");

  assert_eq!(verdict["messages"], serde_json::json!([]));
  let requests = server.requests();
  assert_eq!(requests.len(), 1);
  assert_eq!(requests[0].method, "POST");
  assert_eq!(requests[0].path, "/nu/?out=json");
  assert_eq!(
    requests[0].content_type.as_deref(),
    Some("text/html; charset=utf-8")
  );
  assert_eq!(requests[0].body, html);
}

#[tokio::test]
async fn test_validate_css_posts_urlencoded_text() {
  let server = spawn_server().await;

  let verdict = validate(
    &test_client(),
    &server.url("/css-validator/validator?output=json"),
    ValidationKind::Css,
    "a { color: red; }",
  )
  .await
  .expect("validation should succeed");

  assert_eq!(verdict["cssvalidation"]["validity"], true);
  let requests = server.requests();
  assert_eq!(requests[0].method, "POST");
  assert_eq!(
    requests[0].content_type.as_deref(),
    Some("application/x-www-form-urlencoded")
  );
  assert_eq!(requests[0].body, "text=a+%7B+color%3A+red%3B+%7D");
}

#[tokio::test]
async fn test_validation_chain_runs_in_order() {
  let server = spawn_server().await;
  let (sink, received) = collecting_sink();
  let documents = vec![
    ValidationDocument::new("index.html", ValidationKind::Html, "<p>hi</p>"),
    ValidationDocument::new("site.css", ValidationKind::Css, "p{}"),
    ValidationDocument::new("logo.svg", ValidationKind::Svg, "<svg/>"),
  ];

  let tasks = validation_chain(&test_client(), &local_endpoints(&server), documents, sink);
  let report = SequentialRunner::default()
    .run(tasks, RunCallbacks::new(|| {}).on_error(|_, _| {}))
    .expect("failed to start run")
    .wait()
    .await
    .expect("run should finish");

  assert_eq!(report.outcome, RunOutcome::Completed);
  let names: Vec<String> = received
    .lock()
    .unwrap()
    .iter()
    .map(|(name, _)| name.clone())
    .collect();
  assert_eq!(names, vec!["index.html", "site.css", "logo.svg"]);

  let content_types: Vec<Option<String>> = server
    .requests()
    .into_iter()
    .map(|request| request.content_type)
    .collect();
  assert_eq!(
    content_types,
    vec![
      Some("text/html; charset=utf-8".to_string()),
      Some("application/x-www-form-urlencoded".to_string()),
      Some("image/svg+xml; charset=utf-8".to_string()),
    ]
  );
}

#[tokio::test]
async fn test_validation_failure_fails_continuation() {
  let server = spawn_server().await;
  let (sink, received) = collecting_sink();
  let endpoints = ValidatorEndpoints {
    markup: server.url("/nu/?out=json"),
    css: server.url("/missing"),
  };
  let documents = vec![
    ValidationDocument::new("site.css", ValidationKind::Css, "p{}"),
    ValidationDocument::new("index.html", ValidationKind::Html, "<p>hi</p>"),
  ];
  let failures: Arc<Mutex<Vec<(usize, String)>>> = Arc::default();

  let f = failures.clone();
  let tasks = validation_chain(&test_client(), &endpoints, documents, sink);
  let report = SequentialRunner::default()
    .run(
      tasks,
      RunCallbacks::new(|| {}).on_error(move |err, index| {
        f.lock().unwrap().push((index, err.to_string()));
      }),
    )
    .expect("failed to start run")
    .wait()
    .await
    .expect("run should finish");

  assert!(matches!(report.outcome, RunOutcome::Failed { index: 0, .. }));
  assert!(received.lock().unwrap().is_empty());
  assert_eq!(server.requests().len(), 1);
  let failures = failures.lock().unwrap().clone();
  assert_eq!(failures.len(), 1);
  assert!(failures[0].1.contains("status: 404"));
}
