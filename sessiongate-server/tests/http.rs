//! End-to-end tests over a real socket

use serde_json::{json, Value};
use sessiongate_core::auth::SessionTokens;
use sessiongate_core::DEFAULT_NAMES;
use sessiongate_engine::StorageEngine;
use sessiongate_server::{AppState, SessionGateServer, DEFAULT_COOKIE_NAME};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const SECRET: &str = "http-test-key";

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn start_server() -> (SocketAddr, tempfile::TempDir) {
    let (engine, temp) = StorageEngine::temp().unwrap();
    let names = engine.names().unwrap();
    names.seed(&DEFAULT_NAMES).unwrap();

    let tokens = Arc::new(SessionTokens::new(Some(SECRET)));
    let server = SessionGateServer::new(AppState::new(names, tokens, DEFAULT_COOKIE_NAME));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve_listener(listener));

    (addr, temp)
}

async fn send(addr: SocketAddr, method: &str, path: &str, cookie: Option<&str>) -> Reply {
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut request = format!("{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n", method, path);
    if let Some(cookie) = cookie {
        request.push_str(&format!("Cookie: {}\r\n", cookie));
    }
    if method == "POST" {
        request.push_str("Content-Length: 0\r\n");
    }
    request.push_str("\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let mut lines = head.lines();
    let status = lines.next().unwrap().split_whitespace().nth(1).unwrap().parse().unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    Reply {
        status,
        headers,
        body: body.to_string(),
    }
}

fn session_cookie(payload: Value) -> String {
    let token = SessionTokens::new(Some(SECRET)).create_jwt(&payload, None).unwrap();
    format!("{}={}", DEFAULT_COOKIE_NAME, token)
}

#[tokio::test]
async fn names_are_listed_as_json() {
    let (addr, _temp) = start_server().await;
    let reply = send(addr, "GET", "/api/names", None).await;

    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("content-type"), Some("application/json"));

    let body = reply.json();
    let records = body.as_array().unwrap();
    let mut names: Vec<&str> = records.iter().map(|r| r["name"].as_str().unwrap()).collect();
    names.sort();
    assert_eq!(names, vec!["Andrew Mead", "Bob", "Charlie"]);
    assert!(records.iter().all(|r| r["id"].as_str().map(str::len) == Some(26)));
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let (addr, _temp) = start_server().await;

    let health = send(addr, "GET", "/health", None).await;
    assert_eq!(health.status, 200);
    assert_eq!(health.json()["status"], "healthy");

    let missing = send(addr, "GET", "/nowhere", None).await;
    assert_eq!(missing.status, 404);
    assert_eq!(missing.json(), json!({"error": "Not found"}));
}

#[tokio::test]
async fn me_requires_a_session_cookie() {
    let (addr, _temp) = start_server().await;

    let anonymous = send(addr, "GET", "/api/me", None).await;
    assert_eq!(anonymous.status, 401);
    assert!(anonymous.body.is_empty());

    let cookie = session_cookie(json!({"username": "Bob"}));
    let me = send(addr, "GET", "/api/me", Some(&cookie)).await;
    assert_eq!(me.status, 200);
    assert_eq!(me.json()["username"], "Bob");
}

#[tokio::test]
async fn refresh_sets_a_new_cookie() {
    let (addr, _temp) = start_server().await;
    let cookie = session_cookie(json!({"username": "Bob"}));

    let reply = send(addr, "POST", "/api/session/refresh", Some(&cookie)).await;
    assert_eq!(reply.status, 204);

    let set_cookie = reply.header("set-cookie").unwrap();
    assert!(set_cookie.starts_with(&format!("{}=", DEFAULT_COOKIE_NAME)));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));

    let token = set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
        .unwrap();
    let claims = SessionTokens::new(Some(SECRET)).payload_from_jwt(&token).unwrap();
    assert_eq!(claims.get("username"), Some(&json!("Bob")));
    assert_eq!(claims.jwt_id().map(str::len), Some(26));

    let me = send(addr, "GET", "/api/me", Some(&format!("{}={}", DEFAULT_COOKIE_NAME, token))).await;
    assert_eq!(me.status, 200);

    let rejected = send(addr, "POST", "/api/session/refresh", None).await;
    assert_eq!(rejected.status, 401);
}
