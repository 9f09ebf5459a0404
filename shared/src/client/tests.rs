use super::*;
use crate::date::tests::ManualClock;
use crate::http::mock::MockHttpClient;
use crate::protocol::{CreateLinkRequest, ListLinksRequest, LoginRequest, UnlockLinkRequest};
use crate::session::MemoryStore;
use futures::channel::oneshot;
use serde_json::json;
use std::cell::Cell;

// =========================================================
// 辅助函数
// =========================================================

const BASE: &str = "https://api.test";

fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

fn test_user() -> User {
    User {
        id: "u1".into(),
        email: "owner@example.com".into(),
        balance: 7.5,
        is_admin: false,
        email_verified: true,
        payout_method: None,
        payout_address: None,
    }
}

fn create_client(
    transport: &MockHttpClient,
) -> (ApiClient<MockHttpClient, MemoryStore>, ManualClock) {
    let config = ClientConfig {
        api_base: format!("{}/", BASE),
        ..ClientConfig::default()
    };
    let clock = ManualClock::default();
    let client = ApiClient::with_clock(
        &config,
        transport.clone(),
        MemoryStore::default(),
        clock.clone(),
    );
    (client, clock)
}

// =========================================================
// 鉴权头
// =========================================================

#[tokio::test]
async fn test_bearer_token_attached_when_signed_in() {
    let transport = MockHttpClient::new();
    transport.mock_response(HttpMethod::Get, &url("/admin/users"), 200, json!([]));
    let (client, _) = create_client(&transport);

    client.get("/admin/users").await.unwrap();
    client.sign_in("tok-1".into(), test_user());
    client.get("/admin/users").await.unwrap();

    let reqs = transport.requests();
    assert_eq!(reqs.len(), 2);
    assert!(!reqs[0].headers.contains_key(HEADER_AUTHORIZATION));
    assert_eq!(
        reqs[1].headers.get(HEADER_AUTHORIZATION).map(String::as_str),
        Some("Bearer tok-1")
    );
}

// =========================================================
// 缓存
// =========================================================

#[tokio::test]
async fn test_cacheable_get_served_from_cache_within_ttl() {
    let transport = MockHttpClient::new();
    transport.mock_response(HttpMethod::Get, &url("/stats"), 200, json!({ "total_clicks": 3 }));
    let (client, clock) = create_client(&transport);

    client.get("/stats").await.unwrap();
    clock.advance(Duration::from_secs(59));
    let second = client.get("/stats").await.unwrap();

    assert_eq!(transport.request_count(), 1);
    assert_eq!(second.status, 200);
}

#[tokio::test]
async fn test_cache_expires_after_ttl() {
    let transport = MockHttpClient::new();
    transport.mock_response(HttpMethod::Get, &url("/cpm-rates"), 200, json!([]));
    let (client, clock) = create_client(&transport);

    client.get("/cpm-rates").await.unwrap();
    clock.advance(Duration::from_secs(60));
    client.get("/cpm-rates").await.unwrap();

    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_non_allow_listed_path_is_never_cached() {
    let transport = MockHttpClient::new();
    transport.mock_response(HttpMethod::Get, &url("/l/abc"), 200, json!({ "title": "t" }));
    let (client, _) = create_client(&transport);

    client.get("/l/abc").await.unwrap();
    client.get("/l/abc").await.unwrap();

    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_failed_response_is_not_cached() {
    let transport = MockHttpClient::new();
    transport.mock_response(HttpMethod::Get, &url("/stats"), 500, json!({ "error": "boom" }));
    let (client, _) = create_client(&transport);

    let err = client.get("/stats").await.unwrap_err();
    assert_eq!(err.message(), "boom");

    transport.mock_response(HttpMethod::Get, &url("/stats"), 200, json!({}));
    client.get("/stats").await.unwrap();
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_concurrent_identical_requests_are_collapsed() {
    let transport = MockHttpClient::new();
    transport.mock_response(HttpMethod::Get, &url("/links"), 200, json!([]));
    let (tx, rx) = oneshot::channel();
    transport.hold_until(rx);
    let (client, _) = create_client(&transport);

    let first = client.get("/links");
    let second = client.get("/links");
    let release = async move {
        let _ = tx.send(());
    };
    let (a, b, _) = futures::join!(first, second, release);

    assert!(a.is_ok());
    assert_eq!(a, b);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_mutation_evicts_related_cache_entries() {
    let transport = MockHttpClient::new();
    transport.mock_response(HttpMethod::Get, &url("/links"), 200, json!([]));
    transport.mock_response(HttpMethod::Get, &url("/cpm-rates"), 200, json!([]));
    transport.mock_response(
        HttpMethod::Post,
        &url("/links"),
        201,
        json!({ "id": "1", "short_code": "abc", "original_url": "https://example.com" }),
    );
    let (client, _) = create_client(&transport);

    client.send(&ListLinksRequest).await.unwrap();
    client.get("/cpm-rates").await.unwrap();
    let created = client
        .send(&CreateLinkRequest {
            original_url: "https://example.com".into(),
            title: None,
        })
        .await
        .unwrap();
    assert_eq!(created.short_code, "abc");

    client.send(&ListLinksRequest).await.unwrap();
    client.get("/cpm-rates").await.unwrap();

    let gets: Vec<_> = transport
        .requests()
        .into_iter()
        .filter(|r| r.method == HttpMethod::Get)
        .map(|r| r.url)
        .collect();
    // /links 重新请求，/cpm-rates 仍命中缓存
    assert_eq!(gets, vec![url("/links"), url("/cpm-rates"), url("/links")]);
}

// =========================================================
// 401 处理
// =========================================================

#[tokio::test]
async fn test_unauthorized_clears_session_and_fires_hook() {
    let transport = MockHttpClient::new();
    transport.mock_response(HttpMethod::Get, &url("/payouts"), 200, json!([]));
    transport.mock_response(
        HttpMethod::Get,
        &url("/admin/users"),
        401,
        json!({ "error": "Token expired" }),
    );
    let (client, _) = create_client(&transport);
    let fired = Rc::new(Cell::new(0));
    client.set_unauthorized_handler({
        let fired = fired.clone();
        move || fired.set(fired.get() + 1)
    });

    client.sign_in("tok".into(), test_user());
    client.get("/payouts").await.unwrap();

    let err = client.get("/admin/users").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.message(), "Token expired");
    assert_eq!(fired.get(), 1);
    assert!(!client.session().is_authenticated());
    assert!(client.session().user.is_none());

    // 缓存也被清空
    client.get("/payouts").await.unwrap();
    assert_eq!(transport.request_count(), 3);
}

// =========================================================
// 类型化请求
// =========================================================

#[tokio::test]
async fn test_typed_login_then_sign_in() {
    let transport = MockHttpClient::new();
    transport.mock_response(
        HttpMethod::Post,
        &url("/auth/login"),
        200,
        json!({ "token": "abc", "user": { "id": "u1", "email": "owner@example.com", "balance": 2.0 } }),
    );
    let (client, _) = create_client(&transport);

    let resp = client
        .send(&LoginRequest {
            email: "owner@example.com".into(),
            password: "secret123".into(),
        })
        .await
        .unwrap();
    client.sign_in(resp.token, resp.user);

    let session = client.session();
    assert!(session.is_authenticated());
    assert_eq!(session.user.unwrap().balance, 2.0);

    let req = &transport.requests()[0];
    assert_eq!(req.headers.get(HEADER_CONTENT_TYPE).map(String::as_str), Some("application/json"));
    assert_eq!(
        req.body.as_deref(),
        Some(r#"{"email":"owner@example.com","password":"secret123"}"#)
    );
}

#[tokio::test]
async fn test_unlock_request_carries_token_in_header_and_body() {
    let transport = MockHttpClient::new();
    transport.mock_response(
        HttpMethod::Post,
        &url("/l/abc/unlock"),
        200,
        json!({ "url": "https://x" }),
    );
    let (client, _) = create_client(&transport);

    let resp = client
        .send(&UnlockLinkRequest {
            short_code: "abc".into(),
            captcha_token: Some("cap".into()),
        })
        .await
        .unwrap();

    assert_eq!(resp.url, "https://x");
    let req = &transport.requests()[0];
    assert_eq!(req.headers.get("X-Captcha-Token").map(String::as_str), Some("cap"));
    assert_eq!(req.body.as_deref(), Some(r#"{"captchaToken":"cap"}"#));
}
