use super::*;
use crate::request::{HttpMethod, MockHttpClient};
use crate::route::{GuardDecision, Route, guard};
use crate::token::MemoryTokenStore;
use serde_json::json;
use siteadmin_shared::Role;
use std::cell::RefCell;
use std::rc::Rc;

// =========================================================
// 辅助函数
// =========================================================

const BASE: &str = "http://api.test";

type TestStore = SessionStore<Rc<MockHttpClient>, MemoryTokenStore>;

fn setup(tokens: MemoryTokenStore) -> (Rc<MockHttpClient>, MemoryTokenStore, TestStore) {
    // RUST_LOG=debug cargo test 时输出日志
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let http = Rc::new(MockHttpClient::new());
    let api = ApiClient::new(BASE, http.clone(), tokens.clone());
    (http, tokens, SessionStore::new(api))
}

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

fn user_json(role: &str) -> serde_json::Value {
    json!({ "id": "u1", "email": "ed@example.com", "name": "Ed", "role": role })
}

fn mock_login_ok(http: &MockHttpClient, token: &str, role: &str) {
    http.mock_response(
        HttpMethod::Post,
        &url("/auth/login"),
        200,
        json!({ "token": token, "user": user_json(role) }),
    );
}

// =========================================================
// initialize 测试
// =========================================================

#[tokio::test]
async fn test_initialize_without_token_settles_logged_out() {
    let (http, _tokens, store) = setup(MemoryTokenStore::new());
    assert!(store.state().loading);
    assert!(!store.state().initialized);

    store.initialize().await;

    let state = store.state();
    assert!(state.user.is_none());
    assert!(!state.loading);
    assert!(state.initialized);
    assert_eq!(http.request_count(), 0);
}

#[tokio::test]
async fn test_initialize_restores_session_from_token() {
    let (http, _tokens, store) = setup(MemoryTokenStore::with_token("good"));
    http.mock_response(HttpMethod::Get, &url("/auth/me"), 200, json!({ "user": user_json("EDITOR") }));

    store.initialize().await;

    let state = store.state();
    assert_eq!(state.user.as_ref().map(|u| u.role), Some(Role::Editor));
    assert_eq!(state.token.as_deref(), Some("good"));
    assert!(state.permissions().can_create);
    let reqs = http.requests_to(HttpMethod::Get, &url("/auth/me"));
    assert_eq!(reqs[0].header("Authorization"), Some("Bearer good"));
}

#[tokio::test]
async fn test_initialize_rejected_token_clears_everything() {
    let (http, tokens, store) = setup(MemoryTokenStore::with_token("expired"));
    http.mock_response(HttpMethod::Get, &url("/auth/me"), 401, json!({ "message": "jwt expired" }));

    store.initialize().await;

    let state = store.state();
    assert!(state.user.is_none());
    assert!(state.token.is_none());
    assert!(tokens.load().is_none());
    assert!(!state.loading && state.initialized);
    // 校验失败不视为登录错误
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_initialize_network_error_clears_session() {
    let (http, tokens, store) = setup(MemoryTokenStore::with_token("t"));
    http.mock_failure(HttpMethod::Get, &url("/auth/me"), "offline");

    store.initialize().await;

    assert!(store.state().user.is_none());
    assert!(tokens.load().is_none());
}

#[tokio::test]
async fn test_initialize_settles_exactly_once() {
    let (http, _tokens, store) = setup(MemoryTokenStore::with_token("good"));
    http.mock_response(HttpMethod::Get, &url("/auth/me"), 200, user_json("ADMIN"));

    let settled = Rc::new(RefCell::new(0));
    {
        let settled = settled.clone();
        let was_initialized = Cell::new(false);
        store.subscribe(move |s| {
            if s.initialized && !was_initialized.replace(true) {
                *settled.borrow_mut() += 1;
            }
        });
    }

    store.initialize().await;
    store.initialize().await;

    assert_eq!(*settled.borrow(), 1);
    assert_eq!(http.request_count(), 1);
}

#[tokio::test]
async fn test_guard_never_renders_protected_content_while_loading() {
    let (http, _tokens, store) = setup(MemoryTokenStore::with_token("good"));
    http.mock_response(HttpMethod::Get, &url("/auth/me"), 200, user_json("ADMIN"));

    let violations = Rc::new(RefCell::new(Vec::new()));
    {
        let violations = violations.clone();
        store.subscribe(move |s| {
            for route in [Route::Dashboard, Route::Projects, Route::Users] {
                if s.loading && matches!(guard(route, s), GuardDecision::Render(_)) {
                    violations.borrow_mut().push(route);
                }
            }
        });
    }

    assert_eq!(guard(Route::Projects, &store.state()), GuardDecision::Pending);
    store.initialize().await;

    assert!(violations.borrow().is_empty());
    assert_eq!(
        guard(Route::Projects, &store.state()),
        GuardDecision::Render(Route::Projects)
    );
}

// =========================================================
// login / logout 测试
// =========================================================

#[tokio::test]
async fn test_login_success_persists_token() {
    let (http, tokens, store) = setup(MemoryTokenStore::new());
    store.initialize().await;
    mock_login_ok(&http, "fresh", "ADMIN");

    let user = store.login(" ed@example.com ", "secret").await.unwrap();

    assert_eq!(user.role, Role::Admin);
    assert_eq!(tokens.load().as_deref(), Some("fresh"));
    let state = store.state();
    assert_eq!(state.token.as_deref(), Some("fresh"));
    assert!(!state.loading);
    assert_eq!(guard(Route::Login, &state), GuardDecision::Redirect(Route::Dashboard));

    let sent = &http.requests_to(HttpMethod::Post, &url("/auth/login"))[0];
    assert_eq!(sent.json()["email"], json!("ed@example.com"));
}

#[tokio::test]
async fn test_login_failure_uses_backend_message() {
    let (http, tokens, store) = setup(MemoryTokenStore::new());
    store.initialize().await;
    http.mock_response(
        HttpMethod::Post,
        &url("/auth/login"),
        401,
        json!({ "message": "Invalid credentials" }),
    );

    let err = store.login("ed@example.com", "wrong").await.unwrap_err();

    assert!(err.is_auth_failure());
    let state = store.state();
    assert!(state.user.is_none());
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some("Invalid credentials"));
    assert!(tokens.load().is_none());
    // 留在登录页
    assert_eq!(guard(Route::Login, &state), GuardDecision::Render(Route::Login));
}

#[tokio::test]
async fn test_login_failure_falls_back_to_generic_message() {
    let (http, _tokens, store) = setup(MemoryTokenStore::new());
    store.initialize().await;
    http.mock_failure(HttpMethod::Post, &url("/auth/login"), "connection refused");

    assert!(store.login("ed@example.com", "pw").await.is_err());
    assert_eq!(store.state().error.as_deref(), Some(LOGIN_FAILED_MESSAGE));
    assert!(!store.state().loading);
}

#[tokio::test]
async fn test_login_blank_fields_never_hit_network() {
    let (http, _tokens, store) = setup(MemoryTokenStore::new());
    store.initialize().await;

    assert!(store.login("  ", "").await.is_err());
    assert_eq!(http.request_count(), 0);
    assert_eq!(store.state().error.as_deref(), Some("Please fill in all fields"));

    store.clear_error();
    assert!(store.state().error.is_none());
}

#[tokio::test]
async fn test_login_then_logout_leaves_nothing_behind() {
    for role in ["ADMIN", "EDITOR", "VIEWER"] {
        let (http, tokens, store) = setup(MemoryTokenStore::new());
        store.initialize().await;
        mock_login_ok(&http, "t-123", role);

        store.login("ed@example.com", "pw").await.unwrap();
        store.logout();

        let state = store.state();
        assert!(tokens.load().is_none());
        assert!(state.user.is_none());
        assert!(state.token.is_none());
        assert_eq!(
            guard(Route::Projects, &state),
            GuardDecision::Redirect(Route::Login)
        );
    }
}

#[tokio::test]
async fn test_logout_never_fails_when_logged_out() {
    let (_http, tokens, store) = setup(MemoryTokenStore::new());
    store.logout();
    store.logout();
    assert!(tokens.load().is_none());
    assert!(store.state().user.is_none());
}

// =========================================================
// 并发交错测试
// =========================================================

#[tokio::test]
async fn test_slow_verification_does_not_override_logout() {
    let (http, tokens, store) = setup(MemoryTokenStore::with_token("old"));
    let release = http.mock_deferred(HttpMethod::Get, &url("/auth/me"));

    let init = store.initialize();
    let interleave = async {
        tokio::task::yield_now().await;
        store.logout();
        release.send((200, user_json("ADMIN").to_string())).unwrap();
    };
    futures::join!(init, interleave);

    let state = store.state();
    assert!(state.user.is_none());
    assert!(tokens.load().is_none());
    assert!(state.initialized);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_failed_verification_does_not_clear_newer_login() {
    let (http, tokens, store) = setup(MemoryTokenStore::with_token("stale"));
    let release = http.mock_deferred(HttpMethod::Get, &url("/auth/me"));
    mock_login_ok(&http, "fresh", "EDITOR");

    let init = store.initialize();
    let interleave = async {
        tokio::task::yield_now().await;
        store.login("ed@example.com", "pw").await.unwrap();
        release
            .send((401, json!({ "message": "expired" }).to_string()))
            .unwrap();
    };
    futures::join!(init, interleave);

    let state = store.state();
    assert_eq!(state.user.as_ref().map(|u| u.role), Some(Role::Editor));
    assert_eq!(tokens.load().as_deref(), Some("fresh"));
    assert!(!state.loading);
}

#[tokio::test]
async fn test_login_superseded_by_logout_is_discarded() {
    let (http, tokens, store) = setup(MemoryTokenStore::new());
    store.initialize().await;
    let release = http.mock_deferred(HttpMethod::Post, &url("/auth/login"));

    let login = store.login("ed@example.com", "pw");
    let interleave = async {
        tokio::task::yield_now().await;
        store.logout();
        release
            .send((200, json!({ "token": "late", "user": user_json("ADMIN") }).to_string()))
            .unwrap();
    };
    let (result, _) = futures::join!(login, interleave);

    assert!(result.is_err());
    assert!(tokens.load().is_none());
    assert!(store.state().user.is_none());
    assert!(!store.state().loading);
}
