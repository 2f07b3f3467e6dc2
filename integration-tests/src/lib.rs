//! An in-process stand-in for the complaint service.
//!
//! [`StubService::spawn`] serves the auth and complaint endpoints on a random
//! local port. Sessions are tracked with a cookie, so a client only stays
//! signed in if it sends cookies back. The `fail_*` and `*_delay` knobs let a
//! test break or slow down individual endpoints while it runs.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use api::{ApiClient, Config};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cookie::Cookie;
use serde::Deserialize;
use serde_json::{Value, json};
use types::{Identity, Role};

pub const SESSION_COOKIE_NAME: &str = "complaints_session";

pub const ADMIN_EMAIL: &str = "admin@city.gov";
pub const ADMIN_PASSWORD: &str = "correct horse";
pub const RESIDENT_EMAIL: &str = "resident@example.com";
pub const RESIDENT_PASSWORD: &str = "battery staple";

pub fn admin() -> Identity {
    Identity {
        id: "65a0000000000000000000a1".into(),
        email: ADMIN_EMAIL.into(),
        first_name: "Dana".into(),
        last_name: "Reyes".into(),
        role: Role::Admin,
    }
}

pub fn resident() -> Identity {
    Identity {
        id: "65a0000000000000000000b2".into(),
        email: RESIDENT_EMAIL.into(),
        first_name: "Sam".into(),
        last_name: "Okafor".into(),
        role: Role::User,
    }
}

/// A complaint as the service serializes it.
pub fn complaint(id: &str, title: &str, category: &str, status: &str, created_at: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "category": category,
        "status": status,
        "priority": "High",
        "createdAt": created_at,
        "userEmail": RESIDENT_EMAIL,
    })
}

#[derive(Default)]
pub struct StubState {
    accounts: Vec<(String, String, Identity)>,
    sessions: Mutex<HashMap<String, Identity>>,
    next_session: AtomicU64,

    pub complaints: Mutex<Vec<Value>>,
    pub user_count: Mutex<Value>,

    pub login_delay_ms: AtomicU64,
    pub me_delay_ms: AtomicU64,
    pub fail_me: AtomicBool,
    pub fail_logout: AtomicBool,
    pub fail_complaints: AtomicBool,
    pub fail_user_count: AtomicBool,
    /// Answer login and session lookups with 200 but no `user` in the body.
    pub omit_user: AtomicBool,

    /// Requests seen, by path.
    pub hits: Mutex<HashMap<String, usize>>,
}

impl StubState {
    fn new() -> Self {
        Self {
            accounts: vec![
                (ADMIN_EMAIL.into(), ADMIN_PASSWORD.into(), admin()),
                (RESIDENT_EMAIL.into(), RESIDENT_PASSWORD.into(), resident()),
            ],
            user_count: Mutex::new(json!({ "count": 0 })),
            ..Default::default()
        }
    }

    pub fn set_complaints(&self, complaints: Vec<Value>) {
        *self.complaints.lock().unwrap() = complaints;
    }

    pub fn set_user_count(&self, body: Value) {
        *self.user_count.lock().unwrap() = body;
    }

    pub fn set_me_delay(&self, delay: Duration) {
        self.me_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_login_delay(&self, delay: Duration) {
        self.login_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn record(&self, path: &str) {
        *self.hits.lock().unwrap().entry(path.to_string()).or_default() += 1;
    }

    fn session(&self, headers: &HeaderMap) -> Option<Identity> {
        let token = session_token(headers)?;
        self.sessions.lock().unwrap().get(&token).cloned()
    }
}

pub struct StubService {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubService {
    pub async fn spawn() -> Self {
        let state = Arc::new(StubState::new());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener address");

        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });

        Self { addr, state }
    }

    pub fn state(&self) -> &StubState {
        &self.state
    }

    pub fn config(&self) -> Config {
        Config::new(
            format!("http://{}", self.addr)
                .parse()
                .expect("stub url"),
        )
    }

    /// A fresh client with an empty cookie jar.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("build client")
    }
}

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(user_login))
        .route("/api/auth/admin-login", post(admin_login))
        .route("/api/auth/logout", post(user_logout))
        .route("/api/auth/admin-logout", post(admin_logout))
        .route("/api/auth/me", get(me))
        .route("/api/auth/users/count", get(user_count))
        .route("/api/complaints/all", get(all_complaints))
        .with_state(state)
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    cookie_header
        .split(';')
        .filter_map(|part| Cookie::parse(part.trim()).ok())
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

fn error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "msg": msg }))).into_response()
}

async fn pause(delay_ms: &AtomicU64) {
    let delay = delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn user_login(State(state): State<Arc<StubState>>, Json(body): Json<LoginBody>) -> Response {
    state.record("/api/auth/login");
    login(&state, body, false).await
}

async fn admin_login(
    State(state): State<Arc<StubState>>,
    Json(body): Json<LoginBody>,
) -> Response {
    state.record("/api/auth/admin-login");
    login(&state, body, true).await
}

async fn login(state: &StubState, body: LoginBody, admin_only: bool) -> Response {
    pause(&state.login_delay_ms).await;

    let Some(identity) = state
        .accounts
        .iter()
        .find(|(email, password, _)| *email == body.email && *password == body.password)
        .map(|(_, _, identity)| identity.clone())
    else {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    };

    if admin_only && !identity.is_admin() {
        return error(StatusCode::FORBIDDEN, "Access denied: admins only");
    }

    if state.omit_user.load(Ordering::SeqCst) {
        return Json(json!({ "msg": "Login successful" })).into_response();
    }

    let token = format!(
        "s{}",
        state.next_session.fetch_add(1, Ordering::SeqCst)
    );
    state
        .sessions
        .lock()
        .unwrap()
        .insert(token.clone(), identity.clone());

    let cookie = Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .build();

    (
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({ "msg": "Login successful", "user": identity })),
    )
        .into_response()
}

async fn user_logout(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.record("/api/auth/logout");
    logout(&state, &headers)
}

async fn admin_logout(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.record("/api/auth/admin-logout");
    logout(&state, &headers)
}

fn logout(state: &StubState, headers: &HeaderMap) -> Response {
    if state.fail_logout.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Logout failed");
    }

    if let Some(token) = session_token(headers) {
        state.sessions.lock().unwrap().remove(&token);
    }

    let cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(cookie::time::Duration::ZERO)
        .build();

    (
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({ "msg": "Logged out" })),
    )
        .into_response()
}

async fn me(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.record("/api/auth/me");
    pause(&state.me_delay_ms).await;

    if state.fail_me.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Session lookup failed");
    }

    if state.omit_user.load(Ordering::SeqCst) {
        return Json(json!({ "user": null })).into_response();
    }

    match state.session(&headers) {
        Some(identity) => Json(json!({ "user": identity })).into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Not authenticated"),
    }
}

async fn all_complaints(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.record("/api/complaints/all");

    if state.fail_complaints.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }

    match state.session(&headers) {
        Some(identity) if identity.is_admin() => {
            Json(Value::Array(state.complaints.lock().unwrap().clone())).into_response()
        }
        _ => error(StatusCode::FORBIDDEN, "Admins only"),
    }
}

async fn user_count(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.record("/api/auth/users/count");

    if state.fail_user_count.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }

    match state.session(&headers) {
        Some(identity) if identity.is_admin() => {
            Json(state.user_count.lock().unwrap().clone()).into_response()
        }
        _ => error(StatusCode::FORBIDDEN, "Admins only"),
    }
}
