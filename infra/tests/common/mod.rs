//! In-process stub of the enrollment backend for HTTP client tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Mutex;

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use enroll_infra::BackendClient;
use enroll_shared::BackendConfig;

pub const GOOD_CODE: &str = "246810";
pub const GOOD_PASSWORD: &str = "correct horse";
pub const VERIFIED_EMAIL: &str = "done@school.edu";
pub const FLAKY_EMAIL: &str = "flaky@school.edu";
pub const ADMIN_TOKEN: &str = "admin-token";

/// What the stub has seen and what it will answer
pub struct StubState {
    pub attempts_left: Mutex<u8>,
    pub requests: Mutex<Vec<String>>,
    pub bodies: Mutex<Vec<Value>>,
    pub auth_headers: Mutex<Vec<String>>,
    pub query_strings: Mutex<Vec<String>>,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            attempts_left: Mutex::new(3),
            requests: Mutex::new(Vec::new()),
            bodies: Mutex::new(Vec::new()),
            auth_headers: Mutex::new(Vec::new()),
            query_strings: Mutex::new(Vec::new()),
        }
    }
}

impl StubState {
    fn record(&self, req: &HttpRequest, body: Option<&Value>) {
        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}", req.method(), req.path()));
        self.query_strings
            .lock()
            .unwrap()
            .push(req.query_string().to_string());
        if let Some(auth) = req.headers().get("authorization") {
            self.auth_headers
                .lock()
                .unwrap()
                .push(auth.to_str().unwrap_or_default().to_string());
        }
        if let Some(body) = body {
            self.bodies.lock().unwrap().push(body.clone());
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.bodies.lock().unwrap().last().cloned()
    }
}

pub struct StubBackend {
    pub addr: SocketAddr,
    pub state: web::Data<StubState>,
    handle: ServerHandle,
}

impl StubBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> BackendClient {
        BackendClient::new(&BackendConfig::new(self.base_url())).unwrap()
    }

    pub fn admin_client(&self) -> BackendClient {
        let mut config = BackendConfig::new(self.base_url());
        config.api_token = Some(ADMIN_TOKEN.to_string());
        BackendClient::new(&config).unwrap()
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

/// Start the stub on an ephemeral port
pub async fn spawn_stub() -> StubBackend {
    let state = web::Data::new(StubState::default());
    let data = state.clone();

    let server = HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);

    StubBackend {
        addr,
        state,
        handle,
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/enrollee-applicants")
            .route("/login", web::post().to(login))
            .route("/send-signin-otp", web::post().to(send_otp))
            .route("/resend-otp", web::post().to(send_otp))
            .route("/request-password-reset", web::post().to(send_otp))
            .route("/verify-otp", web::post().to(verify_otp))
            .route("/verify-signin-otp", web::post().to(verify_otp))
            .route("/verification-status/{email}", web::get().to(verification_status))
            .route("/login-otp-status/{email}", web::get().to(empty_status))
            .route("/password-reset-status/{email}", web::get().to(empty_status)),
    )
    .service(
        web::scope("/api")
            .route("/accounts", web::get().to(list_accounts))
            .route("/accounts", web::post().to(create_account))
            .route("/accounts/{id}", web::get().to(get_account))
            .route("/accounts/{id}", web::put().to(update_account))
            .route("/accounts/{id}", web::delete().to(no_content))
            .route("/announcements", web::get().to(list_announcements))
            .route("/announcements", web::post().to(create_announcement))
            .route("/announcements/{id}", web::put().to(update_announcement))
            .route("/announcements/{id}", web::delete().to(no_content))
            .route("/access-control", web::get().to(access_control))
            .route("/access-control/{role}", web::put().to(echo))
            .route("/queue/history", web::get().to(queue_history))
            .route("/queue/history/export", web::get().to(queue_export))
            .route("/system-logs", web::post().to(created)),
    );
}

async fn login(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req, Some(&body.0));
    if body["password"] == GOOD_PASSWORD {
        HttpResponse::Ok().json(json!({
            "message": "OTP required",
            "requiresOtp": true,
            "firstName": "Jane"
        }))
    } else {
        HttpResponse::Unauthorized().json(json!({ "message": "Invalid email or password" }))
    }
}

async fn send_otp(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req, Some(&body.0));
    *state.attempts_left.lock().unwrap() = 3;
    let expiry = Utc::now() + Duration::seconds(300);
    HttpResponse::Ok().json(json!({
        "message": "OTP sent",
        "otpExpiry": expiry.timestamp_millis()
    }))
}

async fn verify_otp(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req, Some(&body.0));

    if body["email"] == FLAKY_EMAIL {
        return HttpResponse::ServiceUnavailable()
            .content_type("text/html")
            .body("<html><body>Service Unavailable</body></html>");
    }

    if body["otp"] == GOOD_CODE {
        return HttpResponse::Ok().json(json!({ "message": "Email verified", "token": "tok-123" }));
    }

    let mut attempts = state.attempts_left.lock().unwrap();
    *attempts = attempts.saturating_sub(1);
    HttpResponse::BadRequest().json(json!({
        "message": "Invalid OTP",
        "attemptsLeft": *attempts
    }))
}

async fn verification_status(
    req: HttpRequest,
    state: web::Data<StubState>,
    path: web::Path<String>,
) -> HttpResponse {
    state.record(&req, None);
    let email = path.into_inner();
    if email == VERIFIED_EMAIL {
        return HttpResponse::Ok().json(json!({ "isVerified": true }));
    }
    HttpResponse::Ok().json(json!({
        "isVerified": false,
        "attemptsLeft": *state.attempts_left.lock().unwrap(),
        "firstName": "Jane"
    }))
}

async fn empty_status(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, None);
    HttpResponse::Ok().json(json!({}))
}

fn authorized(req: &HttpRequest) -> bool {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", ADMIN_TOKEN))
        .unwrap_or(false)
}

async fn list_accounts(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, None);
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(json!({ "error": "Missing admin token" }));
    }
    HttpResponse::Ok().json(json!({
        "data": [{
            "id": 1,
            "email": "registrar@school.edu",
            "firstName": "Rita",
            "lastName": "Reyes",
            "role": "registrar",
            "isActive": true
        }],
        "page": 1,
        "perPage": 20,
        "total": 1
    }))
}

async fn create_account(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req, Some(&body.0));
    HttpResponse::Created().json(json!({
        "id": 7,
        "email": body["email"],
        "firstName": body["firstName"],
        "lastName": body["lastName"],
        "role": body["role"]
    }))
}

fn stored_account(id: i64) -> Value {
    json!({
        "id": id,
        "email": "registrar@school.edu",
        "firstName": "Rita",
        "lastName": "Reyes",
        "role": "registrar",
        "isActive": true
    })
}

async fn get_account(
    req: HttpRequest,
    state: web::Data<StubState>,
    path: web::Path<i64>,
) -> HttpResponse {
    state.record(&req, None);
    let id = path.into_inner();
    if id != 1 {
        return HttpResponse::NotFound().json(json!({ "message": "Account not found" }));
    }
    HttpResponse::Ok().json(stored_account(id))
}

async fn update_account(
    req: HttpRequest,
    state: web::Data<StubState>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req, Some(&body.0));
    let mut account = stored_account(path.into_inner());
    if let (Some(target), Some(changes)) = (account.as_object_mut(), body.as_object()) {
        for (field, value) in changes {
            target.insert(field.clone(), value.clone());
        }
    }
    HttpResponse::Ok().json(account)
}

async fn update_announcement(
    req: HttpRequest,
    state: web::Data<StubState>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req, Some(&body.0));
    HttpResponse::Ok().json(json!({
        "id": path.into_inner(),
        "title": body["title"],
        "body": body["body"],
        "isPublished": body["isPublished"],
        "publishedAt": "2025-06-01T00:00:00Z"
    }))
}

async fn list_announcements(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, None);
    HttpResponse::Ok().json(json!([{
        "id": 3,
        "title": "Enrollment opens",
        "body": "First semester enrollment opens on June 2.",
        "isPublished": true,
        "publishedAt": "2025-05-20T08:00:00Z"
    }]))
}

async fn create_announcement(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req, Some(&body.0));
    HttpResponse::Created().json(json!({
        "id": 4,
        "title": body["title"],
        "body": body["body"],
        "isPublished": body["isPublished"]
    }))
}

async fn access_control(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, None);
    HttpResponse::Ok().json(json!([
        { "role": "admin", "permissions": [] },
        { "role": "staff", "permissions": ["viewQueue"] }
    ]))
}

async fn queue_history(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, None);
    HttpResponse::Ok().json(json!({
        "data": [{
            "id": 11,
            "ticketNumber": "A-011",
            "service": "registrar",
            "status": "completed",
            "createdAt": "2025-06-02T08:00:00Z",
            "servedAt": "2025-06-02T08:12:00Z"
        }],
        "page": 1,
        "perPage": 20,
        "total": 41
    }))
}

async fn queue_export(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, None);
    HttpResponse::Ok()
        .content_type("text/csv")
        .body("ticket,service,status\nA-011,registrar,completed\n")
}

async fn echo(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req, Some(&body.0));
    HttpResponse::Ok().json(body.into_inner())
}

async fn no_content(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
    state.record(&req, None);
    HttpResponse::NoContent().finish()
}

async fn created(
    req: HttpRequest,
    state: web::Data<StubState>,
    body: web::Json<Value>,
) -> HttpResponse {
    state.record(&req, Some(&body.0));
    HttpResponse::Created().json(json!({ "message": "Logged" }))
}
