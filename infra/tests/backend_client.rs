//! Integration tests for the backend client against an in-process stub
//!
//! Run with: cargo test -p enroll_infra --test backend_client

mod common;

use std::sync::Arc;

use enroll_core::domain::{
    AccountUpdate, NewAccount, NewAnnouncement, OtpPurpose, Permission, QueueHistoryQuery,
    QueueStatus, Role, RolePermissions, SystemLogEntry, VerificationSession,
};
use enroll_core::errors::{ApiError, FlowError};
use enroll_core::services::{
    EnrolleeApi, SessionStore, SignIn, SystemClock, TimerState, VerificationFlow,
    VerificationPolicy, VerifyOutcome,
};
use enroll_infra::{BackendClient, MemorySessionStore};
use enroll_shared::types::Pagination;
use enroll_shared::BackendConfig;
use serde_json::json;

use common::{spawn_stub, FLAKY_EMAIL, GOOD_CODE, GOOD_PASSWORD, VERIFIED_EMAIL};

const EMAIL: &str = "jane.doe@school.edu";

#[actix_rt::test]
async fn test_send_otp_hits_purpose_endpoint() {
    let stub = spawn_stub().await;
    let client = stub.client();

    for purpose in [
        OtpPurpose::EmailVerification,
        OtpPurpose::SignIn,
        OtpPurpose::PasswordReset,
    ] {
        let dispatch = client.send_otp(purpose, EMAIL).await.unwrap();
        assert_eq!(dispatch.message, "OTP sent");
        assert!(dispatch.otp_expiry.is_some());
    }

    assert_eq!(
        stub.state.requests(),
        vec![
            "POST /api/enrollee-applicants/resend-otp",
            "POST /api/enrollee-applicants/send-signin-otp",
            "POST /api/enrollee-applicants/request-password-reset",
        ]
    );
    assert_eq!(stub.state.last_body().unwrap()["email"], EMAIL);
    stub.stop().await;
}

#[actix_rt::test]
async fn test_verify_rejection_carries_attempts_left() {
    let stub = spawn_stub().await;
    let client = stub.client();

    let err = client
        .verify_otp(OtpPurpose::SignIn, EMAIL, "000000")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ApiError::Rejected {
            status: 400,
            message: "Invalid OTP".to_string(),
            attempts_left: Some(2),
        }
    );
    assert!(err.is_client_rejection());
    assert_eq!(
        stub.state.requests(),
        vec!["POST /api/enrollee-applicants/verify-signin-otp"]
    );

    let verified = client
        .verify_otp(OtpPurpose::PasswordReset, EMAIL, GOOD_CODE)
        .await
        .unwrap();
    assert_eq!(verified.token.as_deref(), Some("tok-123"));
    assert_eq!(stub.state.last_body().unwrap()["purpose"], "password-reset");
    stub.stop().await;
}

#[actix_rt::test]
async fn test_server_error_page_maps_to_status_text() {
    let stub = spawn_stub().await;
    let client = stub.client();

    let err = client
        .verify_otp(OtpPurpose::EmailVerification, FLAKY_EMAIL, GOOD_CODE)
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::rejected(503, "Service Unavailable"));
    assert!(!err.is_client_rejection());
    stub.stop().await;
}

#[actix_rt::test]
async fn test_status_escapes_email_path_segment() {
    let stub = spawn_stub().await;
    let client = stub.client();

    let status = client
        .otp_status(OtpPurpose::EmailVerification, "j+enroll@school.edu")
        .await
        .unwrap();
    assert!(!status.is_verified);
    assert_eq!(status.attempts_left, Some(3));

    let status = client
        .otp_status(OtpPurpose::EmailVerification, VERIFIED_EMAIL)
        .await
        .unwrap();
    assert!(status.is_verified);

    let status = client
        .otp_status(OtpPurpose::SignIn, EMAIL)
        .await
        .unwrap();
    assert_eq!(status.attempts_left, None);
    stub.stop().await;
}

#[actix_rt::test]
async fn test_unreachable_backend_is_network_error() {
    // Nothing listens on the discard port of the loopback interface
    let client = BackendClient::new(&BackendConfig::new("http://127.0.0.1:9")).unwrap();

    let err = client
        .send_otp(OtpPurpose::EmailVerification, EMAIL)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

#[actix_rt::test]
async fn test_flow_against_backend() {
    let stub = spawn_stub().await;
    let api = Arc::new(stub.client());
    let store = Arc::new(MemorySessionStore::new());

    let mut flow = VerificationFlow::open(
        api,
        store.clone(),
        Arc::new(SystemClock),
        VerificationPolicy::default(),
        EMAIL,
        OtpPurpose::EmailVerification,
    )
    .await
    .unwrap();
    assert_eq!(flow.timer().session().first_name, "Jane");

    let outcome = flow.verify("135790").await.unwrap();
    assert_eq!(
        outcome,
        VerifyOutcome::Rejected {
            message: "Invalid OTP".to_string(),
            attempts_left: 2,
            locked_out: false,
        }
    );
    let key = VerificationSession::storage_key(EMAIL);
    assert_eq!(store.load(&key).await.unwrap().unwrap().attempts_left, 2);

    let outcome = flow.verify(GOOD_CODE).await.unwrap();
    assert!(outcome.is_verified());
    assert!(store.load(&key).await.unwrap().is_none());
    stub.stop().await;
}

#[actix_rt::test]
async fn test_open_verified_address_is_rejected() {
    let stub = spawn_stub().await;

    let result = VerificationFlow::open(
        Arc::new(stub.client()),
        Arc::new(MemorySessionStore::new()),
        Arc::new(SystemClock),
        VerificationPolicy::default(),
        VERIFIED_EMAIL,
        OtpPurpose::EmailVerification,
    )
    .await;

    assert!(matches!(result, Err(FlowError::AlreadyVerified)));
    stub.stop().await;
}

#[actix_rt::test]
async fn test_sign_in_sends_otp_after_credentials() {
    let stub = spawn_stub().await;
    let store = Arc::new(MemorySessionStore::new());

    let step = VerificationFlow::sign_in(
        Arc::new(stub.client()),
        store.clone(),
        Arc::new(SystemClock),
        VerificationPolicy::default(),
        EMAIL,
        GOOD_PASSWORD,
    )
    .await
    .unwrap();

    let flow = match step {
        SignIn::OtpRequired(flow) => flow,
        SignIn::Authenticated(_) => panic!("Expected an OTP step"),
    };
    assert_eq!(flow.timer().state(), TimerState::Active);
    assert_eq!(
        stub.state.requests(),
        vec![
            "POST /api/enrollee-applicants/login",
            "GET /api/enrollee-applicants/login-otp-status/jane.doe@school.edu",
            "POST /api/enrollee-applicants/send-signin-otp",
        ]
    );
    assert_eq!(store.len().await, 1);
    stub.stop().await;
}

#[actix_rt::test]
async fn test_sign_in_with_wrong_password() {
    let stub = spawn_stub().await;

    let result = VerificationFlow::sign_in(
        Arc::new(stub.client()),
        Arc::new(MemorySessionStore::new()),
        Arc::new(SystemClock),
        VerificationPolicy::default(),
        EMAIL,
        "hunter2",
    )
    .await;

    match result {
        Err(FlowError::Api(err)) => {
            assert_eq!(err.user_message(), "Invalid email or password");
        }
        _ => panic!("Expected a rejected sign-in"),
    }
    assert_eq!(stub.state.requests().len(), 1);
    stub.stop().await;
}

#[actix_rt::test]
async fn test_admin_requests_carry_bearer_token() {
    let stub = spawn_stub().await;

    let err = stub
        .client()
        .list_accounts(Pagination::default())
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::rejected(401, "Missing admin token"));

    let page = stub
        .admin_client()
        .list_accounts(Pagination::new(1, 20))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].role, Role::Registrar);
    assert_eq!(page.data[0].full_name(), "Rita Reyes");
    assert!(stub
        .state
        .query_strings
        .lock()
        .unwrap()
        .iter()
        .any(|q| q == "page=1&perPage=20"));
    stub.stop().await;
}

#[actix_rt::test]
async fn test_account_and_announcement_management() {
    let stub = spawn_stub().await;
    let client = stub.admin_client();

    let account = client
        .create_account(&NewAccount {
            email: "staff@school.edu".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Santos".to_string(),
            role: Role::Staff,
            password: "temporary-pass".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(account.id, 7);
    assert_eq!(account.role, Role::Staff);
    assert!(account.is_active);

    client.delete_account(7).await.unwrap();

    let announcements = client.list_announcements().await.unwrap();
    assert_eq!(announcements[0].title, "Enrollment opens");

    let created = client
        .publish_announcement(&NewAnnouncement {
            title: "Holiday".to_string(),
            body: "No classes on June 12.".to_string(),
            is_published: true,
        })
        .await
        .unwrap();
    assert_eq!(created.id, 4);
    assert!(created.is_published);

    let requests = stub.state.requests();
    assert!(requests.contains(&"DELETE /api/accounts/7".to_string()));
    assert!(requests.contains(&"POST /api/announcements".to_string()));
    stub.stop().await;
}

#[actix_rt::test]
async fn test_account_lookup_and_partial_update() {
    let stub = spawn_stub().await;
    let client = stub.admin_client();

    let account = client.get_account(1).await.unwrap();
    assert_eq!(account.full_name(), "Rita Reyes");

    let missing = client.get_account(99).await.unwrap_err();
    assert_eq!(missing, ApiError::rejected(404, "Account not found"));

    let updated = client
        .update_account(
            1,
            &AccountUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.is_active);
    assert_eq!(updated.role, Role::Registrar);

    // Unset fields stay off the wire
    assert_eq!(stub.state.last_body(), Some(json!({ "isActive": false })));

    let edited = client
        .update_announcement(
            3,
            &NewAnnouncement {
                title: "Enrollment opens (moved)".to_string(),
                body: "Enrollment now opens on June 9.".to_string(),
                is_published: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.id, 3);
    assert!(edited.published_at.is_some());

    client.delete_announcement(3).await.unwrap();
    assert!(stub
        .state
        .requests()
        .contains(&"DELETE /api/announcements/3".to_string()));
    stub.stop().await;
}

#[actix_rt::test]
async fn test_access_control_round_trip() {
    let stub = spawn_stub().await;
    let client = stub.admin_client();

    let roles = client.access_control().await.unwrap();
    assert_eq!(roles.len(), 2);
    assert!(roles[0].allows(Permission::ExportQueue));
    assert!(roles[1].allows(Permission::ViewQueue));
    assert!(!roles[1].allows(Permission::ManageAccounts));

    let updated = client
        .update_role_permissions(&RolePermissions {
            role: Role::Registrar,
            permissions: vec![Permission::ViewQueue, Permission::ExportQueue],
        })
        .await
        .unwrap();
    assert!(updated.allows(Permission::ExportQueue));
    assert!(stub
        .state
        .requests()
        .contains(&"PUT /api/access-control/registrar".to_string()));
    stub.stop().await;
}

#[actix_rt::test]
async fn test_queue_history_and_export() {
    let stub = spawn_stub().await;
    let client = stub.admin_client();
    let query = QueueHistoryQuery {
        from: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
        status: Some(QueueStatus::Completed),
        ..Default::default()
    };

    let page = client.queue_history(&query).await.unwrap();
    assert_eq!(page.total, 41);
    assert_eq!(page.total_pages(), 3);
    assert_eq!(page.data[0].wait_minutes(), Some(12));

    let csv = client.export_queue_history(&query).await.unwrap();
    assert!(String::from_utf8(csv).unwrap().starts_with("ticket,service,status"));

    let queries = stub.state.query_strings.lock().unwrap().clone();
    assert_eq!(queries[0], "from=2025-06-01&status=completed");
    stub.stop().await;
}

#[actix_rt::test]
async fn test_system_log_is_posted() {
    let stub = spawn_stub().await;

    stub.admin_client()
        .record_system_log(
            &SystemLogEntry::new("announcement.publish", "admin@school.edu")
                .with_details("Holiday"),
        )
        .await
        .unwrap();

    let body = stub.state.last_body().unwrap();
    assert_eq!(body["action"], "announcement.publish");
    assert_eq!(body["details"], "Holiday");
    stub.stop().await;
}
