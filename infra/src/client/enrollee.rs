//! Enrollee-facing endpoints: sign-in and the three OTP flows

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use enroll_core::domain::OtpPurpose;
use enroll_core::errors::ApiError;
use enroll_core::services::{EnrolleeApi, LoginOutcome, OtpDispatch, OtpStatus, VerifiedOtp};
use enroll_shared::utils::mask_email;

use super::backend::BackendClient;

pub const ENROLLEE_API_PREFIX: &str = "/api/enrollee-applicants";

/// Endpoint that emails a (new) code for `purpose`
pub fn send_path(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::EmailVerification => "/api/enrollee-applicants/resend-otp",
        OtpPurpose::SignIn => "/api/enrollee-applicants/send-signin-otp",
        OtpPurpose::PasswordReset => "/api/enrollee-applicants/request-password-reset",
    }
}

/// Endpoint that checks a code for `purpose`
pub fn verify_path(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::EmailVerification | OtpPurpose::PasswordReset => {
            "/api/enrollee-applicants/verify-otp"
        }
        OtpPurpose::SignIn => "/api/enrollee-applicants/verify-signin-otp",
    }
}

/// Status endpoint for `purpose`; the email is appended as a path segment
pub fn status_path(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::EmailVerification => "/api/enrollee-applicants/verification-status",
        OtpPurpose::SignIn => "/api/enrollee-applicants/login-otp-status",
        OtpPurpose::PasswordReset => "/api/enrollee-applicants/password-reset-status",
    }
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    email: &'a str,
    otp: &'a str,
    /// Disambiguates reset codes on the shared verify endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    purpose: Option<&'static str>,
}

#[async_trait]
impl EnrolleeApi for BackendClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        debug!(email = %mask_email(email), "POST login");
        let request = self
            .post(self.url(&format!("{}/login", ENROLLEE_API_PREFIX)))
            .json(&LoginRequest { email, password });
        self.send_json(request).await
    }

    async fn send_otp(&self, purpose: OtpPurpose, email: &str) -> Result<OtpDispatch, ApiError> {
        debug!(email = %mask_email(email), purpose = %purpose, "POST send otp");
        let request = self
            .post(self.url(send_path(purpose)))
            .json(&EmailRequest { email });
        self.send_json(request).await
    }

    async fn verify_otp(
        &self,
        purpose: OtpPurpose,
        email: &str,
        code: &str,
    ) -> Result<VerifiedOtp, ApiError> {
        debug!(email = %mask_email(email), purpose = %purpose, "POST verify otp");
        let body = VerifyRequest {
            email,
            otp: code,
            purpose: (purpose == OtpPurpose::PasswordReset).then(|| purpose.label()),
        };
        let request = self.post(self.url(verify_path(purpose))).json(&body);
        self.send_json(request).await
    }

    async fn otp_status(&self, purpose: OtpPurpose, email: &str) -> Result<OtpStatus, ApiError> {
        debug!(email = %mask_email(email), purpose = %purpose, "GET otp status");
        let url = self.url_with_segment(status_path(purpose), email)?;
        self.send_json(self.get(url)).await
    }
}
