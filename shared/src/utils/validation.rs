//! Input checks performed before any backend call

/// Length of an emailed OTP code
pub const OTP_CODE_LENGTH: usize = 6;

/// Check that a code is exactly six ASCII digits
pub fn is_valid_otp_code(code: &str) -> bool {
    code.len() == OTP_CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}
