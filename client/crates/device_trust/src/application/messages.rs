//! User-facing messages
//!
//! Vietnamese strings shown by the authentication flow.

pub const DEVICE_UNIDENTIFIED: &str = "Không thể xác định thiết bị";
pub const DEVICE_PERMANENTLY_BLOCKED: &str = "Thiết bị đã bị khóa vĩnh viễn";
pub const DEVICE_PERMANENTLY_BLOCKED_AFTER_FAILURES: &str =
    "Thiết bị đã bị khóa vĩnh viễn do đăng nhập sai quá nhiều lần";
pub const AUTOMATION_DETECTED: &str = "Phát hiện hoạt động tự động";
/// Shown only under [`FailurePolicy::FailClosed`](super::config::FailurePolicy)
pub const SECURITY_CHECK_UNAVAILABLE: &str =
    "Không thể kiểm tra bảo mật thiết bị. Vui lòng thử lại sau.";

pub fn temporarily_blocked(remaining: &str) -> String {
    format!("Thiết bị bị khóa. Thử lại sau {remaining}")
}

pub fn account_limit_reached(max_accounts: u32) -> String {
    format!("Đã đạt giới hạn {max_accounts} tài khoản trên thiết bị này")
}

pub fn attempts_remaining(remaining: u32) -> String {
    format!("Còn {remaining} lần thử trước khi bị khóa")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_messages() {
        assert_eq!(
            temporarily_blocked("0 giờ 30 phút"),
            "Thiết bị bị khóa. Thử lại sau 0 giờ 30 phút"
        );
        assert_eq!(
            account_limit_reached(3),
            "Đã đạt giới hạn 3 tài khoản trên thiết bị này"
        );
        assert_eq!(attempts_remaining(2), "Còn 2 lần thử trước khi bị khóa");
    }
}
