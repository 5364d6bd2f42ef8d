//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum used to decide whether a failure may be
//! resolved permissively (fail-open) or must be surfaced.

use serde::Serialize;

/// エラー種別の列挙体
///
/// デバイス信頼サブシステムで発生するエラーを分類します。
/// バックエンド障害と、リクエストを組み立てる前に起きたローカルな失敗を区別します。
/// プローブの失敗はセンチネル値へ回復されるため、ここには現れません。
///
/// ## Notes
/// * `non_exhaustive` - 将来的に列挙子が追加される可能性があることを示す
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::BackendUnavailable;
/// assert!(kind.is_fail_open());
/// assert_eq!(kind.as_str(), "Backend Unavailable");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// バックエンドに到達できない（ネットワーク障害・タイムアウト）
    BackendUnavailable,
    /// バックエンドが非成功ステータスを返した
    BackendRejected,
    /// バックエンドの応答が契約に一致しない
    ContractViolation,
    /// 呼び出し側の入力が不正
    InvalidInput,
    /// ビューのスコープが閉じられ、結果が破棄された
    Cancelled,
    /// 内部エラー
    Internal,
}

impl ErrorKind {
    /// ユーザー向けの文字列表現を取得
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::InvalidInput.as_str(), "Invalid Input");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BackendUnavailable => "Backend Unavailable",
            ErrorKind::BackendRejected => "Backend Rejected",
            ErrorKind::ContractViolation => "Contract Violation",
            ErrorKind::InvalidInput => "Invalid Input",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Internal => "Internal",
        }
    }

    /// インフラ障害として許可側に倒してよいかを判定
    ///
    /// バックエンド起因の失敗とキャンセルは `true` を返します。
    /// 入力検証エラーは呼び出し側へそのまま返すべきなので `false` です。
    #[inline]
    pub const fn is_fail_open(&self) -> bool {
        matches!(
            self,
            ErrorKind::BackendUnavailable
                | ErrorKind::BackendRejected
                | ErrorKind::ContractViolation
                | ErrorKind::Cancelled
        )
    }

    /// HTTP ステータスコードからバックエンドのエラー種別を推定
    ///
    /// 408/429/5xx は一時的な障害、それ以外の 4xx は拒否として扱います。
    pub const fn from_backend_status(status: u16) -> Self {
        match status {
            408 | 429 | 500..=599 => ErrorKind::BackendUnavailable,
            400..=499 => ErrorKind::BackendRejected,
            _ => ErrorKind::ContractViolation,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_open_classification() {
        assert!(ErrorKind::BackendUnavailable.is_fail_open());
        assert!(ErrorKind::BackendRejected.is_fail_open());
        assert!(ErrorKind::ContractViolation.is_fail_open());
        assert!(ErrorKind::Cancelled.is_fail_open());
        assert!(!ErrorKind::InvalidInput.is_fail_open());
        assert!(!ErrorKind::Internal.is_fail_open());
    }

    #[test]
    fn test_from_backend_status() {
        assert_eq!(ErrorKind::from_backend_status(503), ErrorKind::BackendUnavailable);
        assert_eq!(ErrorKind::from_backend_status(429), ErrorKind::BackendUnavailable);
        assert_eq!(ErrorKind::from_backend_status(408), ErrorKind::BackendUnavailable);
        assert_eq!(ErrorKind::from_backend_status(401), ErrorKind::BackendRejected);
        assert_eq!(ErrorKind::from_backend_status(404), ErrorKind::BackendRejected);
        assert_eq!(ErrorKind::from_backend_status(302), ErrorKind::ContractViolation);
    }

    #[test]
    fn test_serialize_screaming_snake() {
        let json = serde_json::to_string(&ErrorKind::BackendUnavailable).unwrap();
        assert_eq!(json, r#""BACKEND_UNAVAILABLE""#);
    }
}
