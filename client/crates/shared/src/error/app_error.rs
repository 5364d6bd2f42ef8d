//! Application Error - Unified error type for the workspace
//!
//! Defines [`AppError`] struct and [`AppResult<T>`] type alias.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use super::kind::ErrorKind;

/// ワークスペース統一エラー型
///
/// 各クレートの固有エラー（`TrustError` など）はこの型へ変換されます。
/// 利用者へ表示される文言ではなく、ログと診断のための型です。
///
/// ## Fields
/// * `kind` - エラーの分類（許可側に倒せるかを決める）
/// * `message` - 診断用メッセージ
/// * `operation` - 失敗した操作名（`check_device_blocked` など）
/// * `source` - 元のエラー
///
/// ## Examples
/// ```rust
/// use kernel::error::app_error::AppError;
///
/// let err = AppError::backend_unavailable("request timed out")
///     .in_operation("check_device_blocked");
/// assert!(err.is_fail_open());
/// assert_eq!(err.operation(), Some("check_device_blocked"));
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    operation: Option<&'static str>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

/// アプリケーション結果型エイリアス
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: None,
            source: None,
        }
    }

    /// バックエンド到達不能
    pub fn backend_unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BackendUnavailable, message)
    }

    /// 入力・設定値の不正
    pub fn invalid_input(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// 失敗した操作名を付与
    pub fn in_operation(self, operation: &'static str) -> Self {
        Self {
            operation: Some(operation),
            ..self
        }
    }

    /// 元のエラーを付与
    pub fn with_source<E>(self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self {
            source: Some(Box::new(source)),
            ..self
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn operation(&self) -> Option<&'static str> {
        self.operation
    }

    /// 許可側に倒してよいエラーかどうか
    pub fn is_fail_open(&self) -> bool {
        self.kind.is_fail_open()
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("operation", &self.operation)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Some(operation) => write!(f, "[{}] {}: {}", self.kind, operation, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}
