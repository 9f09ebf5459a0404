use std::fmt;

use serde::{Deserialize, Serialize};

// =========================================================
// 错误状态枚举
// =========================================================

/// 错误语义，由 HTTP 状态码或本地失败原因推导
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorStatus {
    /// 请求未送达或未收到响应
    Network,
    /// 401: 会话失效
    Unauthorized,
    /// 403: 无权限（如非管理员访问管理接口）
    Forbidden,
    /// 404: 资源不存在（如未知短码）
    NotFound,
    /// 400 / 409 / 422: 请求被业务校验拒绝
    InvalidInput,
    /// 429: 被限流
    RateLimited,
    /// 5xx 及其他未分类状态
    Server,
    /// 响应体无法解析
    Decode,
}

impl ApiErrorStatus {
    pub fn from_status_code(code: u16) -> Self {
        match code {
            401 => ApiErrorStatus::Unauthorized,
            403 => ApiErrorStatus::Forbidden,
            404 | 410 => ApiErrorStatus::NotFound,
            400 | 409 | 422 => ApiErrorStatus::InvalidInput,
            429 => ApiErrorStatus::RateLimited,
            _ => ApiErrorStatus::Server,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiErrorStatus::Network => "NETWORK_ERROR",
            ApiErrorStatus::Unauthorized => "UNAUTHORIZED",
            ApiErrorStatus::Forbidden => "FORBIDDEN",
            ApiErrorStatus::NotFound => "RESOURCE_NOT_FOUND",
            ApiErrorStatus::InvalidInput => "INVALID_INPUT",
            ApiErrorStatus::RateLimited => "RATE_LIMITED",
            ApiErrorStatus::Server => "SERVER_ERROR",
            ApiErrorStatus::Decode => "DECODE_ERROR",
        }
    }

    /// 后端没有给出错误信息时的兜底文案
    fn fallback_message(&self) -> &'static str {
        match self {
            ApiErrorStatus::Network => "Network error, please check your connection",
            ApiErrorStatus::Unauthorized => "Your session has expired, please sign in again",
            ApiErrorStatus::Forbidden => "You do not have permission to do that",
            ApiErrorStatus::NotFound => "Not found",
            ApiErrorStatus::InvalidInput => "The request was rejected",
            ApiErrorStatus::RateLimited => "Too many attempts, please wait a moment",
            ApiErrorStatus::Server => "Server error, please try again later",
            ApiErrorStatus::Decode => "Unexpected response from server",
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 客户端错误
///
/// `message` 面向用户，直接显示在页面上。
/// 需要 `Clone`：合并后的同一请求结果会分发给多个等待者。
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: ApiErrorStatus,
    pub message: String,
}

/// 后端错误响应体 `{ "error": "..." }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn new(status: ApiErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Network, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            ApiErrorStatus::Unauthorized,
            ApiErrorStatus::Unauthorized.fallback_message(),
        )
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Decode, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::InvalidInput, message)
    }

    /// 由非 2xx 响应构造错误，优先使用响应体中的 `error` 字段
    pub fn from_response(status_code: u16, body: &str) -> Self {
        let status = ApiErrorStatus::from_status_code(status_code);
        let message = serde_json::from_str::<ErrorResponse>(body)
            .ok()
            .map(|r| r.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| status.fallback_message().to_string());
        Self { status, message }
    }

    pub fn error_code(&self) -> &'static str {
        self.status.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == ApiErrorStatus::Unauthorized
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::decode(format!("{}: {}", ApiErrorStatus::Decode.fallback_message(), e))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_uses_error_body() {
        let err = ApiError::from_response(404, r#"{"error":"Link not found"}"#);
        assert_eq!(err.status, ApiErrorStatus::NotFound);
        assert_eq!(err.message(), "Link not found");
        assert_eq!(err.error_code(), "RESOURCE_NOT_FOUND");
    }

    #[test]
    fn test_from_response_falls_back_on_plain_body() {
        let err = ApiError::from_response(502, "Bad Gateway");
        assert_eq!(err.status, ApiErrorStatus::Server);
        assert_eq!(err.message(), "Server error, please try again later");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiErrorStatus::from_status_code(401), ApiErrorStatus::Unauthorized);
        assert_eq!(ApiErrorStatus::from_status_code(429), ApiErrorStatus::RateLimited);
        assert_eq!(ApiErrorStatus::from_status_code(422), ApiErrorStatus::InvalidInput);
    }

    #[test]
    fn test_display_is_user_message() {
        let err = ApiError::invalid_input("Captcha expired");
        assert_eq!(err.to_string(), "Captcha expired");
    }
}
