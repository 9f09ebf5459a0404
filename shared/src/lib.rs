//! LinkGate 共享核心
//!
//! 与平台无关的逻辑都放在这里，前端（WASM）与原生测试共用：
//! - `protocol`: 后端接口定义（路径、方法、请求/响应类型）
//! - `client`: HTTP 客户端封装（Bearer、缓存、请求合并、401 处理）
//! - `session`: 会话存储（token + 用户资料）
//! - `gate`: 解锁门状态机及其定时驱动
//! - `ad_signal`: 广告交互检测

use serde::{Deserialize, Serialize};

// =========================================================
// 跨平台日志宏
// =========================================================

#[cfg(target_arch = "wasm32")]
macro_rules! log_info {
    ($($t:tt)*) => (web_sys::console::log_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_info {
    ($($t:tt)*) => (println!($($t)*))
}

#[cfg(target_arch = "wasm32")]
macro_rules! log_warn {
    ($($t:tt)*) => (web_sys::console::warn_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_warn {
    ($($t:tt)*) => (eprintln!($($t)*))
}

#[cfg(target_arch = "wasm32")]
macro_rules! log_error {
    ($($t:tt)*) => (web_sys::console::error_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_error {
    ($($t:tt)*) => (eprintln!($($t)*))
}

pub mod ad_signal;
pub mod client;
pub mod config;
pub mod date;
pub mod error;
pub mod gate;
pub mod http;
pub mod protocol;
pub mod schedule;
pub mod session;

pub use chrono;
pub use client::ApiClient;
pub use config::ClientConfig;
pub use date::{Clock, SystemClock, Timestamp};
pub use error::{ApiError, ApiErrorStatus};
pub use session::{KeyValueStore, Session, SessionStore};

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CAPTCHA_TOKEN: &str = "X-Captcha-Token";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";

/// 最低提现金额
pub const MIN_PAYOUT_AMOUNT: f64 = 5.0;

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_address: Option<String>,
}

/// 登录 / 验证成功后的响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// 后端只返回一条提示信息的通用响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub short_code: String,
    pub original_url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub earnings: f64,
    #[serde(default)]
    pub created_at: Timestamp,
}

impl Link {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.original_url)
    }
}

/// 解锁页加载的链接描述，加载后只读
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub short_code: Option<String>,
    /// 后端可以关闭人机验证；缺省视为需要
    #[serde(default)]
    pub captcha_required: Option<bool>,
}

impl LinkMetadata {
    pub fn label(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return title.to_string();
        }
        match self.short_code.as_deref() {
            Some(code) if !code.is_empty() => format!("Link {}", code),
            _ => "Protected link".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: String,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub earnings: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    #[serde(default)]
    pub total_clicks: u64,
    #[serde(default)]
    pub total_earnings: f64,
    #[serde(default)]
    pub today_clicks: u64,
    #[serde(default)]
    pub today_earnings: f64,
    #[serde(default)]
    pub daily: Vec<DailyStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpmTier {
    pub tier: String,
    #[serde(default)]
    pub countries: Vec<String>,
    /// 每千次展示的收益（美元）
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Paid,
    Rejected,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Approved => "approved",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Rejected => "rejected",
        }
    }

    /// 管理员还能继续处理的状态
    pub fn is_open(&self) -> bool {
        matches!(self, PayoutStatus::Pending | PayoutStatus::Approved)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub amount: f64,
    #[serde(default)]
    pub method: Option<String>,
    pub status: PayoutStatus,
    #[serde(default)]
    pub created_at: Timestamp,
    /// 仅管理员接口返回
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminOverview {
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_links: u64,
    #[serde(default)]
    pub total_clicks: u64,
    #[serde(default)]
    pub total_paid: f64,
    #[serde(default)]
    pub pending_payouts: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub banned: bool,
}

/// 金额展示格式：`$12.34`
pub fn format_money(amount: f64) -> String {
    format!("${:.2}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_metadata_label_prefers_title() {
        let meta = LinkMetadata {
            title: Some("Release notes".into()),
            short_code: Some("abc".into()),
            captcha_required: None,
        };
        assert_eq!(meta.label(), "Release notes");
    }

    #[test]
    fn test_link_metadata_label_falls_back() {
        let meta = LinkMetadata {
            title: Some("   ".into()),
            short_code: Some("abc".into()),
            captcha_required: None,
        };
        assert_eq!(meta.label(), "Link abc");
        assert_eq!(LinkMetadata::default().label(), "Protected link");
    }

    #[test]
    fn test_user_tolerates_missing_fields() {
        let user: User = serde_json::from_str(r#"{"id":"u1","email":"a@b.c"}"#).unwrap();
        assert_eq!(user.balance, 0.0);
        assert!(!user.is_admin);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(3.0), "$3.00");
        assert_eq!(format_money(12.5), "$12.50");
    }
}
