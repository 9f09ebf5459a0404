use crate::http::HttpMethod;
use crate::{
    AdminOverview, AdminUser, AuthResponse, CpmTier, Link, LinkMetadata, MessageResponse, Payout,
    PayoutStatus, StatsSummary, User,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// 允许缓存（并合并并发请求）的只读接口
pub const CACHEABLE_PATHS: &[&str] = &[
    "/stats",
    "/cpm-rates",
    "/links",
    "/payouts",
    "/auth/me",
    "/admin/overview",
];

pub fn is_cacheable(path: &str) -> bool {
    CACHEABLE_PATHS.contains(&path)
}

/// 路径的第一段，如 `/links/42` -> `/links`。写操作成功后按此失效缓存。
pub fn cache_scope(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    let end = trimmed.find(['/', '?']).unwrap_or(trimmed.len());
    &path[..path.len() - trimmed.len() + end]
}

/// 对路径片段做百分号编码（只保留 RFC 3986 unreserved 字符）
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for b in segment.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;

    /// The URL path relative to the API base.
    fn path(&self) -> String;

    /// Extra headers carried by this request.
    fn headers(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

macro_rules! static_get {
    ($(#[$meta:meta])* $name:ident, $path:expr, $resp:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, Serialize, Deserialize)]
        pub struct $name;

        impl ApiRequest for $name {
            type Response = $resp;
            const METHOD: HttpMethod = HttpMethod::Get;

            fn path(&self) -> String {
                $path.to_string()
            }
        }
    };
}

// =========================================================
// Auth
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl ApiRequest for LoginRequest {
    type Response = AuthResponse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/auth/login".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

impl ApiRequest for RegisterRequest {
    type Response = MessageResponse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/auth/register".to_string()
    }
}

/// Confirm the emailed code; success signs the user in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

impl ApiRequest for VerifyEmailRequest {
    type Response = AuthResponse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/auth/verify".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendCodeRequest {
    pub email: String,
}

impl ApiRequest for ResendCodeRequest {
    type Response = MessageResponse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/auth/resend".to_string()
    }
}

static_get!(CurrentUserRequest, "/auth/me", User);

// =========================================================
// Links
// =========================================================

static_get!(ListLinksRequest, "/links", Vec<Link>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLinkRequest {
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ApiRequest for CreateLinkRequest {
    type Response = Link;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/links".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLinkRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

impl ApiRequest for UpdateLinkRequest {
    type Response = Link;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/links/{}", encode_segment(&self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteLinkRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DeleteLinkRequest {
    type Response = ();
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/links/{}", encode_segment(&self.id))
    }
}

// =========================================================
// Stats / Rates / Payouts / Profile
// =========================================================

static_get!(StatsRequest, "/stats", StatsSummary);
static_get!(CpmRatesRequest, "/cpm-rates", Vec<CpmTier>);
static_get!(ListPayoutsRequest, "/payouts", Vec<Payout>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayoutRequest {
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl ApiRequest for CreatePayoutRequest {
    type Response = Payout;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/payouts".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub payout_method: String,
    pub payout_address: String,
}

impl ApiRequest for UpdateProfileRequest {
    type Response = User;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        "/profile".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ApiRequest for ContactRequest {
    type Response = MessageResponse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/contact".to_string()
    }
}

// =========================================================
// Admin
// =========================================================

static_get!(AdminOverviewRequest, "/admin/overview", AdminOverview);
static_get!(AdminUsersRequest, "/admin/users", Vec<AdminUser>);
static_get!(AdminPayoutsRequest, "/admin/payouts", Vec<Payout>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUpdateUserRequest {
    #[serde(skip)]
    pub id: String,
    pub banned: bool,
}

impl ApiRequest for AdminUpdateUserRequest {
    type Response = AdminUser;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/admin/users/{}", encode_segment(&self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUpdatePayoutRequest {
    #[serde(skip)]
    pub id: String,
    pub status: PayoutStatus,
}

impl ApiRequest for AdminUpdatePayoutRequest {
    type Response = Payout;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/admin/payouts/{}", encode_segment(&self.id))
    }
}

// =========================================================
// Unlock gate
// =========================================================

/// Resolve the metadata of a shortened link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveLinkRequest {
    #[serde(skip)]
    pub short_code: String,
}

impl ApiRequest for ResolveLinkRequest {
    type Response = LinkMetadata;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/l/{}", encode_segment(&self.short_code))
    }
}

/// Release the destination URL. The captcha token travels in both the body and a header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockLinkRequest {
    #[serde(skip)]
    pub short_code: String,
    #[serde(rename = "captchaToken", skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
}

impl ApiRequest for UnlockLinkRequest {
    type Response = UnlockResponse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        format!("/l/{}/unlock", encode_segment(&self.short_code))
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        match &self.captcha_token {
            Some(token) => vec![(crate::HEADER_CAPTCHA_TOKEN, token.clone())],
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResponse {
    pub url: String,
}
