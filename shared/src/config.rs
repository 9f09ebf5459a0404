//! 客户端运行时配置
//!
//! 从一个 key 查找函数读取配置，读不到就用默认值。
//! 前端传入编译期环境变量（`option_env!`），测试传入闭包。

use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "/api";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

pub const VAR_API_BASE: &str = "LINKGATE_API_BASE";
pub const VAR_PUBLIC_BASE: &str = "LINKGATE_PUBLIC_BASE";
pub const VAR_CAPTCHA_SITE_KEY: &str = "LINKGATE_CAPTCHA_SITE_KEY";
pub const VAR_AD_URL: &str = "LINKGATE_AD_URL";

/// 未配置广告地址时，相对 API 根地址的广告跳转接口
pub const DEFAULT_AD_PATH: &str = "/ads/click";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// 后端 API 根地址，不带结尾 `/`
    pub api_base: String,
    /// 对外展示短链时使用的站点根地址；为空时使用当前页面的 origin
    pub public_base: Option<String>,
    /// 人机验证站点 key；未配置时解锁不需要验证
    pub captcha_site_key: Option<String>,
    /// 解锁页 "打开广告" 按钮的目标地址
    pub ad_url: Option<String>,
    pub cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            public_base: None,
            captcha_site_key: None,
            ad_url: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            api_base: non_empty(VAR_API_BASE)
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            public_base: non_empty(VAR_PUBLIC_BASE).map(|v| v.trim_end_matches('/').to_string()),
            captcha_site_key: non_empty(VAR_CAPTCHA_SITE_KEY),
            ad_url: non_empty(VAR_AD_URL),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }

    pub fn verification_enabled(&self) -> bool {
        self.captcha_site_key.is_some()
    }

    pub fn ad_target(&self) -> String {
        self.ad_url
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.api_base, DEFAULT_AD_PATH))
    }

    /// 拼接访客可见的短链地址
    pub fn short_url(&self, origin: &str, short_code: &str) -> String {
        let base = self
            .public_base
            .as_deref()
            .unwrap_or(origin)
            .trim_end_matches('/');
        format!("{}/l/{}", base, short_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config, ClientConfig::default());
        assert!(!config.verification_enabled());
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_reads_and_normalizes_values() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (VAR_API_BASE, "https://api.example.com/"),
            (VAR_CAPTCHA_SITE_KEY, "0x4AAA"),
        ]));
        assert_eq!(config.api_base, "https://api.example.com");
        assert_eq!(config.captcha_site_key.as_deref(), Some("0x4AAA"));
        assert!(config.verification_enabled());
    }

    #[test]
    fn test_blank_site_key_disables_verification() {
        let config = ClientConfig::from_lookup(lookup_from(&[(VAR_CAPTCHA_SITE_KEY, "  ")]));
        assert!(!config.verification_enabled());
    }

    #[test]
    fn test_ad_target_falls_back_to_api_base() {
        let config = ClientConfig::from_lookup(lookup_from(&[(VAR_API_BASE, "https://api.example.com/")]));
        assert_eq!(config.ad_target(), "https://api.example.com/ads/click");

        let config = ClientConfig::from_lookup(lookup_from(&[(VAR_AD_URL, " https://ads.example.com/go ")]));
        assert_eq!(config.ad_target(), "https://ads.example.com/go");
    }

    #[test]
    fn test_short_url_prefers_public_base() {
        let mut config = ClientConfig::default();
        assert_eq!(config.short_url("https://app.test/", "abc"), "https://app.test/l/abc");
        config.public_base = Some("https://go.test".into());
        assert_eq!(config.short_url("https://app.test", "abc"), "https://go.test/l/abc");
    }
}
