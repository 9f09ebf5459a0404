//! API 上下文
//!
//! 整个应用共享一个 `ApiClient`（缓存与会话都在其中），通过 Context 注入。
//! 客户端内部使用 `Rc`，不满足 `Send`，因此放在 `StoredValue::new_local` 中。

use leptos::prelude::*;
use linkgate_shared::config::{VAR_AD_URL, VAR_API_BASE, VAR_CAPTCHA_SITE_KEY, VAR_PUBLIC_BASE};
use linkgate_shared::{ApiClient, ClientConfig};

use crate::web::{BrowserStore, FetchClient};

pub type Api = ApiClient<FetchClient, BrowserStore>;

/// 编译期环境变量（Trunk 构建时注入）
fn compile_time_var(name: &str) -> Option<String> {
    let value = match name {
        VAR_API_BASE => option_env!("LINKGATE_API_BASE"),
        VAR_PUBLIC_BASE => option_env!("LINKGATE_PUBLIC_BASE"),
        VAR_CAPTCHA_SITE_KEY => option_env!("LINKGATE_CAPTCHA_SITE_KEY"),
        VAR_AD_URL => option_env!("LINKGATE_AD_URL"),
        _ => None,
    };
    value.map(str::to_string)
}

#[derive(Clone, Copy)]
pub struct ApiContext {
    client: StoredValue<Api, LocalStorage>,
    config: StoredValue<ClientConfig>,
}

impl ApiContext {
    pub fn client(&self) -> Api {
        self.client.get_value()
    }

    pub fn config(&self) -> ClientConfig {
        self.config.get_value()
    }
}

/// 创建客户端并放入 Context
pub fn provide_api() -> ApiContext {
    let config = ClientConfig::from_lookup(compile_time_var);
    web_sys::console::log_1(
        &format!(
            "[Api] Using API base {} (verification {})",
            config.api_base,
            if config.verification_enabled() { "on" } else { "off" }
        )
        .into(),
    );

    let client = ApiClient::new(&config, FetchClient, BrowserStore);
    let ctx = ApiContext {
        client: StoredValue::new_local(client),
        config: StoredValue::new(config),
    };
    provide_context(ctx);
    ctx
}

pub fn use_api_context() -> ApiContext {
    use_context::<ApiContext>().expect("ApiContext should be provided")
}

pub fn use_api() -> Api {
    use_api_context().client()
}

pub fn use_config() -> ClientConfig {
    use_api_context().config()
}
