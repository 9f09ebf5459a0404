//! 新建短链表单
//!
//! 将零散的 signal 整合为 `LinkFormState`，负责数据的持有、重置
//! 以及到请求对象的转换（含校验）。

use leptos::prelude::*;
use linkgate_shared::protocol::CreateLinkRequest;

/// 校验并规整用户输入
pub fn build_request(original_url: &str, title: &str) -> Result<CreateLinkRequest, String> {
    let url = original_url.trim();
    if url.is_empty() {
        return Err("Please enter the destination URL".to_string());
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err("The URL must start with http:// or https://".to_string());
    }
    let title = title.trim();
    Ok(CreateLinkRequest {
        original_url: url.to_string(),
        title: (!title.is_empty()).then(|| title.to_string()),
    })
}

/// 表单状态结构体
///
/// 使用 `RwSignal` 因为它实现了 `Copy` trait，适合作为 Props 在组件间传递。
#[derive(Clone, Copy)]
pub struct LinkFormState {
    pub original_url: RwSignal<String>,
    pub title: RwSignal<String>,
}

impl LinkFormState {
    pub fn new() -> Self {
        Self {
            original_url: RwSignal::new(String::new()),
            title: RwSignal::new(String::new()),
        }
    }

    pub fn reset(&self) {
        self.original_url.set(String::new());
        self.title.set(String::new());
    }

    pub fn to_request(&self) -> Result<CreateLinkRequest, String> {
        build_request(&self.original_url.get(), &self.title.get())
    }
}

impl Default for LinkFormState {
    fn default() -> Self {
        Self::new()
    }
}

#[component]
pub fn LinkForm(
    form: LinkFormState,
    #[prop(into)] submitting: Signal<bool>,
    #[prop(into)] on_submit: Callback<CreateLinkRequest>,
    #[prop(into)] on_invalid: Callback<String>,
) -> impl IntoView {
    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        match form.to_request() {
            Ok(req) => on_submit.run(req),
            Err(msg) => on_invalid.run(msg),
        }
    };

    view! {
        <form class="flex flex-col md:flex-row gap-2 w-full" on:submit=submit>
            <input
                type="url"
                placeholder="https://example.com/very/long/url"
                class="input input-bordered flex-1"
                on:input=move |ev| form.original_url.set(event_target_value(&ev))
                prop:value=form.original_url
            />
            <input
                type="text"
                placeholder="Title (optional)"
                class="input input-bordered md:w-56"
                on:input=move |ev| form.title.set(event_target_value(&ev))
                prop:value=form.title
            />
            <button class="btn btn-primary" disabled=move || submitting.get()>
                {move || if submitting.get() {
                    view! { <span class="loading loading-spinner"></span> "Shortening..." }.into_any()
                } else {
                    "Shorten".into_any()
                }}
            </button>
        </form>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_trims_and_drops_empty_title() {
        let req = build_request("  https://example.com/a  ", "   ").unwrap();
        assert_eq!(req.original_url, "https://example.com/a");
        assert!(req.title.is_none());

        let req = build_request("http://x.io", " Promo ").unwrap();
        assert_eq!(req.title.as_deref(), Some("Promo"));
    }

    #[test]
    fn test_build_request_rejects_bad_urls() {
        assert!(build_request("", "t").is_err());
        assert!(build_request("ftp://example.com", "").is_err());
        assert!(build_request("example.com", "").is_err());
    }
}
