//! 页面间共用的小组件与状态

use leptos::prelude::*;

use crate::components::icons::AlertCircle;

/// 操作结果提示：(消息内容, 是否出错)
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// 3 秒后自动消失的提示
pub fn use_notice() -> RwSignal<Option<Notice>> {
    let notice = RwSignal::new(None::<Notice>);

    Effect::new(move |_| {
        if notice.with(Option::is_some) {
            set_timeout(move || notice.set(None), std::time::Duration::from_secs(3));
        }
    });

    notice
}

#[component]
pub fn NoticeToast(notice: RwSignal<Option<Notice>>) -> impl IntoView {
    move || {
        notice.get().map(|n| {
            let class = if n.is_error {
                "alert alert-error shadow-lg"
            } else {
                "alert alert-success shadow-lg"
            };
            view! {
                <div class="toast toast-top toast-end z-50">
                    <div class=class>
                        <span>{n.message}</span>
                    </div>
                </div>
            }
        })
    }
}

/// 行内错误提示，消息为 `None` 时不渲染
#[component]
pub fn ErrorAlert(#[prop(into)] message: Signal<Option<String>>) -> impl IntoView {
    move || {
        message.get().map(|msg| {
            view! {
                <div role="alert" class="alert alert-error text-sm py-2">
                    <AlertCircle attr:class="shrink-0 h-5 w-5" />
                    <span>{msg}</span>
                </div>
            }
        })
    }
}

#[component]
pub fn Spinner(#[prop(optional, into)] label: Option<String>) -> impl IntoView {
    view! {
        <div class="flex items-center justify-center py-8 gap-2 text-base-content/60">
            <span class="loading loading-spinner loading-md"></span>
            {label}
        </div>
    }
}

#[component]
pub fn StatCard(
    title: &'static str,
    #[prop(into)] value: Signal<String>,
    #[prop(optional)] desc: Option<&'static str>,
    #[prop(default = "text-primary")] accent: &'static str,
) -> impl IntoView {
    view! {
        <div class="stat">
            <div class="stat-title">{title}</div>
            <div class=format!("stat-value {}", accent)>{move || value.get()}</div>
            {desc.map(|d| view! { <div class="stat-desc">{d}</div> })}
        </div>
    }
}

/// 页面标题区
#[component]
pub fn PageHeader(
    title: &'static str,
    #[prop(optional)] subtitle: Option<&'static str>,
) -> impl IntoView {
    view! {
        <div class="mb-6">
            <h1 class="text-2xl md:text-3xl font-bold">{title}</h1>
            {subtitle.map(|s| view! { <p class="text-base-content/70 mt-1">{s}</p> })}
        </div>
    }
}
