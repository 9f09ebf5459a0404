//! 广告嵌入框
//!
//! 广告放在沙箱 iframe 中。iframe 内的点击不会冒泡到宿主页面，
//! 只能通过 "指针进入 iframe 后窗口失焦" 来推断访客点了广告。
//! 判定逻辑在 `AdSignal` 中，这里只负责接线 DOM 事件与防抖定时器。

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use linkgate_shared::ad_signal::{AdSignal, DEBOUNCE};

const AD_MARKUP: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><style>
html,body{margin:0;height:100%;display:flex;align-items:center;justify-content:center;
font-family:sans-serif;background:#f3f4f6;color:#6b7280}
</style></head>
<body><div id="ad-slot">Advertisement</div></body>
</html>"#;

/// 在新标签页打开广告，弹窗被拦截时返回 false
fn open_ad(url: &str) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    match window.open_with_url_and_target(url, "_blank") {
        Ok(Some(_)) => true,
        Ok(None) => {
            web_sys::console::warn_1(&"[AdFrame] Ad popup was blocked".into());
            false
        }
        Err(e) => {
            web_sys::console::error_2(&"[AdFrame] Failed to open ad:".into(), &e);
            false
        }
    }
}

#[component]
pub fn AdFrame(
    /// "打开广告" 按钮的目标地址
    ad_url: String,
    /// 访客与广告互动后调用，每次挂载最多一次
    on_signal: Callback<()>,
) -> impl IntoView {
    let signal_state = StoredValue::new(AdSignal::new());
    let debounce = StoredValue::new_local(None::<Timeout>);

    let blur_handle = window_event_listener(leptos::ev::blur, move |_| {
        let fire = signal_state.try_update_value(|s| s.window_blur()).unwrap_or(false);
        if !fire {
            return;
        }
        let timeout = Timeout::new(DEBOUNCE.as_millis() as u32, move || {
            if signal_state.try_update_value(|s| s.debounce_elapsed()) == Some(true) {
                web_sys::console::log_1(&"[AdFrame] Ad interaction detected".into());
                on_signal.run(());
            }
        });
        debounce.set_value(Some(timeout));
    });

    on_cleanup(move || {
        blur_handle.remove();
        debounce.try_update_value(|t| t.take());
    });

    let on_open = move |_| {
        if signal_state.with_value(AdSignal::is_signaled) || !open_ad(&ad_url) {
            return;
        }
        if signal_state.try_update_value(AdSignal::confirm) == Some(true) {
            on_signal.run(());
        }
    };

    view! {
        <div class="flex flex-col gap-2">
            <div
                class="w-full h-64 rounded-box overflow-hidden border border-base-300"
                on:pointerenter=move |_| signal_state.update_value(AdSignal::pointer_enter)
                on:pointerleave=move |_| signal_state.update_value(AdSignal::pointer_leave)
            >
                <iframe
                    title="Advertisement"
                    class="w-full h-full"
                    sandbox="allow-scripts allow-popups allow-popups-to-escape-sandbox"
                    srcdoc=AD_MARKUP
                ></iframe>
            </div>
            <button class="btn btn-ghost btn-sm self-end" on:click=on_open>
                "Open ad"
            </button>
        </div>
    }
}
