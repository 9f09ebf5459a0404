//! Cloudflare Turnstile 人机验证组件
//!
//! 脚本由 index.html 以 `render=explicit` 方式加载。脚本尚未就绪时定时重试渲染。

use gloo_timers::callback::Timeout;
use leptos::html::Div;
use leptos::prelude::*;
use wasm_bindgen::prelude::*;

const RETRY_DELAY_MS: u32 = 500;
const MAX_RENDER_ATTEMPTS: u32 = 20;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = turnstile, js_name = render, catch)]
    fn turnstile_render(container: &web_sys::HtmlElement, params: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = turnstile, js_name = reset, catch)]
    fn turnstile_reset(widget_id: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = turnstile, js_name = remove, catch)]
    fn turnstile_remove(widget_id: &JsValue) -> Result<(), JsValue>;
}

fn render_params(
    site_key: &str,
    on_token: &Closure<dyn Fn(String)>,
    on_expired: &Closure<dyn Fn()>,
) -> Result<JsValue, JsValue> {
    let params = js_sys::Object::new();
    js_sys::Reflect::set(&params, &"sitekey".into(), &site_key.into())?;
    js_sys::Reflect::set(&params, &"callback".into(), on_token.as_ref())?;
    js_sys::Reflect::set(&params, &"expired-callback".into(), on_expired.as_ref())?;
    Ok(params.into())
}

/// 渲染好的验证组件，drop 时从页面移除
struct Widget {
    id: JsValue,
    _on_token: Closure<dyn Fn(String)>,
    _on_expired: Closure<dyn Fn()>,
}

impl Drop for Widget {
    fn drop(&mut self) {
        let _ = turnstile_remove(&self.id);
    }
}

#[component]
pub fn CaptchaWidget(
    site_key: String,
    /// 每次变化都重置组件，要求访客重新验证
    #[prop(into)]
    generation: Signal<u32>,
    on_token: Callback<String>,
    on_expired: Callback<()>,
) -> impl IntoView {
    let container = NodeRef::<Div>::new();
    let widget = StoredValue::new_local(None::<Widget>);
    let retry = StoredValue::new_local(None::<Timeout>);
    let site_key = StoredValue::new(site_key);

    fn try_render(
        container: NodeRef<Div>,
        widget: StoredValue<Option<Widget>, LocalStorage>,
        retry: StoredValue<Option<Timeout>, LocalStorage>,
        site_key: StoredValue<String>,
        on_token: Callback<String>,
        on_expired: Callback<()>,
        attempt: u32,
    ) {
        let Some(el) = container.get_untracked() else {
            return;
        };
        let token_cb = Closure::<dyn Fn(String)>::new(move |token: String| on_token.run(token));
        let expired_cb = Closure::<dyn Fn()>::new(move || on_expired.run(()));

        let rendered = site_key
            .with_value(|key| render_params(key, &token_cb, &expired_cb))
            .and_then(|params| turnstile_render(&el, &params));

        match rendered {
            Ok(id) => {
                web_sys::console::log_1(&"[Captcha] Widget rendered".into());
                widget.set_value(Some(Widget {
                    id,
                    _on_token: token_cb,
                    _on_expired: expired_cb,
                }));
            }
            Err(_) if attempt < MAX_RENDER_ATTEMPTS => {
                let timeout = Timeout::new(RETRY_DELAY_MS, move || {
                    try_render(container, widget, retry, site_key, on_token, on_expired, attempt + 1);
                });
                retry.set_value(Some(timeout));
            }
            Err(e) => {
                web_sys::console::error_2(&"[Captcha] Failed to render widget:".into(), &e);
            }
        }
    }

    Effect::new(move |_| {
        generation.track();
        let existing = widget.with_value(|w| w.as_ref().map(|w| w.id.clone()));
        match existing {
            Some(id) => {
                if let Err(e) = turnstile_reset(&id) {
                    web_sys::console::error_2(&"[Captcha] Failed to reset widget:".into(), &e);
                }
            }
            None => try_render(container, widget, retry, site_key, on_token, on_expired, 1),
        }
    });

    on_cleanup(move || {
        retry.try_update_value(|t| t.take());
        widget.try_update_value(|w| w.take());
    });

    view! { <div node_ref=container class="flex justify-center min-h-16"></div> }
}
