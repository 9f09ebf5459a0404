use crate::api::use_api;
use crate::auth::{resend_code, use_auth, verify_email};
use crate::components::common::{ErrorAlert, Notice, NoticeToast, use_notice};
use crate::web::router::{query_param, use_navigate};
use leptos::prelude::*;
use leptos::task::spawn_local;

pub const CODE_LEN: usize = 6;

pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.chars().all(|c| c.is_ascii_digit())
}

#[component]
pub fn VerifyPage() -> impl IntoView {
    let auth = use_auth();
    let api = StoredValue::new_local(use_api());
    let navigate = use_navigate();
    let notice = use_notice();

    let email = RwSignal::new(query_param("email").unwrap_or_default());
    let code = RwSignal::new(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (is_resending, set_is_resending) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let entered = code.get().trim().to_string();
        if email.get().trim().is_empty() {
            set_error_msg.set(Some("Please enter your email address".to_string()));
            return;
        }
        if !is_valid_code(&entered) {
            set_error_msg.set(Some(format!("The code has {} digits", CODE_LEN)));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        let navigate = navigate.clone();
        let api = api.get_value();
        spawn_local(async move {
            match verify_email(auth, &api, email.get_untracked().trim().to_string(), entered).await {
                Ok(()) => navigate("/dashboard"),
                Err(e) => set_error_msg.set(Some(e.to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    let on_resend = move |_| {
        let address = email.get().trim().to_string();
        if address.is_empty() {
            set_error_msg.set(Some("Please enter your email address".to_string()));
            return;
        }
        set_is_resending.set(true);
        let api = api.get_value();
        spawn_local(async move {
            match resend_code(&api, address).await {
                Ok(resp) if !resp.message.is_empty() => notice.set(Some(Notice::success(resp.message))),
                Ok(_) => notice.set(Some(Notice::success("A new code is on its way"))),
                Err(e) => notice.set(Some(Notice::error(e.to_string()))),
            }
            set_is_resending.set(false);
        });
    };

    view! {
        <NoticeToast notice=notice />
        <div class="hero py-12">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"Verify your email"</h1>
                    <p class="text-base-content/70">
                        "Enter the 6-digit code we sent to your inbox"
                    </p>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <ErrorAlert message=error_msg />
                        <div class="form-control">
                            <label class="label" for="email">
                                <span class="label-text">"Email"</span>
                            </label>
                            <input
                                id="email"
                                type="email"
                                on:input=move |ev| email.set(event_target_value(&ev))
                                prop:value=email
                                class="input input-bordered"
                                required
                            />
                        </div>
                        <div class="form-control">
                            <label class="label" for="code">
                                <span class="label-text">"Verification code"</span>
                            </label>
                            <input
                                id="code"
                                type="text"
                                inputmode="numeric"
                                maxlength="6"
                                placeholder="123456"
                                on:input=move |ev| code.set(event_target_value(&ev))
                                prop:value=code
                                class="input input-bordered font-mono tracking-widest text-center text-xl"
                                required
                            />
                        </div>
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Verifying..." }.into_any()
                                } else {
                                    "Verify".into_any()
                                }}
                            </button>
                        </div>
                        <button
                            type="button"
                            class="btn btn-ghost btn-sm"
                            disabled=move || is_resending.get()
                            on:click=on_resend
                        >
                            "Resend code"
                        </button>
                    </form>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_format() {
        assert!(is_valid_code("012345"));
        assert!(!is_valid_code("12345"));
        assert!(!is_valid_code("12a456"));
        assert!(!is_valid_code("1234567"));
    }
}
