use crate::api::use_api;
use crate::auth::register;
use crate::components::common::ErrorAlert;
use crate::web::router::{Link, use_navigate};
use leptos::prelude::*;
use leptos::task::spawn_local;

pub const MIN_PASSWORD_LEN: usize = 8;

/// 提交前的本地校验
pub fn validate_registration(email: &str, password: &str, confirm: &str) -> Result<(), String> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err("Please enter a valid email address".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    if password != confirm {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let api = StoredValue::new_local(use_api());
    let navigate = use_navigate();

    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let address = email.get().trim().to_string();
        if let Err(msg) =
            validate_registration(&address, &password.get(), &confirm.get())
        {
            set_error_msg.set(Some(msg));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        let navigate = navigate.clone();
        let api = api.get_value();
        spawn_local(async move {
            match register(&api, address.clone(), password.get_untracked()).await {
                Ok(_) => {
                    let encoded = String::from(js_sys::encode_uri_component(&address));
                    navigate(&format!("/verify?email={}", encoded));
                }
                Err(e) => set_error_msg.set(Some(e.to_string())),
            }
            set_is_submitting.set(false);
        });
    };

    let field = move |id: &'static str, label: &'static str, kind: &'static str, value: RwSignal<String>| {
        view! {
            <div class="form-control">
                <label class="label" for=id>
                    <span class="label-text">{label}</span>
                </label>
                <input
                    id=id
                    type=kind
                    on:input=move |ev| value.set(event_target_value(&ev))
                    prop:value=value
                    class="input input-bordered"
                    required
                />
            </div>
        }
    };

    view! {
        <div class="hero py-12">
            <div class="hero-content flex-col w-full max-w-md">
                <div class="text-center mb-4">
                    <h1 class="text-3xl font-bold">"Create your account"</h1>
                    <p class="text-base-content/70">"Start earning from the links you share"</p>
                </div>

                <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                    <form class="card-body" on:submit=on_submit>
                        <ErrorAlert message=error_msg />
                        {field("email", "Email", "email", email)}
                        {field("password", "Password", "password", password)}
                        {field("confirm", "Confirm password", "password", confirm)}
                        <div class="form-control mt-6">
                            <button class="btn btn-primary" disabled=move || is_submitting.get()>
                                {move || if is_submitting.get() {
                                    view! { <span class="loading loading-spinner"></span> "Creating account..." }.into_any()
                                } else {
                                    "Create account".into_any()
                                }}
                            </button>
                        </div>
                        <p class="text-sm text-center mt-2">
                            "Already registered? "
                            <Link to="/login" class="link link-primary">"Sign in"</Link>
                        </p>
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
    fn test_validate_registration() {
        assert!(validate_registration("a@b.c", "longenough", "longenough").is_ok());
        assert_eq!(
            validate_registration("a@b.c", "short", "short"),
            Err("Password must be at least 8 characters".to_string())
        );
        assert_eq!(
            validate_registration("a@b.c", "longenough", "different"),
            Err("Passwords do not match".to_string())
        );
        assert!(validate_registration("not-an-email", "longenough", "longenough").is_err());
    }
}
