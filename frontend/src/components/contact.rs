use crate::api::use_api;
use crate::auth::use_auth;
use crate::components::common::{ErrorAlert, PageHeader};
use leptos::prelude::*;
use leptos::task::spawn_local;
use linkgate_shared::protocol::ContactRequest;

/// 所有字段必填，邮箱需包含 `@`
pub fn build_contact(name: &str, email: &str, subject: &str, message: &str) -> Result<ContactRequest, String> {
    let (name, email, subject, message) = (name.trim(), email.trim(), subject.trim(), message.trim());
    if name.is_empty() || email.is_empty() || subject.is_empty() || message.is_empty() {
        return Err("Please fill in all fields".to_string());
    }
    if !email.contains('@') {
        return Err("Please enter a valid email address".to_string());
    }
    Ok(ContactRequest {
        name: name.to_string(),
        email: email.to_string(),
        subject: subject.to_string(),
        message: message.to_string(),
    })
}

#[component]
pub fn ContactPage() -> impl IntoView {
    let auth = use_auth();
    let api = StoredValue::new_local(use_api());

    let name = RwSignal::new(String::new());
    let email = RwSignal::new(auth.user().map(|u| u.email).unwrap_or_default());
    let subject = RwSignal::new(String::new());
    let message = RwSignal::new(String::new());
    let (sending, set_sending) = signal(false);
    let (sent, set_sent) = signal(None::<String>);
    let (error_msg, set_error_msg) = signal(None::<String>);

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let req = match build_contact(&name.get(), &email.get(), &subject.get(), &message.get()) {
            Ok(req) => req,
            Err(msg) => {
                set_error_msg.set(Some(msg));
                return;
            }
        };
        set_error_msg.set(None);
        set_sending.set(true);

        let api = api.get_value();
        spawn_local(async move {
            match api.send(&req).await {
                Ok(resp) => {
                    let text = if resp.message.is_empty() {
                        "Thanks! We'll get back to you soon.".to_string()
                    } else {
                        resp.message
                    };
                    set_sent.set(Some(text));
                }
                Err(e) => set_error_msg.set(Some(e.to_string())),
            }
            set_sending.set(false);
        });
    };

    view! {
        <PageHeader title="Contact" subtitle="Questions about your account or payouts? Write to us." />
        <div class="card bg-base-100 shadow-xl max-w-2xl">
            <Show
                when=move || sent.with(Option::is_none)
                fallback=move || view! {
                    <div class="card-body">
                        <div role="alert" class="alert alert-success">{move || sent.get().unwrap_or_default()}</div>
                    </div>
                }
            >
                <form class="card-body" on:submit=on_submit>
                    <ErrorAlert message=error_msg />
                    <div class="grid gap-4 md:grid-cols-2">
                        <input
                            type="text"
                            placeholder="Name"
                            class="input input-bordered"
                            on:input=move |ev| name.set(event_target_value(&ev))
                            prop:value=name
                        />
                        <input
                            type="email"
                            placeholder="Email"
                            class="input input-bordered"
                            on:input=move |ev| email.set(event_target_value(&ev))
                            prop:value=email
                        />
                    </div>
                    <input
                        type="text"
                        placeholder="Subject"
                        class="input input-bordered"
                        on:input=move |ev| subject.set(event_target_value(&ev))
                        prop:value=subject
                    />
                    <textarea
                        rows="6"
                        placeholder="Message"
                        class="textarea textarea-bordered"
                        on:input=move |ev| message.set(event_target_value(&ev))
                        prop:value=message
                    ></textarea>
                    <div class="form-control mt-2">
                        <button class="btn btn-primary" disabled=move || sending.get()>
                            {move || if sending.get() { "Sending..." } else { "Send message" }}
                        </button>
                    </div>
                </form>
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_contact_requires_every_field() {
        assert!(build_contact("Ann", "ann@example.com", "Hi", "Hello").is_ok());
        assert_eq!(
            build_contact("Ann", "ann@example.com", "  ", "Hello"),
            Err("Please fill in all fields".to_string())
        );
        assert!(build_contact("Ann", "ann.example.com", "Hi", "Hello").is_err());
    }
}
