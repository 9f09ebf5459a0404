use crate::auth::use_auth;
use crate::components::icons::{CheckCircle, LinkIcon, ShieldCheck};
use crate::web::router::Link;
use leptos::prelude::*;

#[component]
fn Feature(title: &'static str, body: &'static str, children: Children) -> impl IntoView {
    view! {
        <div class="card bg-base-100 shadow-md">
            <div class="card-body items-center text-center">
                <div class="p-3 bg-primary/10 rounded-2xl text-primary">{children()}</div>
                <h3 class="card-title">{title}</h3>
                <p class="text-base-content/70">{body}</p>
            </div>
        </div>
    }
}

#[component]
pub fn HomePage() -> impl IntoView {
    let is_authenticated = use_auth().is_authenticated_signal();

    view! {
        <div class="hero py-16">
            <div class="hero-content text-center">
                <div class="max-w-2xl">
                    <h1 class="text-4xl md:text-5xl font-bold">"Shorten links. Get paid."</h1>
                    <p class="py-6 text-lg text-base-content/70">
                        "Turn every link you share into revenue. Visitors view a short sequence \
                         of ads before reaching the destination, and you earn for every unlock."
                    </p>
                    <Show
                        when=move || is_authenticated.get()
                        fallback=|| view! {
                            <div class="flex gap-2 justify-center">
                                <Link to="/register" class="btn btn-primary">"Create free account"</Link>
                                <Link to="/cpm-rates" class="btn btn-ghost">"See rates"</Link>
                            </div>
                        }
                    >
                        <Link to="/dashboard" class="btn btn-primary">"Go to dashboard"</Link>
                    </Show>
                </div>
            </div>
        </div>

        <div class="grid gap-6 md:grid-cols-3">
            <Feature title="Shorten" body="Paste any URL and get a short link in one click.">
                <LinkIcon attr:class="h-8 w-8" />
            </Feature>
            <Feature title="Share" body="Post it anywhere. Every verified visitor counts.">
                <ShieldCheck attr:class="h-8 w-8" />
            </Feature>
            <Feature title="Earn" body="Track clicks and earnings, then withdraw to your payout method.">
                <CheckCircle attr:class="h-8 w-8" />
            </Feature>
        </div>
    }
}
