//! 短链解锁页
//!
//! 页面只负责渲染 `UnlockSession` 与转发用户操作，状态推进全部由 `GateDriver` 完成。

mod ad_frame;
mod captcha;

use ad_frame::AdFrame;
use captcha::CaptchaWidget;

use crate::api::{Api, use_api_context};
use crate::components::common::Spinner;
use crate::components::icons::{AlertCircle, CheckCircle, ShieldCheck};
use crate::web::BrowserScheduler;
use crate::web::router::Link;
use leptos::prelude::*;
use leptos::task::spawn_local;
use linkgate_shared::gate::{
    COUNTDOWN_SECONDS, FinalStepPhase, GateDriver, GatePhase, Step, UnlockSession,
};

type Driver = GateDriver<Api, BrowserScheduler>;

/// 页面主体当前展示的内容；只在切换时重新渲染
#[derive(Debug, Clone, PartialEq)]
enum Screen {
    Loading,
    Failed(String),
    Gate(Step),
    Done,
}

impl Screen {
    fn of(session: &UnlockSession) -> Self {
        match session.phase() {
            GatePhase::Loading => Screen::Loading,
            GatePhase::Error(message) => Screen::Failed(message),
            GatePhase::Step(step) => Screen::Gate(step),
            GatePhase::Final(_) => Screen::Gate(Step::Three),
            GatePhase::Unlocked => Screen::Done,
        }
    }
}

fn redirect_to(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.location().set_href(url) {
            web_sys::console::error_2(&"[Unlock] Redirect failed:".into(), &e);
        }
    }
}

#[component]
pub fn UnlockPage(short_code: String) -> impl IntoView {
    let ctx = use_api_context();
    let config = ctx.config();

    let driver: Driver = GateDriver::new(
        &short_code,
        ctx.client(),
        BrowserScheduler,
        config.verification_enabled(),
    );
    let session = RwSignal::new(driver.snapshot());
    driver.on_change(move |s| session.set(s.clone()));
    driver.on_redirect(redirect_to);

    let driver = StoredValue::new_local(driver);
    {
        let driver = driver.get_value();
        spawn_local(async move { driver.load().await });
    }
    on_cleanup(move || {
        driver.try_with_value(GateDriver::teardown);
    });

    let screen = Memo::new(move |_| session.with(Screen::of));
    let title = move || {
        session.with(|s| s.link().map(|l| l.label()).unwrap_or_else(|| short_code.clone()))
    };

    let on_ad_signal = Callback::new(move |_| {
        driver.with_value(|d| d.acknowledge_ad());
    });
    let on_token = Callback::new(move |token: String| {
        driver.with_value(|d| d.submit_verification(&token));
    });
    let on_expired = Callback::new(move |_| {
        driver.with_value(GateDriver::expire_verification);
    });

    let on_continue = move |_| {
        if let Err(e) = driver.with_value(|d| d.advance_step()) {
            web_sys::console::warn_1(&format!("[Unlock] Cannot continue: {}", e).into());
        }
    };

    let on_unlock = move |_| {
        let d = driver.get_value();
        spawn_local(async move {
            if let Err(e) = d.unlock().await {
                web_sys::console::warn_1(&format!("[Unlock] Cannot unlock: {}", e).into());
            }
        });
    };

    let site_key = config.captcha_site_key.clone();
    let ad_url = config.ad_target();
    let generation = Signal::derive(move || session.with(UnlockSession::verification_generation));

    let gate_view = move |step: Step| {
        let site_key = site_key.clone();
        view! {
            <div class="flex flex-col gap-4">
                <AdFrame ad_url=ad_url.clone() on_signal=on_ad_signal />

                <div class="text-sm text-center">
                    <Show
                        when=move || session.with(UnlockSession::ad_acknowledged)
                        fallback=|| view! { <span class="opacity-70">"View the ad above to continue."</span> }
                    >
                        <span class="text-success inline-flex items-center gap-1">
                            <CheckCircle attr:class="h-4 w-4" />
                            "Ad viewed"
                        </span>
                    </Show>
                </div>

                {if step.is_final() {
                    let site_key = site_key.clone();
                    view! {
                        <Show when=move || session.with(UnlockSession::is_counting)>
                            <div class="flex flex-col items-center gap-2">
                                <div
                                    class="radial-progress text-primary"
                                    style=move || {
                                        let left = session.with(UnlockSession::countdown);
                                        format!("--value:{};", left * 100 / COUNTDOWN_SECONDS)
                                    }
                                    role="progressbar"
                                >
                                    {move || session.with(UnlockSession::countdown)}
                                </div>
                                <span class="text-sm opacity-70">"Please wait..."</span>
                            </div>
                        </Show>

                        <Show when=move || session.with(UnlockSession::challenge_visible)>
                            {site_key.clone().map(|key| view! {
                                <CaptchaWidget
                                    site_key=key
                                    generation=generation
                                    on_token=on_token
                                    on_expired=on_expired
                                />
                            })}
                        </Show>

                        {move || session.with(|s| s.unlock_error().map(str::to_string)).map(|msg| view! {
                            <div role="alert" class="alert alert-error">
                                <AlertCircle attr:class="h-5 w-5" />
                                <span>{msg}</span>
                            </div>
                        })}

                        <button
                            class="btn btn-primary btn-lg"
                            disabled=move || session.with(|s| s.check_unlock().is_err())
                            on:click=on_unlock
                        >
                            <Show
                                when=move || session.with(|s| s.phase() == GatePhase::Final(FinalStepPhase::Unlocking))
                                fallback=|| view! { <ShieldCheck attr:class="h-5 w-5" /> "Get link" }
                            >
                                <span class="loading loading-spinner"></span>
                                "Unlocking..."
                            </Show>
                        </button>
                    }
                    .into_any()
                } else {
                    view! {
                        <button
                            class="btn btn-primary btn-lg"
                            disabled=move || session.with(|s| s.check_advance().is_err())
                            on:click=on_continue
                        >
                            "Continue"
                        </button>
                    }
                    .into_any()
                }}
            </div>
        }
    };

    let body = move || match screen.get() {
        Screen::Loading => view! { <Spinner label="Loading link..." /> }.into_any(),
        Screen::Failed(message) => view! {
            <div class="flex flex-col items-center gap-4 py-8 text-center">
                <AlertCircle attr:class="h-12 w-12 text-error" />
                <h3 class="text-xl font-bold">"This link is unavailable"</h3>
                <p class="opacity-70">{message}</p>
                <Link to="/" class="btn btn-ghost">"Back to home"</Link>
            </div>
        }
        .into_any(),
        Screen::Gate(step) => gate_view(step).into_any(),
        Screen::Done => view! {
            <div class="flex flex-col items-center gap-4 py-8 text-center">
                <CheckCircle attr:class="h-12 w-12 text-success" />
                <h3 class="text-xl font-bold">"Link unlocked"</h3>
                <p class="opacity-70">"Redirecting you to the destination..."</p>
                {move || session.with(|s| s.destination_url().map(str::to_string)).map(|url| view! {
                    <a href=url class="link link-primary break-all">"Continue manually"</a>
                })}
            </div>
        }
        .into_any(),
    };

    view! {
        <div class="max-w-2xl mx-auto">
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body gap-6">
                    <h2 class="card-title justify-center text-2xl break-all">{title}</h2>
                    <ul class="steps w-full">
                        {[Step::One, Step::Two, Step::Three]
                            .into_iter()
                            .map(|step| {
                                let reached = move || session.with(|s| s.current_step().number() >= step.number());
                                view! {
                                    <li class=move || if reached() { "step step-primary" } else { "step" }>
                                        {format!("Step {}", step.number())}
                                    </li>
                                }
                            })
                            .collect_view()}
                    </ul>
                    {body}
                </div>
            </div>
        </div>
    }
}
