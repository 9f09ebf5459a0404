use crate::api::use_api;
use crate::components::common::{ErrorAlert, PageHeader, Spinner, StatCard};
use crate::web::layout::{Responsive, use_breakpoint};
use leptos::prelude::*;
use leptos::task::spawn_local;
use linkgate_shared::protocol::StatsRequest;
use linkgate_shared::{StatsSummary, format_money};

#[component]
pub fn StatsPage() -> impl IntoView {
    let api = use_api();

    let (stats, set_stats) = signal(None::<StatsSummary>);
    let (error_msg, set_error_msg) = signal(None::<String>);
    let breakpoint = use_breakpoint();
    // 小屏只展示最近几天
    let visible_days = Responsive::new(7usize).tablet(14).desktop(30);

    spawn_local(async move {
        match api.send(&StatsRequest).await {
            Ok(summary) => set_stats.set(Some(summary)),
            Err(e) => set_error_msg.set(Some(format!("Failed to load stats: {}", e))),
        }
    });

    let field = move |f: fn(&StatsSummary) -> String| {
        Signal::derive(move || stats.with(|s| s.as_ref().map(f).unwrap_or_else(|| "-".to_string())))
    };

    view! {
        <PageHeader title="Statistics" subtitle="Clicks and earnings across all of your links." />
        <ErrorAlert message=error_msg />

        <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100 my-6">
            <StatCard title="Today's clicks" value=field(|s| s.today_clicks.to_string()) />
            <StatCard
                title="Today's earnings"
                value=field(|s| format_money(s.today_earnings))
                accent="text-success"
            />
            <StatCard title="Total clicks" value=field(|s| s.total_clicks.to_string()) />
            <StatCard
                title="Total earnings"
                value=field(|s| format_money(s.total_earnings))
                accent="text-success"
            />
        </div>

        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <h3 class="card-title p-6 pb-2">"Daily breakdown"</h3>
                <Show
                    when=move || stats.with(Option::is_some)
                    fallback=move || {
                        view! {
                            <Show when=move || error_msg.with(Option::is_none)>
                                <Spinner />
                            </Show>
                        }
                    }
                >
                    <div class="overflow-x-auto w-full">
                        <table class="table table-zebra w-full">
                            <thead>
                                <tr>
                                    <th>"Date"</th>
                                    <th>"Clicks"</th>
                                    <th>"Earnings"</th>
                                </tr>
                            </thead>
                            <tbody>
                                <For
                                    each=move || {
                                        let limit = *visible_days.pick(breakpoint.get());
                                        stats.with(|s| {
                                            s.as_ref()
                                                .map(|s| s.daily[s.daily.len().saturating_sub(limit)..].to_vec())
                                                .unwrap_or_default()
                                        })
                                    }
                                    key=|d| d.date.clone()
                                    children=|day| {
                                        view! {
                                            <tr>
                                                <td class="font-mono text-sm">{day.date}</td>
                                                <td>{day.clicks}</td>
                                                <td>{format_money(day.earnings)}</td>
                                            </tr>
                                        }
                                    }
                                />
                            </tbody>
                        </table>
                    </div>
                </Show>
            </div>
        </div>
    }
}
