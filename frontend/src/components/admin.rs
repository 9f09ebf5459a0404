use crate::api::{Api, use_api};
use crate::components::common::{ErrorAlert, Notice, NoticeToast, PageHeader, Spinner, StatCard, use_notice};
use crate::components::payouts::status_badge;
use leptos::prelude::*;
use leptos::task::spawn_local;
use linkgate_shared::error::ApiResult;
use linkgate_shared::protocol::{
    AdminOverviewRequest, AdminPayoutsRequest, AdminUpdatePayoutRequest, AdminUpdateUserRequest,
    AdminUsersRequest,
};
use linkgate_shared::{AdminOverview, AdminUser, Payout, PayoutStatus, format_money};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview,
    Users,
    Payouts,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Overview, Tab::Users, Tab::Payouts];

    fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Users => "Users",
            Tab::Payouts => "Payouts",
        }
    }
}

/// 管理员可对提现执行的下一步操作
fn payout_actions(status: PayoutStatus) -> &'static [(PayoutStatus, &'static str)] {
    match status {
        PayoutStatus::Pending => &[
            (PayoutStatus::Approved, "Approve"),
            (PayoutStatus::Rejected, "Reject"),
        ],
        PayoutStatus::Approved => &[
            (PayoutStatus::Paid, "Mark paid"),
            (PayoutStatus::Rejected, "Reject"),
        ],
        PayoutStatus::Paid | PayoutStatus::Rejected => &[],
    }
}

#[component]
pub fn AdminPage() -> impl IntoView {
    let api = StoredValue::new_local(use_api());
    let notice = use_notice();
    let tab = RwSignal::new(Tab::Overview);

    let (overview, set_overview) = signal(None::<AdminOverview>);
    let (users, set_users) = signal(Vec::<AdminUser>::new());
    let (payouts, set_payouts) = signal(Vec::<Payout>::new());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(None::<String>);

    {
        let api = api.get_value();
        spawn_local(async move {
            match load_all(&api).await {
                Ok((o, u, p)) => {
                    set_overview.set(Some(o));
                    set_users.set(u);
                    set_payouts.set(p);
                }
                Err(e) => set_error_msg.set(Some(format!("Failed to load admin data: {}", e))),
            }
            set_loading.set(false);
        });
    }

    let update_payout = move |id: String, status: PayoutStatus| {
        let api = api.get_value();
        spawn_local(async move {
            match api.send(&AdminUpdatePayoutRequest { id, status }).await {
                Ok(updated) => {
                    set_payouts.update(|list| {
                        if let Some(slot) = list.iter_mut().find(|p| p.id == updated.id) {
                            *slot = updated;
                        }
                    });
                    notice.set(Some(Notice::success(format!("Payout {}", status.as_str()))));
                    if let Ok(o) = api.send(&AdminOverviewRequest).await {
                        set_overview.set(Some(o));
                    }
                }
                Err(e) => notice.set(Some(Notice::error(e.to_string()))),
            }
        });
    };

    let set_banned = move |id: String, banned: bool| {
        let api = api.get_value();
        spawn_local(async move {
            match api.send(&AdminUpdateUserRequest { id, banned }).await {
                Ok(updated) => {
                    set_users.update(|list| {
                        if let Some(slot) = list.iter_mut().find(|u| u.id == updated.id) {
                            *slot = updated;
                        }
                    });
                    notice.set(Some(Notice::success(if banned { "User banned" } else { "User unbanned" })));
                }
                Err(e) => notice.set(Some(Notice::error(e.to_string()))),
            }
        });
    };

    let stat = move |f: fn(&AdminOverview) -> String| {
        Signal::derive(move || overview.with(|o| o.as_ref().map(f).unwrap_or_else(|| "-".to_string())))
    };

    let overview_view = move || {
        view! {
            <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                <StatCard title="Users" value=stat(|o| o.total_users.to_string()) />
                <StatCard title="Links" value=stat(|o| o.total_links.to_string()) />
                <StatCard title="Clicks" value=stat(|o| o.total_clicks.to_string()) accent="text-secondary" />
                <StatCard title="Paid out" value=stat(|o| format_money(o.total_paid)) accent="text-success" />
                <StatCard title="Pending payouts" value=stat(|o| o.pending_payouts.to_string()) accent="text-warning" />
            </div>
        }
    };

    let users_view = move || {
        view! {
            <div class="overflow-x-auto w-full card bg-base-100 shadow-xl">
                <table class="table table-zebra w-full">
                    <thead>
                        <tr>
                            <th>"Email"</th>
                            <th>"Balance"</th>
                            <th>"Role"</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=move || users.get()
                            key=|u| (u.id.clone(), u.banned)
                            children=move |user| {
                                let id = user.id.clone();
                                let banned = user.banned;
                                view! {
                                    <tr>
                                        <td class="font-mono text-sm">{user.email}</td>
                                        <td>{format_money(user.balance)}</td>
                                        <td>
                                            {if user.is_admin { "admin" } else { "user" }}
                                            {banned.then(|| view! { <span class="badge badge-error ml-2">"banned"</span> })}
                                        </td>
                                        <td class="text-right">
                                            <button
                                                class={if banned { "btn btn-sm btn-outline" } else { "btn btn-sm btn-outline btn-error" }}
                                                on:click=move |_| set_banned(id.clone(), !banned)
                                            >
                                                {if banned { "Unban" } else { "Ban" }}
                                            </button>
                                        </td>
                                    </tr>
                                }
                            }
                        />
                    </tbody>
                </table>
            </div>
        }
    };

    let payouts_view = move || {
        view! {
            <div class="overflow-x-auto w-full card bg-base-100 shadow-xl">
                <table class="table table-zebra w-full">
                    <thead>
                        <tr>
                            <th>"User"</th>
                            <th>"Amount"</th>
                            <th class="hidden md:table-cell">"Method"</th>
                            <th>"Status"</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        <For
                            each=move || payouts.get()
                            key=|p| (p.id.clone(), p.status)
                            children=move |payout| {
                                let id = payout.id.clone();
                                view! {
                                    <tr>
                                        <td class="font-mono text-sm">{payout.user_email.clone().unwrap_or_default()}</td>
                                        <td>{format_money(payout.amount)}</td>
                                        <td class="hidden md:table-cell">{payout.method.clone().unwrap_or_default()}</td>
                                        <td><span class=status_badge(payout.status)>{payout.status.as_str()}</span></td>
                                        <td class="text-right">
                                            <div class="flex gap-1 justify-end">
                                                {payout_actions(payout.status)
                                                    .iter()
                                                    .map(|(next, label)| {
                                                        let id = id.clone();
                                                        let next = *next;
                                                        view! {
                                                            <button
                                                                class="btn btn-xs btn-outline"
                                                                on:click=move |_| update_payout(id.clone(), next)
                                                            >
                                                                {*label}
                                                            </button>
                                                        }
                                                    })
                                                    .collect_view()}
                                            </div>
                                        </td>
                                    </tr>
                                }
                            }
                        />
                    </tbody>
                </table>
            </div>
        }
    };

    view! {
        <NoticeToast notice=notice />
        <PageHeader title="Admin" subtitle="Platform overview, users and payout requests." />
        <ErrorAlert message=error_msg />

        <div role="tablist" class="tabs tabs-boxed mb-6 w-fit">
            {Tab::ALL
                .iter()
                .map(|t| {
                    let t = *t;
                    view! {
                        <a
                            role="tab"
                            class=move || if tab.get() == t { "tab tab-active" } else { "tab" }
                            on:click=move |_| tab.set(t)
                        >
                            {t.label()}
                        </a>
                    }
                })
                .collect_view()}
        </div>

        <Show when=move || !loading.get() fallback=|| view! { <Spinner /> }>
            {move || match tab.get() {
                Tab::Overview => overview_view().into_any(),
                Tab::Users => users_view().into_any(),
                Tab::Payouts => payouts_view().into_any(),
            }}
        </Show>
    }
}

async fn load_all(api: &Api) -> ApiResult<(AdminOverview, Vec<AdminUser>, Vec<Payout>)> {
    let overview = api.send(&AdminOverviewRequest).await?;
    let users = api.send(&AdminUsersRequest).await?;
    let payouts = api.send(&AdminPayoutsRequest).await?;
    Ok((overview, users, payouts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_actions_follow_status() {
        assert_eq!(payout_actions(PayoutStatus::Pending).len(), 2);
        assert_eq!(payout_actions(PayoutStatus::Approved)[0].0, PayoutStatus::Paid);
        assert!(payout_actions(PayoutStatus::Paid).is_empty());
        assert!(payout_actions(PayoutStatus::Rejected).is_empty());
    }
}
