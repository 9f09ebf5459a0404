use crate::api::use_api;
use crate::auth::{refresh_user, use_auth};
use crate::components::common::{ErrorAlert, Notice, NoticeToast, PageHeader, Spinner, use_notice};
use leptos::prelude::*;
use leptos::task::spawn_local;
use linkgate_shared::protocol::{CreatePayoutRequest, ListPayoutsRequest};
use linkgate_shared::{ApiError, MIN_PAYOUT_AMOUNT, Payout, PayoutStatus, format_money};

fn balance_refresh_warning(error: &ApiError) -> String {
    format!("[Payouts] Failed to refresh balance: {}", error)
}

/// 解析并校验提现金额：`最低金额 <= amount <= 余额`
pub fn validate_amount(input: &str, balance: f64) -> Result<f64, String> {
    let amount: f64 = input
        .trim()
        .parse()
        .map_err(|_| "Please enter a valid amount".to_string())?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err("The amount must be greater than zero".to_string());
    }
    if amount < MIN_PAYOUT_AMOUNT {
        return Err(format!(
            "The minimum payout is {}",
            format_money(MIN_PAYOUT_AMOUNT)
        ));
    }
    if amount > balance {
        return Err(format!(
            "The amount exceeds your balance of {}",
            format_money(balance)
        ));
    }
    Ok(amount)
}

pub fn status_badge(status: PayoutStatus) -> &'static str {
    match status {
        PayoutStatus::Pending => "badge badge-warning",
        PayoutStatus::Approved => "badge badge-info",
        PayoutStatus::Paid => "badge badge-success",
        PayoutStatus::Rejected => "badge badge-error",
    }
}

#[component]
pub fn PayoutsPage() -> impl IntoView {
    let auth = use_auth();
    let api = StoredValue::new_local(use_api());
    let notice = use_notice();

    let (payouts, set_payouts) = signal(Vec::<Payout>::new());
    let (loading, set_loading) = signal(true);
    let (submitting, set_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(None::<String>);
    let amount = RwSignal::new(String::new());

    let balance = move || auth.session.with(|s| s.user.as_ref().map_or(0.0, |u| u.balance));
    let method = move || auth.session.with(|s| s.user.as_ref().and_then(|u| u.payout_method.clone()));

    {
        let api = api.get_value();
        spawn_local(async move {
            match api.send(&ListPayoutsRequest).await {
                Ok(data) => set_payouts.set(data),
                Err(e) => set_error_msg.set(Some(format!("Failed to load payouts: {}", e))),
            }
            set_loading.set(false);
        });
    }

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let value = match validate_amount(&amount.get(), balance()) {
            Ok(v) => v,
            Err(msg) => {
                set_error_msg.set(Some(msg));
                return;
            }
        };

        set_error_msg.set(None);
        set_submitting.set(true);
        let api = api.get_value();
        let req = CreatePayoutRequest {
            amount: value,
            method: method(),
        };
        spawn_local(async move {
            match api.send(&req).await {
                Ok(payout) => {
                    set_payouts.update(|list| list.insert(0, payout));
                    amount.set(String::new());
                    notice.set(Some(Notice::success("Payout requested")));
                    // 余额已变化
                    if let Err(e) = refresh_user(auth, &api).await {
                        web_sys::console::warn_1(&balance_refresh_warning(&e).into());
                    }
                }
                Err(e) => set_error_msg.set(Some(e.to_string())),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <NoticeToast notice=notice />
        <PageHeader title="Payouts" subtitle="Withdraw your earnings." />

        <div class="card bg-base-100 shadow-xl mb-8">
            <form class="card-body" on:submit=on_submit>
                <div class="flex flex-col md:flex-row md:items-end gap-4">
                    <div>
                        <div class="text-sm opacity-70">"Available balance"</div>
                        <div class="text-3xl font-bold text-success">{move || format_money(balance())}</div>
                    </div>
                    <div class="form-control flex-1">
                        <label class="label" for="amount">
                            <span class="label-text">
                                {format!("Amount (minimum {})", format_money(MIN_PAYOUT_AMOUNT))}
                            </span>
                        </label>
                        <input
                            id="amount"
                            type="number"
                            step="0.01"
                            min="0"
                            class="input input-bordered"
                            on:input=move |ev| amount.set(event_target_value(&ev))
                            prop:value=amount
                        />
                    </div>
                    <button class="btn btn-primary" disabled=move || submitting.get()>
                        "Request payout"
                    </button>
                </div>
                <Show when=move || method().is_none()>
                    <p class="text-sm text-warning">
                        "Set a payout method on your profile before requesting a payout."
                    </p>
                </Show>
                <ErrorAlert message=error_msg />
            </form>
        </div>

        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <h3 class="card-title p-6 pb-2">"History"</h3>
                <Show when=move || !loading.get() fallback=|| view! { <Spinner /> }>
                    <Show
                        when=move || payouts.with(|p| !p.is_empty())
                        fallback=|| view! { <p class="text-center py-8 text-base-content/50">"No payouts yet."</p> }
                    >
                        <div class="overflow-x-auto w-full">
                            <table class="table table-zebra w-full">
                                <thead>
                                    <tr>
                                        <th>"Date"</th>
                                        <th>"Amount"</th>
                                        <th class="hidden md:table-cell">"Method"</th>
                                        <th>"Status"</th>
                                    </tr>
                                </thead>
                                <tbody>
                                    <For
                                        each=move || payouts.get()
                                        key=|p| p.id.clone()
                                        children=|payout| {
                                            view! {
                                                <tr>
                                                    <td class="text-sm">{payout.created_at.format_date()}</td>
                                                    <td class="font-mono">{format_money(payout.amount)}</td>
                                                    <td class="hidden md:table-cell">{payout.method.unwrap_or_else(|| "-".to_string())}</td>
                                                    <td>
                                                        <span class=status_badge(payout.status)>{payout.status.as_str()}</span>
                                                    </td>
                                                </tr>
                                            }
                                        }
                                    />
                                </tbody>
                            </table>
                        </div>
                    </Show>
                </Show>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_refresh_warning_names_the_cause() {
        let warning = balance_refresh_warning(&ApiError::network("offline"));
        assert!(warning.starts_with("[Payouts] Failed to refresh balance: "));
        assert!(warning.contains("offline"));
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount("10", 25.0), Ok(10.0));
        assert_eq!(validate_amount(" 25.00 ", 25.0), Ok(25.0));
        assert!(validate_amount("0", 25.0).is_err());
        assert!(validate_amount("-3", 25.0).is_err());
        assert!(validate_amount("abc", 25.0).is_err());
        assert_eq!(
            validate_amount("4.99", 25.0),
            Err("The minimum payout is $5.00".to_string())
        );
        assert_eq!(
            validate_amount("30", 25.0),
            Err("The amount exceeds your balance of $25.00".to_string())
        );
    }
}
