use crate::api::use_api;
use crate::components::common::{ErrorAlert, PageHeader, Spinner};
use leptos::prelude::*;
use leptos::task::spawn_local;
use linkgate_shared::protocol::CpmRatesRequest;
use linkgate_shared::{CpmTier, format_money};

#[component]
pub fn CpmRatesPage() -> impl IntoView {
    let api = use_api();

    let (tiers, set_tiers) = signal(Vec::<CpmTier>::new());
    let (loading, set_loading) = signal(true);
    let (error_msg, set_error_msg) = signal(None::<String>);

    spawn_local(async move {
        match api.send(&CpmRatesRequest).await {
            Ok(data) => set_tiers.set(data),
            Err(e) => set_error_msg.set(Some(format!("Failed to load rates: {}", e))),
        }
        set_loading.set(false);
    });

    view! {
        <PageHeader
            title="CPM Rates"
            subtitle="What you earn per 1000 unlocks, by visitor country."
        />
        <ErrorAlert message=error_msg />

        <div class="card bg-base-100 shadow-xl mt-4">
            <div class="card-body p-0">
                <Show when=move || !loading.get() fallback=|| view! { <Spinner /> }>
                    <div class="overflow-x-auto w-full">
                        <table class="table w-full">
                            <thead>
                                <tr>
                                    <th>"Tier"</th>
                                    <th>"Countries"</th>
                                    <th class="text-right">"Rate / 1000"</th>
                                </tr>
                            </thead>
                            <tbody>
                                <For
                                    each=move || tiers.get()
                                    key=|t| t.tier.clone()
                                    children=|tier| {
                                        let countries = if tier.countries.is_empty() {
                                            "All other countries".to_string()
                                        } else {
                                            tier.countries.join(", ")
                                        };
                                        view! {
                                            <tr>
                                                <td class="font-bold">{tier.tier}</td>
                                                <td class="text-sm opacity-80">{countries}</td>
                                                <td class="text-right font-mono text-success">
                                                    {format_money(tier.rate)}
                                                </td>
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
