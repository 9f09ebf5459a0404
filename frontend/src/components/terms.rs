use crate::components::common::PageHeader;
use leptos::prelude::*;

const SECTIONS: [(&str, &str); 5] = [
    (
        "Using the service",
        "You may shorten any link you have the right to share. Links to malware, phishing, \
         illegal content or content that infringes on the rights of others are removed without notice.",
    ),
    (
        "Earnings",
        "Earnings are credited for unique, human visitors who complete the unlock steps. \
         Rates depend on the visitor's country and are listed on the CPM rates page.",
    ),
    (
        "Invalid traffic",
        "Automated traffic, incentivised clicks and self-clicks are not paid. Accounts that \
         generate invalid traffic may be suspended and their balance forfeited.",
    ),
    (
        "Payouts",
        "Payouts can be requested once your balance reaches the minimum amount and are \
         reviewed manually before being sent to your configured payout method.",
    ),
    (
        "Changes",
        "These terms may change over time. Continued use of the service after a change \
         means you accept the updated terms.",
    ),
];

#[component]
pub fn TermsPage() -> impl IntoView {
    view! {
        <PageHeader title="Terms of Service" />
        <div class="card bg-base-100 shadow-xl">
            <div class="card-body prose max-w-none">
                {SECTIONS
                    .iter()
                    .map(|(title, body)| {
                        view! {
                            <h3 class="text-lg font-bold mt-4">{*title}</h3>
                            <p class="text-base-content/80">{*body}</p>
                        }
                    })
                    .collect_view()}
            </div>
        </div>
    }
}
