mod link_form;

use crate::api::{use_api, use_config};
use crate::auth::{refresh_user, use_auth};
use crate::components::common::{Notice, NoticeToast, PageHeader, StatCard, use_notice};
use crate::components::icons::*;
use link_form::{LinkForm, LinkFormState};
use leptos::prelude::*;
use leptos::task::spawn_local;
use linkgate_shared::protocol::{
    CreateLinkRequest, DeleteLinkRequest, ListLinksRequest, UpdateLinkRequest,
};
use linkgate_shared::{Link, format_money};
use wasm_bindgen_futures::JsFuture;

fn page_origin() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

/// 写入剪贴板，等待浏览器确认
async fn copy_to_clipboard(text: &str) -> Result<(), String> {
    let window = web_sys::window().ok_or_else(|| "No window available".to_string())?;
    let promise = window.navigator().clipboard().write_text(text);
    JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|e| e.as_string().unwrap_or_else(|| "Clipboard access denied".to_string()))
}

/// 只有浏览器确认写入后才提示已复制
fn copy_notice(url: &str, result: Result<(), String>) -> Notice {
    match result {
        Ok(()) => Notice::success(format!("Copied {}", url)),
        Err(e) => Notice::error(format!("Copy failed: {}", e)),
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();
    let api = StoredValue::new_local(use_api());
    let config = StoredValue::new(use_config());
    let notice = use_notice();
    let form = LinkFormState::new();

    let (links, set_links) = signal(Vec::<Link>::new());
    let (loading_links, set_loading_links) = signal(true);
    let (creating, set_creating) = signal(false);
    // 正在重命名的链接：(id, 新标题)
    let editing = RwSignal::new(None::<(String, String)>);

    let load_links = move || {
        set_loading_links.set(true);
        let api = api.get_value();
        spawn_local(async move {
            match api.send(&ListLinksRequest).await {
                Ok(data) => set_links.set(data),
                Err(e) => notice.set(Some(Notice::error(format!("Failed to load links: {}", e)))),
            }
            set_loading_links.set(false);
        });
    };

    // 挂载时加载一次，同时刷新余额
    load_links();
    {
        let api = api.get_value();
        spawn_local(async move {
            if let Err(e) = refresh_user(auth, &api).await {
                web_sys::console::warn_1(&format!("[Api] Failed to refresh profile: {}", e).into());
            }
        });
    }

    let handle_create = move |req: CreateLinkRequest| {
        set_creating.set(true);
        let api = api.get_value();
        spawn_local(async move {
            match api.send(&req).await {
                Ok(link) => {
                    notice.set(Some(Notice::success(format!("Created /l/{}", link.short_code))));
                    set_links.update(|list| list.insert(0, link));
                    form.reset();
                }
                Err(e) => notice.set(Some(Notice::error(format!("Failed to create link: {}", e)))),
            }
            set_creating.set(false);
        });
    };

    let handle_invalid = move |msg: String| notice.set(Some(Notice::error(msg)));

    let handle_rename = move || {
        let Some((id, title)) = editing.get_untracked() else {
            return;
        };
        let api = api.get_value();
        spawn_local(async move {
            let req = UpdateLinkRequest {
                id,
                title: Some(title.trim().to_string()),
                original_url: None,
            };
            match api.send(&req).await {
                Ok(updated) => {
                    set_links.update(|list| {
                        if let Some(slot) = list.iter_mut().find(|l| l.id == updated.id) {
                            *slot = updated;
                        }
                    });
                    editing.set(None);
                    notice.set(Some(Notice::success("Link renamed")));
                }
                Err(e) => notice.set(Some(Notice::error(format!("Failed to rename link: {}", e)))),
            }
        });
    };

    let handle_delete = move |id: String| {
        let api = api.get_value();
        spawn_local(async move {
            match api.send(&DeleteLinkRequest { id: id.clone() }).await {
                Ok(()) => {
                    notice.set(Some(Notice::success("Link deleted")));
                    set_links.update(|list| list.retain(|l| l.id != id));
                }
                Err(e) => notice.set(Some(Notice::error(format!("Failed to delete link: {}", e)))),
            }
        });
    };

    let handle_copy = move |code: String| {
        let url = config.with_value(|c| c.short_url(&page_origin(), &code));
        spawn_local(async move {
            let result = copy_to_clipboard(&url).await;
            notice.set(Some(copy_notice(&url, result)));
        });
    };

    // 统计数据的派生值
    let total_links = move || links.with(|l| l.len());
    let balance = Signal::derive(move || {
        auth.session
            .with(|s| s.user.as_ref().map(|u| format_money(u.balance)))
            .unwrap_or_else(|| format_money(0.0))
    });
    let total_clicks = Signal::derive(move || {
        links.with(|l| l.iter().map(|link| link.clicks).sum::<u64>()).to_string()
    });
    let link_count = Signal::derive(move || total_links().to_string());

    view! {
        <NoticeToast notice=notice />
        <PageHeader title="Dashboard" subtitle="Shorten a link, share it, and earn from every unlock." />

        <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100 mb-8">
            <StatCard title="Balance" value=balance accent="text-success" />
            <StatCard title="Links" value=link_count />
            <StatCard title="Total clicks" value=total_clicks accent="text-secondary" />
        </div>

        <div class="card bg-base-100 shadow-xl mb-8">
            <div class="card-body">
                <h3 class="card-title">"New short link"</h3>
                <LinkForm
                    form=form
                    submitting=creating
                    on_submit=handle_create
                    on_invalid=handle_invalid
                />
            </div>
        </div>

        <div class="card bg-base-100 shadow-xl">
            <div class="card-body p-0">
                <div class="flex items-center justify-between p-6 pb-2">
                    <div>
                        <h3 class="card-title">"Your links"</h3>
                        <p class="text-base-content/70 text-sm">"Copy, rename or remove your short links."</p>
                    </div>
                    <button on:click=move |_| load_links() disabled=move || loading_links.get() class="btn btn-ghost btn-circle">
                        <RefreshCw attr:class=move || if loading_links.get() { "h-5 w-5 animate-spin" } else { "h-5 w-5" } />
                    </button>
                </div>

                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"Link"</th>
                                <th class="hidden md:table-cell">"Destination"</th>
                                <th>"Clicks"</th>
                                <th class="hidden md:table-cell">"Earnings"</th>
                                <th class="hidden md:table-cell">"Created"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>
                            <Show when=move || total_links() == 0 && !loading_links.get()>
                                <tr>
                                    <td colspan="6" class="text-center py-8 text-base-content/50">
                                        "No links yet. Shorten one above to get started."
                                    </td>
                                </tr>
                            </Show>
                            <Show when=move || loading_links.get() && total_links() == 0>
                                <tr>
                                    <td colspan="6" class="text-center py-8 text-base-content/50">
                                        <span class="loading loading-spinner loading-md"></span> " Loading..."
                                    </td>
                                </tr>
                            </Show>
                            <For
                                each=move || links.get()
                                key=|l| (l.id.clone(), l.title.clone())
                                children=move |link| {
                                    let id = link.id.clone();
                                    let edit_id = link.id.clone();
                                    let row_id = link.id.clone();
                                    let code = link.short_code.clone();
                                    let current_title = link.title.clone().unwrap_or_default();
                                    let is_editing = move || {
                                        editing.with(|e| e.as_ref().is_some_and(|(eid, _)| *eid == row_id))
                                    };
                                    view! {
                                        <tr>
                                            <td>
                                                <Show
                                                    when=is_editing
                                                    fallback={
                                                        let title = link.display_title().to_string();
                                                        let code = link.short_code.clone();
                                                        move || view! {
                                                            <div class="font-bold">{title.clone()}</div>
                                                            <div class="font-mono text-xs opacity-60">"/l/" {code.clone()}</div>
                                                        }
                                                    }
                                                >
                                                    <form
                                                        class="flex gap-1"
                                                        on:submit=move |ev: web_sys::SubmitEvent| {
                                                            ev.prevent_default();
                                                            handle_rename();
                                                        }
                                                    >
                                                        <input
                                                            class="input input-bordered input-sm"
                                                            prop:value=move || editing.with(|e| e.as_ref().map(|(_, t)| t.clone()).unwrap_or_default())
                                                            on:input=move |ev| {
                                                                let value = event_target_value(&ev);
                                                                editing.update(|e| {
                                                                    if let Some((_, t)) = e {
                                                                        *t = value;
                                                                    }
                                                                });
                                                            }
                                                        />
                                                        <button class="btn btn-primary btn-sm">"Save"</button>
                                                        <button
                                                            type="button"
                                                            class="btn btn-ghost btn-sm"
                                                            on:click=move |_| editing.set(None)
                                                        >
                                                            "Cancel"
                                                        </button>
                                                    </form>
                                                </Show>
                                            </td>
                                            <td class="hidden md:table-cell max-w-xs truncate text-sm opacity-70">
                                                {link.original_url.clone()}
                                            </td>
                                            <td>{link.clicks}</td>
                                            <td class="hidden md:table-cell">{format_money(link.earnings)}</td>
                                            <td class="hidden md:table-cell text-sm opacity-70">
                                                {link.created_at.format_date()}
                                            </td>
                                            <td>
                                                <div class="flex gap-1 justify-end">
                                                    <button
                                                        class="btn btn-ghost btn-sm btn-square"
                                                        title="Copy short URL"
                                                        on:click=move |_| handle_copy(code.clone())
                                                    >
                                                        <Copy attr:class="h-4 w-4" />
                                                    </button>
                                                    <button
                                                        class="btn btn-ghost btn-sm btn-square"
                                                        title="Rename"
                                                        on:click=move |_| editing.set(Some((edit_id.clone(), current_title.clone())))
                                                    >
                                                        <Pencil attr:class="h-4 w-4" />
                                                    </button>
                                                    <button
                                                        class="btn btn-ghost btn-sm btn-square text-error"
                                                        title="Delete"
                                                        on:click=move |_| handle_delete(id.clone())
                                                    >
                                                        <Trash2 attr:class="h-4 w-4" />
                                                    </button>
                                                </div>
                                            </td>
                                        </tr>
                                    }
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_notice_reports_rejected_write() {
        let ok = copy_notice("https://lg.test/abc", Ok(()));
        assert!(!ok.is_error);
        assert_eq!(ok.message, "Copied https://lg.test/abc");

        let denied = copy_notice("https://lg.test/abc", Err("Clipboard access denied".to_string()));
        assert!(denied.is_error);
        assert_eq!(denied.message, "Copy failed: Clipboard access denied");
    }
}
