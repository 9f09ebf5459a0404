//! LocalStorage 封装模块
//!
//! 实现共享核心的 `KeyValueStore`，供 `SessionStore` 持久化会话。

use gloo_storage::{LocalStorage, Storage};
use linkgate_shared::KeyValueStore;

/// 浏览器 LocalStorage
///
/// 存储不可用（隐私模式等）时读取返回 `None`，写入返回 `false`。
#[derive(Clone, Copy, Default)]
pub struct BrowserStore;

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::get::<String>(key).ok()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        LocalStorage::set(key, value).is_ok()
    }

    fn delete(&self, key: &str) -> bool {
        LocalStorage::delete(key);
        true
    }
}
