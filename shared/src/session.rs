//! 会话存储
//!
//! 在持久化 key/value 存储上的一层薄封装，只保存 token 与用户资料。
//! 不是全局状态：由调用方构造后注入给需要它的组件。

use crate::User;

pub const STORAGE_TOKEN_KEY: &str = "linkgate_token";
pub const STORAGE_USER_KEY: &str = "linkgate_user";

/// 持久化 key/value 存储
///
/// 浏览器中由 LocalStorage 实现，测试中使用 `MemoryStore`。
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    /// 返回是否写入成功
    fn set(&self, key: &str, value: &str) -> bool;
    fn delete(&self, key: &str) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

#[derive(Clone)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Session {
        let token = self.token();
        let user = self
            .store
            .get(STORAGE_USER_KEY)
            .and_then(|raw| match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    log_warn!("[Session] Discarding unreadable user profile: {}", e);
                    None
                }
            });
        Session { token, user }
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(STORAGE_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn save(&self, session: &Session) {
        match &session.token {
            Some(token) => {
                self.store.set(STORAGE_TOKEN_KEY, token);
            }
            None => {
                self.store.delete(STORAGE_TOKEN_KEY);
            }
        }
        match &session.user {
            Some(user) => self.save_user(user),
            None => {
                self.store.delete(STORAGE_USER_KEY);
            }
        }
    }

    pub fn save_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => {
                if !self.store.set(STORAGE_USER_KEY, &raw) {
                    log_warn!("[Session] Failed to persist user profile");
                }
            }
            Err(e) => log_error!("[Session] Failed to serialize user profile: {}", e),
        }
    }

    pub fn clear(&self) {
        self.store.delete(STORAGE_TOKEN_KEY);
        self.store.delete(STORAGE_USER_KEY);
    }
}

/// 内存实现，供测试及存储不可用时降级使用
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: std::rc::Rc<std::cell::RefCell<std::collections::HashMap<String, String>>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.borrow_mut().remove(key);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "u1".into(),
            email: "a@b.c".into(),
            balance: 12.5,
            is_admin: true,
            email_verified: true,
            payout_method: None,
            payout_address: None,
        }
    }

    #[test]
    fn test_save_then_load() {
        let store = SessionStore::new(MemoryStore::default());
        let session = Session {
            token: Some("t".into()),
            user: Some(user()),
        };
        store.save(&session);

        let loaded = store.load();
        assert_eq!(loaded, session);
        assert!(loaded.is_authenticated());
        assert!(loaded.is_admin());
    }

    #[test]
    fn test_clear_removes_everything() {
        let backing = MemoryStore::default();
        let store = SessionStore::new(backing.clone());
        store.save(&Session {
            token: Some("t".into()),
            user: Some(user()),
        });

        store.clear();

        assert_eq!(store.load(), Session::default());
        assert!(backing.get(STORAGE_TOKEN_KEY).is_none());
    }

    #[test]
    fn test_corrupt_user_is_ignored() {
        let backing = MemoryStore::default();
        backing.set(STORAGE_TOKEN_KEY, "t");
        backing.set(STORAGE_USER_KEY, "{not json");

        let loaded = SessionStore::new(backing).load();
        assert_eq!(loaded.token.as_deref(), Some("t"));
        assert!(loaded.user.is_none());
        assert!(!loaded.is_admin());
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let backing = MemoryStore::default();
        backing.set(STORAGE_TOKEN_KEY, "");
        let loaded = SessionStore::new(backing).load();
        assert!(!loaded.is_authenticated());
    }
}
