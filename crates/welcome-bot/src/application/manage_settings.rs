//! ManageSettingsUseCase: the `welcome_*` administrative commands.
//!
//! Every handler returns the reply text for the caller and never an error:
//! user mistakes get a hint, persistence failures get a generic failure
//! reply and an `error!` log line.
//!
//! Mutating handlers follow the same sequence while holding the service lock:
//!
//! ```text
//! lock → check (idempotence) → mutate in memory → store.set → store.save → reply
//! ```
//!
//! If `save` fails the in-memory settings are already updated and stay ahead
//! of the durable copy until the next successful save.
//!
//! Access control is not checked here; the dispatcher consults
//! `AccessPolicy` before calling a mutating handler.

use serde_json::Value;
use tracing::{error, info};

use welcome_core::domain::config::{KEY_ENABLED_GROUPS, KEY_ENABLE_IMAGE, KEY_WELCOME_MESSAGE};
use welcome_core::Command;

use super::welcome_service::WelcomeService;

const NEED_GROUP: &str = "请在群聊中使用此命令或指定群号";
const MESSAGE_UPDATED: &str = "欢迎消息已更新";
const MESSAGE_USAGE: &str = "请提供欢迎消息内容，例如: welcome_set 欢迎新朋友!";
const IMAGE_ENABLED: &str = "图片欢迎功能已启用";
const IMAGE_DISABLED: &str = "图片欢迎功能已禁用";

const ENABLE_FAILED: &str = "启用群聊时出错";
const DISABLE_FAILED: &str = "禁用群聊时出错";
const SET_MESSAGE_FAILED: &str = "设置欢迎消息时出错";
const ENABLE_IMAGE_FAILED: &str = "启用图片欢迎功能时出错";
const DISABLE_IMAGE_FAILED: &str = "禁用图片欢迎功能时出错";

/// Picks the explicit group argument, else the group the command came from.
fn resolve_group(explicit: Option<&str>, origin_group: Option<&str>) -> Option<String> {
    explicit
        .or(origin_group)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
}

impl WelcomeService {
    /// Runs `command` and returns the reply text.
    ///
    /// `origin_group` is the group the command was typed in, if any.
    pub async fn execute(&self, command: &Command, origin_group: Option<&str>) -> String {
        match command {
            Command::Enable { group_id } => {
                self.enable_group(group_id.as_deref(), origin_group).await
            }
            Command::Disable { group_id } => {
                self.disable_group(group_id.as_deref(), origin_group).await
            }
            Command::SetMessage { text } => self.set_message(text).await,
            Command::ShowMessage => self.show_message().await,
            Command::EnableImage => self.set_image_enabled(true).await,
            Command::DisableImage => self.set_image_enabled(false).await,
            Command::Status => self.status().await,
        }
    }

    /// `welcome_enable [group_id]`
    pub async fn enable_group(&self, group_id: Option<&str>, origin_group: Option<&str>) -> String {
        let Some(group_id) = resolve_group(group_id, origin_group) else {
            return NEED_GROUP.to_string();
        };

        let mut state = self.lock().await;
        if !state.config.enabled_groups.insert(group_id.clone()) {
            return format!("群 {group_id} 的欢迎功能已经启用");
        }
        let groups = Value::from(state.config.enabled_groups.to_vec());
        match state.persist(KEY_ENABLED_GROUPS, groups) {
            Ok(()) => {
                info!("welcome enabled for group {group_id}");
                format!("已启用群 {group_id} 的欢迎功能")
            }
            Err(e) => {
                error!("failed to enable group {group_id}: {e}");
                ENABLE_FAILED.to_string()
            }
        }
    }

    /// `welcome_disable [group_id]`
    pub async fn disable_group(
        &self,
        group_id: Option<&str>,
        origin_group: Option<&str>,
    ) -> String {
        let Some(group_id) = resolve_group(group_id, origin_group) else {
            return NEED_GROUP.to_string();
        };

        let mut state = self.lock().await;
        if !state.config.enabled_groups.remove(&group_id) {
            return format!("群 {group_id} 的欢迎功能已经禁用");
        }
        let groups = Value::from(state.config.enabled_groups.to_vec());
        match state.persist(KEY_ENABLED_GROUPS, groups) {
            Ok(()) => {
                info!("welcome disabled for group {group_id}");
                format!("已禁用群 {group_id} 的欢迎功能")
            }
            Err(e) => {
                error!("failed to disable group {group_id}: {e}");
                DISABLE_FAILED.to_string()
            }
        }
    }

    /// `welcome_set <text>`
    pub async fn set_message(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return MESSAGE_USAGE.to_string();
        }

        let mut state = self.lock().await;
        state.config.welcome_message = text.to_string();
        match state.persist(KEY_WELCOME_MESSAGE, Value::from(text)) {
            Ok(()) => {
                info!("welcome message updated");
                MESSAGE_UPDATED.to_string()
            }
            Err(e) => {
                error!("failed to set welcome message: {e}");
                SET_MESSAGE_FAILED.to_string()
            }
        }
    }

    /// `welcome_show`
    pub async fn show_message(&self) -> String {
        let state = self.lock().await;
        format!("当前欢迎消息: {}", state.config.welcome_message)
    }

    /// `welcome_image_enable` / `welcome_image_disable`
    pub async fn set_image_enabled(&self, enabled: bool) -> String {
        let mut state = self.lock().await;
        state.config.enable_image = enabled;
        match state.persist(KEY_ENABLE_IMAGE, Value::from(enabled)) {
            Ok(()) => {
                info!("image welcome set to {enabled}");
                let reply = if enabled { IMAGE_ENABLED } else { IMAGE_DISABLED };
                reply.to_string()
            }
            Err(e) => {
                error!("failed to set image welcome to {enabled}: {e}");
                let reply = if enabled { ENABLE_IMAGE_FAILED } else { DISABLE_IMAGE_FAILED };
                reply.to_string()
            }
        }
    }

    /// `welcome_status`
    pub async fn status(&self) -> String {
        let cfg = self.config().await;

        let groups = if cfg.enabled_groups.is_empty() {
            "无".to_string()
        } else {
            cfg.enabled_groups.iter().collect::<Vec<_>>().join(", ")
        };
        let count = match self.image_count() {
            Ok(n) => n.to_string(),
            Err(_) => "无法获取".to_string(),
        };

        format!(
            "欢迎插件状态:\n启用群组: {groups}\n欢迎消息: {}\n图片欢迎: {}\n图片文件夹: {}\n可用图片数量: {count}",
            cfg.welcome_message,
            if cfg.enable_image { "启用" } else { "禁用" },
            self.image_folder().display(),
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use welcome_core::{AllowList, WelcomeConfig};

    use crate::application::load_welcome_config;
    use crate::application::testing::{FixedImages, MemoryStore};
    use crate::application::welcome_service::MockConfigStore;

    fn make_service(store: MemoryStore, images: FixedImages) -> WelcomeService {
        WelcomeService::load(Box::new(store), Arc::new(images))
    }

    #[tokio::test]
    async fn test_enable_explicit_group_persists_and_confirms() {
        // Arrange
        let store = MemoryStore::with(&[(KEY_ENABLED_GROUPS, json!(["1001"]))]);
        let durable = store.durable();
        let service = make_service(store, FixedImages::empty());

        // Act
        let reply = service.enable_group(Some("2002"), None).await;

        // Assert
        assert_eq!(reply, "已启用群 2002 的欢迎功能");
        assert_eq!(
            service.config().await.enabled_groups.to_vec(),
            vec!["1001", "2002"]
        );
        assert_eq!(
            durable.lock().unwrap().get(KEY_ENABLED_GROUPS),
            Some(&json!(["1001", "2002"]))
        );
    }

    #[tokio::test]
    async fn test_enable_uses_origin_group_when_no_argument() {
        let service = make_service(MemoryStore::default(), FixedImages::empty());
        let reply = service.enable_group(None, Some("3003")).await;
        assert_eq!(reply, "已启用群 3003 的欢迎功能");
        assert!(service.config().await.enabled_groups.contains("3003"));
    }

    #[tokio::test]
    async fn test_enable_without_any_group_asks_for_one() {
        // Arrange: private chat, no argument
        let store = MemoryStore::default();
        let durable = store.durable();
        let service = make_service(store, FixedImages::empty());

        // Act
        let reply = service.enable_group(None, None).await;

        // Assert
        assert_eq!(reply, NEED_GROUP);
        assert!(service.config().await.enabled_groups.is_empty());
        assert!(durable.lock().unwrap().is_empty(), "nothing may be persisted");
    }

    #[tokio::test]
    async fn test_enable_twice_is_idempotent() {
        let service = make_service(MemoryStore::default(), FixedImages::empty());

        let first = service.enable_group(Some("2002"), None).await;
        let second = service.enable_group(Some("2002"), None).await;

        assert_eq!(first, "已启用群 2002 的欢迎功能");
        assert_eq!(second, "群 2002 的欢迎功能已经启用");
        assert_eq!(service.config().await.enabled_groups.len(), 1);
    }

    #[tokio::test]
    async fn test_disable_absent_group_reports_already_disabled() {
        let store = MemoryStore::with(&[(KEY_ENABLED_GROUPS, json!(["1001"]))]);
        let service = make_service(store, FixedImages::empty());

        let reply = service.disable_group(Some("2002"), None).await;

        assert_eq!(reply, "群 2002 的欢迎功能已经禁用");
        assert_eq!(service.config().await.enabled_groups.to_vec(), vec!["1001"]);
    }

    #[tokio::test]
    async fn test_disable_present_group_removes_and_persists() {
        let store = MemoryStore::with(&[(KEY_ENABLED_GROUPS, json!(["1001", "2002"]))]);
        let durable = store.durable();
        let service = make_service(store, FixedImages::empty());

        let reply = service.disable_group(None, Some("1001")).await;

        assert_eq!(reply, "已禁用群 1001 的欢迎功能");
        assert_eq!(
            durable.lock().unwrap().get(KEY_ENABLED_GROUPS),
            Some(&json!(["2002"]))
        );
    }

    #[tokio::test]
    async fn test_set_message_round_trips_through_show_and_restart() {
        // Arrange
        let store = MemoryStore::default();
        let durable = store.durable();
        let service = make_service(store, FixedImages::empty());

        // Act
        let reply = service.set_message("X").await;

        // Assert
        assert_eq!(reply, MESSAGE_UPDATED);
        assert_eq!(service.show_message().await, "当前欢迎消息: X");

        let restarted = make_service(MemoryStore::reopen(&durable), FixedImages::empty());
        assert_eq!(restarted.show_message().await, "当前欢迎消息: X");
    }

    #[tokio::test]
    async fn test_set_message_with_blank_text_is_rejected() {
        let service = make_service(MemoryStore::default(), FixedImages::empty());
        let reply = service.set_message("   ").await;
        assert_eq!(reply, MESSAGE_USAGE);
        assert_eq!(
            service.config().await.welcome_message,
            WelcomeConfig::default().welcome_message
        );
    }

    #[tokio::test]
    async fn test_image_toggle_persists_flag() {
        let store = MemoryStore::default();
        let durable = store.durable();
        let service = make_service(store, FixedImages::empty());

        assert_eq!(service.set_image_enabled(false).await, IMAGE_DISABLED);
        assert_eq!(
            durable.lock().unwrap().get(KEY_ENABLE_IMAGE),
            Some(&json!(false))
        );
        assert_eq!(service.set_image_enabled(true).await, IMAGE_ENABLED);
        assert!(load_welcome_config(&MemoryStore::reopen(&durable)).enable_image);
    }

    #[tokio::test]
    async fn test_save_failure_yields_generic_failure_reply() {
        // Arrange
        let mut store = MemoryStore::default();
        store.fail_save = true;
        let service = make_service(store, FixedImages::empty());

        // Act
        let reply = service.enable_group(Some("2002"), None).await;

        // Assert: failure reported; memory is ahead of the durable copy.
        assert_eq!(reply, ENABLE_FAILED);
        assert!(service.config().await.enabled_groups.contains("2002"));
    }

    #[tokio::test]
    async fn test_rejected_value_yields_failure_without_saving() {
        // Arrange: the store refuses the value; save must never be attempted.
        let mut store = MockConfigStore::new();
        store.expect_get().returning(|_| None);
        store.expect_set().returning(|key, _| {
            Err(crate::application::StoreError::InvalidValue {
                key: key.to_string(),
                reason: "unsupported".to_string(),
            })
        });
        store.expect_save().never();
        let service = WelcomeService::load(Box::new(store), Arc::new(FixedImages::empty()));

        // Act
        let reply = service.set_message("hello").await;

        // Assert
        assert_eq!(reply, SET_MESSAGE_FAILED);
    }

    #[tokio::test]
    async fn test_status_lists_groups_flag_folder_and_image_count() {
        // Arrange
        let store = MemoryStore::with(&[
            (KEY_ENABLED_GROUPS, json!(["1001"])),
            (KEY_WELCOME_MESSAGE, json!("Welcome!")),
            (KEY_ENABLE_IMAGE, json!(true)),
        ]);
        let images = FixedImages::new(&["/imgs/a.png", "/imgs/b.png", "/imgs/c.gif"]);
        let service = make_service(store, images);

        // Act
        let status = service.status().await;

        // Assert
        assert!(status.starts_with("欢迎插件状态:"));
        assert!(status.contains("启用群组: 1001"));
        assert!(status.contains("欢迎消息: Welcome!"));
        assert!(status.contains("图片欢迎: 启用"));
        assert!(status.contains("图片文件夹: /imgs"));
        assert!(status.contains("可用图片数量: 3"));
    }

    #[tokio::test]
    async fn test_status_with_no_groups_and_unreadable_folder() {
        let service = WelcomeService::new(
            WelcomeConfig {
                enabled_groups: AllowList::new(),
                enable_image: false,
                ..WelcomeConfig::default()
            },
            Box::new(MemoryStore::default()),
            Arc::new(FixedImages::failing()),
        );

        let status = service.status().await;

        assert!(status.contains("启用群组: 无"));
        assert!(status.contains("图片欢迎: 禁用"));
        assert!(status.contains("可用图片数量: 无法获取"));
    }

    #[tokio::test]
    async fn test_execute_routes_each_command() {
        let service = make_service(MemoryStore::default(), FixedImages::empty());

        let reply = service
            .execute(&Command::Enable { group_id: None }, Some("1001"))
            .await;
        assert_eq!(reply, "已启用群 1001 的欢迎功能");

        let reply = service.execute(&Command::ShowMessage, None).await;
        assert!(reply.starts_with("当前欢迎消息: "));

        let reply = service.execute(&Command::DisableImage, None).await;
        assert_eq!(reply, IMAGE_DISABLED);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enables_are_all_kept() {
        // Arrange
        let store = MemoryStore::default();
        let durable = store.durable();
        let service = Arc::new(make_service(store, FixedImages::empty()));
        let ids: Vec<String> = (0..32).map(|i| format!("{}", 5000 + i)).collect();

        // Act
        let handles: Vec<_> = ids
            .iter()
            .cloned()
            .map(|id| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.enable_group(Some(&id), None).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Assert: no update was lost, in memory or in the saved copy.
        let in_memory = service.config().await.enabled_groups;
        let saved: Vec<String> = serde_json::from_value(
            durable.lock().unwrap().get(KEY_ENABLED_GROUPS).cloned().unwrap(),
        )
        .unwrap();
        assert_eq!(in_memory.len(), ids.len());
        assert_eq!(saved.len(), ids.len());
        for id in &ids {
            assert!(in_memory.contains(id), "{id} missing in memory");
            assert!(saved.contains(id), "{id} missing in store");
        }
    }

    #[test]
    fn test_resolve_group_prefers_explicit_argument() {
        assert_eq!(resolve_group(Some("1"), Some("2")), Some("1".to_string()));
        assert_eq!(resolve_group(None, Some("2")), Some("2".to_string()));
        assert_eq!(resolve_group(None, None), None);
        assert_eq!(resolve_group(None, Some("  ")), None);
    }
}
