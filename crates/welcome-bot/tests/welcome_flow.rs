//! End-to-end flow through the dispatcher with the real TOML store and a real
//! image folder on disk.  Only the event bus is replaced by a recorder.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use welcome_bot::application::{
    load_welcome_config, AccessPolicy, BusError, Dispatcher, EventBus, WelcomeService,
};
use welcome_bot::infrastructure::image_folder::ImageFolder;
use welcome_bot::infrastructure::storage::TomlConfigStore;
use welcome_core::{OutboundMessage, ReplyTarget, Segment};

// ── Test doubles ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingBus {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingBus {
    fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl EventBus for RecordingBus {
    async fn send(&self, message: OutboundMessage) -> Result<(), BusError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

struct Harness {
    dispatcher: Dispatcher,
    bus: Arc<RecordingBus>,
}

/// Starts the bot the way `main` does, rooted at `dir`.
fn start(dir: &Path) -> Harness {
    let store = TomlConfigStore::open(dir.join("welcome.toml")).unwrap();
    let config = load_welcome_config(&store);
    let images = ImageFolder::ensure(dir.join(&config.image_folder)).unwrap();
    let service = WelcomeService::new(config, Box::new(store), Arc::new(images));

    let bus = Arc::new(RecordingBus::default());
    let dispatcher = Dispatcher::new(
        Arc::new(service),
        AccessPolicy::new(["10000"]),
        "/",
        Arc::clone(&bus) as Arc<dyn EventBus>,
    );
    Harness { dispatcher, bus }
}

fn temp_root() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("welcome-flow-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn command(group_id: u64, user_id: u64, role: &str, text: &str) -> Value {
    json!({
        "post_type": "message",
        "message_type": "group",
        "group_id": group_id,
        "user_id": user_id,
        "raw_message": text,
        "sender": {"role": role}
    })
}

fn join(group_id: u64, user_id: u64) -> Value {
    json!({"post_type": "notice", "notice_type": "group_increase",
           "group_id": group_id, "user_id": user_id})
}

fn reply_text(message: &OutboundMessage) -> String {
    message
        .chain
        .segments()
        .iter()
        .filter_map(|s| match s {
            Segment::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_full_welcome_scenario() {
    // Arrange
    let root = temp_root();
    let bot = start(&root);

    // Act 1: the group admin enables their group; a superuser sets the text.
    bot.dispatcher
        .dispatch(&command(1001, 42, "admin", "/welcome_enable"))
        .await;
    bot.dispatcher
        .dispatch(&command(1001, 10000, "member", "/welcome_set Welcome aboard!"))
        .await;
    bot.dispatcher
        .dispatch(&command(1001, 10000, "member", "/welcome_image_disable"))
        .await;

    // Assert 1
    let replies: Vec<String> = bot.bus.take().iter().map(reply_text).collect();
    assert_eq!(
        replies,
        vec![
            "已启用群 1001 的欢迎功能",
            "欢迎消息已更新",
            "图片欢迎功能已禁用"
        ]
    );

    // Act 2: someone joins the enabled group and another group.
    bot.dispatcher.dispatch(&join(1001, 555)).await;
    bot.dispatcher.dispatch(&join(2002, 556)).await;

    // Assert 2
    let sent = bot.bus.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].target, ReplyTarget::Group("1001".to_string()));
    assert_eq!(
        sent[0].chain.segments(),
        &[Segment::mention("555"), Segment::text(" Welcome aboard!")]
    );

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_image_is_attached_from_folder_on_disk() {
    // Arrange
    let root = temp_root();
    let bot = start(&root);
    bot.dispatcher
        .dispatch(&command(1001, 10000, "member", "/welcome_enable"))
        .await;
    std::fs::write(root.join("welcome_images").join("cat.png"), b"png").unwrap();
    std::fs::write(root.join("welcome_images").join("readme.txt"), b"txt").unwrap();
    bot.bus.take();

    // Act
    bot.dispatcher.dispatch(&join(1001, 555)).await;

    // Assert
    let sent = bot.bus.take();
    let images: Vec<&Path> = sent[0].chain.images().collect();
    assert_eq!(images.len(), 1);
    assert!(images[0].ends_with("cat.png"));
    assert!(images[0].is_absolute());

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_settings_survive_restart() {
    // Arrange
    let root = temp_root();
    {
        let bot = start(&root);
        bot.dispatcher
            .dispatch(&command(1001, 10000, "member", "/welcome_enable 2002"))
            .await;
        bot.dispatcher
            .dispatch(&command(1001, 10000, "member", "/welcome_set X"))
            .await;
    }

    // Act
    let bot = start(&root);
    bot.dispatcher
        .dispatch(&command(1001, 42, "member", "/welcome_show"))
        .await;
    bot.dispatcher.dispatch(&join(2002, 7)).await;

    // Assert
    let sent = bot.bus.take();
    assert_eq!(reply_text(&sent[0]), "当前欢迎消息: X");
    assert_eq!(sent[1].target, ReplyTarget::Group("2002".to_string()));

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_member_cannot_change_settings() {
    // Arrange
    let root = temp_root();
    let bot = start(&root);

    // Act
    bot.dispatcher
        .dispatch(&command(1001, 42, "member", "/welcome_enable"))
        .await;
    bot.dispatcher.dispatch(&join(1001, 555)).await;

    // Assert
    let sent = bot.bus.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(reply_text(&sent[0]), "权限不足，仅管理员可使用此命令");
    assert!(!root.join("welcome.toml").exists());

    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_status_reports_live_image_count() {
    // Arrange
    let root = temp_root();
    let bot = start(&root);
    for name in ["a.png", "b.jpg", "c.gif"] {
        std::fs::write(root.join("welcome_images").join(name), b"x").unwrap();
    }

    // Act
    bot.dispatcher
        .dispatch(&command(1001, 42, "member", "/welcome_status"))
        .await;

    // Assert
    let status = reply_text(&bot.bus.take()[0]);
    assert!(status.contains("启用群组: 无"));
    assert!(status.contains("可用图片数量: 3"));

    let _ = std::fs::remove_dir_all(&root);
}
