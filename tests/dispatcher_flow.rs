//! Dispatcher integration tests
//! Run with: cargo test --test dispatcher_flow

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use mousebot::application::errors::{BotError, CommandError, StorageError};
use mousebot::application::messaging::replies;
use mousebot::application::messaging::{
    DebugChannelMiddleware, Dispatch, MessageDispatcher, SelfMessageMiddleware,
};
use mousebot::application::render::CounterView;
use mousebot::application::services::CounterBook;
use mousebot::domain::entities::{Adjustment, ChannelCounter, CounterMap, Message, MessageId, MouseCommand, User};
use mousebot::domain::traits::{Bot, BotInfo, CounterStore};
use mousebot::infrastructure::storage::{JsonFileStore, MemoryStore};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

const CHANNEL: &str = "1001";
const BOT_ID: &str = "999";

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Text(String),
    Counter { id: MessageId, fields: Vec<String> },
    Edit { id: MessageId, fields: Vec<String> },
}

/// Records everything the dispatcher asks the platform to do
#[derive(Default)]
struct RecordingBot {
    sent: Mutex<Vec<(String, Sent)>>,
    fail_edits: bool,
    fail_posts: bool,
}

impl RecordingBot {
    fn failing_edits() -> Self {
        Self { fail_edits: true, ..Self::default() }
    }

    fn failing_posts() -> Self {
        Self { fail_posts: true, ..Self::default() }
    }

    fn take(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().drain(..).map(|(_, s)| s).collect()
    }

    fn push(&self, chat_id: &str, sent: Sent) -> usize {
        let mut log = self.sent.lock().unwrap();
        log.push((chat_id.to_string(), sent));
        log.len()
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn start(&self) -> Result<(), BotError> {
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageId, BotError> {
        Ok(self.push(chat_id, Sent::Text(text.to_string())) as MessageId)
    }

    async fn send_counter(&self, chat_id: &str, view: &CounterView) -> Result<MessageId, BotError> {
        if self.fail_posts {
            return Err(BotError::Network("channel unavailable".to_string()));
        }
        let id = 500 + self.sent.lock().unwrap().len() as MessageId;
        self.push(chat_id, Sent::Counter { id, fields: view.fields.clone() });
        Ok(id)
    }

    async fn edit_counter(&self, chat_id: &str, message_id: MessageId, view: &CounterView) -> Result<(), BotError> {
        if self.fail_edits {
            return Err(BotError::Network(format!("message {} not found", message_id)));
        }
        self.push(chat_id, Sent::Edit { id: message_id, fields: view.fields.clone() });
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: BOT_ID.to_string(),
            name: "mousebot".to_string(),
            username: "mousebot".to_string(),
        }
    }
}

/// Memory store whose saves fail while `broken` is set
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    broken: Arc<AtomicBool>,
}

impl FlakyStore {
    fn set_broken(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }
}

impl CounterStore for FlakyStore {
    fn load(&self) -> Result<CounterMap, StorageError> {
        self.inner.load()
    }

    fn save(&self, counters: &CounterMap) -> Result<(), StorageError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full")));
        }
        self.inner.save(counters)
    }
}

fn dispatcher(store: impl CounterStore + 'static) -> MessageDispatcher {
    ensure_init();
    let book = CounterBook::open(Box::new(store)).unwrap();
    MessageDispatcher::new("/mousebot", book)
        .with_bot_username("mousebot")
        .with_middleware(SelfMessageMiddleware::new(BOT_ID))
}

fn msg(text: &str) -> Message {
    Message::new(CHANNEL, text)
        .with_chat_name("general")
        .with_sender(User::new("42").with_username("heather"))
}

fn fields(human: u64, cat: u64) -> Vec<String> {
    vec![
        format!("Caught by humans: {}", human),
        format!("Caught by cats: {}", cat),
    ]
}

fn counts(d: &MessageDispatcher) -> Option<(u64, u64)> {
    d.counters().get(CHANNEL).map(|c| (c.human, c.cat))
}

#[tokio::test]
async fn init_posts_a_zero_counter_and_persists_it() {
    let store = MemoryStore::new();
    let mut d = dispatcher(store.clone());
    let bot = RecordingBot::default();

    assert_eq!(d.process(&bot, msg("/mousebot init")).await, Dispatch::Handled(MouseCommand::Init));

    let sent = bot.take();
    let [Sent::Counter { id, fields: shown }] = sent.as_slice() else {
        panic!("expected one counter post, got {:?}", sent);
    };
    assert_eq!(shown, &fields(0, 0));
    assert_eq!(store.snapshot()[CHANNEL], ChannelCounter::new(*id));
}

#[tokio::test]
async fn decrement_below_zero_clamps_and_warns() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot init")).await;
    d.process(&bot, msg("/mousebot +3")).await;
    bot.take();

    d.process(&bot, msg("/mousebot -5")).await;
    assert_eq!(counts(&d), Some((0, 0)));

    let sent = bot.take();
    assert_eq!(sent[0], Sent::Text(replies::CLAMP_NOTICE.to_string()));
    assert!(matches!(&sent[1], Sent::Edit { fields: f, .. } if *f == fields(0, 0)));
}

#[tokio::test]
async fn cat_counts_are_independent() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot init")).await;
    d.process(&bot, msg("/mousebot +")).await;
    d.process(&bot, msg("/mousebot cat +2")).await;
    d.process(&bot, msg("/mousebot cat -1")).await;

    assert_eq!(counts(&d), Some((1, 1)));
}

#[tokio::test]
async fn edits_target_the_recorded_message() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot init")).await;
    let counter_id = d.counters().get(CHANNEL).unwrap().message_id;
    bot.take();

    d.process(&bot, msg("/mousebot cat +4")).await;
    assert_eq!(bot.take(), vec![Sent::Edit { id: counter_id, fields: fields(0, 4) }]);
}

#[tokio::test]
async fn first_increment_creates_the_counter() {
    let store = MemoryStore::new();
    let mut d = dispatcher(store.clone());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot +2")).await;

    let sent = bot.take();
    assert_eq!(sent[0], Sent::Text(replies::CREATING_NOTICE.to_string()));
    assert!(matches!(&sent[1], Sent::Counter { fields: f, .. } if *f == fields(2, 0)));
    assert_eq!(store.snapshot()[CHANNEL].human, 2);
}

#[tokio::test]
async fn first_decrement_creates_at_zero() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot cat -3")).await;

    assert_eq!(counts(&d), Some((0, 0)));
    let sent = bot.take();
    assert_eq!(sent[0], Sent::Text(replies::CREATING_NOTICE.to_string()));
    assert_eq!(sent[1], Sent::Text(replies::CLAMP_NOTICE.to_string()));
}

#[tokio::test]
async fn reset_zeroes_both_counts() {
    let store = MemoryStore::new();
    let mut d = dispatcher(store.clone());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot init")).await;
    d.process(&bot, msg("/mousebot +7")).await;
    d.process(&bot, msg("/mousebot cat +3")).await;
    d.process(&bot, msg("/mousebot reset")).await;

    assert_eq!(counts(&d), Some((0, 0)));
    assert_eq!((store.snapshot()[CHANNEL].human, store.snapshot()[CHANNEL].cat), (0, 0));
}

#[tokio::test]
async fn unknown_command_hints_and_changes_nothing() {
    let store = MemoryStore::new();
    let mut d = dispatcher(store.clone());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot init")).await;
    d.process(&bot, msg("/mousebot +2")).await;
    let before = store.snapshot();
    bot.take();

    let outcome = d.process(&bot, msg("/mousebot dance")).await;
    assert_eq!(outcome, Dispatch::Rejected(CommandError::UnknownSubcommand("dance".to_string())));

    let sent = bot.take();
    assert!(matches!(&sent[..], [Sent::Text(t)] if t.contains("/mousebot help")));
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn bad_magnitude_sends_usage_only() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot init")).await;
    bot.take();

    d.process(&bot, msg("/mousebot cat +many")).await;
    assert_eq!(bot.take(), vec![Sent::Text("Usage: `/mousebot cat +`".to_string())]);
    assert_eq!(counts(&d), Some((0, 0)));
}

#[tokio::test]
async fn bare_prefix_and_help_send_usage() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    let usage = replies::usage("/mousebot");
    assert_eq!(d.process(&bot, msg("/mousebot")).await, Dispatch::Rejected(CommandError::MissingSubcommand));
    assert_eq!(d.process(&bot, msg("/mousebot help")).await, Dispatch::Handled(MouseCommand::Help));
    assert_eq!(bot.take(), vec![Sent::Text(usage.clone()), Sent::Text(usage)]);
    assert!(d.counters().is_empty());
}

#[tokio::test]
async fn unrelated_and_own_messages_are_ignored() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    assert_eq!(d.process(&bot, msg("good morning")).await, Dispatch::Ignored);

    let own = Message::new(CHANNEL, "/mousebot +").with_sender(User::new(BOT_ID).as_bot());
    assert_eq!(d.process(&bot, own).await, Dispatch::Ignored);
    assert!(bot.take().is_empty());
}

#[tokio::test]
async fn debug_mode_only_serves_the_test_channel() {
    ensure_init();
    let book = CounterBook::open(Box::new(MemoryStore::new())).unwrap();
    let mut d = MessageDispatcher::new("/mousebot", book)
        .with_middleware(DebugChannelMiddleware::new("testing"));
    let bot = RecordingBot::default();

    assert_eq!(d.process(&bot, msg("/mousebot init")).await, Dispatch::Ignored);

    let in_testing = Message::new("2002", "/mousebot init").with_chat_name("testing");
    assert_eq!(d.process(&bot, in_testing).await, Dispatch::Handled(MouseCommand::Init));
    assert!(d.counters().get("2002").is_some());
    assert!(d.counters().get(CHANNEL).is_none());
}

#[tokio::test]
async fn channels_are_counted_separately() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot +3")).await;
    d.process(&bot, Message::new("2002", "/mousebot cat +1")).await;

    assert_eq!(counts(&d), Some((3, 0)));
    assert_eq!(d.counters().get("2002").map(|c| (c.human, c.cat)), Some((0, 1)));
}

#[tokio::test]
async fn failed_edit_is_reported_and_state_kept() {
    let store = MemoryStore::new();
    let mut d = dispatcher(store.clone());
    let bot = RecordingBot::failing_edits();

    d.process(&bot, msg("/mousebot init")).await;
    bot.take();

    assert_eq!(d.process(&bot, msg("/mousebot +1")).await, Dispatch::Failed);
    assert_eq!(store.snapshot()[CHANNEL].human, 1);

    let sent = bot.take();
    assert_eq!(sent[0], Sent::Text(replies::EDIT_FAILURE.to_string()));
    assert_eq!(sent[1], Sent::Text(replies::usage("/mousebot")));
}

#[tokio::test]
async fn counts_never_go_negative_over_any_sequence() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    let script = ["+2", "-1", "-9", "cat -", "+", "cat +5", "cat -6", "-", "-", "reset", "-3"];
    for step in script {
        d.process(&bot, msg(&format!("/mousebot {}", step))).await;
        let (human, cat) = counts(&d).unwrap();
        assert!(human <= 2 && cat <= 5, "after {}: {} {}", step, human, cat);
    }
    assert_eq!(counts(&d), Some((0, 0)));
}

#[tokio::test]
async fn counters_survive_a_restart() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counts.json");
    let bot = RecordingBot::default();

    {
        let book = CounterBook::open(Box::new(JsonFileStore::new(&path))).unwrap();
        let mut d = MessageDispatcher::new("/mousebot", book);
        d.process(&bot, msg("/mousebot init")).await;
        d.process(&bot, msg("/mousebot +4")).await;
        d.process(&bot, msg("/mousebot cat +1")).await;
    }

    let reloaded: CounterMap = JsonFileStore::new(&path).load().unwrap();
    let counter = reloaded[CHANNEL];
    assert_eq!((counter.human, counter.cat), (4, 1));

    let book = CounterBook::open(Box::new(JsonFileStore::new(&path))).unwrap();
    let mut d = MessageDispatcher::new("/mousebot", book);
    d.process(&bot, msg("/mousebot -")).await;
    assert_eq!(counts(&d), Some((3, 1)));
    assert_eq!(d.counters().get(CHANNEL).unwrap().message_id, counter.message_id);
}

#[tokio::test]
async fn failed_post_is_reported_generically() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::failing_posts();

    assert_eq!(d.process(&bot, msg("/mousebot init")).await, Dispatch::Failed);
    assert_eq!(
        bot.take(),
        vec![
            Sent::Text(replies::GENERIC_FAILURE.to_string()),
            Sent::Text(replies::usage("/mousebot")),
        ]
    );
    assert!(d.counters().is_empty());

    // Later commands are still served
    assert_eq!(d.process(&bot, msg("/mousebot help")).await, Dispatch::Handled(MouseCommand::Help));
}

#[tokio::test]
async fn failed_save_is_reported_and_retry_counts_once() {
    let store = FlakyStore::default();
    let mut d = dispatcher(store.clone());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot init")).await;
    bot.take();

    store.set_broken(true);
    assert_eq!(d.process(&bot, msg("/mousebot +1")).await, Dispatch::Failed);
    assert_eq!(
        bot.take(),
        vec![
            Sent::Text(replies::GENERIC_FAILURE.to_string()),
            Sent::Text(replies::usage("/mousebot")),
        ]
    );
    assert_eq!(counts(&d), Some((0, 0)));
    assert_eq!(store.inner.snapshot()[CHANNEL].human, 0);

    store.set_broken(false);
    assert_eq!(
        d.process(&bot, msg("/mousebot +1")).await,
        Dispatch::Handled(MouseCommand::human(Adjustment::Add(1)))
    );
    assert_eq!(counts(&d), Some((1, 0)));
    assert_eq!(store.inner.snapshot()[CHANNEL].human, 1);
    assert!(matches!(&bot.take()[..], [Sent::Edit { fields: f, .. }] if *f == fields(1, 0)));
}

#[tokio::test]
async fn reset_on_new_channel_creates_counter() {
    let store = MemoryStore::new();
    let mut d = dispatcher(store.clone());
    let bot = RecordingBot::default();

    assert_eq!(d.process(&bot, msg("/mousebot reset")).await, Dispatch::Handled(MouseCommand::Reset));

    let sent = bot.take();
    assert_eq!(sent[0], Sent::Text(replies::RESET_NOTICE.to_string()));
    let Sent::Counter { id, fields: shown } = &sent[1] else {
        panic!("expected a counter post, got {:?}", sent);
    };
    assert_eq!(shown, &fields(0, 0));
    assert_eq!(store.snapshot()[CHANNEL], ChannelCounter::new(*id));
}

#[tokio::test]
async fn init_again_replaces_the_counter() {
    let store = MemoryStore::new();
    let mut d = dispatcher(store.clone());
    let bot = RecordingBot::default();

    d.process(&bot, msg("/mousebot init")).await;
    d.process(&bot, msg("/mousebot +3")).await;
    let first_id = d.counters().get(CHANNEL).unwrap().message_id;

    d.process(&bot, msg("/mousebot init")).await;
    let replaced = *d.counters().get(CHANNEL).unwrap();

    assert_ne!(replaced.message_id, first_id);
    assert_eq!((replaced.human, replaced.cat), (0, 0));
    assert_eq!(store.snapshot()[CHANNEL], replaced);
    assert_eq!(d.counters().len(), 1);
}

#[tokio::test]
async fn commands_for_another_bot_are_ignored() {
    let mut d = dispatcher(MemoryStore::new());
    let bot = RecordingBot::default();

    assert_eq!(d.process(&bot, msg("/mousebot@someotherbot +")).await, Dispatch::Ignored);
    assert!(bot.take().is_empty());

    assert_eq!(d.process(&bot, msg("/mousebot@mousebot init")).await, Dispatch::Handled(MouseCommand::Init));
}
