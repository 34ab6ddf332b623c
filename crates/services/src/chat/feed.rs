use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use prep_core::model::{ChatMessage, ChatRoom, RoomId};
use storage::repository::{ChatRepository, StorageError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Latest view of the room list and the active room's messages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatSnapshot {
    pub room: Option<RoomId>,
    pub rooms: Vec<ChatRoom>,
    pub messages: Vec<ChatMessage>,
}

/// Periodic re-read of chat state, published on a `watch` channel.
///
/// One background task polls at a time. Switching rooms aborts it and starts
/// a fresh one; dropping the feed cancels it. A task only publishes while its
/// generation is current, so a read that was in flight during a switch never
/// reaches subscribers.
pub struct ChatFeed {
    chat: Arc<dyn ChatRepository>,
    interval: Duration,
    tx: Arc<watch::Sender<ChatSnapshot>>,
    generation: Arc<AtomicU64>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ChatFeed {
    /// Start polling `room` (or only the room list when `None`).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn start(chat: Arc<dyn ChatRepository>, room: Option<RoomId>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(ChatSnapshot::default());
        let mut feed = Self {
            chat,
            interval,
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            token: CancellationToken::new(),
            task: None,
        };
        feed.spawn(room);
        feed
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Stop polling the current room and start on `room`.
    pub fn switch_room(&mut self, room: Option<RoomId>) {
        self.token.cancel();
        if let Some(old) = self.task.take() {
            old.abort();
        }
        // Bumped under the channel lock so no stale publish can interleave.
        self.tx.send_if_modified(|_| {
            self.generation.fetch_add(1, Ordering::AcqRel);
            false
        });
        self.token = CancellationToken::new();
        self.spawn(room);
    }

    /// Cancel polling and wait for the task to finish.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn spawn(&mut self, room: Option<RoomId>) {
        debug!(room = ?room, every_ms = self.interval.as_millis(), "chat poll starting");
        let publisher = Publisher {
            tx: Arc::clone(&self.tx),
            generation: Arc::clone(&self.generation),
            mine: self.generation.load(Ordering::Acquire),
        };
        let task = tokio::spawn(poll(
            Arc::clone(&self.chat),
            room,
            self.interval,
            publisher,
            self.token.clone(),
        ));
        self.task = Some(task);
    }
}

impl Drop for ChatFeed {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

struct Publisher {
    tx: Arc<watch::Sender<ChatSnapshot>>,
    generation: Arc<AtomicU64>,
    mine: u64,
}

impl Publisher {
    /// Returns `false` once a newer poll owns the channel.
    fn publish(&self, snapshot: ChatSnapshot) -> bool {
        self.tx.send_if_modified(|slot| {
            let current = self.generation.load(Ordering::Acquire) == self.mine;
            if current {
                *slot = snapshot;
            }
            current
        })
    }
}

async fn refresh(
    chat: &dyn ChatRepository,
    room: Option<&RoomId>,
) -> Result<ChatSnapshot, StorageError> {
    let rooms = chat.rooms().await?;
    let messages = match room {
        Some(id) => chat.messages(id).await?,
        None => Vec::new(),
    };
    Ok(ChatSnapshot {
        room: room.cloned(),
        rooms,
        messages,
    })
}

async fn poll(
    chat: Arc<dyn ChatRepository>,
    room: Option<RoomId>,
    interval: Duration,
    publisher: Publisher,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match refresh(chat.as_ref(), room.as_ref()).await {
            Ok(snapshot) if !token.is_cancelled() => {
                if !publisher.publish(snapshot) {
                    break;
                }
            }
            Ok(_) => break,
            Err(err) => warn!(room = ?room, error = %err, "chat poll failed"),
        }
    }
    debug!(room = ?room, "chat poll stopped");
}
