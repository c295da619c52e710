use common::push::AbilityPrompt;
use common::snapshot::{ChatLine, GameSnapshot, LobbySnapshot};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Holds the latest [`GameSnapshot`] behind a watch channel. Each push
/// swaps in a new `Arc`; readers always dereference the latest one and
/// never see a partially applied update.
pub struct SnapshotStore {
    game: watch::Sender<Arc<GameSnapshot>>,
    lobby: Mutex<LobbyInfo>,
}

#[derive(Default)]
struct LobbyInfo {
    join_code: Option<String>,
    chat: Vec<ChatLine>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (game, _) = watch::channel(Arc::new(GameSnapshot::default()));
        SnapshotStore {
            game,
            lobby: Mutex::new(LobbyInfo::default()),
        }
    }

    pub fn publish(&self, update: LobbySnapshot) {
        {
            let mut lobby = self.lobby.lock().unwrap();
            lobby.join_code = Some(update.join_code);
            lobby.chat = update.chat;
        }
        let _ = self.game.send(Arc::new(update.game));
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<GameSnapshot>> {
        self.game.subscribe()
    }

    pub fn latest(&self) -> Arc<GameSnapshot> {
        self.game.borrow().clone()
    }

    pub fn join_code(&self) -> Option<String> {
        self.lobby.lock().unwrap().join_code.clone()
    }

    pub fn set_join_code(&self, code: &str) {
        self.lobby.lock().unwrap().join_code = Some(code.to_string());
    }

    pub fn chat(&self) -> Vec<ChatLine> {
        self.lobby.lock().unwrap().chat.clone()
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

/// An ability prompt waiting for the player's answer, with the
/// declinability the push variant carried.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingPrompt {
    pub prompt: AbilityPrompt,
    pub mandatory: bool,
}

/// Single-slot holder for the ability prompt currently shown to the
/// player. A newer prompt replaces an unanswered one; answering takes
/// the slot so a prompt is consumed at most once.
pub struct PromptStore {
    slot: watch::Sender<Option<PendingPrompt>>,
    //Keep one receiver alive so `publish` (a plain `send`) always stores
    //the prompt: tokio's watch drops the value when the receiver count is
    //zero, which would otherwise lose a requeued prompt between observers.
    _keepalive: watch::Receiver<Option<PendingPrompt>>,
}

impl PromptStore {
    pub fn new() -> Self {
        let (slot, keepalive) = watch::channel(None);
        PromptStore {
            slot,
            _keepalive: keepalive,
        }
    }

    pub fn publish(&self, prompt: AbilityPrompt, mandatory: bool) {
        let _ = self.slot.send(Some(PendingPrompt { prompt, mandatory }));
    }

    pub fn take(&self) -> Option<PendingPrompt> {
        let mut taken = None;
        self.slot.send_modify(|slot| taken = slot.take());
        taken
    }

    pub fn current(&self) -> Option<PendingPrompt> {
        self.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PendingPrompt>> {
        self.slot.subscribe()
    }
}

impl Default for PromptStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-only turn narration. The revision counter lets the view layer
/// wake on new entries without cloning the whole log.
pub struct NarrationLog {
    entries: Mutex<Vec<String>>,
    revision: watch::Sender<u64>,
}

impl NarrationLog {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        NarrationLog {
            entries: Mutex::new(Vec::new()),
            revision,
        }
    }

    pub fn append(&self, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }
        self.entries.lock().unwrap().extend(messages);
        self.revision.send_modify(|rev| *rev += 1);
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl Default for NarrationLog {
    fn default() -> Self {
        Self::new()
    }
}
