use crate::broker::TargetBroker;
use crate::stores::{NarrationLog, PromptStore, SnapshotStore};
use common::push::{AbilityPrompt, PushMessage};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Everything the demultiplexer writes into.
#[derive(Clone)]
pub struct Routes {
    pub snapshots: Arc<SnapshotStore>,
    pub prompts: Arc<PromptStore>,
    pub narration: Arc<NarrationLog>,
    pub broker: Arc<TargetBroker>,
    /// Id of the player this client is signed in as. Prompts addressed
    /// to anyone else are dropped here.
    pub local_player: String,
}

/// Drain the subscription stream, routing each push to its surface.
/// Runs until the sender side closes; nothing a single message contains
/// can take the loop down.
pub fn spawn_demux(mut pushes: mpsc::UnboundedReceiver<PushMessage>, routes: Routes) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = pushes.recv().await {
            route(message, &routes);
        }
        info!("push channel closed, demultiplexer exiting");
    })
}

fn route(message: PushMessage, routes: &Routes) {
    match message {
        PushMessage::Updated(lobby) => {
            if let Some(seat) = lobby.game.seat_of(&routes.local_player) {
                routes.broker.set_local_seat(seat);
            }
            routes.snapshots.publish(lobby);
        }
        PushMessage::TurnMessages(messages) => {
            routes.narration.append(messages);
        }
        PushMessage::AskAbility(prompt) => offer(prompt, false, routes),
        PushMessage::MandatoryAbility(prompt) => offer(prompt, true, routes),
        PushMessage::Debug(text) => {
            warn!("server debug: {}", text);
        }
    }
}

fn offer(prompt: AbilityPrompt, mandatory: bool, routes: &Routes) {
    if prompt.player_id == routes.local_player {
        routes.prompts.publish(prompt, mandatory);
    } else {
        debug!("dropping ability prompt addressed to {}", prompt.player_id);
    }
}
