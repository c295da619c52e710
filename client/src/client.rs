use crate::broker::{TargetBroker, TargetingState};
use crate::demux::{spawn_demux, Routes};
use crate::facade::RemoteServer;
use crate::session::SessionRelay;
use crate::stores::{NarrationLog, PromptStore, SnapshotStore};
use anyhow::{anyhow, bail, Context, Result};
use common::ops::names::*;
use common::ops::{
    ActionCardArgs, ChatArgs, LoginArgs, PlayCardArgs, RefreshArgs, RespondMandatoryArgs,
    RespondOptionalArgs, SelectDeckArgs, SubscribeArgs, TokenPair,
};
use common::push::PushMessage;
use common::snapshot::{DeckColor, LobbySnapshot, PlayerSeat};
use common::targets::{CandidateTarget, TargetRequirement};
use log::debug;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// The composed client: session relay, remote facade, observable
/// stores, and the target broker, wired so every mutation with a target
/// phase is gated on a successful solicitation. A broker rejection
/// aborts the flow before anything reaches the server.
pub struct GameClient {
    server: RemoteServer,
    session: Arc<SessionRelay>,
    snapshots: Arc<SnapshotStore>,
    prompts: Arc<PromptStore>,
    narration: Arc<NarrationLog>,
    broker: Arc<TargetBroker>,
    local_player: String,
}

impl GameClient {
    /// Wire the stores and demultiplexer onto an established
    /// connection. `local_player` is the id this client signs in as;
    /// prompts for other players are filtered out.
    pub fn start(
        server: RemoteServer,
        pushes: mpsc::UnboundedReceiver<PushMessage>,
        session: Arc<SessionRelay>,
        local_player: &str,
    ) -> (Self, JoinHandle<()>) {
        let snapshots = Arc::new(SnapshotStore::new());
        let prompts = Arc::new(PromptStore::new());
        let narration = Arc::new(NarrationLog::new());
        let broker = Arc::new(TargetBroker::new(snapshots.subscribe()));
        let demux = spawn_demux(
            pushes,
            Routes {
                snapshots: Arc::clone(&snapshots),
                prompts: Arc::clone(&prompts),
                narration: Arc::clone(&narration),
                broker: Arc::clone(&broker),
                local_player: local_player.to_string(),
            },
        );
        (
            GameClient {
                server,
                session,
                snapshots,
                prompts,
                narration,
                broker,
                local_player: local_player.to_string(),
            },
            demux,
        )
    }

    async fn call(&self, op: &str, args: Value) -> Result<Value> {
        let token = self.session.bearer().await;
        self.server.call(op, token, args).await
    }

    // ---- authentication ----

    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let args = serde_json::to_value(LoginArgs {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let reply = self.call(AUTH_LOGIN, args).await?;
        let tokens: TokenPair = serde_json::from_value(reply).context("malformed login reply")?;
        self.session.set_tokens(&tokens).await
    }

    /// Resume with the refresh token persisted by an earlier run.
    /// Returns false when no token was stored.
    pub async fn resume(&self) -> Result<bool> {
        let Some(refresh_token) = self.session.stored_refresh()? else {
            return Ok(false);
        };
        let args = serde_json::to_value(RefreshArgs { refresh_token })?;
        let reply = self.call(AUTH_REFRESH, args).await?;
        let tokens: TokenPair = serde_json::from_value(reply).context("malformed refresh reply")?;
        self.session.set_tokens(&tokens).await?;
        Ok(true)
    }

    // ---- lobby lifecycle ----

    pub async fn create_lobby(&self) -> Result<String> {
        let reply = self.call(LOBBY_CREATE, json!([])).await?;
        let lobby: LobbySnapshot =
            serde_json::from_value(reply).context("malformed lobby reply")?;
        let code = lobby.join_code.clone();
        self.snapshots.publish(lobby);
        self.subscribe_lobby(&code).await?;
        Ok(code)
    }

    pub async fn join_lobby(&self, code: &str) -> Result<()> {
        self.call(LOBBY_JOIN, json!(code)).await?;
        self.snapshots.set_join_code(code);
        self.subscribe_lobby(code).await
    }

    async fn subscribe_lobby(&self, code: &str) -> Result<()> {
        let args = serde_json::to_value(SubscribeArgs {
            code: code.to_string(),
        })?;
        self.call(LOBBY_SUBSCRIBE, args).await?;
        Ok(())
    }

    pub async fn ready(&self) -> Result<()> {
        let code = self.code()?;
        self.call(LOBBY_READY, json!(code)).await?;
        Ok(())
    }

    pub async fn select_deck(&self, deck: DeckColor) -> Result<()> {
        let args = serde_json::to_value(SelectDeckArgs {
            code: self.code()?,
            deck,
        })?;
        self.call(LOBBY_SELECT_DECK, args).await?;
        Ok(())
    }

    pub async fn advance_turn(&self) -> Result<()> {
        let code = self.code()?;
        self.call(LOBBY_TURN, json!(code)).await?;
        Ok(())
    }

    pub async fn chat(&self, text: &str) -> Result<()> {
        let args = serde_json::to_value(ChatArgs {
            code: self.code()?,
            text: text.to_string(),
        })?;
        self.call(LOBBY_CHAT, args).await?;
        Ok(())
    }

    // ---- card actions, gated on target acquisition ----

    /// Play a card from hand. Target solicitation happens only when the
    /// card's play requirement asks for one; a rejected solicitation
    /// aborts before the mutation is built.
    pub async fn play_card(&self, hand_index: usize) -> Result<()> {
        let code = self.code()?;
        let (card, requirement) = {
            let snapshot = self.snapshots.latest();
            let seat = self.my_seat_state(&snapshot)?;
            let card = seat
                .hand
                .get(hand_index)
                .ok_or_else(|| anyhow!("no card in hand at index {}", hand_index))?;
            (card.card.name.clone(), card.play_requirement())
        };
        let target = self.solicit(requirement, &card).await?;
        let args = serde_json::to_value(PlayCardArgs {
            code,
            in_hand_index: hand_index as i32,
            target,
        })?;
        self.call(LOBBY_PLAY_CARD, args).await?;
        Ok(())
    }

    /// Activate an ability of a card already in play.
    pub async fn activate_ability(&self, in_play_index: usize, ability_id: &str) -> Result<()> {
        self.card_action(LOBBY_ACTION_CARD, in_play_index, ability_id)
            .await
    }

    /// Attach a card in play to the target its ability names.
    pub async fn attach_card(&self, in_play_index: usize, ability_id: &str) -> Result<()> {
        self.card_action(LOBBY_ATTACH_CARD, in_play_index, ability_id)
            .await
    }

    async fn card_action(&self, op: &str, in_play_index: usize, ability_id: &str) -> Result<()> {
        let code = self.code()?;
        let (player_index, name, requirement) = {
            let snapshot = self.snapshots.latest();
            let seat = self.my_seat_state(&snapshot)?;
            let card = seat
                .public_info
                .cards_in_play
                .get(in_play_index)
                .ok_or_else(|| anyhow!("no card in play at index {}", in_play_index))?;
            let ability = card
                .ability(ability_id)
                .ok_or_else(|| anyhow!("{} has no ability {}", card.card.name, ability_id))?;
            (
                seat.player_index,
                card.card.name.clone(),
                ability.required_target.clone(),
            )
        };
        let target = self.solicit(requirement, &name).await?;
        let args = serde_json::to_value(ActionCardArgs {
            code,
            trigger_id: ability_id.to_string(),
            player_index,
            in_play_index: in_play_index as i32,
            target,
        })?;
        self.call(op, args).await?;
        Ok(())
    }

    /// Answer the ability prompt currently on display. Accepting runs
    /// the ability's own target solicitation before the response is
    /// sent; a rejected solicitation puts the prompt back and sends
    /// nothing. Declining is only legal for optional prompts.
    pub async fn respond_prompt(&self, accept: bool) -> Result<()> {
        let code = self.code()?;
        let Some(pending) = self.prompts.take() else {
            debug!("no ability prompt to respond to");
            return Ok(());
        };
        let ability_id = pending.prompt.details.id.clone();
        if !accept {
            if pending.mandatory {
                self.prompts.publish(pending.prompt, true);
                bail!("a mandatory ability cannot be declined");
            }
            let args = serde_json::to_value(RespondOptionalArgs {
                code,
                ability_id,
                target: None,
                response: false,
            })?;
            self.call(LOBBY_RESPOND_OPTIONAL, args).await?;
            return Ok(());
        }
        let requirement = pending.prompt.details.required_target.clone();
        let target = match self.solicit(requirement, &pending.prompt.card.card.name).await {
            Ok(target) => target,
            Err(err) => {
                //Keep the prompt answerable; nothing was sent
                self.prompts.publish(pending.prompt, pending.mandatory);
                return Err(err);
            }
        };
        if pending.mandatory {
            let args = serde_json::to_value(RespondMandatoryArgs {
                code,
                ability_id,
                target,
            })?;
            self.call(LOBBY_RESPOND_MANDATORY, args).await?;
        } else {
            let args = serde_json::to_value(RespondOptionalArgs {
                code,
                ability_id,
                target,
                response: true,
            })?;
            self.call(LOBBY_RESPOND_OPTIONAL, args).await?;
        }
        Ok(())
    }

    /// Forward a click from the view layer into the broker.
    pub fn submit_click(&self, candidate: CandidateTarget) {
        self.broker.submit_candidate(candidate);
    }

    async fn solicit(
        &self,
        requirement: TargetRequirement,
        subject: &str,
    ) -> Result<Option<CandidateTarget>> {
        if !requirement.needs_target() {
            return Ok(None);
        }
        let prompt = format!("Choose a target for {}: {}", subject, requirement.describe());
        let target = self.broker.request_target(requirement, &prompt).await?;
        Ok(target)
    }

    fn my_seat_state<'a>(
        &self,
        snapshot: &'a common::snapshot::GameSnapshot,
    ) -> Result<&'a PlayerSeat> {
        snapshot
            .players
            .get(&self.local_player)
            .ok_or_else(|| anyhow!("{} is not seated in this game", self.local_player))
    }

    fn code(&self) -> Result<String> {
        self.snapshots
            .join_code()
            .ok_or_else(|| anyhow!("not in a lobby"))
    }

    // ---- observables for the view layer ----

    pub fn targeting(&self) -> watch::Receiver<TargetingState> {
        self.broker.state()
    }

    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.snapshots
    }

    pub fn prompts(&self) -> &Arc<PromptStore> {
        &self.prompts
    }

    pub fn narration(&self) -> &Arc<NarrationLog> {
        &self.narration
    }

    pub fn local_player(&self) -> &str {
        &self.local_player
    }
}
