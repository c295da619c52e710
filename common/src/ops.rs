use crate::push::PushMessage;
use crate::snapshot::DeckColor;
use crate::targets::CandidateTarget;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod names {
    pub const LOBBY_CREATE: &str = "lobby.create";
    pub const LOBBY_JOIN: &str = "lobby.join";
    pub const LOBBY_READY: &str = "lobby.ready";
    pub const LOBBY_SELECT_DECK: &str = "lobby.select_deck";
    pub const LOBBY_TURN: &str = "lobby.turn";
    pub const LOBBY_PLAY_CARD: &str = "lobby.play_card";
    pub const LOBBY_ACTION_CARD: &str = "lobby.action_card";
    pub const LOBBY_ATTACH_CARD: &str = "lobby.attach_card";
    pub const LOBBY_RESPOND_OPTIONAL: &str = "lobby.respond_optional_ability";
    pub const LOBBY_RESPOND_MANDATORY: &str = "lobby.respond_mandatory_ability";
    pub const LOBBY_CHAT: &str = "lobby.chat";
    pub const LOBBY_SUBSCRIBE: &str = "lobby.subscribe";
    pub const AUTH_LOGIN: &str = "authentication.login";
    pub const AUTH_REFRESH: &str = "authentication.refresh";
}

/// An outgoing mutation or subscription start: dotted operation name,
/// bearer credential, structured argument payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Request {
    pub id: u64,
    pub op: String,
    pub token: Option<String>,
    pub args: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum Outcome {
    Ok(Value),
    Err(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Reply {
    pub id: u64,
    pub outcome: Outcome,
}

/// A frame off the wire: either the answer to one of our requests or a
/// server push on the persistent subscription.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum Frame {
    Reply(Reply),
    Push(PushMessage),
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct LoginArgs {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct RefreshArgs {
    pub refresh_token: String,
}

/// Result payload of both authentication operations.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct PlayCardArgs {
    pub code: String,
    pub in_hand_index: i32,
    pub target: Option<CandidateTarget>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct ActionCardArgs {
    pub code: String,
    pub trigger_id: String,
    pub player_index: i32,
    pub in_play_index: i32,
    pub target: Option<CandidateTarget>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct RespondMandatoryArgs {
    pub code: String,
    pub ability_id: String,
    pub target: Option<CandidateTarget>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct RespondOptionalArgs {
    pub code: String,
    pub ability_id: String,
    pub target: Option<CandidateTarget>,
    pub response: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct SelectDeckArgs {
    pub code: String,
    pub deck: DeckColor,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChatArgs {
    pub code: String,
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
pub struct SubscribeArgs {
    pub code: String,
}
