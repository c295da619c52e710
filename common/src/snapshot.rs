use crate::cards::{CardWithAbilities, ManaColor};
use crate::targets::{CandidateTarget, CardRef, Pile};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display)]
pub enum TurnPhase {
    Untap,
    Upkeep,
    Draw,
    Main,
    BeginningOfCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndOfCombat,
    Main2,
    End,
    Cleanup,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TurnInfo {
    pub current_player_index: i32,
    pub phase: TurnPhase,
    pub turn_number: i32,
}

/// Countdown for the player currently holding priority.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorityTimer {
    pub player_index: i32,
    pub time_left: i8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Attack {
    pub attacker: CardRef,
    pub target: CandidateTarget,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Block {
    pub attacker: CardRef,
    pub blocker: CardRef,
}

/// Information every seat can see.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PublicGameInfo {
    pub current_turn: Option<TurnInfo>,
    pub priority_timer: Option<PriorityTimer>,
    pub attacks: Vec<Attack>,
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PublicPlayerInfo {
    pub hand_size: i32,
    pub cards_in_play: Vec<CardWithAbilities>,
    pub spells: Vec<CardWithAbilities>,
    pub mana_pool: Vec<ManaColor>,
    pub health: i8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PlayerStatus {
    Spectator,
    Ready,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DeckColor {
    White,
    Blue,
    Black,
    Red,
    Green,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum GameStatus {
    NeedsPlayers,
    WaitingForStart(i32),
    InGame,
}

impl Default for GameStatus {
    fn default() -> Self {
        GameStatus::NeedsPlayers
    }
}

/// One player's slice of the snapshot. `hand` is populated only for the
/// seat the snapshot was personalized for; other hands arrive empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlayerSeat {
    pub player_index: i32,
    pub status: PlayerStatus,
    pub is_leader: bool,
    pub deck: DeckColor,
    pub hand: Vec<CardWithAbilities>,
    pub public_info: PublicPlayerInfo,
}

/// The full game state as of the latest push. Replaced wholesale on
/// every update; never patched in place.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GameSnapshot {
    pub players: HashMap<String, PlayerSeat>,
    pub public_info: PublicGameInfo,
    pub status: GameStatus,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChatLine {
    pub player_id: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LobbySnapshot {
    pub join_code: String,
    pub chat: Vec<ChatLine>,
    pub game: GameSnapshot,
}

impl GameSnapshot {
    pub fn seat_of(&self, player_id: &str) -> Option<i32> {
        self.players.get(player_id).map(|p| p.player_index)
    }

    pub fn by_seat(&self, seat: i32) -> Option<&PlayerSeat> {
        self.players.values().find(|p| p.player_index == seat)
    }

    /// Walk seat -> pile -> index. Any miss is a stale reference and
    /// yields None rather than an error.
    pub fn resolve(&self, target: &CardRef) -> Option<&CardWithAbilities> {
        let seat = self.by_seat(target.player_index)?;
        let pile = match target.pile {
            Pile::Hand => &seat.hand,
            Pile::Play => &seat.public_info.cards_in_play,
            Pile::Spell => &seat.public_info.spells,
        };
        usize::try_from(target.card_index).ok().and_then(|i| pile.get(i))
    }

    pub fn is_attacker(&self, target: &CardRef) -> bool {
        self.public_info.attacks.iter().any(|a| a.attacker == *target)
    }
}
