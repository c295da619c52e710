use crate::cards::{CardType, CreatureType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The three per-player card locations a click can land on. The wire
/// and the UI agree on these names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Pile {
    Hand,
    Play,
    Spell,
}

/// A card identified positionally: owning seat, pile, index within the
/// pile. Positions are only meaningful against the snapshot current at
/// the moment they are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CardRef {
    pub player_index: i32,
    pub pile: Pile,
    pub card_index: i32,
}

/// What the user clicked while a target was being solicited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CandidateTarget {
    Player(i32),
    Card(CardRef),
}

/// The targeting constraint an ability or card action declares.
/// Matching is exhaustive over these variants; there is no catch-all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TargetRequirement {
    None,
    EnemyCardOrPlayer,
    EnemyCardInCombat,
    CardOfType(CardType),
    CreatureOfType(CreatureType),
    Spell,
}

impl TargetRequirement {
    pub fn needs_target(&self) -> bool {
        *self != TargetRequirement::None
    }

    /// Human-readable description, shown next to the awaiting-target flag.
    pub fn describe(&self) -> String {
        match self {
            TargetRequirement::None => "no target".to_string(),
            TargetRequirement::EnemyCardOrPlayer => "an opposing player or one of their cards".to_string(),
            TargetRequirement::EnemyCardInCombat => "an attacking card".to_string(),
            TargetRequirement::CardOfType(t) => format!("a {} card", t),
            TargetRequirement::CreatureOfType(c) => format!("a {} creature", c),
            TargetRequirement::Spell => "a card in a spell pile".to_string(),
        }
    }
}
