use crate::targets::TargetRequirement;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ManaColor {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display)]
pub enum CardType {
    Creature,
    Enchantment,
    Instant,
    Sorcery,
    Artifact,
    Land,
}

impl CardType {
    //Lands resolve immediately instead of passing through a spell pile
    pub fn is_spell(&self) -> bool {
        *self != CardType::Land
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display)]
pub enum CreatureType {
    Angel,
    Elf,
}

/// How an ability is activated, as the server advertises it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ActionKind {
    Tap,
    None,
    Instant,
    Attach,
    PlayedCard,
}

/// The visible face of a card as it appears in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CardView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub card_type: CardType,
    pub creature_type: Option<CreatureType>,
    pub cost: Vec<ManaColor>,
    pub power: i8,
    pub toughness: i8,
    pub tapped: bool,
}

/// One activatable ability of a card, with the targeting constraint the
/// client must satisfy before responding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AbilityDetails {
    pub id: String,
    pub mana_cost: Vec<ManaColor>,
    pub required_target: TargetRequirement,
    pub description: String,
    pub kind: ActionKind,
    pub show: bool,
    pub meets_requirements: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CardWithAbilities {
    pub card: CardView,
    pub abilities: Vec<AbilityDetails>,
}

impl CardWithAbilities {
    /// The requirement that applies when this card is played from hand.
    /// Only an instant-kind ability solicits a target at play time;
    /// everything else resolves targetless and the wire carries null.
    pub fn play_requirement(&self) -> TargetRequirement {
        self.abilities
            .iter()
            .find(|a| a.kind == ActionKind::Instant && a.required_target.needs_target())
            .map(|a| a.required_target.clone())
            .unwrap_or(TargetRequirement::None)
    }

    pub fn ability(&self, id: &str) -> Option<&AbilityDetails> {
        self.abilities.iter().find(|a| a.id == id)
    }
}
