use crate::cards::{AbilityDetails, CardWithAbilities};
use crate::snapshot::LobbySnapshot;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A server-initiated ability offer. Whether it may be declined is
/// carried by the [`PushMessage`] variant it arrives in. Answering with
/// acceptance first runs the ability's own target solicitation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AbilityPrompt {
    pub player_id: String,
    pub card: CardWithAbilities,
    pub details: AbilityDetails,
}

/// Everything the subscription can push at the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub enum PushMessage {
    Updated(LobbySnapshot),
    TurnMessages(Vec<String>),
    AskAbility(AbilityPrompt),
    MandatoryAbility(AbilityPrompt),
    Debug(String),
}
