use crate::errors::TargetError;
use common::snapshot::GameSnapshot;
use common::targets::{CandidateTarget, Pile, TargetRequirement};
use log::{debug, info};
use schemars::JsonSchema;
use serde::Serialize;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch};

/// What the view layer observes while a solicitation is open: clicks
/// switch from "act on this card" to "submit this as the target".
#[derive(Clone, Debug, Default, PartialEq, Serialize, JsonSchema)]
pub struct TargetingState {
    pub awaiting: bool,
    pub prompt: String,
}

struct PendingRequest {
    requirement: TargetRequirement,
    reply: oneshot::Sender<Result<CandidateTarget, TargetError>>,
}

/// Owns the single in-flight target solicitation. Callers suspend in
/// [`TargetBroker::request_target`]; the view layer feeds clicks through
/// [`TargetBroker::submit_candidate`], which settles the request against
/// the snapshot current at click time.
///
/// At most one request exists at a time. A new request supersedes the
/// old one; superseding is the only cancellation mechanism and the
/// broker holds no timers.
pub struct TargetBroker {
    pending: Mutex<Option<PendingRequest>>,
    state: watch::Sender<TargetingState>,
    //Keep one receiver alive for the broker's lifetime so `state.send`
    //never no-ops for want of a subscriber: tokio's watch drops the sent
    //value (and returns Err) when the receiver count is zero, which would
    //otherwise leave the published state stale between transient observers.
    _state_keepalive: watch::Receiver<TargetingState>,
    snapshots: watch::Receiver<Arc<GameSnapshot>>,
    //Seat of the player this client plays as, or -1 before the first
    //personalized snapshot arrives. Needed for enemy checks.
    local_seat: AtomicI32,
}

impl std::fmt::Debug for TargetBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetBroker")
            .field("awaiting", &self.state.borrow().awaiting)
            .finish()
    }
}

impl TargetBroker {
    pub fn new(snapshots: watch::Receiver<Arc<GameSnapshot>>) -> Self {
        let (state, keepalive) = watch::channel(TargetingState::default());
        TargetBroker {
            pending: Mutex::new(None),
            state,
            _state_keepalive: keepalive,
            snapshots,
            local_seat: AtomicI32::new(-1),
        }
    }

    pub fn state(&self) -> watch::Receiver<TargetingState> {
        self.state.subscribe()
    }

    pub fn set_local_seat(&self, seat: i32) {
        self.local_seat.store(seat, Ordering::Relaxed);
    }

    fn local_seat(&self) -> Option<i32> {
        let seat = self.local_seat.load(Ordering::Relaxed);
        (seat >= 0).then_some(seat)
    }

    /// Ask the user for a target satisfying `requirement`. Returns
    /// `Ok(None)` immediately when no target is needed; otherwise marks
    /// the interface as awaiting a target and suspends until a click
    /// settles the request or a newer request supersedes this one.
    ///
    /// One non-matching click fails the whole solicitation; retrying
    /// means issuing a fresh request.
    pub async fn request_target(
        &self,
        requirement: TargetRequirement,
        prompt: &str,
    ) -> Result<Option<CandidateTarget>, TargetError> {
        if !requirement.needs_target() {
            return Ok(None);
        }
        let (tx, rx) = oneshot::channel();
        let superseded = {
            let mut slot = self.pending.lock().unwrap();
            slot.replace(PendingRequest {
                requirement,
                reply: tx,
            })
        };
        if let Some(prev) = superseded {
            info!("superseding unresolved target request");
            let _ = prev.reply.send(Err(TargetError::Superseded));
        }
        let _ = self.state.send(TargetingState {
            awaiting: true,
            prompt: prompt.to_string(),
        });
        match rx.await {
            Ok(settled) => settled.map(Some),
            //The broker was dropped with the request open
            Err(_) => Err(TargetError::Superseded),
        }
    }

    /// Feed one click into the pending request. A no-op when nothing is
    /// pending. Otherwise the request is consumed: the waiter resolves
    /// with the candidate on a match and fails with a descriptive
    /// rejection on a mismatch. The awaiting flag clears exactly once
    /// either way, because the slot is taken exactly once.
    pub fn submit_candidate(&self, candidate: CandidateTarget) {
        let Some(request) = self.pending.lock().unwrap().take() else {
            debug!("click with no pending target request, ignoring");
            return;
        };
        //Always validate against the snapshot current at click time,
        //not whatever was current when the request was issued.
        let snapshot = self.snapshots.borrow().clone();
        let verdict = match_candidate(
            &request.requirement,
            &candidate,
            &snapshot,
            self.local_seat(),
        );
        let _ = self.state.send(TargetingState::default());
        match verdict {
            Ok(()) => {
                let _ = request.reply.send(Ok(candidate));
            }
            Err(reason) => {
                info!("rejected target candidate: {}", reason);
                let _ = request.reply.send(Err(TargetError::Invalid(reason)));
            }
        }
    }
}

/// The requirement/candidate matching table. Exhaustive over both
/// enums; a reference that no longer resolves against the snapshot is a
/// mismatch, never a fault.
pub fn match_candidate(
    requirement: &TargetRequirement,
    candidate: &CandidateTarget,
    snapshot: &GameSnapshot,
    local_seat: Option<i32>,
) -> Result<(), String> {
    //Before the first personalized snapshot the local seat is unknown
    //and enemy checks accept any seat, matching the legacy rule set
    let is_enemy = |seat: i32| local_seat.map_or(true, |local| seat != local);
    match requirement {
        TargetRequirement::None => Err("requirement takes no target".to_string()),
        TargetRequirement::EnemyCardOrPlayer => match candidate {
            CandidateTarget::Player(seat) => {
                if snapshot.by_seat(*seat).is_none() {
                    Err(format!("no player in seat {}", seat))
                } else if is_enemy(*seat) {
                    Ok(())
                } else {
                    Err("cannot target yourself".to_string())
                }
            }
            CandidateTarget::Card(card) => {
                if snapshot.resolve(card).is_none() {
                    Err("card reference no longer resolves".to_string())
                } else if is_enemy(card.player_index) {
                    Ok(())
                } else {
                    Err("cannot target your own card".to_string())
                }
            }
        },
        TargetRequirement::EnemyCardInCombat => match candidate {
            CandidateTarget::Player(_) => Err("an attacking card is required".to_string()),
            CandidateTarget::Card(card) => {
                if snapshot.is_attacker(card) {
                    Ok(())
                } else {
                    Err("card is not attacking".to_string())
                }
            }
        },
        TargetRequirement::CardOfType(wanted) => match candidate {
            CandidateTarget::Player(_) => Err(format!("a {} card is required", wanted)),
            CandidateTarget::Card(card) => match snapshot.resolve(card) {
                None => Err("card reference no longer resolves".to_string()),
                Some(found) if found.card.card_type == *wanted => Ok(()),
                Some(found) => Err(format!(
                    "{} is a {} card, not a {} card",
                    found.card.name, found.card.card_type, wanted
                )),
            },
        },
        TargetRequirement::CreatureOfType(wanted) => match candidate {
            CandidateTarget::Player(_) => Err(format!("a {} creature is required", wanted)),
            CandidateTarget::Card(card) => match snapshot.resolve(card) {
                None => Err("card reference no longer resolves".to_string()),
                Some(found) if found.card.creature_type == Some(*wanted) => Ok(()),
                Some(found) => Err(format!("{} is not a {} creature", found.card.name, wanted)),
            },
        },
        TargetRequirement::Spell => match candidate {
            CandidateTarget::Player(_) => Err("a card in a spell pile is required".to_string()),
            CandidateTarget::Card(card) if card.pile != Pile::Spell => {
                Err(format!("card is in the {} pile, not a spell pile", card.pile))
            }
            CandidateTarget::Card(card) => {
                if snapshot.resolve(card).is_some() {
                    Ok(())
                } else {
                    Err("card reference no longer resolves".to_string())
                }
            }
        },
    }
}
