use crate::tests::common_test::{scripted_client, seed_lobby, two_player_snapshot};
use anyhow::Result;
use common::cards::{ActionKind, CardType};
use common::ops::names::*;
use common::ops::{ActionCardArgs, PlayCardArgs, RespondMandatoryArgs, RespondOptionalArgs, TokenPair};
use common::push::{AbilityPrompt, PushMessage};
use common::targets::{CandidateTarget, CardRef, Pile, TargetRequirement};
use serde_json::json;
use std::sync::Arc;

fn prompt_for(player_id: &str, requirement: TargetRequirement) -> AbilityPrompt {
    let card = crate::tests::common_test::creature("Warden of Echoes");
    AbilityPrompt {
        player_id: player_id.to_string(),
        details: crate::tests::common_test::ability("echo-1", ActionKind::None, requirement),
        card,
    }
}

#[test_log::test(tokio::test)]
async fn login_attaches_the_bearer_to_later_calls() -> Result<()> {
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    let login = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.login("alice", "hunter2").await })
    };
    let request = server
        .answer(
            AUTH_LOGIN,
            json!(TokenPair {
                access_token: "access-1".to_string(),
                refresh_token: "refresh-1".to_string(),
            }),
        )
        .await;
    assert_eq!(request.token, None);
    login.await??;

    seed_lobby(&client, &server, two_player_snapshot()).await;
    let ready = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.ready().await })
    };
    let request = server.answer(LOBBY_READY, json!(null)).await;
    assert_eq!(request.token.as_deref(), Some("access-1"));
    ready.await??;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn playing_a_targetless_card_sends_a_null_target() -> Result<()> {
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    seed_lobby(&client, &server, two_player_snapshot()).await;
    let play = {
        let client = Arc::clone(&client);
        //Oak Guardian has no instant-kind ability
        tokio::spawn(async move { client.play_card(1).await })
    };
    let request = server.answer(LOBBY_PLAY_CARD, json!(null)).await;
    let args: PlayCardArgs = serde_json::from_value(request.args)?;
    assert_eq!(args.in_hand_index, 1);
    assert_eq!(args.target, None);
    assert!(!client.targeting().borrow().awaiting);
    play.await??;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn playing_a_targeted_card_waits_for_a_valid_click() -> Result<()> {
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    seed_lobby(&client, &server, two_player_snapshot()).await;
    let play = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.play_card(0).await })
    };
    client
        .targeting()
        .wait_for(|s| s.awaiting)
        .await
        .expect("targeting state closed");
    let candidate = CandidateTarget::Card(CardRef {
        player_index: 1,
        pile: Pile::Play,
        card_index: 2,
    });
    client.submit_click(candidate);
    let request = server.answer(LOBBY_PLAY_CARD, json!(null)).await;
    let args: PlayCardArgs = serde_json::from_value(request.args)?;
    assert_eq!(args.in_hand_index, 0);
    assert_eq!(args.target, Some(candidate));
    play.await??;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn a_remote_rejection_lands_after_the_target_phase() -> Result<()> {
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    seed_lobby(&client, &server, two_player_snapshot()).await;
    let play = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.play_card(0).await })
    };
    client
        .targeting()
        .wait_for(|s| s.awaiting)
        .await
        .expect("targeting state closed");
    client.submit_click(CandidateTarget::Card(CardRef {
        player_index: 1,
        pile: Pile::Play,
        card_index: 2,
    }));
    //The target phase succeeded; the server still gets the last word
    let request = server.expect(LOBBY_PLAY_CARD).await;
    server.reply_err(request.id, "not your turn");
    let err = play.await?.unwrap_err();
    assert!(err.to_string().contains("not your turn"));
    //No automatic retry
    assert!(server.idle());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn a_rejected_target_aborts_before_the_facade() -> Result<()> {
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    seed_lobby(&client, &server, two_player_snapshot()).await;
    let play = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.play_card(0).await })
    };
    client
        .targeting()
        .wait_for(|s| s.awaiting)
        .await
        .expect("targeting state closed");
    //A player can never satisfy CardOfType(Creature)
    client.submit_click(CandidateTarget::Player(1));
    assert!(play.await?.is_err());
    assert!(server.idle());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn enemy_checks_use_the_seat_learned_from_the_snapshot() -> Result<()> {
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    seed_lobby(&client, &server, two_player_snapshot()).await;
    let play = {
        let client = Arc::clone(&client);
        //Shock Bolt wants an enemy card or player
        tokio::spawn(async move { client.play_card(2).await })
    };
    client
        .targeting()
        .wait_for(|s| s.awaiting)
        .await
        .expect("targeting state closed");
    //Alice clicking herself is not an enemy
    client.submit_click(CandidateTarget::Player(0));
    assert!(play.await?.is_err());
    assert!(server.idle());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn activating_an_ability_solicits_its_requirement() -> Result<()> {
    let mut game = two_player_snapshot();
    let alice = game.players.get_mut("alice").unwrap();
    alice.public_info.cards_in_play[0]
        .abilities
        .push(crate::tests::common_test::ability(
            "volley-1",
            ActionKind::Tap,
            TargetRequirement::CardOfType(CardType::Creature),
        ));
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    seed_lobby(&client, &server, game).await;
    let action = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.activate_ability(0, "volley-1").await })
    };
    client
        .targeting()
        .wait_for(|s| s.awaiting)
        .await
        .expect("targeting state closed");
    let candidate = CandidateTarget::Card(CardRef {
        player_index: 1,
        pile: Pile::Play,
        card_index: 0,
    });
    client.submit_click(candidate);
    let request = server.answer(LOBBY_ACTION_CARD, json!(null)).await;
    let args: ActionCardArgs = serde_json::from_value(request.args)?;
    assert_eq!(args.trigger_id, "volley-1");
    assert_eq!(args.player_index, 0);
    assert_eq!(args.target, Some(candidate));
    action.await??;
    Ok(())
}

//Scenario: a mandatory prompt arrives unprompted mid-game; accepting it
//starts a fresh solicitation from the ability's own requirement
#[test_log::test(tokio::test)]
async fn mandatory_prompt_launches_a_fresh_solicitation() -> Result<()> {
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    seed_lobby(&client, &server, two_player_snapshot()).await;
    server.push(PushMessage::MandatoryAbility(prompt_for(
        "alice",
        TargetRequirement::EnemyCardOrPlayer,
    )));
    client
        .prompts()
        .subscribe()
        .wait_for(|p| p.is_some())
        .await
        .expect("prompt store closed");
    let respond = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.respond_prompt(true).await })
    };
    client
        .targeting()
        .wait_for(|s| s.awaiting)
        .await
        .expect("targeting state closed");
    client.submit_click(CandidateTarget::Player(1));
    let request = server.answer(LOBBY_RESPOND_MANDATORY, json!(null)).await;
    let args: RespondMandatoryArgs = serde_json::from_value(request.args)?;
    assert_eq!(args.ability_id, "echo-1");
    assert_eq!(args.target, Some(CandidateTarget::Player(1)));
    respond.await??;
    Ok(())
}

#[test_log::test(tokio::test)]
async fn declining_an_optional_prompt_sends_no_target() -> Result<()> {
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    seed_lobby(&client, &server, two_player_snapshot()).await;
    server.push(PushMessage::AskAbility(prompt_for(
        "alice",
        TargetRequirement::EnemyCardOrPlayer,
    )));
    client
        .prompts()
        .subscribe()
        .wait_for(|p| p.is_some())
        .await
        .expect("prompt store closed");
    let respond = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.respond_prompt(false).await })
    };
    let request = server.answer(LOBBY_RESPOND_OPTIONAL, json!(null)).await;
    let args: RespondOptionalArgs = serde_json::from_value(request.args)?;
    assert!(!args.response);
    assert_eq!(args.target, None);
    respond.await??;
    assert!(client.prompts().current().is_none());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn a_mandatory_prompt_cannot_be_declined() -> Result<()> {
    let (client, server, _demux) = scripted_client("alice");
    seed_lobby(&client, &server, two_player_snapshot()).await;
    server.push(PushMessage::MandatoryAbility(prompt_for(
        "alice",
        TargetRequirement::None,
    )));
    client
        .prompts()
        .subscribe()
        .wait_for(|p| p.is_some())
        .await
        .expect("prompt store closed");
    assert!(client.respond_prompt(false).await.is_err());
    //The prompt stays on display
    assert!(client.prompts().current().is_some());
    Ok(())
}

#[test_log::test(tokio::test)]
async fn a_bad_click_on_a_prompt_requeues_it() -> Result<()> {
    let (client, mut server, _demux) = scripted_client("alice");
    let client = Arc::new(client);
    seed_lobby(&client, &server, two_player_snapshot()).await;
    server.push(PushMessage::MandatoryAbility(prompt_for(
        "alice",
        TargetRequirement::EnemyCardInCombat,
    )));
    client
        .prompts()
        .subscribe()
        .wait_for(|p| p.is_some())
        .await
        .expect("prompt store closed");
    let respond = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.respond_prompt(true).await })
    };
    client
        .targeting()
        .wait_for(|s| s.awaiting)
        .await
        .expect("targeting state closed");
    //No combat is underway, so nothing satisfies the requirement
    client.submit_click(CandidateTarget::Player(1));
    assert!(respond.await?.is_err());
    assert!(server.idle());
    assert!(client.prompts().current().is_some());
    Ok(())
}
