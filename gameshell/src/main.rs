#![deny(unused_must_use)]
use anyhow::{Context, Result};
use client::client::GameClient;
use client::facade::RemoteServer;
use client::session::SessionRelay;
use common::snapshot::{DeckColor, GameSnapshot};
use common::targets::{CandidateTarget, CardRef, Pile};
use log::info;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
mod write_schema;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    write_schema::write_types();

    let addr = std::env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let store = std::env::var("SESSION_FILE").unwrap_or_else(|_| "data.json".to_string());
    let player = std::env::var("PLAYER_ID").context("PLAYER_ID must be set")?;

    let (server, pushes) = RemoteServer::connect(&addr)
        .await
        .with_context(|| format!("connecting to {}", addr))?;
    let session = Arc::new(SessionRelay::new(store));
    let (game, _demux) = GameClient::start(server, pushes, session, &player);
    let game = Arc::new(game);

    if game.resume().await.unwrap_or(false) {
        info!("resumed session for {}", player);
    }
    spawn_watchers(&game);
    repl(game).await
}

/// Print server-driven events as they land so the REPL stays readable.
fn spawn_watchers(game: &Arc<GameClient>) {
    let mut targeting = game.targeting();
    tokio::spawn(async move {
        while targeting.changed().await.is_ok() {
            let state = targeting.borrow().clone();
            if state.awaiting {
                println!("* {}", state.prompt);
            }
        }
    });

    let mut prompts = game.prompts().subscribe();
    tokio::spawn(async move {
        while prompts.changed().await.is_ok() {
            let pending = prompts.borrow().clone();
            if let Some(pending) = pending {
                let kind = if pending.mandatory { "must" } else { "may" };
                println!(
                    "* {} {} trigger: {} (accept/decline)",
                    pending.prompt.card.card.name, kind, pending.prompt.details.description
                );
            }
        }
    });

    let narration = Arc::clone(game.narration());
    let mut revisions = narration.subscribe();
    tokio::spawn(async move {
        let mut seen = 0;
        while revisions.changed().await.is_ok() {
            let entries = narration.entries();
            for line in &entries[seen..] {
                println!("> {}", line);
            }
            seen = entries.len();
        }
    });
}

async fn repl(game: Arc<GameClient>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("commands: login create join ready deck turn say play act attach accept decline click state quit");
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            ["quit"] => break,
            ["state"] => print_state(&game.snapshots().latest()),
            other => {
                if let Err(err) = dispatch(&game, other) {
                    println!("! {}", err);
                }
            }
        }
    }
    Ok(())
}

/// Commands that wait on a target run detached so the prompt stays free
/// for the click that answers them.
fn dispatch(game: &Arc<GameClient>, words: &[&str]) -> Result<()> {
    match words {
        ["login", user, pass] => {
            let (user, pass) = (user.to_string(), pass.to_string());
            detach(game, move |g| async move { g.login(&user, &pass).await });
        }
        ["create"] => detach(game, |g| async move {
            let code = g.create_lobby().await?;
            println!("lobby {}", code);
            Ok(())
        }),
        ["join", code] => {
            let code = code.to_string();
            detach(game, move |g| async move { g.join_lobby(&code).await });
        }
        ["ready"] => detach(game, |g| async move { g.ready().await }),
        ["deck", color] => {
            let deck = DeckColor::from_str(color).map_err(|_| anyhow::anyhow!("unknown deck {}", color))?;
            detach(game, move |g| async move { g.select_deck(deck).await });
        }
        ["turn"] => detach(game, |g| async move { g.advance_turn().await }),
        ["say", rest @ ..] => {
            let text = rest.join(" ");
            detach(game, move |g| async move { g.chat(&text).await });
        }
        ["play", index] => {
            let index: usize = index.parse()?;
            detach(game, move |g| async move { g.play_card(index).await });
        }
        ["act", index, ability] => {
            let index: usize = index.parse()?;
            let ability = ability.to_string();
            detach(game, move |g| async move {
                g.activate_ability(index, &ability).await
            });
        }
        ["attach", index, ability] => {
            let index: usize = index.parse()?;
            let ability = ability.to_string();
            detach(game, move |g| async move {
                g.attach_card(index, &ability).await
            });
        }
        ["accept"] => detach(game, |g| async move { g.respond_prompt(true).await }),
        ["decline"] => detach(game, |g| async move { g.respond_prompt(false).await }),
        ["click", "player", seat] => {
            game.submit_click(CandidateTarget::Player(seat.parse()?));
        }
        ["click", seat, pile, index] => {
            let pile = Pile::from_str(pile).map_err(|_| anyhow::anyhow!("unknown pile {}", pile))?;
            game.submit_click(CandidateTarget::Card(CardRef {
                player_index: seat.parse()?,
                pile,
                card_index: index.parse()?,
            }));
        }
        other => anyhow::bail!("unknown command {:?}", other),
    }
    Ok(())
}

fn detach<F, Fut>(game: &Arc<GameClient>, run: F)
where
    F: FnOnce(Arc<GameClient>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<()>> + Send + 'static,
{
    let game = Arc::clone(game);
    tokio::spawn(async move {
        if let Err(err) = run(game).await {
            println!("! {}", err);
        }
    });
}

fn print_state(snapshot: &GameSnapshot) {
    if let Some(turn) = &snapshot.public_info.current_turn {
        println!(
            "turn {} seat {} phase {}",
            turn.turn_number, turn.current_player_index, turn.phase
        );
    }
    let mut seats: Vec<_> = snapshot.players.iter().collect();
    seats.sort_by_key(|(_, seat)| seat.player_index);
    for (id, seat) in seats {
        println!(
            "[{}] {} hp {} hand {}",
            seat.player_index, id, seat.public_info.health, seat.public_info.hand_size
        );
        for (i, card) in seat.hand.iter().enumerate() {
            println!("  hand {} {}", i, card.card.name);
        }
        for (i, card) in seat.public_info.cards_in_play.iter().enumerate() {
            println!("  play {} {}", i, card.card.name);
        }
        for (i, card) in seat.public_info.spells.iter().enumerate() {
            println!("  spell {} {}", i, card.card.name);
        }
    }
    for attack in &snapshot.public_info.attacks {
        println!(
            "attacking: seat {} play {} -> {:?}",
            attack.attacker.player_index, attack.attacker.card_index, attack.target
        );
    }
}
