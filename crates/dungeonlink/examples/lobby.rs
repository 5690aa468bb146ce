//! Minimal end-to-end demo: log in, open a room with a bot, start the
//! game, and roll whenever it is our turn.
//!
//! Point it at a running server:
//!
//! ```text
//! cargo run --example lobby -- http://localhost:3000/api ws://localhost:3000/events
//! ```

use std::sync::Arc;

use dungeonlink::prelude::*;

#[tokio::main]
async fn main() -> Result<(), DungeonlinkError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dungeonlink=debug".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let api_url = args
        .next()
        .unwrap_or_else(|| "http://localhost:3000/api".into());
    let events_url = args
        .next()
        .unwrap_or_else(|| "ws://localhost:3000/events".into());

    let client = DungeonClient::new(
        Arc::new(HttpApi::new(api_url)),
        Arc::new(WebSocketPush),
        Box::new(MemoryCredentialStore::default()),
        events_url,
        ChannelConfig::default(),
    );

    let session = client.login("demo", "demo-password").await?;
    println!("logged in as {} ({})", session.username, session.user_id);

    let room = client
        .create_room(RoomSettings::named("demo dungeon"))
        .await?;
    println!("room {} open", room.room_id);
    client.add_bot().await?;

    let state = client.start_game().await?;
    println!("game on, {} rounds", state.max_rounds);

    let mut game = client.watch_game();
    while game.changed().await.is_ok() {
        let Some(state) = game.borrow_and_update().clone() else {
            continue;
        };
        if let Some(note) = &state.last_event {
            println!("  {note}");
        }
        if let Some(winner) = state.winner_id {
            println!("winner: {winner}");
            break;
        }
        if state.waiting_for_roll && client.is_my_turn() {
            client.roll_dice().await?;
        }
    }

    client.logout().await;
    Ok(())
}
