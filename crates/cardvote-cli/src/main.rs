use anyhow::{Context, Result};
use cardvote_client::{
    backend_url_from_env, room_url, wait_for_result, LivenessProbe, SelectionDraft,
    VotingClientFactory,
};
use cardvote_server::{shutdown_signal, RoomServer, ServerConfig};
use cardvote_types::{RoomId, RoomRules, ServerEvent, UserId};
use clap::{Parser, Subcommand};
use log::LevelFilter;

mod display;

#[derive(Parser, Debug)]
#[clap(name = "cardvote", author, version, about = "Multiplayer card voting from the terminal")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new room id
    NewRoom {
        #[clap(long, default_value = "2", help = "Number of players")]
        players: usize,

        #[clap(long, default_value = "2", help = "Cards each player selects")]
        selections: usize,

        #[clap(long, help = "Web frontend base URL (defaults to FRONTEND_URL)")]
        frontend_url: Option<String>,
    },
    /// Join a room, vote, and wait for the result
    Join {
        room_id: RoomId,

        #[clap(long, short, help = "Name shown to the other players")]
        name: Option<String>,

        #[clap(
            long = "select",
            short,
            help = "Card to vote for; repeat once per slot, missing slots are left to chance"
        )]
        selections: Vec<String>,

        #[clap(long, help = "Connection id (random when omitted)")]
        user_id: Option<UserId>,

        #[clap(long, help = "Room service URL (defaults to BACKEND_URL or ws://localhost:8000)")]
        backend: Option<String>,
    },
    /// List open rooms and their players
    Rooms {
        #[clap(long, help = "Room service URL (defaults to BACKEND_URL or ws://localhost:8000)")]
        backend: Option<String>,
    },
    /// Run a room service in this process
    Serve {
        #[clap(long, default_value = "127.0.0.1:8000")]
        bind_addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level_filter = cli.log_level.parse().unwrap_or(LevelFilter::Warn);
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();

    match cli.command {
        Commands::NewRoom {
            players,
            selections,
            frontend_url,
        } => new_room(players, selections, frontend_url),
        Commands::Join {
            room_id,
            name,
            selections,
            user_id,
            backend,
        } => {
            let backend = backend.unwrap_or_else(backend_url_from_env);
            let user_id = user_id.unwrap_or_else(UserId::generate);
            join_room(&backend, room_id, user_id, name, selections).await
        }
        Commands::Rooms { backend } => {
            let backend = backend.unwrap_or_else(backend_url_from_env);
            list_rooms(&backend).await
        }
        Commands::Serve { bind_addr } => serve(&bind_addr).await,
    }
}

fn new_room(players: usize, selections: usize, frontend_url: Option<String>) -> Result<()> {
    let rules = RoomRules::new(players, selections)?;
    let room_id = RoomId::generate(rules);
    println!("{}", room_id);

    let frontend_url = frontend_url.or_else(|| std::env::var("FRONTEND_URL").ok());
    if let Some(frontend_url) = frontend_url {
        println!("{}", room_url(&frontend_url, &room_id));
    }
    Ok(())
}

async fn join_room(
    backend: &str,
    room_id: RoomId,
    user_id: UserId,
    name: Option<String>,
    cards: Vec<String>,
) -> Result<()> {
    let rules = room_id.rules();
    let mut draft = SelectionDraft::new(rules);
    draft.fill(cards)?;

    LivenessProbe::new(backend).check().await?;

    let mut client = VotingClientFactory::connect_remote(backend, room_id.clone(), user_id).await?;
    println!(
        "Joined room {} ({} players, {} cards each)",
        room_id, rules.users_count(), rules.selections_per_user()
    );

    if let Some(name) = name {
        client.update_user_name(&name).await?;
    }
    client.submit_selections(draft.into_selections()).await?;

    let result = wait_for_result(client.as_mut(), |event| {
        if let ServerEvent::UsersUpdated { .. } = event {
            println!("{}\n", display::render_event(event));
        }
    })
    .await?;

    match result {
        Some(event) => print!("{}", display::render_event(&event)),
        None => println!("The room closed before voting completed."),
    }

    client.close().await
}

async fn list_rooms(backend: &str) -> Result<()> {
    let overview = LivenessProbe::new(backend)
        .with_attempts(1)
        .overview()
        .await
        .with_context(|| format!("Failed to list rooms at {}", backend))?;
    println!("{}", display::render_overview(&overview));
    Ok(())
}

async fn serve(bind_addr: &str) -> Result<()> {
    let config = ServerConfig::new().with_bind_addr_str(bind_addr)?;
    println!("Serving rooms on ws://{}", config.bind_addr);
    RoomServer::with_config(config)
        .serve_with_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
