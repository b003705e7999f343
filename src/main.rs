use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use matrix_sdk::ruma::OwnedRoomId;
use matrix_sdk::RoomState;
use serde_json::Value;

use timeline_render::config::{self, RenderSettings};
use timeline_render::matrix::{self, MatrixClient};
use timeline_render::message::RawEvent;
use timeline_render::state::leave::LeaveOutcome;
use timeline_render::state::rooms::{RoomsState, SECTION_CONVERSATIONS, SECTION_INVITES};
use timeline_render::state::timeline::TimelineState;
use timeline_render::ui::timeline::{row_lines, row_padding};

#[derive(Parser)]
#[command(name = "timeline-render")]
#[command(about = "Render Matrix timeline events as text with measured layout")]
struct Cli {
    /// Colour sender names with ANSI escapes
    #[arg(long, global = true)]
    color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render events from a JSON file (an array of events or a /messages response)
    Render {
        path: PathBuf,
        /// Layout width in points (defaults to the bubble width)
        width: Option<f32>,
    },
    /// Render the latest page of a room using the saved session
    Room {
        room_id: OwnedRoomId,
        width: Option<f32>,
        /// Additional backward pages to load
        #[arg(long, default_value_t = 0)]
        pages: usize,
    },
    /// Log in and save the session
    Login {
        homeserver: String,
        username: String,
        #[arg(long, env = "TIMELINE_RENDER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List pending invitations and joined rooms
    Rooms,
    /// Show the effective render settings
    Settings {
        /// Write them to the settings file, creating it if needed
        #[arg(long)]
        save: bool,
    },
    /// Leave a joined room or reject an invitation, by its position in the list
    Leave {
        /// `invites` or `conversations`
        #[arg(long, default_value = SECTION_CONVERSATIONS)]
        section: String,
        index: usize,
        /// Confirm the removal; without it the request is cancelled
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("timeline_render=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let settings = config::load_settings().render;

    let result = match cli.command {
        Command::Render { path, width } => render_file(&path, width, settings, cli.color).await,
        Command::Room { room_id, width, pages } => {
            render_room(room_id, width, pages, settings, cli.color).await
        }
        Command::Login {
            homeserver,
            username,
            password,
        } => matrix::client::login(&homeserver, &username, &password)
            .await
            .map(|_| ()),
        Command::Rooms => list_rooms().await,
        Command::Settings { save } => show_settings(save),
        Command::Leave {
            section,
            index,
            yes,
        } => leave_room(&section, index, yes).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn parse_events(json: &Value) -> Result<Vec<RawEvent>, String> {
    let list = match json {
        Value::Array(list) => list,
        Value::Object(map) => map
            .get("chunk")
            .and_then(Value::as_array)
            .ok_or_else(|| "Expected an array of events or an object with `chunk`".to_string())?,
        _ => return Err("Expected an array of events or an object with `chunk`".to_string()),
    };

    let mut events = Vec::with_capacity(list.len());
    for (i, value) in list.iter().enumerate() {
        match RawEvent::from_json(value) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!("Skipping event #{i}: {e}"),
        }
    }
    Ok(events)
}

async fn render_file(
    path: &Path,
    width: Option<f32>,
    settings: RenderSettings,
    color: bool,
) -> Result<(), String> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let json: Value =
        serde_json::from_str(&data).map_err(|e| format!("Invalid JSON in {}: {e}", path.display()))?;
    let events = parse_events(&json)?;

    let room_id = OwnedRoomId::try_from("!local:localhost").map_err(|e| e.to_string())?;
    let width = width.unwrap_or(settings.bubble_width);
    let mut state = TimelineState::new(settings);
    state.set_timeline(room_id, events, None);
    print_timeline(&mut state, width, color).await;
    Ok(())
}

async fn render_room(
    room_id: OwnedRoomId,
    width: Option<f32>,
    pages: usize,
    settings: RenderSettings,
    color: bool,
) -> Result<(), String> {
    let client = matrix::client::restore_stored().await?;
    matrix::sync::sync_once(&client).await?;
    let room = client
        .get_room(&room_id)
        .ok_or_else(|| format!("Room {room_id} is not known to this session"))?;

    let width = width.unwrap_or(settings.bubble_width);
    let mut state = TimelineState::new(settings);
    let (events, token) = matrix::timeline::load_room_events(&room).await?;
    state.set_timeline(room_id, events, token);

    for _ in 0..pages {
        let Some(token) = state.pagination_token.clone() else {
            break;
        };
        let (events, token) = matrix::timeline::load_earlier_events(&room, &token).await?;
        state.prepend_events(events, token);
    }

    print_timeline(&mut state, width, color).await;
    Ok(())
}

async fn print_timeline(state: &mut TimelineState, width: f32, color: bool) {
    state.measure_rows(width);

    for row in state.rows() {
        let (top, bottom) = row_padding(&row.intent);
        for line in row_lines(row, color) {
            println!("{line}");
        }

        if let Some(mut rx) = state.subscribe_size(&row.key) {
            if state.is_measuring(&row.key) {
                let _ = tokio::time::timeout(Duration::from_secs(5), rx.changed()).await;
            }
            let size = state.row_size(&row.key).unwrap_or_default();
            println!("    ⤷ {}×{} (padding {top}/{bottom})", size.width, size.height);
        }
        println!();
    }
}

fn show_settings(save: bool) -> Result<(), String> {
    let settings = config::load_settings();
    let json = serde_json::to_string_pretty(&settings).map_err(|e| e.to_string())?;
    println!("{json}");
    if save {
        config::save_settings(&settings)?;
        println!("Saved to {}", config::settings_path().display());
    }
    Ok(())
}

async fn connected_rooms() -> Result<(MatrixClient, RoomsState), String> {
    let client = matrix::client::restore_stored().await?;
    matrix::sync::sync_once(&client).await?;
    let mut rooms = RoomsState::default();
    rooms.update_rooms(matrix::sync::collect_rooms(&client));
    Ok((MatrixClient(client), rooms))
}

async fn list_rooms() -> Result<(), String> {
    let (_, rooms) = connected_rooms().await?;
    for section in rooms.sections() {
        println!("{} ({})", section.label, section.key);
        for (index, room) in section.rooms.iter().enumerate() {
            println!("  {index:>3}  {}  {}", room.display_name(), room.room_id);
        }
    }
    Ok(())
}

async fn leave_room(section: &str, index: usize, yes: bool) -> Result<(), String> {
    if section != SECTION_INVITES && section != SECTION_CONVERSATIONS {
        return Err(format!(
            "Unknown section `{section}` (expected `{SECTION_INVITES}` or `{SECTION_CONVERSATIONS}`)"
        ));
    }
    let (client, mut rooms) = connected_rooms().await?;

    rooms.begin_leave(section, index);
    if let Some(prompt) = rooms.leave_prompt(section) {
        println!("{}\n{}", prompt.title, prompt.body);
    }
    if !yes {
        rooms.cancel_leave(section);
        println!("Cancelled (pass --yes to confirm)");
        return Ok(());
    }

    match rooms.confirm_leave(section, &client) {
        LeaveOutcome::Removed(room_id) => wait_until_left(&client, &room_id).await,
        LeaveOutcome::Cancelled | LeaveOutcome::Nothing => {
            Err(format!("No room at position {index} in `{section}`"))
        }
    }
}

/// The removal runs on a spawned task; keep the runtime alive until the
/// room has been left or the request has visibly failed.
async fn wait_until_left(client: &MatrixClient, room_id: &OwnedRoomId) -> Result<(), String> {
    for _ in 0..100 {
        let state = client.0.get_room(room_id).map(|room| room.state());
        if matches!(state, None | Some(RoomState::Left)) {
            println!("Left {room_id}");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Err(format!("Timed out waiting to leave {room_id}"))
}
