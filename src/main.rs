pub mod config;
pub mod gemini;
pub mod i18n;
pub mod live;
pub mod map;
pub mod types;
pub mod view;
#[cfg(test)]
mod tests;

use config::*;
use i18n::translations;
use map::MarkerRegistry;
use types::*;

use chrono::Utc;
use dptree::{case, deps};
use std::{
    collections::HashMap,
    error::Error,
    sync::{Arc, Mutex},
};
use teloxide::{
    dispatching::{dialogue, dialogue::InMemStorage},
    dptree::endpoint,
    filter_command,
    payloads::SendMessageSetters,
    prelude::*,
    types::{
        ButtonRequest, KeyboardButton, KeyboardMarkup, KeyboardRemove,
        ParseMode::Html,
    },
    utils::command::BotCommands,
};

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type MyDialogue = Dialogue<State, InMemStorage<State>>;

/// Per-chat refresh generation numbers. A detection that finishes after a
/// newer refresh has started discards its result instead of writing state.
pub type RefreshSeq = Arc<Mutex<HashMap<ChatId, u64>>>;

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
enum Command {
    #[command(description = "Display help menu showing the commands list")]
    Help,
    #[command(description = "Start and share your location.")]
    Start,
    #[command(description = "Show bus routes passing near you.")]
    Nearby,
    #[command(description = "Refresh nearby routes and live positions.")]
    Refresh,
    #[command(description = "Search buses between two places.")]
    Search,
    #[command(description = "Show a bus stand timing board.")]
    Board,
    #[command(description = "Show travel analytics for your area.")]
    Analytics,
    #[command(description = "Switch between English and Tamil.")]
    Language,
    #[command(description = "Cancel the current action.")]
    Cancel,
}

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    ReceiveLocation {
        app: AppState,
    },
    Active {
        app: AppState,
    },
    ReceiveSource {
        app: AppState,
    },
    ReceiveDestination {
        app: AppState,
        source: String,
    },
    ReceiveStand {
        app: AppState,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting 'TN Bus Expert' BOT ...");

    let bot = Bot::from_env();

    let command_handler = filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Nearby].endpoint(nearby))
        .branch(case![Command::Refresh].endpoint(refresh))
        .branch(case![Command::Search].endpoint(search))
        .branch(case![Command::Board].endpoint(board))
        .branch(case![Command::Analytics].endpoint(analytics))
        .branch(case![Command::Language].endpoint(language))
        .branch(case![Command::Cancel].endpoint(cancel));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![State::ReceiveLocation { app }].endpoint(receive_location))
        .branch(case![State::ReceiveSource { app }].endpoint(receive_source))
        .branch(case![State::ReceiveDestination { app, source }].endpoint(receive_destination))
        .branch(case![State::ReceiveStand { app }].endpoint(receive_stand))
        .branch(case![State::Active { app }].endpoint(active_message))
        .branch(endpoint(invalid_state));

    let callback_query_handler = Update::filter_callback_query().branch(endpoint(handle_callback));

    let dial = dialogue::enter::<Update, InMemStorage<State>, State, _>()
        .branch(message_handler)
        .branch(callback_query_handler);

    let markers: MarkerRegistry = Arc::new(Mutex::new(HashMap::new()));
    let refreshes: RefreshSeq = Arc::new(Mutex::new(HashMap::new()));

    Dispatcher::builder(bot, dial)
        .dependencies(deps![InMemStorage::<State>::new(), markers, refreshes])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}

async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Type /help to see the usage.",
    )
    .await?;
    Ok(())
}

//////////////////////////////////////////////////////////
// Command handlers
//////////////////////////////////////////////////////////

async fn start(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    let app = AppState::default();
    let t = translations(app.language);

    bot.send_message(
        msg.chat.id,
        format!(
            "🚌 <b>{}</b>\n<i>{}</i>\n\n📍 /nearby — {}\n🔍 /search — {}\n🚏 /board — {}\n\n{}",
            t.title,
            t.subtitle,
            t.tabs.nearby,
            t.tabs.search,
            t.tabs.board,
            t.share_location,
        ),
    )
    .parse_mode(Html)
    .reply_markup(location_keyboard())
    .await?;

    dialogue.update(State::ReceiveLocation { app }).await?;
    Ok(())
}

async fn nearby(
    bot: Bot,
    dialogue: MyDialogue,
    msg: Message,
    markers: MarkerRegistry,
    refreshes: RefreshSeq,
) -> HandlerResult {
    let app = current_app(&dialogue).await.with_view_mode(ViewMode::Map);
    let t = translations(app.language);

    match app.user_location {
        // Tab switch only: previously fetched data is shown as-is.
        Some(_) if !app.nearby_buses.is_empty() => {
            bot.send_message(msg.chat.id, view::nearby_summary(&app, t))
                .parse_mode(Html)
                .reply_markup(view::route_select_keyboard(&app.nearby_buses))
                .await?;
            dialogue.update(State::Active { app }).await?;
        }
        Some(coord) => {
            run_detection(&bot, &dialogue, app, coord, &markers, &refreshes).await?;
        }
        None => {
            bot.send_message(msg.chat.id, t.share_location)
                .reply_markup(location_keyboard())
                .await?;
            dialogue.update(State::ReceiveLocation { app }).await?;
        }
    }
    Ok(())
}

async fn refresh(
    bot: Bot,
    dialogue: MyDialogue,
    msg: Message,
    markers: MarkerRegistry,
    refreshes: RefreshSeq,
) -> HandlerResult {
    let app = current_app(&dialogue).await.with_view_mode(ViewMode::Map);
    let t = translations(app.language);

    match app.user_location {
        Some(coord) => run_detection(&bot, &dialogue, app, coord, &markers, &refreshes).await?,
        None => {
            bot.send_message(msg.chat.id, t.share_location)
                .reply_markup(location_keyboard())
                .await?;
            dialogue.update(State::ReceiveLocation { app }).await?;
        }
    }
    Ok(())
}

async fn search(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    let app = current_app(&dialogue).await.with_view_mode(ViewMode::Search);
    let t = translations(app.language);

    bot.send_message(msg.chat.id, format!("🔍 {}", t.search.from))
        .await?;
    dialogue.update(State::ReceiveSource { app }).await?;
    Ok(())
}

async fn board(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    let app = current_app(&dialogue).await.with_view_mode(ViewMode::Board);
    let t = translations(app.language);

    bot.send_message(msg.chat.id, format!("🚏 {}", t.board.placeholder))
        .await?;
    dialogue.update(State::ReceiveStand { app }).await?;
    Ok(())
}

async fn analytics(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    let app = current_app(&dialogue).await;
    let t = translations(app.language);
    let location = if app.location_details.is_empty() {
        DEFAULT_ANALYTICS_REGION.to_string()
    } else {
        app.location_details.clone()
    };

    let status = bot.send_message(msg.chat.id, t.analytics.loading).await?;
    let outcome = gemini::get_travel_analytics(&location).await;
    bot.delete_message(msg.chat.id, status.id).await?;

    match outcome {
        Some(data) => {
            bot.send_message(msg.chat.id, view::analytics_panel(&data, &location, t))
                .parse_mode(Html)
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, format!("⚠️ {}", ERR_ANALYTICS_FAILED))
                .await?;
        }
    }
    Ok(())
}

async fn language(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    let app = current_app(&dialogue).await;
    let t = translations(app.language);
    bot.send_message(msg.chat.id, format!("🌐 {}", t.title))
        .reply_markup(view::language_keyboard(t))
        .await?;
    Ok(())
}

async fn cancel(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    let app = current_app(&dialogue).await;
    bot.send_message(msg.chat.id, "🚫 Cancelled.").await?;
    dialogue.update(State::Active { app }).await?;
    Ok(())
}

//////////////////////////////////////////////////////////
// State handlers
//////////////////////////////////////////////////////////

async fn receive_location(
    bot: Bot,
    dialogue: MyDialogue,
    app: AppState,
    msg: Message,
    markers: MarkerRegistry,
    refreshes: RefreshSeq,
) -> HandlerResult {
    match msg.location() {
        Some(loc) => {
            let coord = Coordinate {
                lat: loc.latitude,
                lon: loc.longitude,
            };
            run_detection(&bot, &dialogue, app, coord, &markers, &refreshes).await?;
        }
        None => {
            let app = location_failed(app, ERR_LOCATION_UNAVAILABLE);
            bot.send_message(msg.chat.id, format!("⚠️ {}", ERR_LOCATION_UNAVAILABLE))
                .reply_markup(KeyboardRemove::new())
                .await?;
            dialogue.update(State::Active { app }).await?;
        }
    }
    Ok(())
}

async fn receive_source(
    bot: Bot,
    dialogue: MyDialogue,
    app: AppState,
    msg: Message,
) -> HandlerResult {
    let t = translations(app.language);
    match msg.text().map(ToOwned::to_owned) {
        Some(source) => {
            bot.send_message(msg.chat.id, format!("🔍 {}", t.search.to))
                .await?;
            dialogue
                .update(State::ReceiveDestination { app, source })
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, format!("❌ {}", t.search.from))
                .await?;
        }
    }
    Ok(())
}

async fn receive_destination(
    bot: Bot,
    dialogue: MyDialogue,
    (app, source): (AppState, String),
    msg: Message,
) -> HandlerResult {
    let t = translations(app.language);
    match msg.text().map(ToOwned::to_owned) {
        Some(destination) => {
            let status = bot.send_message(msg.chat.id, t.find_bus).await?;
            let near = if app.location_details.is_empty() {
                None
            } else {
                Some(app.location_details.as_str())
            };
            let outcome = gemini::search_buses_on_route(&source, &destination, near).await;
            bot.delete_message(msg.chat.id, status.id).await?;

            match outcome {
                Some(results) if results.buses.is_empty() => {
                    bot.send_message(msg.chat.id, t.no_buses).await?;
                }
                Some(results) => {
                    let routes: Vec<BusRoute> = results
                        .buses
                        .iter()
                        .enumerate()
                        .map(|(idx, d)| live::search_route(idx, d, &source, &destination))
                        .collect();
                    bot.send_message(
                        msg.chat.id,
                        view::search_results(results.total_buses_per_day, &routes, t),
                    )
                    .parse_mode(Html)
                    .await?;
                }
                None => {
                    bot.send_message(msg.chat.id, format!("⚠️ {}", ERR_SEARCH_FAILED))
                        .await?;
                }
            }
            dialogue.update(State::Active { app }).await?;
        }
        None => {
            bot.send_message(msg.chat.id, format!("❌ {}", t.search.to))
                .await?;
        }
    }
    Ok(())
}

async fn receive_stand(
    bot: Bot,
    dialogue: MyDialogue,
    app: AppState,
    msg: Message,
) -> HandlerResult {
    let t = translations(app.language);
    match msg.text().map(ToOwned::to_owned) {
        Some(stand_name) => {
            let status = bot.send_message(msg.chat.id, "⏳").await?;
            let outcome = gemini::get_stand_timing_board(&stand_name).await;
            bot.delete_message(msg.chat.id, status.id).await?;

            match outcome {
                Some(board) if board.departures.is_empty() => {
                    bot.send_message(msg.chat.id, t.no_buses).await?;
                }
                Some(board) => {
                    bot.send_message(msg.chat.id, view::timing_board(&board, t, Utc::now()))
                        .parse_mode(Html)
                        .await?;
                }
                None => {
                    bot.send_message(msg.chat.id, format!("⚠️ {}", ERR_BOARD_FAILED))
                        .await?;
                }
            }
            dialogue.update(State::Active { app }).await?;
        }
        None => {
            bot.send_message(msg.chat.id, format!("❌ {}", t.board.placeholder))
                .await?;
        }
    }
    Ok(())
}

/// Messages arriving in the idle state: a re-shared location triggers a
/// fresh detection, anything else gets a usage hint.
async fn active_message(
    bot: Bot,
    dialogue: MyDialogue,
    app: AppState,
    msg: Message,
    markers: MarkerRegistry,
    refreshes: RefreshSeq,
) -> HandlerResult {
    match msg.location() {
        Some(loc) => {
            let coord = Coordinate {
                lat: loc.latitude,
                lon: loc.longitude,
            };
            run_detection(&bot, &dialogue, app, coord, &markers, &refreshes).await?;
        }
        None => {
            invalid_state(bot, msg).await?;
        }
    }
    Ok(())
}

async fn handle_callback(bot: Bot, dialogue: MyDialogue, q: CallbackQuery) -> HandlerResult {
    let Some(data) = q.data else { return Ok(()) };
    let state = dialogue.get().await?.unwrap_or_default();
    let app = app_of(&state);
    let chat_id = dialogue.chat_id();

    if let Some(route_id) = data.strip_prefix("select:") {
        let t = translations(app.language);
        if let Some(bus) = app.nearby_buses.iter().find(|b| b.id == route_id) {
            bot.send_message(chat_id, view::bus_card(bus, t, true))
                .parse_mode(Html)
                .await?;
        }
        let app = AppState {
            selected_bus_id: Some(route_id.to_string()),
            ..app
        };
        dialogue.update(replace_app(state, app)).await?;
    } else if data == "lang:toggle" {
        let language = app.language.toggled();
        let app = app.with_language(language);
        let t = translations(app.language);
        bot.send_message(chat_id, format!("🌐 {}", t.title)).await?;
        dialogue.update(replace_app(state, app)).await?;
    }
    Ok(())
}

//////////////////////////////////////////////////////////
// Detection flow
//////////////////////////////////////////////////////////

async fn run_detection(
    bot: &Bot,
    dialogue: &MyDialogue,
    app: AppState,
    coord: Coordinate,
    markers: &MarkerRegistry,
    refreshes: &RefreshSeq,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let t = translations(app.language);
    let generation = begin_refresh(refreshes, chat_id);

    let app = AppState {
        is_loading: true,
        error: None,
        view_mode: ViewMode::Map,
        ..app
    };
    dialogue.update(State::Active { app: app.clone() }).await?;

    let status = bot
        .send_message(chat_id, t.find_bus)
        .reply_markup(KeyboardRemove::new())
        .await?;
    let outcome = gemini::detect_nearby_routes(coord).await;
    bot.delete_message(chat_id, status.id).await?;

    if !is_current_refresh(refreshes, chat_id, generation) {
        log::debug!("discarding stale nearby-routes result for chat {}", chat_id);
        return Ok(());
    }

    let app = apply_detection(app, coord, outcome);
    if let Some(error) = &app.error {
        bot.send_message(chat_id, format!("⚠️ {}\n{}", error, t.retry_hint))
            .await?;
    } else if app.nearby_buses.is_empty() {
        bot.send_message(chat_id, t.no_buses).await?;
    } else {
        map::sync_markers(
            bot,
            chat_id,
            markers,
            app.user_location,
            &app.live_buses,
            &app.nearby_buses,
        )
        .await?;
        bot.send_message(chat_id, view::nearby_summary(&app, t))
            .parse_mode(Html)
            .reply_markup(view::route_select_keyboard(&app.nearby_buses))
            .await?;
    }
    dialogue.update(State::Active { app }).await?;
    Ok(())
}

/// Folds a detection outcome into the view state. Pure so the failure and
/// empty-result paths are testable without a live bot.
pub fn apply_detection(
    app: AppState,
    coord: Coordinate,
    outcome: Option<gemini::NearbyRoutes>,
) -> AppState {
    match outcome {
        Some(detected) => {
            let routes: Vec<BusRoute> = detected
                .routes
                .iter()
                .enumerate()
                .map(|(idx, d)| live::nearby_route(idx, d))
                .collect();
            let live_buses = live::synth_live_buses(&routes, coord);
            let location_details = if detected.is_rural.unwrap_or(false) {
                format!("🌾 {}", detected.location_name)
            } else {
                detected.location_name
            };
            AppState {
                user_location: Some(coord),
                nearby_buses: routes,
                live_buses,
                selected_bus_id: None,
                location_details,
                is_loading: false,
                error: None,
                ..app
            }
        }
        None => AppState {
            user_location: Some(coord),
            is_loading: false,
            error: Some(ERR_DETECT_FAILED.to_string()),
            ..app
        },
    }
}

/// Location acquisition failed: keep whatever data we had, surface the
/// platform message verbatim.
pub fn location_failed(app: AppState, message: &str) -> AppState {
    AppState {
        is_loading: false,
        error: Some(message.to_string()),
        ..app
    }
}

//////////////////////////////////////////////////////////
// Helpers
//////////////////////////////////////////////////////////

fn location_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new("📍").request(ButtonRequest::Location)
    ]])
}

pub fn app_of(state: &State) -> AppState {
    match state {
        State::Start => AppState::default(),
        State::ReceiveLocation { app }
        | State::Active { app }
        | State::ReceiveSource { app }
        | State::ReceiveStand { app } => app.clone(),
        State::ReceiveDestination { app, .. } => app.clone(),
    }
}

/// Replaces the view-state snapshot without disturbing what the dialogue is
/// currently waiting for.
pub fn replace_app(state: State, app: AppState) -> State {
    match state {
        State::Start | State::Active { .. } => State::Active { app },
        State::ReceiveLocation { .. } => State::ReceiveLocation { app },
        State::ReceiveSource { .. } => State::ReceiveSource { app },
        State::ReceiveDestination { source, .. } => State::ReceiveDestination { app, source },
        State::ReceiveStand { .. } => State::ReceiveStand { app },
    }
}

async fn current_app(dialogue: &MyDialogue) -> AppState {
    match dialogue.get().await.ok().flatten() {
        Some(state) => app_of(&state),
        None => AppState::default(),
    }
}

pub fn begin_refresh(refreshes: &RefreshSeq, chat_id: ChatId) -> u64 {
    let mut map = refreshes.lock().unwrap();
    let generation = map.entry(chat_id).or_insert(0);
    *generation += 1;
    *generation
}

pub fn is_current_refresh(refreshes: &RefreshSeq, chat_id: ChatId, generation: u64) -> bool {
    refreshes
        .lock()
        .unwrap()
        .get(&chat_id)
        .copied()
        .unwrap_or(0)
        == generation
}
