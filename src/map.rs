use crate::types::*;
use crate::HandlerResult;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use teloxide::payloads::SendVenueSetters;
use teloxide::prelude::*;
use teloxide::types::MessageId;

//////////////////////////////////////////////////////////
// Map view
//////////////////////////////////////////////////////////
// Telegram's own map renders the pins, so "markers" here are location and
// venue messages. One user pin, one venue pin per live bus keyed by its id;
// tapping a bus pin's button reports the owning route id upstream via a
// "select:" callback. Selection state itself lives in AppState, not here.

#[derive(Debug, Default)]
pub struct MarkerSet {
    pub user: Option<MessageId>,
    pub buses: HashMap<String, MessageId>,
}

pub type MarkerRegistry = Arc<Mutex<HashMap<ChatId, MarkerSet>>>;

/// Brings the pins for one chat in line with the given snapshot: pins for
/// vanished ids are deleted, moved pins are re-sent (Telegram messages
/// cannot be repositioned), new ids get fresh pins.
pub async fn sync_markers(
    bot: &Bot,
    chat_id: ChatId,
    registry: &MarkerRegistry,
    user: Option<Coordinate>,
    live_buses: &[LiveBus],
    routes: &[BusRoute],
) -> HandlerResult {
    // The registry lock must not be held across awaits.
    let mut previous = registry
        .lock()
        .unwrap()
        .remove(&chat_id)
        .unwrap_or_default();

    let current_ids: HashSet<&str> = live_buses.iter().map(|b| b.id.as_str()).collect();
    for (id, msg_id) in &previous.buses {
        if !current_ids.contains(id.as_str()) {
            // Already-gone messages are fine to ignore.
            let _ = bot.delete_message(chat_id, *msg_id).await;
        }
    }
    previous.buses.retain(|id, _| current_ids.contains(id.as_str()));

    let mut next = MarkerSet::default();
    let outcome = send_pins(bot, chat_id, user, live_buses, routes, &mut previous, &mut next).await;

    // Sends can fail partway (Telegram flood limits, for one). Whatever is
    // still on screen, old or new, must stay registered or a later sync can
    // never delete it.
    registry
        .lock()
        .unwrap()
        .insert(chat_id, merge_markers(next, previous));
    outcome
}

async fn send_pins(
    bot: &Bot,
    chat_id: ChatId,
    user: Option<Coordinate>,
    live_buses: &[LiveBus],
    routes: &[BusRoute],
    previous: &mut MarkerSet,
    next: &mut MarkerSet,
) -> HandlerResult {
    if let Some(msg_id) = previous.user.take() {
        let _ = bot.delete_message(chat_id, msg_id).await;
    }
    if let Some(coord) = user {
        let pin = bot.send_location(chat_id, coord.lat, coord.lon).await?;
        next.user = Some(pin.id);
    }

    for bus in live_buses {
        if let Some(old) = previous.buses.remove(&bus.id) {
            let _ = bot.delete_message(chat_id, old).await;
        }
        let (title, details) = venue_labels(bus, routes);
        let pin = bot
            .send_venue(chat_id, bus.location.lat, bus.location.lon, title, details)
            .reply_markup(crate::view::single_select_button(&bus.route_id, "ℹ️"))
            .await?;
        next.buses.insert(bus.id.clone(), pin.id);
    }
    Ok(())
}

/// Registry state to keep after a sync attempt: pins sent this round win,
/// previous pins the attempt never reached stay registered.
pub fn merge_markers(mut next: MarkerSet, previous: MarkerSet) -> MarkerSet {
    if next.user.is_none() {
        next.user = previous.user;
    }
    for (id, msg_id) in previous.buses {
        next.buses.entry(id).or_insert(msg_id);
    }
    next
}

fn venue_labels(bus: &LiveBus, routes: &[BusRoute]) -> (String, String) {
    let title = match routes.iter().find(|r| r.id == bus.route_id) {
        Some(route) => format!("🚌 {} · {}", route.bus_number, route.name),
        None => format!("🚌 {}", bus.id),
    };
    let details = format!(
        "{} occupancy · heading {}° · {}",
        bus.occupancy,
        bus.heading.round() as u32,
        bus.last_updated.format("%H:%M:%S"),
    );
    (title, details)
}
