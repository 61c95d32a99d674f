use crate::gemini::{TimingBoard, TravelAnalytics};
use crate::i18n::Translations;
use crate::types::*;

use chrono::{DateTime, Utc};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html::escape;

//////////////////////////////////////////////////////////
// Bus cards
//////////////////////////////////////////////////////////

/// Renders one route as an HTML card. `expanded` adds the detail section
/// shown for a selected route.
pub fn bus_card(bus: &BusRoute, t: &Translations, expanded: bool) -> String {
    let mut card = format!(
        "🚌 <b>{}</b> — {}\n<i>{}</i>\n{} → {}",
        escape(&bus.bus_number),
        escape(&bus.name),
        bus.kind,
        escape(&bus.source),
        escape(&bus.destination),
    );
    if let Some(eta) = bus.eta_minutes {
        card.push_str(&format!("\n🟢 {} · {} <b>{}</b> {}", t.live, t.arriving_in, eta, t.mins));
    }
    if expanded {
        card.push_str(&format!(
            "\n\n{}: {} - {}\n{}: {}",
            t.first_last,
            escape(&bus.first_bus),
            escape(&bus.last_bus),
            t.trips,
            bus.trips_per_day,
        ));
        if let Some(freq) = bus.frequency_minutes {
            card.push_str(&format!("\n{} {} {}", t.search.freq, freq, t.mins));
        }
        match (&bus.departure_time, &bus.arrival_time) {
            (Some(dep), Some(arr)) => {
                card.push_str(&format!("\n🕐 {} → {}", escape(dep), escape(arr)));
            }
            (Some(dep), None) => card.push_str(&format!("\n🕐 {}", escape(dep))),
            _ => {}
        }
        if let Some(at) = &bus.time_at_your_location {
            card.push_str(&format!("\n📍 {}", escape(at)));
        }
        if bus.kind == BusType::Private {
            if let Some(url) = &bus.image_url {
                card.push_str(&format!("\n<a href=\"{}\">📷</a>", url));
            }
        }
    }
    card
}

/// Map-view sidebar: location banner plus one compact card per route.
pub fn nearby_summary(app: &AppState, t: &Translations) -> String {
    let mut out = String::new();
    if !app.location_details.is_empty() {
        out.push_str(&format!(
            "📍 <b>{}</b>\n<i>{}</i>\n\n",
            escape(&app.location_details),
            t.loading_info
        ));
    }
    let cards: Vec<String> = app
        .nearby_buses
        .iter()
        .map(|bus| bus_card(bus, t, app.selected_bus_id.as_deref() == Some(bus.id.as_str())))
        .collect();
    out.push_str(&cards.join("\n\n"));
    out
}

/// Search results: total-buses badge plus expanded cards.
pub fn search_results(total_buses_per_day: f64, routes: &[BusRoute], t: &Translations) -> String {
    let mut out = format!(
        "<b>{}</b>\n{}: {}\n",
        t.search.results,
        t.search.total,
        total_buses_per_day.round() as i64
    );
    for route in routes {
        out.push_str("\n");
        out.push_str(&bus_card(route, t, true));
        out.push('\n');
    }
    out
}

//////////////////////////////////////////////////////////
// Timing board
//////////////////////////////////////////////////////////

/// Monospace departure board. Delayed rows carry a ❗ flag so they stand
/// out from on-time rows.
pub fn timing_board(board: &TimingBoard, t: &Translations, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "🚏 <b>{}</b>\n{} · {}\n",
        escape(&board.stand_name.to_uppercase()),
        t.board.departures,
        now.format("%H:%M %d/%m/%Y"),
    );
    out.push_str("<pre>");
    out.push_str(&format!(
        "{:<2}{:<7} {:<18} {:<9} {:<5} {}\n",
        "", "NO.", t.board.destination, t.board.time, "PLAT", t.board.status
    ));
    for dep in &board.departures {
        let delayed = dep.status.to_uppercase().contains("DELAYED");
        // Both flags are two chars so flagged rows keep the column grid.
        let flag = if delayed { "❗ " } else { "  " };
        let destination: String = dep.destination.chars().take(18).collect();
        out.push_str(&format!(
            "{}{:<7} {:<18} {:<9} {:<5} {}\n",
            flag,
            escape(&dep.bus_number),
            escape(&destination),
            escape(&dep.scheduled_time),
            escape(dep.platform.as_deref().unwrap_or("N/A")),
            escape(&dep.status),
        ));
    }
    out.push_str("</pre>");
    out
}

//////////////////////////////////////////////////////////
// Analytics panel
//////////////////////////////////////////////////////////

pub fn analytics_panel(data: &TravelAnalytics, location: &str, t: &Translations) -> String {
    let mut out = format!(
        "📊 <b>{}</b>\n<i>{} {}</i>\n\n{}: {}\n\n<b>{}</b>\n{} {}%\n<code>{}</code>\n{} {}%\n<code>{}</code>\n",
        t.analytics.title,
        t.analytics.subtitle,
        escape(location),
        t.analytics.daily_volume,
        escape(&data.daily_volume),
        t.analytics.gov_vs_priv,
        t.analytics.gov_label,
        data.gov_share.round() as i64,
        share_bar(data.gov_share),
        t.analytics.priv_label,
        data.priv_share.round() as i64,
        share_bar(data.priv_share),
    );
    out.push_str(&format!(
        "\n<b>{}</b>\n<code>{}</code>\n",
        t.analytics.peak_title,
        demand_sparkline(&data.hourly_demand)
    ));
    out.push_str(&format!(
        "\n🌙 <b>{}</b>: {}\n",
        t.analytics.night_insight,
        escape(&data.night_travel_factor)
    ));
    if !data.top_destinations.is_empty() {
        out.push_str(&format!("\n<b>{}</b>\n", t.analytics.trending));
        for (i, dest) in data.top_destinations.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, escape(dest)));
        }
    }
    out
}

/// 20-slot horizontal bar for a 0-100 percentage. Values are displayed
/// as-is; the backend does not guarantee the two shares sum to 100.
pub fn share_bar(pct: f64) -> String {
    let filled = ((pct.clamp(0.0, 100.0) / 100.0) * 20.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}

/// One block character per hour, scaled over 0-100.
pub fn demand_sparkline(values: &[f64]) -> String {
    const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    values
        .iter()
        .map(|v| {
            let idx = ((v.clamp(0.0, 100.0) / 100.0) * 7.0).round() as usize;
            LEVELS[idx]
        })
        .collect()
}

//////////////////////////////////////////////////////////
// Keyboards
//////////////////////////////////////////////////////////

/// Creates an inline keyboard from (label, callback data) pairs, laid out
/// in rows of `chunks` buttons.
pub fn make_inline_keyboard(buttons: Vec<(String, String)>, chunks: usize) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = vec![];

    for pairs in buttons.chunks(chunks) {
        let row = pairs
            .iter()
            .map(|(label, data)| InlineKeyboardButton::callback(label.clone(), data.clone()))
            .collect();

        keyboard.push(row);
    }

    InlineKeyboardMarkup::new(keyboard)
}

pub fn route_select_keyboard(routes: &[BusRoute]) -> InlineKeyboardMarkup {
    let buttons = routes
        .iter()
        .map(|r| (format!("🚌 {}", r.bus_number), format!("select:{}", r.id)))
        .collect();
    make_inline_keyboard(buttons, 2)
}

pub fn single_select_button(route_id: &str, label: &str) -> InlineKeyboardMarkup {
    make_inline_keyboard(vec![(label.to_string(), format!("select:{route_id}"))], 1)
}

/// One button labelled with the other language; pressing it toggles.
pub fn language_keyboard(t: &Translations) -> InlineKeyboardMarkup {
    make_inline_keyboard(
        vec![(t.change_lang.to_string(), "lang:toggle".to_string())],
        1,
    )
}
