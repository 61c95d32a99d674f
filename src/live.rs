use crate::config::*;
use crate::gemini::{BusSearchDescriptor, RouteDescriptor};
use crate::types::*;

use chrono::Utc;
use rand::Rng;

//////////////////////////////////////////////////////////
// View-model mapping
//////////////////////////////////////////////////////////

/// Maps one nearby-route descriptor into a view model, filling the gaps the
/// backend is allowed to leave: category falls back to TNSTC, missing ETA
/// gets a random value in the documented range.
pub fn nearby_route(idx: usize, d: &RouteDescriptor) -> BusRoute {
    let frequency = d.frequency_minutes.filter(|f| *f > 0.0);
    BusRoute {
        id: format!("ai-{idx}"),
        bus_number: d.bus_number.clone(),
        name: d.name.clone(),
        kind: d
            .kind
            .as_deref()
            .and_then(BusType::parse)
            .unwrap_or(BusType::Tnstc),
        source: d.source.clone(),
        destination: d.destination.clone(),
        path: Vec::new(),
        stops: Vec::new(),
        first_bus: DEFAULT_FIRST_BUS.to_string(),
        last_bus: DEFAULT_LAST_BUS.to_string(),
        trips_per_day: (1000.0 / frequency.unwrap_or(30.0)).floor() as u32,
        image_url: Some(format!("https://picsum.photos/seed/bus{idx}/400/300")),
        frequency_minutes: frequency.map(|f| f as u32),
        eta_minutes: Some(
            d.estimated_arrival_time_minutes
                .map(|m| m as u32)
                .unwrap_or_else(random_eta),
        ),
        departure_time: None,
        arrival_time: None,
        time_at_your_location: d.time_at_your_location.clone(),
    }
}

/// Maps one search result. Source and destination come from the submitted
/// query terms, not from the backend.
pub fn search_route(
    idx: usize,
    d: &BusSearchDescriptor,
    source: &str,
    destination: &str,
) -> BusRoute {
    let frequency = d.frequency_minutes.filter(|f| *f > 0.0);
    BusRoute {
        id: format!("search-{idx}"),
        bus_number: d.bus_number.clone(),
        name: d.name.clone(),
        kind: d
            .kind
            .as_deref()
            .and_then(BusType::parse)
            .unwrap_or(BusType::Tnstc),
        source: source.to_string(),
        destination: destination.to_string(),
        path: Vec::new(),
        stops: Vec::new(),
        first_bus: d
            .first_bus
            .clone()
            .or_else(|| d.departure_time.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        last_bus: d.last_bus.clone().unwrap_or_else(|| "N/A".to_string()),
        trips_per_day: d
            .trips_per_day
            .map(|t| t as u32)
            .unwrap_or_else(|| (1000.0 / frequency.unwrap_or(30.0)).floor() as u32),
        image_url: Some(format!("https://picsum.photos/seed/bus{idx}/400/300")),
        frequency_minutes: frequency.map(|f| f as u32),
        eta_minutes: None,
        departure_time: d.departure_time.clone(),
        arrival_time: d.arrival_time.clone(),
        time_at_your_location: d.time_at_user_location.clone(),
    }
}

pub fn random_eta() -> u32 {
    rand::thread_rng().gen_range(ETA_DEFAULT_MIN..=ETA_DEFAULT_MAX)
}

//////////////////////////////////////////////////////////
// Live-bus synthesis
//////////////////////////////////////////////////////////
// There is no real tracking source; positions are fabricated around the
// user's coordinate and replaced wholesale on every refresh.

pub fn jitter(origin: Coordinate) -> Coordinate {
    let mut rng = rand::thread_rng();
    Coordinate {
        lat: origin.lat + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES),
        lon: origin.lon + rng.gen_range(-JITTER_DEGREES..=JITTER_DEGREES),
    }
}

/// One simulated bus per route, all referencing route ids from the same batch.
pub fn synth_live_buses(routes: &[BusRoute], origin: Coordinate) -> Vec<LiveBus> {
    routes
        .iter()
        .map(|route| {
            let mut rng = rand::thread_rng();
            LiveBus {
                id: format!("live-{}", route.id),
                route_id: route.id.clone(),
                location: jitter(origin),
                heading: rng.gen_range(0.0..360.0),
                last_updated: Utc::now(),
                occupancy: match rng.gen_range(0..3) {
                    0 => Occupancy::Low,
                    1 => Occupancy::Medium,
                    _ => Occupancy::High,
                },
            }
        })
        .collect()
}
