use crate::config::*;
use crate::types::Coordinate;

use std::error::Error;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

//////////////////////////////////////////////////////////
// Response records
//////////////////////////////////////////////////////////

/// Raw data about one bus service near the user, before view-model mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    pub bus_number: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub frequency_minutes: Option<f64>,
    #[serde(default)]
    pub estimated_arrival_time_minutes: Option<f64>,
    #[serde(default)]
    pub time_at_your_location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRoutes {
    pub location_name: String,
    #[serde(default)]
    pub is_rural: Option<bool>,
    pub routes: Vec<RouteDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusSearchDescriptor {
    pub bus_number: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub first_bus: Option<String>,
    #[serde(default)]
    pub last_bus: Option<String>,
    #[serde(default)]
    pub frequency_minutes: Option<f64>,
    #[serde(default)]
    pub trips_per_day: Option<f64>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub time_at_user_location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSearch {
    pub total_buses_per_day: f64,
    pub buses: Vec<BusSearchDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    pub bus_number: String,
    pub destination: String,
    #[serde(default)]
    pub scheduled_time: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBoard {
    pub stand_name: String,
    pub departures: Vec<Departure>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelAnalytics {
    pub gov_share: f64,
    pub priv_share: f64,
    /// One value per hour of day. Rejected at parse time unless exactly 24.
    pub hourly_demand: Vec<f64>,
    pub daily_volume: String,
    pub night_travel_factor: String,
    #[serde(default)]
    pub top_destinations: Vec<String>,
}

//////////////////////////////////////////////////////////
// Query operations
//////////////////////////////////////////////////////////
// Every operation swallows transport and parse failures and hands back
// None. Nothing in this module panics or lets an error escape to a handler.

pub async fn detect_nearby_routes(location: Coordinate) -> Option<NearbyRoutes> {
    let prompt = format!(
        "You are a Tamil Nadu bus expert. A user is at coordinates {}, {}. \
         1. Identify the specific road segment or village they are in. \
         2. List at least {NEARBY_ROUTE_TARGET} major bus routes (Government TNSTC, SETC, MTC, or Private) \
         that pass through this exact point, even if it's not a formal stop. \
         3. For each route, provide the Bus Number, Name, Source, Destination, Estimated Frequency \
         and the time it passes the user's point. \
         4. If this is a rural area between two towns, explicitly mention that.",
        location.lat, location.lon
    );
    match generate(prompt, nearby_schema()).await {
        Ok(text) => parse_nearby(&text),
        Err(e) => {
            log::warn!("nearby route detection failed: {}", e);
            None
        }
    }
}

pub async fn search_buses_on_route(
    source: &str,
    destination: &str,
    near: Option<&str>,
) -> Option<RouteSearch> {
    let mut prompt = format!(
        "List all Tamil Nadu bus services (TNSTC, SETC, Private, Mini-buses) operating between \
         {source} and {destination}. Include local rural buses. Provide departure times from \
         {source} and arrival times at {destination}."
    );
    if let Some(near) = near {
        prompt.push_str(&format!(
            " The user is currently near {near}; include the time each bus passes that point."
        ));
    }
    match generate(prompt, search_schema()).await {
        Ok(text) => parse_search(&text),
        Err(e) => {
            log::warn!("route search failed: {}", e);
            None
        }
    }
}

pub async fn get_stand_timing_board(stand_name: &str) -> Option<TimingBoard> {
    let prompt = format!(
        "Create a digital timing board for {stand_name} Bus Stand in Tamil Nadu. \
         List {BOARD_DEPARTURE_COUNT} upcoming departures including bus numbers, destinations, \
         scheduled times, platforms and status (ON TIME or DELAYED X MINS)."
    );
    match generate(prompt, board_schema()).await {
        Ok(text) => parse_board(&text),
        Err(e) => {
            log::warn!("timing board fetch failed: {}", e);
            None
        }
    }
}

pub async fn get_travel_analytics(location: &str) -> Option<TravelAnalytics> {
    let prompt = format!(
        "Summarise bus travel analytics for {location} in Tamil Nadu. Give the percentage share \
         of government (TNSTC/SETC/MTC) versus private operators, hourly passenger demand as 24 \
         values from 0 to 100 indexed by hour of day, a short daily passenger volume figure, a \
         one-line insight about overnight travel, and the top 5 trending destinations."
    );
    match generate(prompt, analytics_schema()).await {
        Ok(text) => parse_analytics(&text),
        Err(e) => {
            log::warn!("travel analytics fetch failed: {}", e);
            None
        }
    }
}

//////////////////////////////////////////////////////////
// Parsing
//////////////////////////////////////////////////////////
// The declared output schema is advisory only, so the completion text is
// re-validated here; anything nonconforming maps to None.

pub fn parse_nearby(text: &str) -> Option<NearbyRoutes> {
    match serde_json::from_str(text) {
        Ok(result) => Some(result),
        Err(e) => {
            log::warn!("malformed nearby-routes response: {}", e);
            None
        }
    }
}

pub fn parse_search(text: &str) -> Option<RouteSearch> {
    match serde_json::from_str(text) {
        Ok(result) => Some(result),
        Err(e) => {
            log::warn!("malformed route-search response: {}", e);
            None
        }
    }
}

pub fn parse_board(text: &str) -> Option<TimingBoard> {
    match serde_json::from_str::<TimingBoard>(text) {
        Ok(mut board) => {
            board.departures.truncate(BOARD_DEPARTURE_COUNT);
            Some(board)
        }
        Err(e) => {
            log::warn!("malformed timing-board response: {}", e);
            None
        }
    }
}

pub fn parse_analytics(text: &str) -> Option<TravelAnalytics> {
    match serde_json::from_str::<TravelAnalytics>(text) {
        Ok(data) => {
            if data.hourly_demand.len() != 24 {
                log::warn!(
                    "analytics response had {} hourly values instead of 24",
                    data.hourly_demand.len()
                );
                return None;
            }
            Some(data)
        }
        Err(e) => {
            log::warn!("malformed analytics response: {}", e);
            None
        }
    }
}

/// Pulls the completion text out of the generateContent envelope.
pub fn extract_text(envelope: &Value) -> Option<String> {
    let text = envelope["candidates"][0]["content"]["parts"][0]["text"].as_str()?;
    Some(text.trim().to_string())
}

//////////////////////////////////////////////////////////
// Transport
//////////////////////////////////////////////////////////

async fn generate(
    prompt: String,
    schema: Value,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let api_key = std::env::var(GEMINI_API_KEY_VAR)?;
    let url = format!("{GEMINI_ENDPOINT}/{GEMINI_MODEL}:generateContent?key={api_key}");

    let body = json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema,
        },
    });

    let client = reqwest::Client::new();
    let resp = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let envelope: Value = serde_json::from_str(&resp)?;
    extract_text(&envelope).ok_or_else(|| "no text candidate in completion response".into())
}

//////////////////////////////////////////////////////////
// Output schemas
//////////////////////////////////////////////////////////

fn nearby_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "locationName": { "type": "STRING", "description": "Descriptive name of the road segment/locality" },
            "isRural": { "type": "BOOLEAN" },
            "routes": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "busNumber": { "type": "STRING" },
                        "name": { "type": "STRING" },
                        "type": { "type": "STRING" },
                        "source": { "type": "STRING" },
                        "destination": { "type": "STRING" },
                        "frequencyMinutes": { "type": "NUMBER" },
                        "estimatedArrivalTimeMinutes": { "type": "NUMBER" },
                        "timeAtYourLocation": { "type": "STRING" },
                    },
                    "required": ["busNumber", "name", "source", "destination"],
                },
            },
        },
        "required": ["locationName", "routes"],
    })
}

fn search_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "totalBusesPerDay": { "type": "NUMBER" },
            "buses": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "busNumber": { "type": "STRING" },
                        "name": { "type": "STRING" },
                        "type": { "type": "STRING" },
                        "firstBus": { "type": "STRING" },
                        "lastBus": { "type": "STRING" },
                        "frequencyMinutes": { "type": "NUMBER" },
                        "tripsPerDay": { "type": "NUMBER" },
                        "departureTime": { "type": "STRING" },
                        "arrivalTime": { "type": "STRING" },
                        "timeAtUserLocation": { "type": "STRING" },
                    },
                    "required": ["busNumber", "name"],
                },
            },
        },
        "required": ["totalBusesPerDay", "buses"],
    })
}

fn board_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "standName": { "type": "STRING" },
            "departures": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "busNumber": { "type": "STRING" },
                        "destination": { "type": "STRING" },
                        "scheduledTime": { "type": "STRING" },
                        "platform": { "type": "STRING" },
                        "status": { "type": "STRING", "description": "ON TIME or DELAYED X MINS" },
                        "type": { "type": "STRING" },
                    },
                    "required": ["busNumber", "destination"],
                },
            },
        },
        "required": ["standName", "departures"],
    })
}

fn analytics_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "govShare": { "type": "NUMBER" },
            "privShare": { "type": "NUMBER" },
            "hourlyDemand": {
                "type": "ARRAY",
                "items": { "type": "NUMBER" },
                "description": "Exactly 24 values, one per hour of day",
            },
            "dailyVolume": { "type": "STRING" },
            "nightTravelFactor": { "type": "STRING" },
            "topDestinations": { "type": "ARRAY", "items": { "type": "STRING" } },
        },
        "required": ["govShare", "privShare", "hourlyDemand", "dailyVolume", "nightTravelFactor"],
    })
}
