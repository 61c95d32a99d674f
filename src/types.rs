use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Operator category. Anything the backend labels that we cannot place
/// falls back to `Tnstc` at the mapping layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    Mtc,
    Tnstc,
    Setc,
    Private,
    Mini,
    Rural,
}

impl BusType {
    pub fn parse(label: &str) -> Option<BusType> {
        let label = label.to_ascii_lowercase();
        if label.contains("mtc") {
            Some(BusType::Mtc)
        } else if label.contains("setc") || label.contains("express") {
            Some(BusType::Setc)
        } else if label.contains("tnstc") || label.contains("state") || label.contains("government") {
            Some(BusType::Tnstc)
        } else if label.contains("private") {
            Some(BusType::Private)
        } else if label.contains("mini") {
            Some(BusType::Mini)
        } else if label.contains("rural") || label.contains("town") {
            Some(BusType::Rural)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BusType::Mtc => "MTC (Chennai City)",
            BusType::Tnstc => "TNSTC (State)",
            BusType::Setc => "SETC (Express)",
            BusType::Private => "Private Bus",
            BusType::Mini => "Mini Bus",
            BusType::Rural => "Rural Town Bus",
        }
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct BusStop {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
}

/// One bus service as shown to the user. All time-of-day fields are opaque
/// display strings straight from the backend, never parsed.
#[derive(Debug, Clone)]
pub struct BusRoute {
    /// Unique within one fetched batch only.
    pub id: String,
    pub bus_number: String,
    pub name: String,
    pub kind: BusType,
    pub source: String,
    pub destination: String,
    /// Never populated by the current data source.
    pub path: Vec<Coordinate>,
    pub stops: Vec<BusStop>,
    pub first_bus: String,
    pub last_bus: String,
    pub trips_per_day: u32,
    pub image_url: Option<String>,
    pub frequency_minutes: Option<u32>,
    pub eta_minutes: Option<u32>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub time_at_your_location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Low,
    Medium,
    High,
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Occupancy::Low => "Low",
            Occupancy::Medium => "Medium",
            Occupancy::High => "High",
        })
    }
}

/// Simulated live position for one route. Generated client-side and
/// replaced wholesale on every refresh.
#[derive(Debug, Clone)]
pub struct LiveBus {
    pub id: String,
    pub route_id: String,
    pub location: Coordinate,
    /// Degrees, [0, 360).
    pub heading: f64,
    pub last_updated: DateTime<Utc>,
    pub occupancy: Occupancy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lang {
    #[default]
    En,
    Ta,
}

impl Lang {
    pub fn toggled(self) -> Lang {
        match self {
            Lang::En => Lang::Ta,
            Lang::Ta => Lang::En,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Map,
    Search,
    Board,
}

/// Single source of truth for one chat. Carried inside the dialogue state
/// and only ever replaced as a whole, never mutated field by field, so a
/// handler always observes a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub user_location: Option<Coordinate>,
    pub nearby_buses: Vec<BusRoute>,
    pub live_buses: Vec<LiveBus>,
    pub selected_bus_id: Option<String>,
    pub is_loading: bool,
    pub language: Lang,
    pub error: Option<String>,
    pub location_details: String,
    pub view_mode: ViewMode,
}

impl AppState {
    pub fn with_view_mode(self, view_mode: ViewMode) -> AppState {
        AppState { view_mode, ..self }
    }

    pub fn with_language(self, language: Lang) -> AppState {
        AppState { language, ..self }
    }
}
