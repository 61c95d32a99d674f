use crate::config::*;
use crate::gemini::*;
use crate::i18n::translations;
use crate::live::*;
use crate::types::*;
use crate::*;

use chrono::Utc;
use serde_json::json;
use teloxide::types::{ChatId, InlineKeyboardButtonKind, MessageId};

fn descriptor(kind: Option<&str>, eta: Option<f64>) -> RouteDescriptor {
    RouteDescriptor {
        bus_number: "21G".to_string(),
        name: "Broadway to Vandalur".to_string(),
        kind: kind.map(str::to_string),
        source: "Broadway".to_string(),
        destination: "Vandalur Zoo".to_string(),
        frequency_minutes: Some(20.0),
        estimated_arrival_time_minutes: eta,
        time_at_your_location: None,
    }
}

fn sample_routes(n: usize) -> Vec<BusRoute> {
    (0..n)
        .map(|idx| nearby_route(idx, &descriptor(Some("TNSTC"), Some(10.0))))
        .collect()
}

//////////////////////////////////////////////////////////
// Live-bus synthesis
//////////////////////////////////////////////////////////

#[test]
fn jitter_stays_within_documented_bound() {
    let origin = Coordinate { lat: 11.0168, lon: 76.9558 };
    for _ in 0..1000 {
        let jittered = jitter(origin);
        assert!((jittered.lat - origin.lat).abs() <= JITTER_DEGREES + f64::EPSILON);
        assert!((jittered.lon - origin.lon).abs() <= JITTER_DEGREES + f64::EPSILON);
    }
}

#[test]
fn one_live_bus_per_route_with_valid_references() {
    let origin = Coordinate { lat: 10.7905, lon: 78.7047 };
    let routes = sample_routes(4);
    let live = synth_live_buses(&routes, origin);

    assert_eq!(routes.len(), 4);
    assert_eq!(live.len(), 4);
    for bus in &live {
        assert!(routes.iter().any(|r| r.id == bus.route_id));
        assert!(bus.heading >= 0.0 && bus.heading < 360.0);
    }
}

#[test]
fn route_ids_unique_within_batch() {
    let routes = sample_routes(6);
    for (i, a) in routes.iter().enumerate() {
        for b in &routes[i + 1..] {
            assert_ne!(a.id, b.id);
        }
    }
}

//////////////////////////////////////////////////////////
// View-model defaults
//////////////////////////////////////////////////////////

#[test]
fn missing_eta_defaults_into_documented_range() {
    for _ in 0..200 {
        let route = nearby_route(0, &descriptor(Some("TNSTC"), None));
        let eta = route.eta_minutes.unwrap();
        assert!((ETA_DEFAULT_MIN..=ETA_DEFAULT_MAX).contains(&eta));
    }
}

#[test]
fn missing_category_defaults_to_tnstc() {
    let route = nearby_route(0, &descriptor(None, Some(8.0)));
    assert_eq!(route.kind, BusType::Tnstc);

    let route = nearby_route(0, &descriptor(Some("something else"), Some(8.0)));
    assert_eq!(route.kind, BusType::Tnstc);
}

#[test]
fn category_labels_are_recognized() {
    assert_eq!(BusType::parse("MTC (Chennai City)"), Some(BusType::Mtc));
    assert_eq!(BusType::parse("SETC (Express)"), Some(BusType::Setc));
    assert_eq!(BusType::parse("TNSTC"), Some(BusType::Tnstc));
    assert_eq!(BusType::parse("Private Bus"), Some(BusType::Private));
    assert_eq!(BusType::parse("Mini Bus"), Some(BusType::Mini));
    assert_eq!(BusType::parse("Rural Town Bus"), Some(BusType::Rural));
    assert_eq!(BusType::parse("ferry"), None);
}

#[test]
fn trips_per_day_derived_from_frequency() {
    let mut d = descriptor(Some("TNSTC"), Some(8.0));
    d.frequency_minutes = Some(20.0);
    assert_eq!(nearby_route(0, &d).trips_per_day, 50);

    d.frequency_minutes = None;
    assert_eq!(nearby_route(0, &d).trips_per_day, 33);
}

//////////////////////////////////////////////////////////
// Query-layer parsing
//////////////////////////////////////////////////////////

#[test]
fn malformed_nearby_response_yields_none() {
    assert!(parse_nearby("not json at all").is_none());
    // Required field missing.
    assert!(parse_nearby(r#"{"routes": []}"#).is_none());
}

#[test]
fn empty_route_list_is_a_result_not_an_error() {
    let parsed = parse_nearby(r#"{"locationName": "NH-83 near Lalpet", "routes": []}"#).unwrap();
    assert_eq!(parsed.location_name, "NH-83 near Lalpet");
    assert!(parsed.routes.is_empty());
}

#[test]
fn board_is_cut_off_at_fixed_departure_count() {
    let departures: Vec<_> = (0..20)
        .map(|i| {
            json!({
                "busNumber": format!("route-{i}"),
                "destination": "Madurai",
                "scheduledTime": "10:30 AM",
                "status": "ON TIME"
            })
        })
        .collect();
    let text = json!({ "standName": "Trichy Central", "departures": departures }).to_string();

    let board = parse_board(&text).unwrap();
    assert_eq!(board.departures.len(), BOARD_DEPARTURE_COUNT);
}

#[test]
fn analytics_requires_exactly_24_hourly_values() {
    let mut body = json!({
        "govShare": 70.0,
        "privShare": 45.0,
        "hourlyDemand": vec![50.0; 23],
        "dailyVolume": "1.2M",
        "nightTravelFactor": "SETC demand doubles after 9 PM",
        "topDestinations": ["Chennai", "Madurai"]
    });
    assert!(parse_analytics(&body.to_string()).is_none());

    body["hourlyDemand"] = json!(vec![50.0; 24]);
    let data = parse_analytics(&body.to_string()).unwrap();
    // Shares are reported as-is; they are not required to sum to 100.
    assert_eq!(data.gov_share, 70.0);
    assert_eq!(data.priv_share, 45.0);
}

#[test]
fn extract_text_reads_first_candidate() {
    let envelope = json!({
        "candidates": [{
            "content": { "parts": [{ "text": "  {\"locationName\": \"x\"} " }] }
        }]
    });
    assert_eq!(extract_text(&envelope).unwrap(), "{\"locationName\": \"x\"}");
    assert!(extract_text(&json!({ "candidates": [] })).is_none());
}

//////////////////////////////////////////////////////////
// Orchestration state
//////////////////////////////////////////////////////////

#[test]
fn failed_detection_sets_error_and_clears_loading() {
    let app = AppState {
        is_loading: true,
        ..AppState::default()
    };
    let coord = Coordinate { lat: 9.9252, lon: 78.1198 };

    let app = apply_detection(app, coord, None);
    assert!(!app.is_loading);
    assert!(!app.error.as_deref().unwrap_or("").is_empty());
    assert!(app.nearby_buses.is_empty());
    assert_eq!(app.user_location, Some(coord));
}

#[test]
fn denied_location_surfaces_platform_message_verbatim() {
    let app = location_failed(AppState::default(), "User denied Geolocation");
    assert_eq!(app.error.as_deref(), Some("User denied Geolocation"));
    assert!(app.nearby_buses.is_empty());
    assert!(!app.is_loading);
}

#[test]
fn empty_detection_result_is_an_empty_state_not_an_error() {
    let coord = Coordinate { lat: 9.9252, lon: 78.1198 };
    let outcome = parse_nearby(r#"{"locationName": "NH-83 near Lalpet", "routes": []}"#);

    let app = apply_detection(AppState::default(), coord, outcome);
    assert!(app.error.is_none());
    assert!(!app.is_loading);
    assert!(app.nearby_buses.is_empty());
    assert_eq!(app.location_details, "NH-83 near Lalpet");
}

#[test]
fn switching_view_mode_preserves_other_views_data() {
    let coord = Coordinate { lat: 10.7905, lon: 78.7047 };
    let routes = sample_routes(3);
    let app = AppState {
        user_location: Some(coord),
        live_buses: synth_live_buses(&routes, coord),
        nearby_buses: routes,
        location_details: "Trichy bypass".to_string(),
        ..AppState::default()
    };

    let app = app.with_view_mode(ViewMode::Search);
    assert_eq!(app.nearby_buses.len(), 3);
    assert_eq!(app.live_buses.len(), 3);

    let app = app.with_view_mode(ViewMode::Map);
    assert_eq!(app.nearby_buses.len(), 3);
    assert_eq!(app.location_details, "Trichy bypass");
}

#[test]
fn interrupted_marker_sync_keeps_unreached_pins_registered() {
    fn pin(n: i32) -> MessageId {
        MessageId(n)
    }

    let mut previous = map::MarkerSet::default();
    previous.buses.insert("live-ai-0".to_string(), pin(2));
    previous.buses.insert("live-ai-1".to_string(), pin(3));

    // A send failed after the first pin of this round went out.
    let mut partial = map::MarkerSet::default();
    partial.user = Some(pin(6));
    partial.buses.insert("live-ai-0".to_string(), pin(7));

    let merged = map::merge_markers(partial, previous);
    assert_eq!(merged.user, Some(pin(6)));
    assert_eq!(merged.buses["live-ai-0"], pin(7));
    assert_eq!(merged.buses["live-ai-1"], pin(3));
    assert_eq!(merged.buses.len(), 2);
}

#[test]
fn newer_refresh_generation_invalidates_older_one() {
    let refreshes: RefreshSeq = Default::default();
    let chat = ChatId(42);

    let first = begin_refresh(&refreshes, chat);
    assert!(is_current_refresh(&refreshes, chat, first));

    let second = begin_refresh(&refreshes, chat);
    assert!(!is_current_refresh(&refreshes, chat, first));
    assert!(is_current_refresh(&refreshes, chat, second));
}

//////////////////////////////////////////////////////////
// Rendering
//////////////////////////////////////////////////////////

#[test]
fn search_mapping_overrides_query_terms() {
    let text = json!({
        "totalBusesPerDay": 40,
        "buses": [
            { "busNumber": "S-101", "name": "Ukkadam Express", "type": "TNSTC", "firstBus": "05:30 AM", "lastBus": "09:00 PM", "tripsPerDay": 18 },
            { "busNumber": "P-7", "name": "Pollachi Flyer", "type": "Private Bus", "departureTime": "06:15 AM" },
            { "busNumber": "M-2", "name": "Valparai Link" }
        ]
    })
    .to_string();

    let results = parse_search(&text).unwrap();
    let routes: Vec<BusRoute> = results
        .buses
        .iter()
        .enumerate()
        .map(|(idx, d)| search_route(idx, d, "Coimbatore", "Pollachi"))
        .collect();

    assert_eq!(routes.len(), 3);
    for route in &routes {
        assert_eq!(route.source, "Coimbatore");
        assert_eq!(route.destination, "Pollachi");
    }
    // departureTime stands in for a missing firstBus.
    assert_eq!(routes[1].first_bus, "06:15 AM");
    assert_eq!(routes[2].first_bus, "N/A");

    let rendered =
        view::search_results(results.total_buses_per_day, &routes, translations(Lang::En));
    assert_eq!(rendered.matches("🚌 <b>").count(), 3);
    assert!(rendered.contains(": 40"));
}

#[test]
fn delayed_departure_row_is_flagged() {
    let departures: Vec<Departure> = (0..15)
        .map(|i| Departure {
            bus_number: format!("route-{i}"),
            destination: "Madurai".to_string(),
            scheduled_time: "10:30 AM".to_string(),
            platform: Some("4".to_string()),
            status: if i == 7 {
                "DELAYED 10 MINS".to_string()
            } else {
                "ON TIME".to_string()
            },
            kind: Some("TNSTC".to_string()),
        })
        .collect();
    let board = TimingBoard {
        stand_name: "Trichy Central".to_string(),
        departures,
    };

    let rendered = view::timing_board(&board, translations(Lang::En), Utc::now());
    assert!(rendered.contains("TRICHY CENTRAL"));
    for line in rendered.lines() {
        if line.contains("DELAYED") {
            assert!(line.starts_with('❗'));
        } else if line.contains("ON TIME") {
            assert!(!line.contains('❗'));
        }
        // The flag column is always two chars wide, so flagged and on-time
        // rows keep the same column grid.
        if let Some(start) = line.find("route-") {
            assert_eq!(line[..start].chars().count(), 2);
        }
    }
}

#[test]
fn expanded_card_shows_detail_section() {
    let route = nearby_route(0, &descriptor(Some("TNSTC"), Some(12.0)));
    let t = translations(Lang::En);

    let compact = view::bus_card(&route, t, false);
    let expanded = view::bus_card(&route, t, true);
    assert!(!compact.contains(t.first_last));
    assert!(expanded.contains(t.first_last));
    assert!(expanded.contains("05:00 AM - 10:00 PM"));
}

#[test]
fn demand_sparkline_has_one_char_per_hour() {
    let spark = view::demand_sparkline(&[50.0; 24]);
    assert_eq!(spark.chars().count(), 24);

    assert_eq!(view::demand_sparkline(&[0.0]), "▁");
    assert_eq!(view::demand_sparkline(&[100.0]), "█");
}

#[test]
fn share_bar_is_proportional_and_unnormalized() {
    let bar = view::share_bar(50.0);
    assert_eq!(bar.chars().count(), 20);
    assert_eq!(bar.chars().filter(|c| *c == '█').count(), 10);

    // Out-of-range inputs are clamped for display only.
    assert_eq!(
        view::share_bar(150.0).chars().filter(|c| *c == '█').count(),
        20
    );
}

//////////////////////////////////////////////////////////
// Translations
//////////////////////////////////////////////////////////

#[test]
fn language_toggle_round_trips_to_identical_bundle() {
    let en = translations(Lang::En);
    let ta = translations(Lang::En.toggled());
    let back = translations(Lang::En.toggled().toggled());

    assert!(std::ptr::eq(en, back));
    assert_ne!(en.title, ta.title);
    assert_eq!(en.title, "TN Bus Expert");
}

#[test]
fn language_keyboard_offers_the_other_language() {
    let kb = view::language_keyboard(translations(Lang::En));
    let button = &kb.inline_keyboard[0][0];
    assert_eq!(button.text, "தமிழ்");
    assert_eq!(
        button.kind,
        InlineKeyboardButtonKind::CallbackData("lang:toggle".to_string())
    );

    let kb = view::language_keyboard(translations(Lang::Ta));
    assert_eq!(kb.inline_keyboard[0][0].text, "English");
}
