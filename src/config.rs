//////////////////////////////////////////////////////////
// Configuration
//////////////////////////////////////////////////////////
// The bot token is read by teloxide itself from TELOXIDE_TOKEN.

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

/// How many routes the nearby-detection prompt asks for. The backend is
/// free to return fewer, including none.
pub const NEARBY_ROUTE_TARGET: usize = 5;

/// Timing boards are cut off after this many departures.
pub const BOARD_DEPARTURE_COUNT: usize = 15;

/// When the backend omits an ETA we pick one in this range (inclusive).
pub const ETA_DEFAULT_MIN: u32 = 5;
pub const ETA_DEFAULT_MAX: u32 = 24;

/// Simulated live positions stay within this offset of the user, in degrees.
pub const JITTER_DEGREES: f64 = 0.01;

pub const DEFAULT_FIRST_BUS: &str = "05:00 AM";
pub const DEFAULT_LAST_BUS: &str = "10:00 PM";

/// Analytics fall back to the whole state when no locality was detected yet.
pub const DEFAULT_ANALYTICS_REGION: &str = "Tamil Nadu";

pub const ERR_LOCATION_UNAVAILABLE: &str =
    "Location sharing is unavailable or was declined. Send /nearby to try again.";
pub const ERR_DETECT_FAILED: &str = "Failed to detect routes";
pub const ERR_SEARCH_FAILED: &str = "Failed to fetch buses for this route";
pub const ERR_BOARD_FAILED: &str = "Failed to fetch the timing board";
pub const ERR_ANALYTICS_FAILED: &str = "Failed to fetch travel analytics";
