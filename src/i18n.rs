use crate::types::Lang;

//////////////////////////////////////////////////////////
// Translations
//////////////////////////////////////////////////////////

pub struct Tabs {
    pub nearby: &'static str,
    pub search: &'static str,
    pub board: &'static str,
}

pub struct SearchLabels {
    pub from: &'static str,
    pub to: &'static str,
    pub results: &'static str,
    pub total: &'static str,
    pub freq: &'static str,
}

pub struct BoardLabels {
    pub placeholder: &'static str,
    pub departures: &'static str,
    pub destination: &'static str,
    pub time: &'static str,
    pub status: &'static str,
}

pub struct AnalyticsLabels {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub loading: &'static str,
    pub gov_vs_priv: &'static str,
    pub gov_label: &'static str,
    pub priv_label: &'static str,
    pub peak_title: &'static str,
    pub daily_volume: &'static str,
    pub night_insight: &'static str,
    pub trending: &'static str,
}

pub struct Translations {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub find_bus: &'static str,
    pub arriving_in: &'static str,
    pub mins: &'static str,
    pub live: &'static str,
    pub trips: &'static str,
    pub first_last: &'static str,
    pub no_buses: &'static str,
    /// Label of the language toggle: the name of the *other* language.
    pub change_lang: &'static str,
    pub loading_info: &'static str,
    pub share_location: &'static str,
    pub retry_hint: &'static str,
    pub tabs: Tabs,
    pub search: SearchLabels,
    pub board: BoardLabels,
    pub analytics: AnalyticsLabels,
}

/// Pure lookup; the bundles themselves are never mutated.
pub fn translations(lang: Lang) -> &'static Translations {
    match lang {
        Lang::En => &EN,
        Lang::Ta => &TA,
    }
}

static EN: Translations = Translations {
    title: "TN Bus Expert",
    subtitle: "Every route, every village, every bus.",
    find_bus: "Finding buses near you...",
    arriving_in: "Arriving in",
    mins: "mins",
    live: "LIVE",
    trips: "Trips/Day",
    first_last: "First/Last",
    no_buses: "No buses detected on this road segment yet.",
    change_lang: "தமிழ்",
    loading_info: "Using AI to analyze road segments...",
    share_location: "Share your location so I can find buses passing near you.",
    retry_hint: "Send /refresh to retry.",
    tabs: Tabs {
        nearby: "Nearby",
        search: "Search Route",
        board: "Bus Stand Board",
    },
    search: SearchLabels {
        from: "From (Source)",
        to: "To (Destination)",
        results: "Buses on this route",
        total: "Total Buses",
        freq: "Frequency: every",
    },
    board: BoardLabels {
        placeholder: "Enter Bus Stand Name (e.g. Trichy Central, Lalpet Stand)",
        departures: "DEPARTURES",
        destination: "DESTINATION",
        time: "SCHED. TIME",
        status: "STATUS",
    },
    analytics: AnalyticsLabels {
        title: "Travel Analytics",
        subtitle: "Bus travel patterns around",
        loading: "Crunching regional travel data...",
        gov_vs_priv: "Government vs Private",
        gov_label: "Government (TNSTC/SETC/MTC)",
        priv_label: "Private Operators",
        peak_title: "Hourly Demand (0-23h)",
        daily_volume: "Daily Passengers",
        night_insight: "Night Travel",
        trending: "Trending Hubs",
    },
};

static TA: Translations = Translations {
    title: "தமிழ்நாடு பஸ் நிபுணர்",
    subtitle: "ஒவ்வொரு வழித்தடமும், ஒவ்வொரு கிராமமும், ஒவ்வொரு பேருந்தும்.",
    find_bus: "உங்களுக்கு அருகிலுள்ள பேருந்துகளைத் தேடுகிறது...",
    arriving_in: "வருகை நேரம்",
    mins: "நிமிடங்கள்",
    live: "நேரடி",
    trips: "பயணங்கள்/நாள்",
    first_last: "முதல்/கடைசி",
    no_buses: "இந்தச் சாலைப் பகுதியில் இன்னும் பேருந்துகள் கண்டறியப்படவில்லை.",
    change_lang: "English",
    loading_info: "சாலைப் பகுதிகளை ஆய்வு செய்ய AI ஐப் பயன்படுத்துகிறது...",
    share_location: "உங்களுக்கு அருகில் செல்லும் பேருந்துகளைக் கண்டறிய உங்கள் இருப்பிடத்தைப் பகிரவும்.",
    retry_hint: "மீண்டும் முயற்சிக்க /refresh அனுப்பவும்.",
    tabs: Tabs {
        nearby: "அருகிலுள்ளவை",
        search: "வழித்தடத் தேடல்",
        board: "பேருந்து நிலைய பலகை",
    },
    search: SearchLabels {
        from: "கிளம்பும் இடம்",
        to: "சேருமிடம்",
        results: "இந்த வழித்தடத்தில் உள்ள பேருந்துகள்",
        total: "மொத்த பேருந்துகள்",
        freq: "அதிர்வெண்: ஒவ்வொரு",
    },
    board: BoardLabels {
        placeholder: "பேருந்து நிலையத்தின் பெயரை உள்ளிடவும்",
        departures: "புறப்பாடுகள்",
        destination: "சேருமிடம்",
        time: "நேரம்",
        status: "நிலை",
    },
    analytics: AnalyticsLabels {
        title: "பயண பகுப்பாய்வு",
        subtitle: "பேருந்து பயண முறைகள்",
        loading: "பிராந்திய பயணத் தரவை ஆய்வு செய்கிறது...",
        gov_vs_priv: "அரசு vs தனியார்",
        gov_label: "அரசு (TNSTC/SETC/MTC)",
        priv_label: "தனியார் பேருந்துகள்",
        peak_title: "மணிநேர தேவை (0-23h)",
        daily_volume: "தினசரி பயணிகள்",
        night_insight: "இரவு பயணம்",
        trending: "பிரபலமான இடங்கள்",
    },
};
