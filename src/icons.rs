use chrono::{DateTime, NaiveDateTime};

const MISSING: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Rain,
    Cloud,
    Storm,
    Sun,
    PartlyCloudy,
}

impl Glyph {
    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Rain => "🌧️",
            Glyph::Cloud => "☁️",
            Glyph::Storm => "⛈️",
            Glyph::Sun => "☀️",
            Glyph::PartlyCloudy => "🌤️",
        }
    }
}

/// Picks the glyph for a condition description. First match wins, so
/// "thunderstorm with rain" is drawn as rain.
pub fn icon_for(description: &str) -> Glyph {
    let lower = description.to_lowercase();
    if lower.contains("rain") {
        Glyph::Rain
    } else if lower.contains("cloud") {
        Glyph::Cloud
    } else if lower.contains("storm") {
        Glyph::Storm
    } else if lower.contains("sunny") || lower.contains("clear") {
        Glyph::Sun
    } else {
        Glyph::PartlyCloudy
    }
}

/// Short weekday ("Mon") of a forecast timestamp.
pub fn day_name(timestamp: &str) -> String {
    let parsed = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(timestamp)
                .ok()
                .map(|dt| dt.naive_local())
        });
    match parsed {
        Some(dt) => dt.format("%a").to_string(),
        None => MISSING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_for() {
        assert_eq!(icon_for("Heavy Rain Showers"), Glyph::Rain);
        assert_eq!(icon_for("broken clouds"), Glyph::Cloud);
        assert_eq!(icon_for("Thunderstorm"), Glyph::Storm);
        assert_eq!(icon_for("thunderstorm with light rain"), Glyph::Rain);
        assert_eq!(icon_for("CLEAR SKY"), Glyph::Sun);
        assert_eq!(icon_for("Sunny"), Glyph::Sun);
        assert_eq!(icon_for("mist"), Glyph::PartlyCloudy);
        assert_eq!(icon_for(""), Glyph::PartlyCloudy);
    }

    #[test]
    fn test_day_name() {
        assert_eq!(day_name("2024-05-01 12:00:00"), "Wed");
        assert_eq!(day_name("2024-05-05T12:00:00+02:00"), "Sun");
        assert_eq!(day_name(""), "--");
        assert_eq!(day_name("tomorrow"), "--");
    }
}
