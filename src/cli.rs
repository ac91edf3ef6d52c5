use std::path::PathBuf;

use clap::builder::{styling::AnsiColor, Styles};
use clap::Parser;

use crate::owm::DEFAULT_BASE_URL;
use crate::units::Units;

const ABOUT: &str = "OpenWeatherMap weather TUI";

const LONG_ABOUT: &str = "
TUI for viewing current conditions and a 5-day forecast sourced from OpenWeatherMap.

Type a city name and press Enter to search. Tab toggles the map view, Ctrl-T switches between the
dark and light palettes, and Esc quits.

An OpenWeatherMap API key is required; pass it with --api-key or set OWM_API_KEY.
";

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default())
    .usage(AnsiColor::Green.on_default())
    .literal(AnsiColor::Green.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug)]
#[command(version, styles=STYLES, about=ABOUT, long_about = LONG_ABOUT)]
pub struct Args {
    #[arg(help = "City to look up on start (e.g. London, \"Sao Paulo\")")]
    pub city: Option<String>,

    #[arg(long, env = "OWM_API_KEY", hide_env_values = true, help = "OpenWeatherMap API key")]
    pub api_key: String,

    #[arg(long, env = "OWM_BASE_URL", default_value = DEFAULT_BASE_URL, help = "API root URL")]
    pub base_url: String,

    #[arg(long, default_value_t = 10, help = "Request timeout in seconds")]
    pub timeout: u64,

    #[arg(long, value_enum, default_value_t = Units::Metric, help = "Display units")]
    pub units: Units,

    #[arg(long, help = "Start with the light palette")]
    pub light: bool,

    #[arg(long, env = "OWX_LOG", help = "Write logs to this file")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["owx", "--api-key", "k", "Paris"]).unwrap();
        assert_eq!(args.city.as_deref(), Some("Paris"));
        assert_eq!(args.api_key, "k");
        assert_eq!(args.timeout, 10);
        assert_eq!(args.units, Units::Metric);
        assert!(!args.light);
    }

    #[test]
    fn test_imperial() {
        let args =
            Args::try_parse_from(["owx", "--api-key", "k", "--units", "imperial", "--light"])
                .unwrap();
        assert_eq!(args.city, None);
        assert_eq!(args.units, Units::Imperial);
        assert!(args.light);
    }
}
