use clap::ValueEnum;

/// Units used for display. Requests and thresholds stay metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn temperature(self, temp_c: f64) -> String {
        match self {
            // `+ 0.0` turns a rounded -0 into 0.
            Units::Metric => format!("{:.0}°C", temp_c.round() + 0.0),
            Units::Imperial => format!("{:.0}°F", temperature::c2f(temp_c).round() + 0.0),
        }
    }

    pub fn speed(self, speed_mps: f64) -> String {
        match self {
            Units::Metric => format!("{speed_mps:.1} m/s"),
            Units::Imperial => format!("{:.1} mph", speed::mps2mph(speed_mps)),
        }
    }
}

pub mod temperature {
    pub fn c2f(temp_c: f64) -> f64 {
        temp_c * 9.0 / 5.0 + 32.0
    }

    #[test]
    fn test_temperature() {
        assert_eq!(c2f(0.0), 32.0);
        assert_eq!(c2f(100.0), 212.0);
        assert_eq!(c2f(-40.0), -40.0);
    }
}

pub mod speed {
    const MPS_TO_MPH: f64 = 2.236_936;

    pub fn mps2mph(mps: f64) -> f64 {
        mps * MPS_TO_MPH
    }

    #[test]
    fn test_speed() {
        assert_eq!(mps2mph(0.0), 0.0);
        assert!((mps2mph(13.8) - 30.87).abs() < 0.01);
    }
}

pub mod direction {
    const COMPASS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    pub fn degree_to_compass(deg: f64) -> &'static str {
        let deg = (deg % 360.0) + 360.0;
        let val = (deg / 22.5 + 0.5) as usize;
        let idx = val % 16;
        COMPASS[idx]
    }

    #[test]
    fn test_degree_to_compass() {
        assert_eq!(degree_to_compass(0.0), "N");
        assert_eq!(degree_to_compass(90.0), "E");
        assert_eq!(degree_to_compass(180.0), "S");
        assert_eq!(degree_to_compass(240.0), "WSW");
        assert_eq!(degree_to_compass(360.0), "N");
        assert_eq!(degree_to_compass(-90.0), "W");
    }
}

#[test]
fn test_units_format() {
    assert_eq!(Units::Metric.temperature(12.6), "13°C");
    assert_eq!(Units::Imperial.temperature(0.0), "32°F");
    assert_eq!(Units::Metric.temperature(-0.3), "0°C");
    assert_eq!(Units::Metric.temperature(-0.6), "-1°C");
    assert_eq!(Units::Metric.speed(4.63), "4.6 m/s");
    assert_eq!(Units::Imperial.speed(0.0), "0.0 mph");
}
