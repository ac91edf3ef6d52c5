use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::owm::{FetchError, WeatherSource};
use crate::weather::{CurrentObservation, ForecastEntry, Snapshot};

/// Runs one query: current conditions first, and the forecast only once those
/// have been accepted.
pub fn fetch_snapshot(source: &dyn WeatherSource, city: &str) -> Result<Snapshot, FetchError> {
    let current = source.current(city)?.check()?;
    let forecast = source.forecast(city)?.check()?;

    let raw: Vec<ForecastEntry> = forecast.list.into_iter().map(ForecastEntry::from).collect();
    Ok(Snapshot::new(
        CurrentObservation::from(current),
        &raw,
        Local::now(),
    ))
}

#[derive(Debug)]
pub struct QueryOutcome {
    pub generation: u64,
    pub city: String,
    pub result: Result<Snapshot, FetchError>,
}

/// What happened to a finished query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    Notified,
    Failed,
    Stale,
}

/// Query bookkeeping and the snapshot on display.
///
/// Every search gets a new generation; only the outcome of the latest one is
/// applied, and the snapshot is replaced only by a complete success.
pub struct Dashboard {
    source: Arc<dyn WeatherSource>,
    tx: Sender<QueryOutcome>,
    rx: Receiver<QueryOutcome>,
    generation: u64,
    loading: bool,
    snapshot: Option<Arc<Snapshot>>,
    notice: Option<String>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            generation: 0,
            loading: false,
            snapshot: None,
            notice: None,
        }
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Starts a query on a worker thread. Blank input is ignored.
    ///
    /// Returns the generation of the new query.
    pub fn search(&mut self, city: &str) -> Option<u64> {
        if city.trim().is_empty() {
            return None;
        }
        self.generation += 1;
        self.loading = true;
        let generation = self.generation;
        let city = city.to_string();
        info!(generation, %city, "query issued");

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = fetch_snapshot(source.as_ref(), &city);
            // The receiver only goes away when the dashboard does.
            let _ = tx.send(QueryOutcome {
                generation,
                city,
                result,
            });
        });
        Some(generation)
    }

    /// Applies every outcome that has arrived so far without blocking.
    pub fn poll(&mut self) -> Vec<Applied> {
        let mut applied = vec![];
        while let Ok(outcome) = self.rx.try_recv() {
            applied.push(self.apply(outcome));
        }
        applied
    }

    pub fn apply(&mut self, outcome: QueryOutcome) -> Applied {
        let QueryOutcome {
            generation,
            city,
            result,
        } = outcome;
        if generation != self.generation {
            debug!(generation, latest = self.generation, %city, "discarded stale result");
            return Applied::Stale;
        }
        self.loading = false;

        match result {
            Ok(snapshot) => {
                info!(generation, %city, alerts = snapshot.alerts.len(), days = snapshot.daily.len(), "query complete");
                self.snapshot = Some(Arc::new(snapshot));
                Applied::Updated
            }
            Err(err) => match err.notice() {
                Some(notice) => {
                    warn!(generation, %city, error = %err, "api error");
                    self.notice = Some(notice);
                    Applied::Notified
                }
                None => {
                    warn!(generation, %city, error = %err, "query failed");
                    Applied::Failed
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owm::{current, forecast, Endpoint};
    use crate::weather::{HEAT_ADVISORY, RAIN_ADVISORY};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn current_json(name: &str, temp: f64) -> current::Current {
        serde_json::from_value(serde_json::json!({
            "cod": 200,
            "name": name,
            "main": {"temp": temp, "humidity": 60},
            "wind": {"speed": 3.0, "deg": 90},
            "weather": [{"description": "clear sky"}],
            "coord": {"lat": 43.07, "lon": -89.4}
        }))
        .unwrap()
    }

    fn forecast_json() -> forecast::Forecast {
        let list: Vec<_> = (0..40)
            .map(|i| {
                let day = 1 + i / 8;
                let hour = (i % 8) * 3;
                let temp = if i == 20 { 36.5 } else { 21.0 };
                let description = if i == 3 { "light rain" } else { "few clouds" };
                serde_json::json!({
                    "dt_txt": format!("2024-05-{day:02} {hour:02}:00:00"),
                    "main": {"temp": temp},
                    "weather": [{"description": description}]
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({"cod": "200", "message": 0, "list": list}))
            .unwrap()
    }

    #[derive(Default)]
    struct FakeSource {
        cities: HashMap<String, (current::Current, forecast::Forecast)>,
        forecast_calls: AtomicUsize,
        gate: Mutex<Option<Receiver<()>>>,
        gated_city: Option<String>,
    }

    impl FakeSource {
        fn with_city(mut self, name: &str, temp: f64) -> Self {
            self.cities
                .insert(name.to_string(), (current_json(name, temp), forecast_json()));
            self
        }
    }

    impl WeatherSource for FakeSource {
        fn current(&self, city: &str) -> Result<current::Current, FetchError> {
            if self.gated_city.as_deref() == Some(city) {
                if let Some(gate) = self.gate.lock().unwrap().take() {
                    gate.recv().unwrap();
                }
            }
            match self.cities.get(city) {
                Some((current, _)) => Ok(current.clone()),
                None => Ok(serde_json::from_str(r#"{"cod": "404", "message": "city not found"}"#)?),
            }
        }

        fn forecast(&self, city: &str) -> Result<forecast::Forecast, FetchError> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            if city == "Atlantis" {
                return Ok(serde_json::from_str(r#"{"cod": 401, "message": "no"}"#)?);
            }
            if city == "Garbled" {
                return Err(serde_json::from_str::<forecast::Forecast>("<html>")
                    .unwrap_err()
                    .into());
            }
            Ok(self.cities[city].1.clone())
        }
    }

    fn wait_for(dashboard: &mut Dashboard) -> Applied {
        let outcome = dashboard.rx.recv_timeout(WAIT).unwrap();
        dashboard.apply(outcome)
    }

    #[test]
    fn test_fetch_snapshot() {
        let source = FakeSource::default().with_city("Madison", 18.0);
        let snap = fetch_snapshot(&source, "Madison").unwrap();
        assert_eq!(snap.current.location_name, "Madison");
        assert_eq!(snap.daily.len(), 5);
        assert!(snap.daily.iter().all(|e| e.timestamp.ends_with("12:00:00")));
        assert_eq!(snap.alerts, vec![RAIN_ADVISORY, HEAT_ADVISORY]);
    }

    #[test]
    fn test_rejected_current_skips_forecast() {
        let source = FakeSource::default();
        let err = fetch_snapshot(&source, "Nowhere").unwrap_err();
        assert!(matches!(
            err,
            FetchError::Api {
                endpoint: Endpoint::Current,
                ..
            }
        ));
        assert_eq!(source.forecast_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_search_updates_snapshot() {
        let mut dashboard = Dashboard::new(Arc::new(FakeSource::default().with_city("Madison", 18.0)));
        assert_eq!(dashboard.search("Madison"), Some(1));
        assert!(dashboard.is_loading());
        assert_eq!(wait_for(&mut dashboard), Applied::Updated);
        assert!(!dashboard.is_loading());
        assert_eq!(dashboard.snapshot().unwrap().current.location_name, "Madison");
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let mut dashboard = Dashboard::new(Arc::new(FakeSource::default()));
        assert_eq!(dashboard.search("   "), None);
        assert!(!dashboard.is_loading());
    }

    #[test]
    fn test_failures_keep_prior_snapshot() {
        let source = FakeSource::default()
            .with_city("Madison", 18.0)
            .with_city("Atlantis", 30.0)
            .with_city("Garbled", 30.0);
        let mut dashboard = Dashboard::new(Arc::new(source));
        dashboard.search("Madison");
        assert_eq!(wait_for(&mut dashboard), Applied::Updated);

        dashboard.search("Nowhere");
        assert_eq!(wait_for(&mut dashboard), Applied::Notified);
        assert_eq!(dashboard.notice(), Some("Error: city not found"));
        dashboard.dismiss_notice();
        assert_eq!(dashboard.notice(), None);

        dashboard.search("Atlantis");
        assert_eq!(wait_for(&mut dashboard), Applied::Failed);
        dashboard.search("Garbled");
        assert_eq!(wait_for(&mut dashboard), Applied::Failed);

        assert_eq!(dashboard.notice(), None);
        assert_eq!(dashboard.snapshot().unwrap().current.location_name, "Madison");
    }

    #[test]
    fn test_superseded_query_is_discarded() {
        let (release, gate) = mpsc::channel();
        let source = FakeSource {
            gate: Mutex::new(Some(gate)),
            gated_city: Some("Slowtown".to_string()),
            ..Default::default()
        }
        .with_city("Slowtown", 5.0)
        .with_city("Madison", 18.0);
        let mut dashboard = Dashboard::new(Arc::new(source));

        assert_eq!(dashboard.search("Slowtown"), Some(1));
        assert_eq!(dashboard.search("Madison"), Some(2));
        assert_eq!(wait_for(&mut dashboard), Applied::Updated);

        release.send(()).unwrap();
        assert_eq!(wait_for(&mut dashboard), Applied::Stale);
        assert_eq!(dashboard.snapshot().unwrap().current.location_name, "Madison");
        assert!(dashboard.poll().is_empty());
    }
}
