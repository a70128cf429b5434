//! Hand-written doubles for the orchestrator's seams.

use std::net::TcpListener;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use proximity_cache::error::RefinementError;
use proximity_cache::geo::GeoPoint;
use proximity_cache::traits::{Clock, RoutedDistanceProvider};

/// Routing provider that returns a canned reply and counts calls.
pub struct StubProvider {
    reply: Option<Vec<f64>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<Vec<GeoPoint>>>,
}

impl StubProvider {
    pub fn returning(distances: Vec<f64>) -> Self {
        Self::new(Some(distances))
    }

    pub fn failing() -> Self {
        Self::new(None)
    }

    fn new(reply: Option<Vec<f64>>) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Vec<GeoPoint>> {
        self.requests.lock().unwrap().clone()
    }
}

impl RoutedDistanceProvider for StubProvider {
    fn routed_distances_km(
        &self,
        _origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<f64>, RefinementError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);
        self.requests.lock().unwrap().push(destinations.to_vec());

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| RefinementError::Rejected("stubbed failure".to_string()))
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// A base URL nothing is listening on.
pub fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind free port");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
