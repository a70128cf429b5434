//! Background refresh and teardown.

mod fixtures;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use proximity_cache::config::RefreshOptions;
use proximity_cache::error::RefinementError;
use proximity_cache::geo::GeoPoint;
use proximity_cache::orchestrator::{Feed, ProximityOrchestrator};
use proximity_cache::scheduler::{ProximitySession, RefreshScheduler};
use proximity_cache::store::MemoryStore;
use proximity_cache::traits::RoutedDistanceProvider;

use fixtures::{ManualClock, StubProvider, churches, user, wait_for};

const TICK: Duration = Duration::from_millis(10);

fn orchestrator(
    provider: &Arc<StubProvider>,
    clock: &Arc<ManualClock>,
) -> ProximityOrchestrator<Arc<StubProvider>, MemoryStore, Arc<ManualClock>> {
    ProximityOrchestrator::with_clock(
        Arc::clone(provider),
        MemoryStore::new(),
        Arc::clone(clock),
        RefreshOptions {
            check_interval: TICK,
            ..RefreshOptions::default()
        },
    )
}

#[test]
fn idle_session_refreshes_after_ttl() {
    let provider = Arc::new(StubProvider::returning(vec![2.0, 5.0, 9.0]));
    let clock = Arc::new(ManualClock::new());
    let session = ProximitySession::start(orchestrator(&provider, &clock)).unwrap();

    session.orchestrator().set_entities(Feed::Ready(churches()));
    session.orchestrator().on_location(Feed::Ready(user()));
    assert_eq!(provider.calls(), 1);

    std::thread::sleep(TICK * 5);
    assert_eq!(provider.calls(), 1, "nothing is due before the TTL");

    clock.advance(chrono::Duration::minutes(31));
    assert!(wait_for(Duration::from_secs(2), || provider.calls() == 2));

    std::thread::sleep(TICK * 5);
    assert_eq!(provider.calls(), 2, "refresh resets the TTL");
}

#[test]
fn closing_session_cancels_the_timer() {
    let provider = Arc::new(StubProvider::returning(vec![2.0, 5.0, 9.0]));
    let clock = Arc::new(ManualClock::new());
    let mut session = ProximitySession::start(orchestrator(&provider, &clock)).unwrap();

    session.orchestrator().set_entities(Feed::Ready(churches()));
    session.orchestrator().on_location(Feed::Ready(user()));
    assert!(session.is_refreshing());

    session.close();
    assert!(!session.is_refreshing());
    assert!(session.orchestrator().is_closed());

    clock.advance(chrono::Duration::hours(2));
    std::thread::sleep(TICK * 5);
    assert_eq!(provider.calls(), 1);
}

#[test]
fn dropping_scheduler_stops_worker() {
    let provider = Arc::new(StubProvider::returning(vec![2.0, 5.0, 9.0]));
    let clock = Arc::new(ManualClock::new());
    let orchestrator = Arc::new(orchestrator(&provider, &clock));
    orchestrator.set_entities(Feed::Ready(churches()));
    orchestrator.on_location(Feed::Ready(user()));

    let scheduler = RefreshScheduler::start(Arc::clone(&orchestrator), orchestrator.check_interval()).unwrap();
    assert!(scheduler.is_running());
    drop(scheduler);

    assert_eq!(Arc::strong_count(&orchestrator), 1, "worker released its handle");
    clock.advance(chrono::Duration::hours(1));
    std::thread::sleep(TICK * 5);
    assert_eq!(provider.calls(), 1);
}

/// Answers the first request, then panics.
struct PanicsOnSecondCall {
    calls: AtomicUsize,
}

impl RoutedDistanceProvider for PanicsOnSecondCall {
    fn routed_distances_km(
        &self,
        _origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<f64>, RefinementError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            panic!("matrix backend blew up");
        }
        Ok(vec![1.0; destinations.len()])
    }
}

#[test]
fn stopping_after_worker_panic_is_clean() {
    let provider = Arc::new(PanicsOnSecondCall {
        calls: AtomicUsize::new(0),
    });
    let clock = Arc::new(ManualClock::new());
    let orchestrator = Arc::new(ProximityOrchestrator::with_clock(
        Arc::clone(&provider),
        MemoryStore::new(),
        Arc::clone(&clock),
        RefreshOptions {
            check_interval: TICK,
            ..RefreshOptions::default()
        },
    ));
    orchestrator.set_entities(Feed::Ready(churches()));
    assert!(orchestrator.on_location(Feed::Ready(user())).is_some());

    let mut scheduler = RefreshScheduler::start(Arc::clone(&orchestrator), TICK).unwrap();
    clock.advance(chrono::Duration::minutes(31));

    assert!(wait_for(Duration::from_secs(2), || !scheduler.is_running()));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    scheduler.stop();
    assert!(!scheduler.is_running());
    assert_eq!(Arc::strong_count(&orchestrator), 1, "panicked worker released its handle");
}
