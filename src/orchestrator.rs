//! Refresh orchestrator.
//!
//! Owns every side effect of the cache: it reads inputs from the entity and
//! geolocation collaborators, consults the [`CachePolicy`], runs
//! estimate → refine → persist cycles, and exposes the resulting
//! [`NearbyView`].
//!
//! Only one cycle runs at a time. A trigger that arrives while a cycle is in
//! flight is recorded as pending; once the running cycle settles the policy
//! is re-checked against the latest inputs and at most one more cycle runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RefreshOptions;
use crate::error::GeoError;
use crate::geo::GeoPoint;
use crate::haversine::estimate_all;
use crate::model::{Accuracy, CacheEntry, Entity, NearbyView};
use crate::policy::{CachePolicy, Verdict};
use crate::refine::refine_or_fallback;
use crate::store::DistanceCache;
use crate::traits::{Clock, KeyValueStore, RoutedDistanceProvider, SystemClock};

/// State of an input collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum Feed<T> {
    Loading,
    Ready(T),
    Failed(String),
}

pub type EntityFeed = Feed<Vec<Entity>>;
pub type LocationFeed = Feed<GeoPoint>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Computing,
    Settled,
    Failed,
}

/// What caused an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Location,
    Entities,
    Timer,
}

enum Inputs {
    NotReady,
    Unavailable(String),
    Ready(GeoPoint, Vec<Entity>),
}

enum CycleOutcome {
    Settled(CacheEntry),
    Failed(GeoError),
    Discarded,
}

struct Inner {
    entities: EntityFeed,
    location: LocationFeed,
    current: Option<CacheEntry>,
    view: Option<NearbyView>,
    state: CycleState,
    last_outcome: Option<CycleState>,
    pending: bool,
}

impl Inner {
    fn inputs(&self) -> Inputs {
        let point = match &self.location {
            Feed::Loading => return Inputs::NotReady,
            Feed::Failed(reason) => return Inputs::Unavailable(format!("location: {reason}")),
            Feed::Ready(point) => *point,
        };

        match &self.entities {
            Feed::Loading => Inputs::NotReady,
            Feed::Failed(reason) => Inputs::Unavailable(format!("entities: {reason}")),
            Feed::Ready(entities) if entities.is_empty() => {
                Inputs::Unavailable("entity set is empty".to_string())
            }
            Feed::Ready(entities) => Inputs::Ready(point, entities.clone()),
        }
    }

    fn transition(&mut self, next: CycleState) {
        debug!(from = ?self.state, to = ?next, "orchestrator state change");
        self.state = next;
    }

    fn serve(&mut self, entry: CacheEntry) -> Option<NearbyView> {
        let view = NearbyView::from_results(entry.results.clone());
        self.current = Some(entry);
        self.view = Some(view);
        self.view.clone()
    }
}

pub struct ProximityOrchestrator<P, S, C = SystemClock> {
    provider: P,
    cache: DistanceCache<S>,
    clock: C,
    policy: CachePolicy,
    refine_limit: usize,
    check_interval: Duration,
    inner: Mutex<Inner>,
    closed: AtomicBool,
}

impl<P, S> ProximityOrchestrator<P, S, SystemClock>
where
    P: RoutedDistanceProvider,
    S: KeyValueStore,
{
    pub fn new(provider: P, store: S, options: RefreshOptions) -> Self {
        Self::with_clock(provider, store, SystemClock, options)
    }
}

impl<P, S, C> ProximityOrchestrator<P, S, C>
where
    P: RoutedDistanceProvider,
    S: KeyValueStore,
    C: Clock,
{
    pub fn with_clock(provider: P, store: S, clock: C, options: RefreshOptions) -> Self {
        Self {
            provider,
            cache: DistanceCache::new(store, options.cache_key),
            clock,
            policy: CachePolicy::new(options.ttl, options.move_threshold_m),
            refine_limit: options.refine_limit,
            check_interval: options.check_interval,
            inner: Mutex::new(Inner {
                entities: Feed::Loading,
                location: Feed::Loading,
                current: None,
                view: None,
                state: CycleState::Idle,
                last_outcome: None,
                pending: false,
            }),
            closed: AtomicBool::new(false),
        }
    }

    /// New entity list from the content source.
    pub fn set_entities(&self, feed: EntityFeed) -> Option<NearbyView> {
        self.lock().entities = feed;
        self.evaluate(Trigger::Entities)
    }

    /// New reading from the geolocation source.
    pub fn on_location(&self, feed: LocationFeed) -> Option<NearbyView> {
        self.lock().location = feed;
        self.evaluate(Trigger::Location)
    }

    /// Background tick: recompute when the last result has outlived the TTL,
    /// whether or not the user has moved.
    pub fn refresh_if_due(&self) -> Option<NearbyView> {
        self.evaluate(Trigger::Timer)
    }

    /// The last exposed result, if any.
    pub fn view(&self) -> Option<NearbyView> {
        self.lock().view.clone()
    }

    pub fn state(&self) -> CycleState {
        self.lock().state
    }

    /// How the most recent cycle ended.
    pub fn last_outcome(&self) -> Option<CycleState> {
        self.lock().last_outcome
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// How often a background scheduler should call [`Self::refresh_if_due`].
    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    pub fn cache(&self) -> &DistanceCache<S> {
        &self.cache
    }

    /// Tear down. Later triggers are ignored, and a cycle still in flight
    /// drops its result instead of persisting it.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("proximity orchestrator closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evaluate(&self, trigger: Trigger) -> Option<NearbyView> {
        if self.is_closed() {
            return None;
        }

        let (point, entities) = {
            let mut inner = self.lock();
            match inner.inputs() {
                Inputs::NotReady => return inner.view.clone(),
                Inputs::Unavailable(reason) => {
                    debug!(?trigger, %reason, "no results available");
                    inner.view = None;
                    // The in-flight cycle must not re-expose its result.
                    if inner.state == CycleState::Computing {
                        inner.pending = true;
                    }
                    return None;
                }
                Inputs::Ready(point, entities) => {
                    if inner.state == CycleState::Computing {
                        debug!(?trigger, "cycle in flight, deferring trigger");
                        inner.pending = true;
                        return inner.view.clone();
                    }
                    if trigger == Trigger::Timer && !self.timer_due(&inner) {
                        return inner.view.clone();
                    }
                    (point, entities)
                }
            }
        };

        if trigger != Trigger::Timer {
            let now = self.clock.now();
            if let Some(entry) = self.cache.load() {
                let verdict = self.policy.evaluate(Some(&entry), point, now);
                if verdict.is_valid() && entry.covers(&entities) {
                    debug!(?trigger, "serving cached distances");
                    return self.lock().serve(entry);
                }
                debug!(?trigger, ?verdict, "cached distances are stale");
            } else {
                debug!(?trigger, verdict = ?Verdict::Missing, "no cached distances");
            }
        }

        self.run_cycles(point, entities)
    }

    fn timer_due(&self, inner: &Inner) -> bool {
        match &inner.current {
            Some(entry) => self.policy.is_expired(entry.computed_at, self.clock.now()),
            None => true,
        }
    }

    fn run_cycles(&self, mut point: GeoPoint, mut entities: Vec<Entity>) -> Option<NearbyView> {
        {
            let mut inner = self.lock();
            if inner.state == CycleState::Computing {
                inner.pending = true;
                return inner.view.clone();
            }
            inner.transition(CycleState::Computing);
        }

        loop {
            let outcome = self.compute(point, &entities);

            let mut inner = self.lock();
            match outcome {
                CycleOutcome::Settled(entry) => {
                    inner.serve(entry);
                    inner.transition(CycleState::Settled);
                    inner.last_outcome = Some(CycleState::Settled);
                }
                CycleOutcome::Failed(err) => {
                    warn!(error = %err, "distance cycle failed");
                    inner.view = None;
                    inner.transition(CycleState::Failed);
                    inner.last_outcome = Some(CycleState::Failed);
                }
                CycleOutcome::Discarded => {
                    inner.pending = false;
                    inner.transition(CycleState::Idle);
                    return None;
                }
            }

            if !std::mem::take(&mut inner.pending) || self.is_closed() {
                inner.transition(CycleState::Idle);
                return inner.view.clone();
            }

            match inner.inputs() {
                Inputs::Ready(next_point, next_entities) => {
                    let now = self.clock.now();
                    let still_fresh = inner.current.as_ref().is_some_and(|entry| {
                        self.policy.evaluate(Some(entry), next_point, now).is_valid()
                            && entry.covers(&next_entities)
                    });
                    if still_fresh {
                        inner.transition(CycleState::Idle);
                        return inner.view.clone();
                    }
                    debug!("running deferred cycle");
                    point = next_point;
                    entities = next_entities;
                    inner.transition(CycleState::Computing);
                }
                Inputs::NotReady => {
                    inner.transition(CycleState::Idle);
                    return inner.view.clone();
                }
                Inputs::Unavailable(reason) => {
                    debug!(%reason, "no results available");
                    inner.view = None;
                    inner.transition(CycleState::Idle);
                    return None;
                }
            }
        }
    }

    fn compute(&self, point: GeoPoint, entities: &[Entity]) -> CycleOutcome {
        let approx = match estimate_all(point, entities) {
            Ok(approx) => approx,
            Err(err) => return CycleOutcome::Failed(err),
        };
        let results = refine_or_fallback(&self.provider, point, approx, self.refine_limit);

        if self.is_closed() {
            debug!("discarding cycle that finished after close");
            return CycleOutcome::Discarded;
        }

        let entry = CacheEntry {
            computed_at: self.clock.now(),
            user_location_snapshot: point,
            results,
        };
        if let Err(err) = self.cache.save(&entry) {
            warn!(error = %err, "failed to persist distance cache");
        }

        let routed = entry
            .results
            .iter()
            .filter(|r| r.accuracy == Accuracy::Routed)
            .count();
        info!(records = entry.results.len(), routed, "distance cycle settled");

        CycleOutcome::Settled(entry)
    }
}
