use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use arc_swap::ArcSwap;
use chrono::Local;
use chrono::Timelike;
use tracing::debug;

use super::StoreError;
use super::auth;
use super::auth::AuthOutcome;
use super::devices;
use super::history;
use super::lights;
use super::state::BoundDevice;
use super::state::LinkType;
use super::state::RuleAction;
use super::state::State;
use crate::predict::SensorSample;
use crate::settings::Settings;

/// Result of running the gate through the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthAttempt {
    pub outcome: AuthOutcome,

    /// True only on the not-authenticated -> authenticated transition.
    /// The caller uses this to trigger the prediction fetch exactly once
    /// per successful authentication.
    pub newly_granted: bool,
}

/// Owner of the daemon state tree.
///
/// Readers take cheap `Arc<State>` snapshots; mutations are serialized by
/// an internal lock, edit a clone, and publish it. No mutation ever
/// observes another mid-flight.
pub struct Store {
    /// Centralized state snapshot (readers load the Arc, writer stores a new one)
    state: ArcSwap<State>,

    /// Serializes writers; the swap itself is atomic but clone-edit-publish
    /// is not.
    write: Mutex<()>,

    /// Newest prediction generation. Completions carrying an older
    /// generation are dropped instead of overwriting newer state.
    prediction_gen: AtomicU64,

    /// Gate secret, fixed for the process lifetime.
    secret: String,
}

impl Store {
    pub fn new(state: State, secret: String) -> Self {
        Self {
            state: ArcSwap::new(Arc::new(state)),
            write: Mutex::new(()),
            prediction_gen: AtomicU64::new(0),
            secret,
        }
    }

    /// Get a snapshot of the current state.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn snapshot(&self) -> Arc<State> {
        self.state.load_full()
    }

    /// Run `f` against a clone of the current state and publish the result.
    /// The aggregate power figure is recomputed on every mutation.
    fn mutate<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let _guard = self.write.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = State::clone(&self.state.load());
        let out = f(&mut state);
        state.total_power = lights::total_power(&state.lights);
        self.state.store(Arc::new(state));
        out
    }

    pub fn toggle_light(&self, id: u32) -> Result<bool, StoreError> {
        self.mutate(|state| lights::toggle(&mut state.lights, id))
    }

    pub fn set_brightness(&self, id: u32, value: u8) -> Result<(), StoreError> {
        self.mutate(|state| lights::set_brightness(&mut state.lights, id, value))
    }

    pub fn all_lights_on(&self) {
        self.mutate(|state| lights::all_on(&mut state.lights));
    }

    pub fn all_lights_off(&self) {
        self.mutate(|state| lights::all_off(&mut state.lights));
    }

    /// Enter or leave power-save mode. Re-applying the current mode is a
    /// no-op so the lossy scaling cannot stack.
    pub fn set_power_save(&self, enabled: bool) -> bool {
        self.mutate(|state| {
            if state.power_save == enabled {
                return false;
            }
            lights::apply_power_save(&mut state.lights, enabled);
            state.power_save = enabled;
            true
        })
    }

    /// Run one gate attempt against the configured secret.
    pub fn attempt_auth(&self, candidate: &str) -> AuthAttempt {
        self.mutate(|state| {
            let was_authenticated = state.auth.is_authenticated;
            let outcome = auth::attempt(&mut state.auth, &self.secret, candidate);
            AuthAttempt {
                outcome,
                newly_granted: !was_authenticated && state.auth.is_authenticated,
            }
        })
    }

    pub fn pair_device(&self, link: LinkType) -> Result<BoundDevice, StoreError> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M").to_string();
        self.mutate(|state| devices::pair(state, link, stamp))
    }

    pub fn remove_device(&self, id: u64) -> Result<(), StoreError> {
        self.mutate(|state| devices::remove(state, id))
    }

    /// Append a rule record dated today.
    pub fn record_rule(&self, action: RuleAction, description: String) -> u64 {
        let date = Local::now().format("%Y-%m-%d").to_string();
        self.mutate(|state| history::record(state, action, description, date))
    }

    /// Start a prediction fetch, superseding any fetch still in flight.
    pub fn begin_prediction(&self) -> u64 {
        self.prediction_gen.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store a fetched rule, unless a newer fetch has started since.
    /// Returns whether the rule was applied.
    pub fn complete_prediction(&self, generation: u64, rule: String) -> bool {
        self.mutate(|state| {
            if generation != self.prediction_gen.load(Ordering::SeqCst) {
                debug!(generation, "dropping stale prediction result");
                return false;
            }
            state.model_rule = Some(rule);
            true
        })
    }

    /// Sample sent to the prediction service: first light's brightness,
    /// first seeded temperature, current hour of day.
    pub fn prediction_sample(&self) -> SensorSample {
        SensorSample::from_state(&self.snapshot(), Local::now().hour())
    }

    /// Replace the in-memory settings. The plaintext password never stays
    /// resident; it is cleared before the state is published.
    pub fn set_settings(&self, mut settings: Settings) {
        settings.password.clear();
        self.mutate(|state| state.settings = settings);
    }
}
