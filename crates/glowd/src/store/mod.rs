pub mod auth;
pub mod devices;
pub mod history;
pub mod lights;
pub mod state;
mod store;

pub use auth::AuthOutcome;
pub use auth::MAX_ATTEMPTS;
pub use devices::MAX_BOUND_DEVICES;
pub use state::AuthState;
pub use state::BoundDevice;
pub use state::EnergyStats;
pub use state::LightDevice;
pub use state::LinkType;
pub use state::RuleAction;
pub use state::RuleRecord;
pub use state::RuleStatus;
pub use state::SensorSamples;
pub use state::State;
pub use store::AuthAttempt;
pub use store::Store;

/// Errors from store mutations. Everything here is a synchronous
/// rejection with no partial state change.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no light with id {0}")]
    UnknownLight(u32),

    #[error("no bound device with id {0}")]
    UnknownDevice(u64),

    #[error("device limit reached: at most 2 devices can be bound")]
    DeviceLimit,
}
