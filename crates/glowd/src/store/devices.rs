//! Companion-device pairing.
//!
//! Devices are session-only: the bound list resets with the process, a
//! limitation carried from the dashboard this replaces.

use super::StoreError;
use super::state::BoundDevice;
use super::state::LinkType;
use super::state::State;

/// At most this many companion devices may be bound at once.
pub const MAX_BOUND_DEVICES: usize = 2;

/// Bind a new companion device.
///
/// Rejects synchronously once the capacity is reached; no partial state
/// change happens on rejection.
pub fn pair(state: &mut State, link: LinkType, last_active: String) -> Result<BoundDevice, StoreError> {
    if state.devices.len() >= MAX_BOUND_DEVICES {
        return Err(StoreError::DeviceLimit);
    }

    let device = BoundDevice {
        id: state.next_device_id,
        name: format!("Device {}", state.devices.len() + 1),
        link,
        connected: true,
        last_active,
    };
    state.next_device_id += 1;
    state.devices.push(device.clone());
    Ok(device)
}

/// Unbind a companion device by id.
pub fn remove(state: &mut State, id: u64) -> Result<(), StoreError> {
    let before = state.devices.len();
    state.devices.retain(|d| d.id != id);
    if state.devices.len() == before {
        return Err(StoreError::UnknownDevice(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp() -> String {
        "2024-10-21 09:00".to_string()
    }

    #[test]
    fn test_pair_rejected_at_capacity() {
        // The seeded state already holds two devices.
        let mut state = State::default();
        assert_eq!(state.devices.len(), MAX_BOUND_DEVICES);

        let err = pair(&mut state, LinkType::Qr, stamp()).unwrap_err();
        assert!(matches!(err, StoreError::DeviceLimit));
        assert_eq!(state.devices.len(), MAX_BOUND_DEVICES);
    }

    #[test]
    fn test_pair_after_remove() {
        let mut state = State::default();
        remove(&mut state, 1).unwrap();

        let device = pair(&mut state, LinkType::ManualCode, stamp()).unwrap();
        assert_eq!(device.name, "Device 2");
        assert_eq!(device.link, LinkType::ManualCode);
        assert!(device.connected);
        assert_eq!(state.devices.len(), MAX_BOUND_DEVICES);
    }

    #[test]
    fn test_pair_ids_do_not_repeat() {
        let mut state = State::default();
        remove(&mut state, 1).unwrap();
        remove(&mut state, 2).unwrap();

        let a = pair(&mut state, LinkType::Bluetooth, stamp()).unwrap();
        let b = pair(&mut state, LinkType::Wifi, stamp()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_remove_unknown_device() {
        let mut state = State::default();
        assert!(matches!(
            remove(&mut state, 77),
            Err(StoreError::UnknownDevice(77))
        ));
        assert_eq!(state.devices.len(), MAX_BOUND_DEVICES);
    }
}
