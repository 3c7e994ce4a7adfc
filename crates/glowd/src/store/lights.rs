//! Pure transition functions over the light collection.
//!
//! These are the state mutations behind the light-control endpoints; they
//! know nothing about the store or the HTTP layer, so they are testable in
//! isolation.

use super::StoreError;
use super::state::LightDevice;

pub const MAX_BRIGHTNESS: u8 = 100;

/// Watts per brightness unit for the aggregate power figure.
const POWER_PER_UNIT: f64 = 0.1;

/// Power-save scales lit devices by this factor, and restores by dividing
/// by it. Both directions floor, so the pair is deliberately lossy.
const POWER_SAVE_FACTOR: f64 = 0.7;

/// Power-save never dims a lit device below this.
const POWER_SAVE_FLOOR: u8 = 10;

/// Brightness given to a device turned on at brightness zero.
const DEFAULT_ON_BRIGHTNESS: u8 = 80;

fn find(lights: &mut [LightDevice], id: u32) -> Result<&mut LightDevice, StoreError> {
    lights
        .iter_mut()
        .find(|l| l.id == id)
        .ok_or(StoreError::UnknownLight(id))
}

/// Flip a light's power state. Brightness is untouched, so switching off a
/// bright device leaves the fault flag raised until brightness follows.
pub fn toggle(lights: &mut [LightDevice], id: u32) -> Result<bool, StoreError> {
    let light = find(lights, id)?;
    light.is_on = !light.is_on;
    Ok(light.is_on)
}

/// Set a light's brightness, clamped to 0-100. Power state couples
/// one-directionally from brightness writes: zero turns the device off,
/// anything else turns it on.
pub fn set_brightness(lights: &mut [LightDevice], id: u32, value: u8) -> Result<(), StoreError> {
    let light = find(lights, id)?;
    light.brightness = value.min(MAX_BRIGHTNESS);
    light.is_on = light.brightness > 0;
    Ok(())
}

/// Turn every light on, raising zero brightness to a usable level.
pub fn all_on(lights: &mut [LightDevice]) {
    for light in lights.iter_mut() {
        light.is_on = true;
        if light.brightness == 0 {
            light.brightness = DEFAULT_ON_BRIGHTNESS;
        }
    }
}

/// Turn every light off and zero its brightness.
pub fn all_off(lights: &mut [LightDevice]) {
    for light in lights.iter_mut() {
        light.is_on = false;
        light.brightness = 0;
    }
}

/// Scale lit devices down (entering power-save) or back up (leaving it).
///
/// Not a true inverse: both directions floor, so a save/restore cycle can
/// drift unless the starting brightness divides evenly.
pub fn apply_power_save(lights: &mut [LightDevice], enabled: bool) {
    for light in lights.iter_mut().filter(|l| l.is_on) {
        light.brightness = if enabled {
            ((f64::from(light.brightness) * POWER_SAVE_FACTOR).floor() as u8).max(POWER_SAVE_FLOOR)
        } else {
            ((f64::from(light.brightness) / POWER_SAVE_FACTOR).floor() as u8).min(MAX_BRIGHTNESS)
        };
    }
}

/// Aggregate power draw: brightness x 0.1 over lit devices.
pub fn total_power(lights: &[LightDevice]) -> f64 {
    lights
        .iter()
        .filter(|l| l.is_on)
        .map(|l| f64::from(l.brightness) * POWER_PER_UNIT)
        .sum()
}

/// Derived fault flag: a device holding brightness while switched off.
/// Observable status only, never enforced.
pub fn has_fault(lights: &[LightDevice]) -> bool {
    lights.iter().any(|l| l.brightness > 0 && !l.is_on)
}
