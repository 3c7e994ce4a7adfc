use serde::Deserialize;
use serde::Serialize;

use crate::settings::Settings;

/// A controllable light device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightDevice {
    pub id: u32,

    /// Human-readable name (e.g. "Kitchen Light").
    pub name: String,

    /// Room the device lives in.
    pub location: String,

    /// Whether the light is on or off.
    pub is_on: bool,

    /// Brightness level, 0-100.
    pub brightness: u8,
}

/// Password-gate state for the history view.
///
/// `is_authenticated` is monotonic for the process lifetime; `attempts`
/// only resets with a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub attempts: u32,
}

/// What a rule-history entry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum RuleAction {
    Create,
    Update,
    Modify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum RuleStatus {
    Active,
    Inactive,
}

/// One entry in the append-only rule history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRecord {
    pub id: u64,

    /// Date the rule changed, `YYYY-MM-DD`.
    pub date: String,

    pub action: RuleAction,
    pub description: String,
    pub status: RuleStatus,
}

/// How a companion device is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    Bluetooth,
    Wifi,
    ManualCode,
    Qr,
}

/// A paired companion device (phone, tablet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundDevice {
    pub id: u64,
    pub name: String,
    pub link: LinkType,
    pub connected: bool,

    /// Last activity, `YYYY-MM-DD HH:MM`.
    pub last_active: String,
}

/// Seeded weekly sensor samples served by the history view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorSamples {
    pub temperature: Vec<i32>,
    pub humidity: Vec<u32>,
    pub light_level: Vec<u32>,
    pub motion: Vec<bool>,
}

/// Energy consumption figures in kWh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyStats {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
    pub yearly: f64,
}

/// Centralized snapshot of the entire daemon state.
///
/// Readers get this behind an `Arc`; every mutation publishes a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub lights: Vec<LightDevice>,
    pub power_save: bool,

    /// Aggregate power draw of lit devices, recomputed on every mutation.
    pub total_power: f64,

    pub auth: AuthState,

    pub rules: Vec<RuleRecord>,
    pub devices: Vec<BoundDevice>,

    /// Rule text from the prediction service, once fetched.
    pub model_rule: Option<String>,

    pub sensors: SensorSamples,
    pub energy: EnergyStats,

    pub settings: Settings,

    #[serde(skip)]
    pub(crate) next_rule_id: u64,

    #[serde(skip)]
    pub(crate) next_device_id: u64,
}

impl Default for State {
    fn default() -> Self {
        let lights = vec![
            seed_light(1, "Living Room", "Living Room", true, 80),
            seed_light(2, "Bedroom Light", "Bedroom", false, 60),
            seed_light(3, "Kitchen Light", "Kitchen", true, 100),
            seed_light(4, "Bathroom Light", "Bathroom", false, 70),
            seed_light(5, "Balcony Light", "Balcony", true, 50),
        ];
        let total_power = super::lights::total_power(&lights);

        Self {
            lights,
            power_save: false,
            total_power,
            auth: AuthState::default(),
            rules: vec![
                RuleRecord {
                    id: 1,
                    date: "2024-10-20".to_string(),
                    action: RuleAction::Update,
                    description: "Adjust living room brightness based on habits".to_string(),
                    status: RuleStatus::Active,
                },
                RuleRecord {
                    id: 2,
                    date: "2024-10-19".to_string(),
                    action: RuleAction::Create,
                    description: "Add night mode rule".to_string(),
                    status: RuleStatus::Active,
                },
                RuleRecord {
                    id: 3,
                    date: "2024-10-18".to_string(),
                    action: RuleAction::Modify,
                    description: "Optimize energy-saving parameters".to_string(),
                    status: RuleStatus::Active,
                },
            ],
            devices: vec![
                BoundDevice {
                    id: 1,
                    name: "iPhone 15".to_string(),
                    link: LinkType::Bluetooth,
                    connected: true,
                    last_active: "2024-10-20 14:30".to_string(),
                },
                BoundDevice {
                    id: 2,
                    name: "iPad Pro".to_string(),
                    link: LinkType::Wifi,
                    connected: false,
                    last_active: "2024-10-19 20:15".to_string(),
                },
            ],
            model_rule: None,
            sensors: SensorSamples {
                temperature: vec![22, 23, 21, 24, 22, 23, 25],
                humidity: vec![45, 47, 43, 46, 44, 48, 45],
                light_level: vec![300, 280, 320, 290, 310, 295, 305],
                motion: vec![true, false, true, true, false, true, false],
            },
            energy: EnergyStats {
                daily: 2.5,
                weekly: 17.8,
                monthly: 75.2,
                yearly: 890.5,
            },
            settings: Settings::default(),
            next_rule_id: 4,
            next_device_id: 3,
        }
    }
}

fn seed_light(id: u32, name: &str, location: &str, is_on: bool, brightness: u8) -> LightDevice {
    LightDevice {
        id,
        name: name.to_string(),
        location: location.to_string(),
        is_on,
        brightness,
    }
}
