//! Device descriptions produced by toolkit discovery.

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Control methods an adb device supports, as the engine's native flag
/// set.
///
/// The engine combines one input method with one screencap method; the
/// discovery result reports every combination the device accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdbControllerType(pub i32);

impl AdbControllerType {
    /// No known control method.
    pub const NONE: Self = Self(0);

    /// Input through `adb shell input`.
    pub const INPUT_ADB_SHELL: Self = Self(1);

    /// Input through a touch agent pushed to the device.
    pub const INPUT_TOUCH_AGENT: Self = Self(2);

    /// Screencap through `adb exec-out screencap`.
    pub const SCREENCAP_ADB: Self = Self(1 << 8);

    /// Screencap through an on-device encode agent.
    pub const SCREENCAP_AGENT: Self = Self(2 << 8);

    /// Whether every flag in `other` is present in `self`.
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for AdbControllerType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An adb device surfaced by toolkit discovery.
///
/// Plain value object with no lifecycle of its own. The adb config
/// payload is an engine-defined JSON string and is carried opaquely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Human-readable device name.
    pub name: String,

    /// Path of the adb binary the device was found through.
    pub adb_path: String,

    /// adb serial addressing the device.
    pub adb_serial: String,

    /// Opaque engine-defined adb config payload.
    pub adb_config: String,

    /// Control methods the device supports.
    pub controller_type: AdbControllerType,
}
