//! External power-sense monitoring.
//!
//! The 5 V supply is measured through a 20 kΩ / 10 kΩ divider into a 16-bit
//! ADC referenced at 3300 mV. Only threshold *transitions* are reported:
//! the remote-facing power-ready bit reflects state changes, not individual
//! samples.

/// Upper divider resistor, kΩ.
const R1_KOHM: u32 = 20;
/// Lower divider resistor, kΩ.
const R2_KOHM: u32 = 10;
/// ADC reference, millivolts.
const REF_MILLIVOLTS: u32 = 3300;

/// Supply is considered present above this voltage, millivolts.
pub const VOLTAGE_THRESHOLD_MV: u32 = 4900;

/// Converts a raw 16-bit ADC sample to the divider input in millivolts.
pub fn voltage_from_sample(sample: u16) -> u32 {
    // Widened to 64 bits: full-scale sample * 99000 overflows u32.
    let scaled = sample as u64 * (REF_MILLIVOLTS * (R1_KOHM + R2_KOHM)) as u64 / R2_KOHM as u64;
    (scaled >> 16) as u32
}

/// Threshold detector over the power-sense ADC channel.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerSense {
    powered: bool,
}

impl PowerSense {
    /// Creates a detector that starts in the unpowered state.
    pub const fn new() -> Self {
        Self { powered: false }
    }

    /// Current powered state.
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// Feeds one completed conversion.
    ///
    /// Returns `Some(new_state)` only when the state changed.
    pub fn update(&mut self, sample: u16) -> Option<bool> {
        let powered = voltage_from_sample(sample) >= VOLTAGE_THRESHOLD_MV;

        if powered != self.powered {
            self.powered = powered;
            Some(powered)
        } else {
            None
        }
    }
}
