//! Hardware abstraction for the board peripherals.
//!
//! The control core owns no drivers. A platform implements [`AudioBoard`]
//! over its GPIO, SPI, I2C and power-management primitives; the core only
//! sequences calls into it. All methods are infallible from the core's point
//! of view: transient bus faults are reported separately through
//! [`Board::on_bus_error`](crate::Board::on_bus_error), and adapters handle
//! everything else internally.

use crate::overlay::SLAVE_REG_COUNT;
use crate::types::{InputPath, OutputPath};

/// Codec master clock source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// On-board oscillator.
    Internal,
    /// External MCLK from the host connector.
    External,
}

/// Board peripheral access used by the control core.
///
/// Codec and amplifier operations must be idempotent: the core re-applies
/// the full routing and gain state after bus-fault recovery.
pub trait AudioBoard {
    /// Reads the switch shift register in one bus transaction.
    ///
    /// Returns the raw byte; the core masks it to the defined bits.
    fn read_switches(&mut self) -> u8;

    /// Writes the 8-bit LED bar shift register.
    fn write_led(&mut self, value: u8);

    /// Drives the board status LED next to the bar.
    fn set_status_led(&mut self, on: bool);

    /// Selects the codec master clock source.
    fn set_clock_source(&mut self, source: ClockSource);

    /// Applies an input route to the codec.
    fn codec_set_input_path(&mut self, path: InputPath);

    /// Applies an output route to the codec.
    fn codec_set_output_path(&mut self, path: OutputPath);

    /// Applies a raw input gain; `mute` silences the channel regardless.
    fn codec_set_input_gain(&mut self, gain: u8, mute: bool);

    /// Applies a raw output gain; `mute` silences the channel regardless.
    fn codec_set_output_gain(&mut self, gain: u8, mute: bool);

    /// Selects the codec sample rate in Hz (44100 or 48000).
    fn codec_set_sample_rate(&mut self, rate: u32);

    /// Enables or disables automatic input gain control.
    fn codec_set_agc(&mut self, enabled: bool);

    /// Hardware reset of the codec, used during bus-fault recovery.
    fn codec_reset(&mut self);

    /// Issues the I2C bus recovery primitive.
    fn bus_recover(&mut self);

    /// Drives the external amplifier power pin.
    fn amp_set_power(&mut self, on: bool);

    /// Drives the two amplifier gain-select pins.
    fn amp_set_gain(&mut self, gain0: bool, gain1: bool);

    /// Reads the full register bank exposed on the I2C slave interface.
    fn slave_read(&mut self, regs: &mut [u8; SLAVE_REG_COUNT]);

    /// Writes the full register bank back to the I2C slave interface.
    fn slave_write(&mut self, regs: &[u8; SLAVE_REG_COUNT]);

    /// Stores two words in battery-retained backup memory.
    fn backup_store(&mut self, words: [u32; 2]);

    /// Loads the two backup memory words.
    fn backup_load(&mut self) -> [u32; 2];

    /// Reloads the watchdog. Boards without one keep the default no-op.
    fn watchdog_reload(&mut self) {}

    /// Blocks in a low-power state until bus activity wakes the part.
    ///
    /// The adapter owns the clock switch and wake-interrupt arming around
    /// the sleep instruction. This is the only blocking call in the system.
    fn suspend(&mut self);

    /// Immediate system reset. Does not return on hardware; mocks record
    /// the call and return so the surrounding logic stays testable.
    fn system_reset(&mut self);
}
