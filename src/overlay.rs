//! The I2C register bank wire format.
//!
//! When the board runs as a peripheral, an external master reads and writes
//! a fixed block of nine virtual registers. [`RegisterOverlay`] is the typed
//! view of that block; it is decoded fresh from the slave interface at the
//! start of every service pass and a new overlay is written back at the end
//! of the same pass. The bit-layout tables below are the single source of
//! truth for the protocol.

use crate::settings::SettingsRecord;
use crate::types::{InputPath, OutputPath};

/// 7-bit I2C address of the register bank.
pub const SLAVE_ADDRESS: u8 = 0x15;

/// Number of virtual registers.
pub const SLAVE_REG_COUNT: usize = 9;

/// `reset` register: bit 0 requests an immediate software reset.
pub const RESET_RESET: u8 = 1 << 0;

/// `sys` register: external MCLK routed to the codec.
pub const SYS_EXT_CLOCK: u8 = 1 << 0;
/// `sys` register: one-shot suspend request, cleared once honored.
pub const SYS_SUSPEND: u8 = 1 << 1;
/// `sys` register: automatic suspend on idle timeout.
pub const SYS_SUSPEND_AUTO: u8 = 1 << 2;
/// `sys` register: one-shot save-configuration request.
pub const SYS_SAVE_CONFIG: u8 = 1 << 7;
/// Defined `sys` bits; the rest read back as zero.
pub const SYS_MASK: u8 = SYS_EXT_CLOCK | SYS_SUSPEND | SYS_SUSPEND_AUTO | SYS_SAVE_CONFIG;

/// `ctl` register: amplifier power.
pub const CTL_POWER: u8 = 1 << 0;
/// `ctl` register: amplifier gain select, low bit.
pub const CTL_GAIN0: u8 = 1 << 1;
/// `ctl` register: amplifier gain select, high bit.
pub const CTL_GAIN1: u8 = 1 << 2;
/// Defined `ctl` bits; the rest read back as zero.
pub const CTL_MASK: u8 = CTL_POWER | CTL_GAIN0 | CTL_GAIN1;

/// `status` register: external supply voltage above threshold.
///
/// The status register is owned by the board and recomputed on every
/// service pass; values written by the master are discarded.
pub const STATUS_POWER_READY: u8 = 1 << 0;

/// `path` register: internal route code (route A).
pub const PATH_INTERNAL: u8 = 1;
/// `path` register: external route code (route B).
pub const PATH_EXTERNAL: u8 = 2;
/// `path` register: automatic input gain control.
pub const PATH_INPUT_AGC: u8 = 1 << 4;
/// Defined `path` bits: output code, input code and the AGC flag.
pub const PATH_MASK: u8 = 0x1F;

const PATH_OUTPUT_SHIFT: u8 = 0;
const PATH_INPUT_SHIFT: u8 = 2;
const PATH_CODE_MASK: u8 = 0x03;

/// Typed view of the nine-register bank.
///
/// Field order matches the wire layout:
/// `{reset, sys, ctl, led, status, sw, path, mic, spk}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterOverlay {
    /// Software reset control.
    pub reset: u8,
    /// System control: clock source, suspend, save-config.
    pub sys: u8,
    /// Amplifier control.
    pub ctl: u8,
    /// LED bar override, displayed verbatim in the slave profile.
    pub led: u8,
    /// Board status, recomputed on every pass.
    pub status: u8,
    /// Echo of the last switch snapshot.
    pub sw: u8,
    /// Packed input/output route codes and AGC flag.
    pub path: u8,
    /// Raw input (microphone) gain, `0..=255`.
    pub mic: u8,
    /// Raw output (speaker) gain, `0..=255`.
    pub spk: u8,
}

impl RegisterOverlay {
    /// Decodes the register block read from the slave interface.
    pub fn from_bytes(bytes: &[u8; SLAVE_REG_COUNT]) -> Self {
        Self {
            reset: bytes[0],
            sys: bytes[1],
            ctl: bytes[2],
            led: bytes[3],
            status: bytes[4],
            sw: bytes[5],
            path: bytes[6],
            mic: bytes[7],
            spk: bytes[8],
        }
    }

    /// Encodes the register block for write-back.
    pub fn to_bytes(&self) -> [u8; SLAVE_REG_COUNT] {
        [
            self.reset, self.sys, self.ctl, self.led, self.status, self.sw, self.path, self.mic,
            self.spk,
        ]
    }

    /// Route code from the output sub-field.
    pub fn output_code(&self) -> u8 {
        (self.path >> PATH_OUTPUT_SHIFT) & PATH_CODE_MASK
    }

    /// Route code from the input sub-field.
    pub fn input_code(&self) -> u8 {
        (self.path >> PATH_INPUT_SHIFT) & PATH_CODE_MASK
    }

    /// Copies a settings record into the path, AGC and level registers.
    ///
    /// Disconnected routes leave the corresponding sub-field at zero.
    pub fn apply_settings(&mut self, settings: &SettingsRecord) {
        self.path &= !PATH_MASK;

        match settings.input_path {
            InputPath::Microphone => self.path |= PATH_INTERNAL << PATH_INPUT_SHIFT,
            InputPath::Line => self.path |= PATH_EXTERNAL << PATH_INPUT_SHIFT,
            InputPath::None => {}
        }
        match settings.output_path {
            OutputPath::Headphones => self.path |= PATH_INTERNAL << PATH_OUTPUT_SHIFT,
            OutputPath::LineOut => self.path |= PATH_EXTERNAL << PATH_OUTPUT_SHIFT,
            OutputPath::None => {}
        }
        if settings.input_agc {
            self.path |= PATH_INPUT_AGC;
        }

        self.mic = settings.input_level;
        self.spk = settings.output_level;
    }

    /// Builds a settings record from the path, AGC and level registers.
    ///
    /// Undefined route codes collapse to the disconnected route.
    pub fn to_settings(&self) -> SettingsRecord {
        let input_path = match self.input_code() {
            PATH_INTERNAL => InputPath::Microphone,
            PATH_EXTERNAL => InputPath::Line,
            _ => InputPath::None,
        };
        let output_path = match self.output_code() {
            PATH_INTERNAL => OutputPath::Headphones,
            PATH_EXTERNAL => OutputPath::LineOut,
            _ => OutputPath::None,
        };

        SettingsRecord {
            input_agc: self.path & PATH_INPUT_AGC != 0,
            input_level: self.mic,
            input_path,
            output_level: self.spk,
            output_path,
        }
    }
}
