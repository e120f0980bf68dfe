//! Core types shared by both operating profiles.

/// Minimum user-facing volume level.
pub const MIN_LEVEL: u8 = 0;
/// Maximum user-facing volume level.
pub const MAX_LEVEL: u8 = 7;

/// Configuration switch bits, as read from the switch shift register.
pub mod switches {
    /// Enable the active codec configuration profile.
    pub const ACTIVE: u8 = 0x01;
    /// Load the persisted configuration instead of compiled-in defaults.
    pub const LOAD_CONFIG: u8 = 0x02;
    /// Route the external MCLK signal to the codec.
    pub const EXT_CLOCK: u8 = 0x04;
    /// Select the 48 kHz sample rate.
    pub const SAMPLE_RATE: u8 = 0x08;
    /// Enable automatic input gain control.
    pub const INPUT_GAIN_AUTO: u8 = 0x10;
    /// Maximum gain for the external amplifier.
    pub const OUTPUT_GAIN_BOOST: u8 = 0x20;

    /// Defined switch bits; everything above is masked off on read.
    pub const MASK: u8 = 0x3F;
}

/// Which level the volume buttons currently adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Volume UI hidden; the next button press selects a channel.
    #[default]
    None,
    /// Adjusting the input (microphone) level.
    Mic,
    /// Adjusting the output (speaker) level.
    Spk,
}

/// Audio input route.
///
/// Route A is the on-board microphone input, route B the external line input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputPath {
    /// Input disconnected.
    #[default]
    None,
    /// Route A: internal microphone input.
    Microphone,
    /// Route B: external line input.
    Line,
}

impl InputPath {
    /// Persisted byte encoding.
    pub fn to_raw(self) -> u8 {
        match self {
            InputPath::None => 0,
            InputPath::Microphone => 1,
            InputPath::Line => 2,
        }
    }

    /// Decodes a persisted byte; undefined values collapse to `None`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => InputPath::Microphone,
            2 => InputPath::Line,
            _ => InputPath::None,
        }
    }

    /// The other selectable route; `None` stays `None`.
    pub fn toggled(self) -> Self {
        match self {
            InputPath::Microphone => InputPath::Line,
            InputPath::Line => InputPath::Microphone,
            InputPath::None => InputPath::None,
        }
    }
}

/// Audio output route.
///
/// Route A is the differential headphone output, route B the line output
/// feeding the external amplifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputPath {
    /// Output disconnected.
    #[default]
    None,
    /// Route A: differential headphone output.
    Headphones,
    /// Route B: line output through the external amplifier.
    LineOut,
}

impl OutputPath {
    /// Persisted byte encoding.
    pub fn to_raw(self) -> u8 {
        match self {
            OutputPath::None => 0,
            OutputPath::Headphones => 1,
            OutputPath::LineOut => 2,
        }
    }

    /// Decodes a persisted byte; undefined values collapse to `None`.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => OutputPath::Headphones,
            2 => OutputPath::LineOut,
            _ => OutputPath::None,
        }
    }

    /// The other selectable route; `None` stays `None`.
    pub fn toggled(self) -> Self {
        match self {
            OutputPath::Headphones => OutputPath::LineOut,
            OutputPath::LineOut => OutputPath::Headphones,
            OutputPath::None => OutputPath::None,
        }
    }
}

/// Debounced front-panel button, reported on the falling edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Toggle the input route.
    Mic,
    /// Toggle the output route.
    Spk,
    /// Volume down, or select the speaker channel when the UI is hidden.
    VolumeDown,
    /// Volume up, or select the microphone channel when the UI is hidden.
    VolumeUp,
}

/// Current audio routing and level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AudioConfig {
    /// Active input route.
    pub input_path: InputPath,
    /// Active output route.
    pub output_path: OutputPath,
    /// Input level, `0..=7`.
    pub input_level: u8,
    /// Output level, `0..=7`.
    pub output_level: u8,
    /// Which level the volume buttons adjust.
    pub mode: Mode,
}

impl AudioConfig {
    /// Compiled-in defaults used when no valid settings record exists.
    pub fn defaults() -> Self {
        Self {
            input_path: InputPath::Microphone,
            output_path: OutputPath::Headphones,
            input_level: 1,
            output_level: 1,
            mode: Mode::None,
        }
    }
}

/// Converts a raw codec gain (`0..=255`) to a user-facing level (`0..=7`).
pub fn gain_to_level(gain: u8) -> u8 {
    (gain as u16 * MAX_LEVEL as u16 / 255) as u8
}

/// Converts a user-facing level (`0..=7`) to a raw codec gain (`0..=255`).
pub fn level_to_gain(level: u8) -> u8 {
    (level as u16 * 255 / MAX_LEVEL as u16) as u8
}
