//! LED bar rendering for the active profile.
//!
//! The bar has four volume segments in the low nibble and four path
//! indicator LEDs in the high nibble. The path currently being adjusted
//! blinks at the tick cadence; the other path is shown steady. In the slave
//! profile the renderer is bypassed entirely and the bar shows whatever the
//! remote master wrote into the LED register.

use crate::types::{AudioConfig, InputPath, Mode, OutputPath};

/// Input route shown on route A (bit 7) or route B (bit 6).
const INPUT_A: u8 = 0x80;
const INPUT_B: u8 = 0x40;
const INPUT_BOTH: u8 = INPUT_A | INPUT_B;

/// Output route shown on route A (bit 4) or route B (bit 5).
const OUTPUT_A: u8 = 0x10;
const OUTPUT_B: u8 = 0x20;
const OUTPUT_BOTH: u8 = OUTPUT_A | OUTPUT_B;

/// Maps a level in `0..=7` to a monotone 4-segment bar pattern.
fn level_to_bar(level: u8) -> u8 {
    let mut result = 0;

    // Bucket into 0..=4 segments; each higher bucket adds one segment.
    let segments = (level + 1) / 2;
    if segments >= 4 {
        result |= 0x01;
    }
    if segments >= 3 {
        result |= 0x02;
    }
    if segments >= 2 {
        result |= 0x04;
    }
    if segments >= 1 {
        result |= 0x08;
    }

    result
}

/// Renders the LED bar byte for the current configuration.
///
/// Pure: identical inputs always produce an identical byte. `blink_visible`
/// is the tick-driven blink phase gating the indicator of the path that is
/// currently being adjusted.
pub fn render(config: &AudioConfig, blink_visible: bool) -> u8 {
    let mut value = match config.mode {
        Mode::Mic => level_to_bar(config.input_level),
        Mode::Spk => level_to_bar(config.output_level),
        Mode::None => 0,
    };

    if config.mode != Mode::Mic {
        match config.input_path {
            InputPath::Microphone => value |= INPUT_A,
            InputPath::Line => value |= INPUT_B,
            InputPath::None => {}
        }
    } else if blink_visible {
        value |= INPUT_BOTH;
    }

    if config.mode != Mode::Spk {
        match config.output_path {
            OutputPath::Headphones => value |= OUTPUT_A,
            OutputPath::LineOut => value |= OUTPUT_B,
            OutputPath::None => {}
        }
    } else if blink_visible {
        value |= OUTPUT_BOTH;
    }

    value
}
