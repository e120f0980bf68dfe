//! Board state aggregate and the event/task coordination core.
//!
//! [`Board`] owns the complete control state and turns asynchronous hardware
//! events into a deterministic sequence of cooperative tasks. Interrupt-side
//! entry points (`on_*` methods) only read hardware, claim a pending slot
//! and post; the posted tasks run later through [`Board::run`], release
//! their slot on entry, mutate state and post follow-up work.
//!
//! The operating profile is selected once, during the startup task, from
//! the configuration switches: [`Profile::Active`] drives the codec and
//! amplifier from local controls, [`Profile::Slave`] (see the slave engine)
//! is driven by an external I2C master.

use crate::hw::{AudioBoard, ClockSource};
use crate::indicator;
use crate::power::PowerSense;
use crate::settings::{self, ConfigMemory};
use crate::task::{Pending, PendingEvent, QueueFull, Scheduler, Task};
use crate::types::{
    AudioConfig, Button, InputPath, MAX_LEVEL, MIN_LEVEL, Mode, OutputPath, gain_to_level,
    level_to_gain, switches,
};

/// Control tick rate, Hz.
pub const CONTROL_UPDATE_RATE: u8 = 10;

/// Idle ticks before autosuspend triggers.
pub const AUTO_SUSPEND_TIMEOUT: u8 = 5 * CONTROL_UPDATE_RATE;

/// Ticks the volume UI stays visible after the last button press.
pub const MODE_ACTIVE_TIMEOUT: u8 = 3 * CONTROL_UPDATE_RATE;

/// Bus-fault recovery attempts before giving up.
pub const BUS_MAX_RETRIES: u8 = 100;

/// Fixed offset of the settings record in configuration memory.
pub const SETTINGS_OFFSET: u32 = 28 * 1024;

/// Operating profile, selected at startup from the configuration switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Profile {
    /// Local switches and buttons drive the codec directly.
    Active,
    /// An external I2C master controls the board through the register bank.
    Slave,
}

/// LED and UI timing state.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Indication {
    /// Volume UI auto-hide countdown, ticks.
    pub(crate) active: u8,
    /// Blink phase counter, `0..CONTROL_UPDATE_RATE`.
    pub(crate) blink: u8,
    /// LED byte last latched from the remote master (slave profile).
    pub(crate) override_byte: u8,
}

/// Shared system bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SystemState {
    /// Last-read switch snapshot.
    pub(crate) switches: u8,
    /// Autosuspend enabled by the remote master.
    pub(crate) autosuspend: bool,
    /// Autosuspend countdown, ticks.
    pub(crate) suspend_timeout: u8,
    /// Consecutive bus-fault recovery attempts.
    pub(crate) bus_retries: u8,
}

/// The board control core.
///
/// One instance exists for the lifetime of the application. All hardware
/// access goes through the injected [`AudioBoard`] and [`ConfigMemory`]
/// implementations, and all deferred work through the [`Scheduler`] passed
/// into each entry point, so the core runs unmodified under test.
pub struct Board<H: AudioBoard, M: ConfigMemory> {
    pub(crate) hw: H,
    pub(crate) memory: M,
    pub(crate) profile: Profile,
    pub(crate) config: AudioConfig,
    pub(crate) pending: Pending,
    pub(crate) indication: Indication,
    pub(crate) system: SystemState,
    pub(crate) power: PowerSense,
}

impl<H: AudioBoard, M: ConfigMemory> Board<H, M> {
    /// Creates the board core around its hardware and configuration memory.
    ///
    /// The core starts with default configuration and the active profile;
    /// the startup task posted by [`Board::start`] performs the real
    /// profile selection and settings load.
    pub fn new(hw: H, memory: M) -> Self {
        Self {
            hw,
            memory,
            profile: Profile::Active,
            config: AudioConfig::defaults(),
            pending: Pending::new(),
            indication: Indication::default(),
            system: SystemState::default(),
            power: PowerSense::new(),
        }
    }

    /// Posts the one-shot startup task.
    pub fn start(&mut self, wq: &mut impl Scheduler) -> Result<(), QueueFull> {
        wq.post(Task::Startup)
    }

    /// Executes one task popped from the work queue.
    pub fn run(&mut self, task: Task, wq: &mut impl Scheduler) {
        match task {
            Task::Startup => self.startup_task(wq),
            Task::SwitchRead => self.switch_read_task(wq),
            Task::LedUpdate => self.led_update_task(),
            Task::InputApply => self.input_apply_task(wq),
            Task::OutputApply => self.output_apply_task(wq),
            Task::VolumeApply => self.volume_apply_task(wq),
            Task::SlaveUpdate => self.slave_update_task(wq),
            Task::Suspend => self.suspend_task(),
        }
    }

    /// Current audio configuration.
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Selected operating profile.
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Outstanding task families.
    pub fn pending(&self) -> Pending {
        self.pending
    }

    /// Last-read switch snapshot.
    pub fn switches(&self) -> u8 {
        self.system.switches
    }

    /// External supply state as last sampled.
    pub fn is_powered(&self) -> bool {
        self.power.is_powered()
    }

    /// Autosuspend enabled by the remote master.
    pub fn is_autosuspend_enabled(&self) -> bool {
        self.system.autosuspend
    }

    /// Remaining autosuspend countdown, ticks.
    pub fn suspend_timeout(&self) -> u8 {
        self.system.suspend_timeout
    }

    /// Consecutive bus-fault recovery attempts.
    pub fn bus_retries(&self) -> u8 {
        self.system.bus_retries
    }

    /// Hardware access, for adapters and tests.
    pub fn hw(&self) -> &H {
        &self.hw
    }

    /// Mutable hardware access, for adapters and tests.
    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Configuration memory access, for adapters and tests.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Mutable configuration memory access, for adapters and tests.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Claims `event` and posts `task` if no task of that family is
    /// outstanding. Returns `true` only when the task was newly posted.
    ///
    /// The claim happens only after a successful post, so a full queue
    /// leaves the slot free and the event re-arms on the next attempt.
    pub(crate) fn schedule(
        &mut self,
        wq: &mut impl Scheduler,
        event: PendingEvent,
        task: Task,
    ) -> bool {
        if self.pending.is_claimed(event) {
            return false;
        }
        if wq.post(task).is_ok() {
            self.pending.claim(event);
            true
        } else {
            false
        }
    }

    /// Periodic control tick, expected at [`CONTROL_UPDATE_RATE`] Hz.
    ///
    /// Advances the blink phase and the volume UI auto-hide countdown,
    /// schedules switch polling, drives the autosuspend countdown and
    /// reloads the watchdog. The watchdog reload is unconditional so a
    /// stuck branch elsewhere cannot starve it.
    pub fn on_tick(&mut self, wq: &mut impl Scheduler) {
        if self.profile == Profile::Active {
            self.indication.blink += 1;
            if self.indication.blink == CONTROL_UPDATE_RATE {
                self.indication.blink = 0;
            }

            if self.indication.active != 0 {
                self.indication.active -= 1;
                if self.indication.active == 0 {
                    self.config.mode = Mode::None;
                }
            }
        }

        self.schedule(wq, PendingEvent::SwitchRead, Task::SwitchRead);

        if self.system.autosuspend {
            if self.system.suspend_timeout == 0 {
                if self.schedule(wq, PendingEvent::Suspend, Task::Suspend) {
                    self.system.suspend_timeout = AUTO_SUSPEND_TIMEOUT;
                }
            } else {
                self.system.suspend_timeout -= 1;
            }
        }

        self.hw.watchdog_reload();
    }

    /// Debounced button edge. Ignored in the slave profile, where the
    /// front-panel buttons are not wired to the core.
    pub fn on_button(&mut self, button: Button, wq: &mut impl Scheduler) {
        if self.profile != Profile::Active {
            return;
        }

        match button {
            Button::Mic => self.on_mic_pressed(wq),
            Button::Spk => self.on_spk_pressed(wq),
            Button::VolumeDown => self.on_volume_down(wq),
            Button::VolumeUp => self.on_volume_up(wq),
        }
    }

    /// Completed power-sense conversion.
    ///
    /// Only a threshold transition schedules a slave update: the remote
    /// status bit tracks state changes, not individual samples.
    pub fn on_adc_sample(&mut self, sample: u16, wq: &mut impl Scheduler) {
        if self.power.update(sample).is_some() && self.profile == Profile::Slave {
            self.schedule(wq, PendingEvent::Slave, Task::SlaveUpdate);
        }
    }

    /// Write-complete notification from the I2C slave interface.
    pub fn on_slave_write(&mut self, wq: &mut impl Scheduler) {
        self.schedule(wq, PendingEvent::Slave, Task::SlaveUpdate);
    }

    /// Bus-fault notification from the codec interface.
    ///
    /// Issues bus recovery and, below the retry ceiling, resets the codec.
    /// Faults beyond the ceiling are abandoned without escalation.
    pub fn on_bus_error(&mut self) {
        self.hw.bus_recover();

        if self.system.bus_retries < BUS_MAX_RETRIES {
            self.system.bus_retries += 1;
            self.hw.codec_reset();
        }
    }

    /// Bus-idle notification after one or more faults.
    ///
    /// Re-applies the full routing and gain state so the codec cannot be
    /// left out of sync with the board after a recovered fault.
    pub fn on_bus_idle(&mut self, wq: &mut impl Scheduler) {
        if self.system.bus_retries != 0 {
            self.system.bus_retries = 0;

            self.input_apply_task(wq);
            self.output_apply_task(wq);
            self.volume_apply_task(wq);
        }
    }

    /// One-shot bring-up: settings load and profile selection.
    fn startup_task(&mut self, wq: &mut impl Scheduler) {
        self.hw.write_led(0);

        let sw = self.hw.read_switches() & switches::MASK;
        let stored = settings::load(&mut self.memory, SETTINGS_OFFSET);

        self.config = match stored {
            Some(record) if sw & switches::LOAD_CONFIG != 0 => AudioConfig {
                input_path: record.input_path,
                output_path: record.output_path,
                input_level: gain_to_level(record.input_level),
                output_level: gain_to_level(record.output_level),
                mode: Mode::None,
            },
            _ => AudioConfig::defaults(),
        };

        if sw & switches::ACTIVE != 0 {
            self.profile = Profile::Active;

            self.switch_read_task(wq);
            self.input_apply_task(wq);
            self.output_apply_task(wq);
            self.volume_apply_task(wq);
        } else {
            self.profile = Profile::Slave;
            self.start_slave(sw, stored, wq);
        }
    }

    /// Polls the switch register and applies changes.
    fn switch_read_task(&mut self, wq: &mut impl Scheduler) {
        self.pending.release(PendingEvent::SwitchRead);

        let state = self.hw.read_switches() & switches::MASK;

        if state != self.system.switches {
            match self.profile {
                Profile::Active => {
                    let boost = state & switches::OUTPUT_GAIN_BOOST != 0;

                    self.hw.set_clock_source(if state & switches::EXT_CLOCK != 0 {
                        ClockSource::External
                    } else {
                        ClockSource::Internal
                    });
                    self.hw.amp_set_gain(boost, boost);
                    self.hw.codec_set_sample_rate(if state & switches::SAMPLE_RATE != 0 {
                        48_000
                    } else {
                        44_100
                    });
                    self.hw.codec_set_agc(state & switches::INPUT_GAIN_AUTO != 0);

                    self.system.switches = state;
                }
                Profile::Slave => {
                    // The snapshot moves when the slave update is scheduled,
                    // not when it executes, so the echoed value never skips
                    // ahead of a change the engine has not been told about.
                    if self.schedule(wq, PendingEvent::Slave, Task::SlaveUpdate) {
                        self.system.switches = state;
                    }
                }
            }
        }

        if self.profile == Profile::Active {
            self.schedule(wq, PendingEvent::Led, Task::LedUpdate);
        }
    }

    /// Refreshes the LED bar.
    fn led_update_task(&mut self) {
        self.pending.release(PendingEvent::Led);

        let value = match self.profile {
            Profile::Active => {
                let blink_visible = self.indication.blink < CONTROL_UPDATE_RATE / 2;
                indicator::render(&self.config, blink_visible)
            }
            Profile::Slave => self.indication.override_byte,
        };

        self.hw.write_led(value);
    }

    /// Applies the configured input route to the codec.
    pub(crate) fn input_apply_task(&mut self, wq: &mut impl Scheduler) {
        self.pending.release(PendingEvent::Codec);

        self.hw.codec_set_input_path(self.config.input_path);

        self.schedule(wq, PendingEvent::Led, Task::LedUpdate);
    }

    /// Applies the configured output route to the codec and amplifier.
    pub(crate) fn output_apply_task(&mut self, wq: &mut impl Scheduler) {
        self.pending.release(PendingEvent::Codec);

        // The external amplifier is only powered on the line-out route.
        self.hw.amp_set_power(self.config.output_path == OutputPath::LineOut);
        self.hw.codec_set_output_path(self.config.output_path);

        self.schedule(wq, PendingEvent::Led, Task::LedUpdate);
    }

    /// Applies the configured gains to the codec, muting zero levels.
    pub(crate) fn volume_apply_task(&mut self, wq: &mut impl Scheduler) {
        self.pending.release(PendingEvent::Codec);

        if self.config.input_path != InputPath::None {
            self.hw.codec_set_input_gain(
                level_to_gain(self.config.input_level),
                self.config.input_level == 0,
            );
        }
        if self.config.output_path != OutputPath::None {
            self.hw.codec_set_output_gain(
                level_to_gain(self.config.output_level),
                self.config.output_level == 0,
            );
        }

        self.schedule(wq, PendingEvent::Led, Task::LedUpdate);
    }

    /// Blocks in low power until bus activity wakes the board.
    fn suspend_task(&mut self) {
        self.pending.release(PendingEvent::Suspend);

        self.hw.set_status_led(false);
        self.hw.suspend();
        self.hw.set_status_led(true);
    }

    fn on_mic_pressed(&mut self, wq: &mut impl Scheduler) {
        self.config.input_path = self.config.input_path.toggled();
        self.schedule(wq, PendingEvent::Codec, Task::InputApply);
    }

    fn on_spk_pressed(&mut self, wq: &mut impl Scheduler) {
        self.config.output_path = self.config.output_path.toggled();
        self.schedule(wq, PendingEvent::Codec, Task::OutputApply);
    }

    fn on_volume_down(&mut self, wq: &mut impl Scheduler) {
        match self.config.mode {
            Mode::None => self.config.mode = Mode::Spk,
            Mode::Mic => {
                // The level moves only if the apply task was actually queued.
                if self.config.input_level > MIN_LEVEL
                    && self.schedule(wq, PendingEvent::Codec, Task::VolumeApply)
                {
                    self.config.input_level -= 1;
                }
            }
            Mode::Spk => {
                if self.config.output_level > MIN_LEVEL
                    && self.schedule(wq, PendingEvent::Codec, Task::VolumeApply)
                {
                    self.config.output_level -= 1;
                }
            }
        }

        self.indication.active = MODE_ACTIVE_TIMEOUT;
    }

    fn on_volume_up(&mut self, wq: &mut impl Scheduler) {
        match self.config.mode {
            Mode::None => self.config.mode = Mode::Mic,
            Mode::Mic => {
                if self.config.input_level < MAX_LEVEL
                    && self.schedule(wq, PendingEvent::Codec, Task::VolumeApply)
                {
                    self.config.input_level += 1;
                }
            }
            Mode::Spk => {
                if self.config.output_level < MAX_LEVEL
                    && self.schedule(wq, PendingEvent::Codec, Task::VolumeApply)
                {
                    self.config.output_level += 1;
                }
            }
        }

        self.indication.active = MODE_ACTIVE_TIMEOUT;
    }
}
