//! Shared test infrastructure for audioboard-control integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use audioboard_control::settings::ConfigMemory;
use audioboard_control::{
    AudioBoard, Board, ClockSource, InputPath, OutputPath, SETTINGS_OFFSET, SLAVE_REG_COUNT,
    SettingsRecord, Task, WorkQueue, switches,
};

// ============================================================================
// Mock Board Hardware
// ============================================================================

/// Mock peripherals recording every call made by the control core.
///
/// Test-side state (`switch_state`, `slave_regs`, `backup`) stands in for
/// the outside world: the switch register, the register bank as last left
/// by the remote master, and the battery-retained memory.
pub struct MockHardware {
    /// Value the switch shift register returns.
    pub switch_state: u8,
    /// Every byte written to the LED bar, in order.
    pub led_writes: Vec<u8>,
    /// Status LED level history.
    pub status_led: Vec<bool>,
    /// Current register bank contents, updated by `slave_write`.
    pub slave_regs: [u8; SLAVE_REG_COUNT],
    /// Every full bank written back, in order.
    pub slave_writes: Vec<[u8; SLAVE_REG_COUNT]>,
    /// Battery-retained words.
    pub backup: [u32; 2],

    pub clock_source: Option<ClockSource>,
    pub input_path: Option<InputPath>,
    pub output_path: Option<OutputPath>,
    pub input_gain: Option<(u8, bool)>,
    pub output_gain: Option<(u8, bool)>,
    pub sample_rate: Option<u32>,
    pub agc: Option<bool>,
    pub amp_power: Option<bool>,
    pub amp_gain: Option<(bool, bool)>,

    pub codec_resets: usize,
    pub bus_recoveries: usize,
    pub watchdog_reloads: usize,
    pub suspend_calls: usize,
    pub reset_calls: usize,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            switch_state: 0,
            led_writes: Vec::new(),
            status_led: Vec::new(),
            slave_regs: [0; SLAVE_REG_COUNT],
            slave_writes: Vec::new(),
            backup: [0; 2],
            clock_source: None,
            input_path: None,
            output_path: None,
            input_gain: None,
            output_gain: None,
            sample_rate: None,
            agc: None,
            amp_power: None,
            amp_gain: None,
            codec_resets: 0,
            bus_recoveries: 0,
            watchdog_reloads: 0,
            suspend_calls: 0,
            reset_calls: 0,
        }
    }

    /// Last byte written to the LED bar.
    pub fn led(&self) -> u8 {
        *self.led_writes.last().expect("no LED write recorded")
    }

    /// Last full bank written back to the slave interface.
    pub fn last_slave_write(&self) -> [u8; SLAVE_REG_COUNT] {
        *self.slave_writes.last().expect("no slave write recorded")
    }
}

impl AudioBoard for MockHardware {
    fn read_switches(&mut self) -> u8 {
        self.switch_state
    }

    fn write_led(&mut self, value: u8) {
        self.led_writes.push(value);
    }

    fn set_status_led(&mut self, on: bool) {
        self.status_led.push(on);
    }

    fn set_clock_source(&mut self, source: ClockSource) {
        self.clock_source = Some(source);
    }

    fn codec_set_input_path(&mut self, path: InputPath) {
        self.input_path = Some(path);
    }

    fn codec_set_output_path(&mut self, path: OutputPath) {
        self.output_path = Some(path);
    }

    fn codec_set_input_gain(&mut self, gain: u8, mute: bool) {
        self.input_gain = Some((gain, mute));
    }

    fn codec_set_output_gain(&mut self, gain: u8, mute: bool) {
        self.output_gain = Some((gain, mute));
    }

    fn codec_set_sample_rate(&mut self, rate: u32) {
        self.sample_rate = Some(rate);
    }

    fn codec_set_agc(&mut self, enabled: bool) {
        self.agc = Some(enabled);
    }

    fn codec_reset(&mut self) {
        self.codec_resets += 1;
    }

    fn bus_recover(&mut self) {
        self.bus_recoveries += 1;
    }

    fn amp_set_power(&mut self, on: bool) {
        self.amp_power = Some(on);
    }

    fn amp_set_gain(&mut self, gain0: bool, gain1: bool) {
        self.amp_gain = Some((gain0, gain1));
    }

    fn slave_read(&mut self, regs: &mut [u8; SLAVE_REG_COUNT]) {
        *regs = self.slave_regs;
    }

    fn slave_write(&mut self, regs: &[u8; SLAVE_REG_COUNT]) {
        self.slave_regs = *regs;
        self.slave_writes.push(*regs);
    }

    fn backup_store(&mut self, words: [u32; 2]) {
        self.backup = words;
    }

    fn backup_load(&mut self) -> [u32; 2] {
        self.backup
    }

    fn watchdog_reload(&mut self) {
        self.watchdog_reloads += 1;
    }

    fn suspend(&mut self) {
        self.suspend_calls += 1;
    }

    fn system_reset(&mut self) {
        self.reset_calls += 1;
    }
}

// ============================================================================
// Mock Configuration Memory
// ============================================================================

/// RAM-backed flash-style memory, large enough to hold the settings sector.
pub struct MockMemory {
    pub data: Vec<u8>,
    position: usize,
    pub erase_count: usize,
}

impl MockMemory {
    pub fn new() -> Self {
        Self {
            data: vec![0xFF; 32 * 1024],
            position: 0,
            erase_count: 0,
        }
    }

    /// Preloads a valid settings record at the fixed offset.
    pub fn with_settings(record: &SettingsRecord) -> Self {
        let mut memory = Self::new();
        let encoded = record.encode();
        let offset = SETTINGS_OFFSET as usize;
        memory.data[offset..offset + encoded.len()].copy_from_slice(&encoded);
        memory
    }

    /// The record bytes currently stored at the fixed offset.
    pub fn stored_record(&self) -> [u8; audioboard_control::SETTINGS_LEN] {
        let offset = SETTINGS_OFFSET as usize;
        self.data[offset..offset + audioboard_control::SETTINGS_LEN]
            .try_into()
            .unwrap()
    }
}

impl ConfigMemory for MockMemory {
    type Error = ();

    fn set_position(&mut self, offset: u32) -> Result<(), ()> {
        if offset as usize >= self.data.len() {
            return Err(());
        }
        self.position = offset as usize;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<(), ()> {
        if self.position + buffer.len() > self.data.len() {
            return Err(());
        }
        buffer.copy_from_slice(&self.data[self.position..self.position + buffer.len()]);
        self.position += buffer.len();
        Ok(())
    }

    fn write(&mut self, buffer: &[u8]) -> Result<(), ()> {
        if self.position + buffer.len() > self.data.len() {
            return Err(());
        }
        self.data[self.position..self.position + buffer.len()].copy_from_slice(buffer);
        self.position += buffer.len();
        Ok(())
    }

    fn erase_sector(&mut self, offset: u32) -> Result<(), ()> {
        self.erase_count += 1;
        let start = offset as usize & !0xFFF;
        let end = (start + 0x1000).min(self.data.len());
        self.data[start..end].fill(0xFF);
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub type TestBoard = Board<MockHardware, MockMemory>;
pub type TestQueue = WorkQueue<16>;

/// Runs queued tasks to completion, including any they post.
pub fn drain(board: &mut TestBoard, wq: &mut TestQueue) {
    while let Some(task) = wq.pop() {
        board.run(task, wq);
    }
}

/// Boots a board with the given switch state and drains startup.
pub fn boot(switch_state: u8, memory: MockMemory) -> (TestBoard, TestQueue) {
    let mut hw = MockHardware::new();
    hw.switch_state = switch_state;

    let mut board = Board::new(hw, memory);
    let mut wq = TestQueue::new();
    board.start(&mut wq).unwrap();
    drain(&mut board, &mut wq);

    (board, wq)
}

/// Boots into the active profile with default settings memory.
pub fn boot_active() -> (TestBoard, TestQueue) {
    boot(switches::ACTIVE, MockMemory::new())
}

/// Boots into the slave profile with default settings memory.
pub fn boot_slave() -> (TestBoard, TestQueue) {
    boot(0, MockMemory::new())
}

/// Pops exactly the expected next task and runs it.
pub fn run_expected(board: &mut TestBoard, wq: &mut TestQueue, expected: Task) {
    let task = wq.pop().expect("expected a queued task");
    assert_eq!(task, expected);
    board.run(task, wq);
}
