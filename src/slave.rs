//! The slave register engine.
//!
//! In the slave profile an external I2C master owns the board through the
//! nine-register bank described in [`crate::overlay`]. Every write-complete
//! notification schedules one service pass: the pass reads the whole bank,
//! honors the control bits, recomputes the board-owned fields and writes
//! the bank back. No overlay state survives between passes; everything the
//! engine needs later lives in the board aggregate or in backup memory.

use crate::board::{AUTO_SUSPEND_TIMEOUT, Board, SETTINGS_OFFSET};
use crate::hw::{AudioBoard, ClockSource};
use crate::overlay::{
    CTL_GAIN0, CTL_GAIN1, CTL_MASK, CTL_POWER, RESET_RESET, RegisterOverlay, SLAVE_REG_COUNT,
    STATUS_POWER_READY, SYS_EXT_CLOCK, SYS_MASK, SYS_SAVE_CONFIG, SYS_SUSPEND, SYS_SUSPEND_AUTO,
};
use crate::settings::{self, ConfigMemory, SettingsRecord};
use crate::task::{PendingEvent, Scheduler, Task};
use crate::types::switches;

/// Guard word marking a valid backup state.
const BACKUP_MAGIC: u32 = 0x4241_4B31;

impl<H: AudioBoard, M: ConfigMemory> Board<H, M> {
    /// Slave-profile startup: seeds and publishes the initial register bank.
    ///
    /// Recovery precedence for the control registers, strongest first:
    /// the backup word from before the last reset, then the configuration
    /// switches. The persisted settings record, when valid, seeds the path
    /// and level registers independently of that choice.
    pub(crate) fn start_slave(
        &mut self,
        sw: u8,
        stored: Option<SettingsRecord>,
        wq: &mut impl Scheduler,
    ) {
        self.system.switches = sw;

        let mut overlay = RegisterOverlay::default();
        overlay.sw = sw;

        if let Some(record) = &stored {
            overlay.apply_settings(record);
        }

        if let Some(state) = self.recover_backup() {
            overlay.sys = state as u8;
            overlay.ctl = (state >> 8) as u8;
            overlay.led = (state >> 16) as u8;
        } else {
            if sw & switches::EXT_CLOCK != 0 {
                overlay.sys |= SYS_EXT_CLOCK;
            }
            if sw & switches::OUTPUT_GAIN_BOOST != 0 {
                overlay.ctl |= CTL_GAIN0 | CTL_GAIN1;
            }
        }

        self.hw.slave_write(&overlay.to_bytes());
        self.slave_update_task(wq);
    }

    /// One service pass over the register bank.
    pub(crate) fn slave_update_task(&mut self, wq: &mut impl Scheduler) {
        self.pending.release(PendingEvent::Slave);

        let mut regs = [0u8; SLAVE_REG_COUNT];
        self.hw.slave_read(&mut regs);
        let mut overlay = RegisterOverlay::from_bytes(&regs);

        // Hard reset: intentionally no cleanup and no write-back. On
        // hardware the call does not return.
        if overlay.reset & RESET_RESET != 0 {
            self.hw.system_reset();
            return;
        }

        if overlay.sys & SYS_EXT_CLOCK != 0 {
            // The one-shot suspend request is cleared only once its task is
            // queued; a full queue leaves the bit armed for the next pass.
            if overlay.sys & SYS_SUSPEND != 0
                && self.schedule(wq, PendingEvent::Suspend, Task::Suspend)
            {
                overlay.sys &= !SYS_SUSPEND;
            }

            self.system.autosuspend = overlay.sys & SYS_SUSPEND_AUTO != 0;
            self.hw.set_clock_source(ClockSource::External);
        } else {
            self.system.autosuspend = false;
            self.hw.set_clock_source(ClockSource::Internal);
        }

        if overlay.sys & SYS_SAVE_CONFIG != 0 {
            let record = overlay.to_settings();
            settings::save(&mut self.memory, SETTINGS_OFFSET, &record);

            overlay.sys &= !SYS_SAVE_CONFIG;
        }

        self.hw.amp_set_power(overlay.ctl & CTL_POWER != 0);
        self.hw
            .amp_set_gain(overlay.ctl & CTL_GAIN0 != 0, overlay.ctl & CTL_GAIN1 != 0);

        // Board-owned status: whatever the master wrote is discarded.
        overlay.status = if self.power.is_powered() {
            STATUS_POWER_READY
        } else {
            0
        };

        if self.indication.override_byte != overlay.led {
            self.indication.override_byte = overlay.led;
            self.schedule(wq, PendingEvent::Led, Task::LedUpdate);
        }

        overlay.sw = self.system.switches;
        overlay.sys &= SYS_MASK;
        overlay.ctl &= CTL_MASK;

        self.save_backup(
            overlay.sys as u32 | (overlay.ctl as u32) << 8 | (overlay.led as u32) << 16,
        );
        self.hw.slave_write(&overlay.to_bytes());

        self.system.suspend_timeout = if self.system.autosuspend {
            AUTO_SUSPEND_TIMEOUT
        } else {
            0
        };
    }

    /// Persists the packed control state for crash recovery.
    fn save_backup(&mut self, state: u32) {
        self.hw.backup_store([BACKUP_MAGIC, state]);
    }

    /// Recovers the packed control state saved before the last reset.
    fn recover_backup(&mut self) -> Option<u32> {
        let words = self.hw.backup_load();
        (words[0] == BACKUP_MAGIC).then_some(words[1])
    }
}
