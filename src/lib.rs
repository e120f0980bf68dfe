#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Board`**: The process-wide state aggregate and task coordinator
//! - **`Profile`**: Active controller vs. I2C register slave, selected at startup
//! - **`Task` / `Scheduler` / `WorkQueue`**: Cooperative run-to-completion work units
//! - **`Pending`**: Typed single-admission gate preventing duplicate task scheduling
//! - **`AudioBoard`**: Trait to implement for your board peripherals
//! - **`ConfigMemory`**: Trait to implement for your settings storage
//! - **`RegisterOverlay`**: Typed view of the 9-byte I2C register bank
//! - **`SettingsRecord`**: CRC-8 protected persisted configuration
//!
//! Interrupt handlers call the `Board::on_*` entry points; those only claim a
//! pending slot and post a task. The platform drains the [`WorkQueue`] from
//! its idle loop and feeds every task into [`Board::run`].

pub mod board;
pub mod hw;
pub mod indicator;
pub mod overlay;
pub mod power;
pub mod settings;
pub mod slave;
pub mod task;
pub mod types;

pub use board::{
    AUTO_SUSPEND_TIMEOUT, BUS_MAX_RETRIES, Board, CONTROL_UPDATE_RATE, MODE_ACTIVE_TIMEOUT,
    Profile, SETTINGS_OFFSET,
};
pub use hw::{AudioBoard, ClockSource};
pub use overlay::{RegisterOverlay, SLAVE_ADDRESS, SLAVE_REG_COUNT};
pub use power::{PowerSense, VOLTAGE_THRESHOLD_MV};
pub use settings::{ConfigMemory, SETTINGS_LEN, SettingsRecord};
pub use task::{Pending, PendingEvent, QueueFull, Scheduler, Task, WorkQueue};
pub use types::{
    AudioConfig, Button, InputPath, MAX_LEVEL, MIN_LEVEL, Mode, OutputPath, switches,
};
