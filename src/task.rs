//! Cooperative task scheduling primitives.
//!
//! The board core never calls into an executor directly. Event handlers post
//! [`Task`] values through an injected [`Scheduler`] capability, and the
//! platform (or a test) drains the queue and feeds tasks back into
//! [`Board::run`](crate::Board::run). Tasks execute strictly after the
//! posting handler returns, in FIFO order, run to completion.
//!
//! Admission control is a typed single-slot gate per task family: a
//! [`PendingEvent`] is claimed when the corresponding task is posted and
//! released by the task as its first action, so at most one instance of each
//! family is ever in flight.

use heapless::Deque;

/// A unit of work executed by the cooperative work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Task {
    /// One-shot board bring-up: settings load and profile selection.
    Startup,
    /// Poll the switch shift register and apply changes.
    SwitchRead,
    /// Refresh the LED bar.
    LedUpdate,
    /// Apply the configured input route to the codec.
    InputApply,
    /// Apply the configured output route to the codec and amplifier.
    OutputApply,
    /// Apply the configured input/output gains to the codec.
    VolumeApply,
    /// Service the I2C register bank.
    SlaveUpdate,
    /// Enter the low-power suspend state until bus activity.
    Suspend,
}

/// Pending-task families guarded by a single-admission slot each.
///
/// The three codec apply tasks share one slot: a second codec mutation is
/// never queued while one is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PendingEvent {
    /// Codec apply task (input path, output path or volume).
    Codec,
    /// Switch polling task.
    SwitchRead,
    /// LED refresh task.
    Led,
    /// Slave register bank service task.
    Slave,
    /// Suspend task.
    Suspend,
}

impl PendingEvent {
    fn mask(self) -> u8 {
        match self {
            PendingEvent::Codec => 1 << 0,
            PendingEvent::SwitchRead => 1 << 1,
            PendingEvent::Led => 1 << 2,
            PendingEvent::Slave => 1 << 3,
            PendingEvent::Suspend => 1 << 4,
        }
    }
}

/// The set of currently outstanding task families.
///
/// An event is claimed between "task posted" and "task started"; the task
/// itself releases the event on entry so new events can re-arm immediately.
/// There is no preemption, so a plain bit set is sufficient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pending(u8);

impl Pending {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Pending(0)
    }

    /// Returns `true` if a task of this family is outstanding.
    pub fn is_claimed(&self, event: PendingEvent) -> bool {
        self.0 & event.mask() != 0
    }

    /// Claims the slot. Must only be called after a successful post.
    pub fn claim(&mut self, event: PendingEvent) {
        self.0 |= event.mask();
    }

    /// Releases the slot. Every task calls this as its first action.
    pub fn release(&mut self, event: PendingEvent) {
        self.0 &= !event.mask();
    }

    /// Returns `true` if no task family is outstanding.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Error returned when the work queue cannot accept another task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

impl core::fmt::Display for QueueFull {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "work queue is full")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for QueueFull {}

/// Capability for posting work onto the cooperative run queue.
///
/// Posted tasks run strictly after the current handler returns, in FIFO
/// order, without preemption. Implement this for your executor, or use
/// [`WorkQueue`] directly.
pub trait Scheduler {
    /// Appends a task to the run queue.
    fn post(&mut self, task: Task) -> Result<(), QueueFull>;
}

/// A fixed-capacity FIFO work queue.
///
/// The platform drains it from its idle loop:
///
/// ```ignore
/// while let Some(task) = wq.pop() {
///     board.run(task, &mut wq);
/// }
/// ```
#[derive(Debug, Default)]
pub struct WorkQueue<const N: usize> {
    queue: Deque<Task, N>,
}

impl<const N: usize> WorkQueue<N> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self { queue: Deque::new() }
    }

    /// Removes and returns the oldest posted task.
    pub fn pop(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if no tasks are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<const N: usize> Scheduler for WorkQueue<N> {
    fn post(&mut self, task: Task) -> Result<(), QueueFull> {
        self.queue.push_back(task).map_err(|_| QueueFull)
    }
}
