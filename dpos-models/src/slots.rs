// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::ModelsResult;
use dpos_time::DposTime;

/// Converts between wall-clock time, epoch seconds and slot numbers.
///
/// Epoch time is the number of whole seconds elapsed since the chain epoch.
/// Slot `s` covers epoch times `[s * block_time, (s + 1) * block_time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotClock {
    epoch: DposTime,
    block_time: u32,
}

impl SlotClock {
    /// Creates a clock for a chain starting at `epoch` with slots of `block_time` seconds
    pub const fn new(epoch: DposTime, block_time: u32) -> Self {
        SlotClock { epoch, block_time }
    }

    /// Slot duration in seconds
    pub fn block_time(&self) -> u32 {
        self.block_time
    }

    /// Seconds since epoch at wall-clock time `now`, zero before the epoch
    pub fn epoch_time(&self, now: DposTime) -> u32 {
        now.saturating_sub(self.epoch).to_secs() as u32
    }

    /// Seconds since epoch now
    pub fn now_epoch_time(&self) -> ModelsResult<u32> {
        Ok(self.epoch_time(DposTime::now()?))
    }

    /// Wall-clock time of an epoch time
    pub fn real_time(&self, epoch_time: u32) -> DposTime {
        self.epoch
            .saturating_add(DposTime::from_secs(epoch_time as u64))
    }

    /// Slot containing `epoch_time`
    ///
    /// ```
    /// # use dpos_models::SlotClock;
    /// # use dpos_time::DposTime;
    /// let clock = SlotClock::new(DposTime::from_millis(0), 8);
    /// assert_eq!(clock.slot_number(15), 1);
    /// assert_eq!(clock.slot_number(16), 2);
    /// assert_eq!(clock.slot_time(2), 16);
    /// ```
    pub fn slot_number(&self, epoch_time: u32) -> u64 {
        (epoch_time / self.block_time.max(1)) as u64
    }

    /// Epoch time at which `slot` starts
    pub fn slot_time(&self, slot: u64) -> u32 {
        (slot * self.block_time as u64) as u32
    }

    /// Slot containing wall-clock time `now`
    pub fn slot_at(&self, now: DposTime) -> u64 {
        self.slot_number(self.epoch_time(now))
    }

    /// Current slot
    pub fn current_slot(&self) -> ModelsResult<u64> {
        Ok(self.slot_at(DposTime::now()?))
    }

    /// Whether `epoch_time` is the first second of a slot
    pub fn is_slot_aligned(&self, epoch_time: u32) -> bool {
        epoch_time % self.block_time.max(1) == 0
    }

    /// Forging is only allowed during the first half of a slot
    ///
    /// ```
    /// # use dpos_models::SlotClock;
    /// # use dpos_time::DposTime;
    /// let clock = SlotClock::new(DposTime::from_millis(0), 8);
    /// assert!(clock.is_forging_window(DposTime::from_millis(16_000)));
    /// assert!(clock.is_forging_window(DposTime::from_millis(19_999)));
    /// assert!(!clock.is_forging_window(DposTime::from_millis(20_000)));
    /// ```
    pub fn is_forging_window(&self, now: DposTime) -> bool {
        let slot_millis = self.block_time as u64 * 1000;
        if slot_millis == 0 {
            return false;
        }
        now.saturating_sub(self.epoch).to_millis() % slot_millis < slot_millis / 2
    }
}
