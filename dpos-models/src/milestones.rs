// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::amount::Amount;
use crate::config::constants::{REWARD_DISTANCE, REWARD_MILESTONES, REWARD_OFFSET};
use serde::{Deserialize, Serialize};

/// Block reward schedule: no reward before `offset`, then one milestone every `distance` blocks.
/// The last milestone applies forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSchedule {
    /// first rewarded height
    pub offset: u32,
    /// number of heights covered by each milestone
    pub distance: u32,
    /// reward of each milestone
    pub milestones: Vec<Amount>,
}

impl Default for MilestoneSchedule {
    fn default() -> Self {
        MilestoneSchedule {
            offset: REWARD_OFFSET,
            distance: REWARD_DISTANCE,
            milestones: REWARD_MILESTONES.to_vec(),
        }
    }
}

impl MilestoneSchedule {
    /// Index of the milestone in force at `height`
    pub fn calc_milestone(&self, height: u32) -> usize {
        let last = self.milestones.len().saturating_sub(1);
        if height < self.offset || self.distance == 0 {
            return 0;
        }
        let index = ((height - self.offset) / self.distance) as usize;
        index.min(last)
    }

    /// Reward of the block at `height`
    ///
    /// ```
    /// # use dpos_models::{Amount, MilestoneSchedule};
    /// let schedule = MilestoneSchedule {
    ///     offset: 10,
    ///     distance: 100,
    ///     milestones: vec![Amount::from_raw(5), Amount::from_raw(3)],
    /// };
    /// assert_eq!(schedule.calc_reward(9), Amount::zero());
    /// assert_eq!(schedule.calc_reward(10), Amount::from_raw(5));
    /// assert_eq!(schedule.calc_reward(110), Amount::from_raw(3));
    /// assert_eq!(schedule.calc_reward(1_000_000), Amount::from_raw(3));
    /// ```
    pub fn calc_reward(&self, height: u32) -> Amount {
        if height < self.offset {
            return Amount::zero();
        }
        self.milestones
            .get(self.calc_milestone(height))
            .copied()
            .unwrap_or_default()
    }
}
