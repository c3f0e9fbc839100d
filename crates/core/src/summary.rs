//! Dashboard figures derived from a level list.

use serde::Serialize;
use std::fmt;

use crate::model::{Level, LevelId};

/// Learner rank by share of completed modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rank {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Rank {
    /// `>= 75%` Platinum, `>= 50%` Gold, `>= 25%` Silver, otherwise Bronze.
    #[must_use]
    pub fn from_completion_rate(percent: f64) -> Self {
        if percent >= 75.0 {
            Rank::Platinum
        } else if percent >= 50.0 {
            Rank::Gold
        } else if percent >= 25.0 {
            Rank::Silver
        } else {
            Rank::Bronze
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rank::Bronze => "Bronze",
            Rank::Silver => "Silver",
            Rank::Gold => "Gold",
            Rank::Platinum => "Platinum",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelCompletion {
    pub level: LevelId,
    pub completed_modules: usize,
    pub total_modules: usize,
    /// Rounded percentage, 0 for a level without modules.
    pub percent: u8,
    /// Predicted earning increase in percent once this skill is learned.
    pub value_boost: u32,
}

/// Suggested next step on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// Finish the open level, currently at `percent`.
    Continue {
        level: LevelId,
        percent: u8,
        earning_boost: u32,
    },
    /// First locked level, opened by finishing the current one.
    UpNext { level: LevelId, earning_boost: u32 },
    /// Nothing open or locked remains; start over from the first level.
    Start { level: LevelId, earning_boost: u32 },
}

impl Recommendation {
    #[must_use]
    pub fn level(&self) -> LevelId {
        match self {
            Recommendation::Continue { level, .. }
            | Recommendation::UpNext { level, .. }
            | Recommendation::Start { level, .. } => *level,
        }
    }

    /// Predicted earning increase in percent.
    #[must_use]
    pub fn earning_boost(&self) -> u32 {
        match self {
            Recommendation::Continue { earning_boost, .. }
            | Recommendation::UpNext { earning_boost, .. }
            | Recommendation::Start { earning_boost, .. } => *earning_boost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub rank: Rank,
    pub completed_modules: usize,
    pub total_modules: usize,
    pub completion_rate: f64,
    pub levels: Vec<LevelCompletion>,
    pub recommendations: Vec<Recommendation>,
}

impl ProgressSummary {
    #[must_use]
    pub fn from_levels(levels: &[Level]) -> Self {
        let per_level: Vec<LevelCompletion> = levels
            .iter()
            .enumerate()
            .map(|(index, level)| level_completion(index, level))
            .collect();
        let total_modules: usize = per_level.iter().map(|l| l.total_modules).sum();
        let completed_modules: usize = per_level.iter().map(|l| l.completed_modules).sum();
        let completion_rate = ratio_percent(completed_modules, total_modules);

        Self {
            rank: Rank::from_completion_rate(completion_rate),
            completed_modules,
            total_modules,
            completion_rate,
            levels: per_level,
            recommendations: recommendations(levels),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio_percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rounded(percent: f64) -> u8 {
    percent.round().clamp(0.0, 100.0) as u8
}

/// A finished skill is worth 8% per position on the path, an unfinished one
/// a tenth of its completion.
fn value_boost(index: usize, percent: u8) -> u32 {
    if percent >= 100 {
        u32::try_from(index + 1).map_or(u32::MAX, |n| n.saturating_mul(8))
    } else {
        (u32::from(percent) + 5) / 10
    }
}

fn level_completion(index: usize, level: &Level) -> LevelCompletion {
    let total_modules = level.modules().len();
    let completed_modules = level.completed_modules();
    let percent = rounded(ratio_percent(completed_modules, total_modules));
    LevelCompletion {
        level: level.id(),
        completed_modules,
        total_modules,
        percent,
        value_boost: value_boost(index, percent),
    }
}

fn module_percent(level: &Level) -> u8 {
    rounded(ratio_percent(level.completed_modules(), level.modules().len()))
}

fn recommendations(levels: &[Level]) -> Vec<Recommendation> {
    let mut out = Vec::with_capacity(2);
    if let Some(open) = levels.iter().find(|l| l.is_unlocked() && !l.is_completed()) {
        out.push(Recommendation::Continue {
            level: open.id(),
            percent: module_percent(open),
            earning_boost: open.id().value().saturating_mul(5).saturating_add(10),
        });
    }
    if let Some(locked) = levels.iter().find(|l| !l.is_unlocked()) {
        out.push(Recommendation::UpNext {
            level: locked.id(),
            earning_boost: locked.id().value().saturating_mul(8).saturating_add(15),
        });
    }
    if out.is_empty() {
        if let Some(first) = levels.first() {
            out.push(Recommendation::Start {
                level: first.id(),
                earning_boost: 15,
            });
        }
    }
    out
}
