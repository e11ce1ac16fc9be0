use serde::{Deserialize, Serialize};

use crate::time::LocalTime;

/// Per-type allocation within a [`BlockTypeConfig::Combo`] block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAllocation {
    pub type_id: String,
    pub ratio: f64,
}

/// How a [`WorkBlock`]'s capacity is divided among task types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BlockTypeConfig {
    /// Consumes no task capacity (breaks, sleep).
    System { kind: String },
    /// Accepts only `type_id`-matching tasks, or the `mixed` wildcard; the
    /// full block is available to that type.
    Single { type_id: String },
    /// Subdivides the block's minutes by ratio across several types.
    /// `sum(allocations.ratio) == 1.0`.
    Combo { allocations: Vec<TypeAllocation> },
}

impl BlockTypeConfig {
    pub fn single(type_id: impl Into<String>) -> Self {
        BlockTypeConfig::Single { type_id: type_id.into() }
    }

    pub fn combo(allocations: Vec<(&str, f64)>) -> Self {
        BlockTypeConfig::Combo {
            allocations: allocations
                .into_iter()
                .map(|(type_id, ratio)| TypeAllocation { type_id: type_id.to_string(), ratio })
                .collect(),
        }
    }
}

/// A contiguous interval within a day carrying a typed capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkBlock {
    pub id: String,
    pub start_time: LocalTime,
    pub end_time: LocalTime,
    pub type_config: BlockTypeConfig,
}

impl WorkBlock {
    /// Total minutes spanned by the block. Panics if `end_time <= start_time`
    /// — callers are expected to validate blocks at ingest (§3 invariant:
    /// `end` strictly after `start`).
    pub fn total_minutes(&self) -> i64 {
        let minutes = LocalTime::minutes_between(&self.start_time, &self.end_time);
        assert!(minutes > 0, "WorkBlock {} has end_time <= start_time", self.id);
        minutes
    }
}

/// A locked interval that consumes time but is never itself scheduled.
///
/// If `end_time <= start_time`, the meeting crosses midnight and its
/// effective end lands on the following calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkMeeting {
    pub id: String,
    pub name: String,
    pub start_time: LocalTime,
    pub end_time: LocalTime,
}

impl WorkMeeting {
    pub fn crosses_midnight(&self) -> bool {
        self.end_time <= self.start_time
    }
}

/// One day's work blocks and meetings. `blocks` must be disjoint within the
/// day (not enforced here; ingest's responsibility per §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyWorkPattern {
    pub date: crate::time::LocalDate,
    pub blocks: Vec<WorkBlock>,
    #[serde(default)]
    pub meetings: Vec<WorkMeeting>,
}
