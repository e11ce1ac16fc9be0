//! Capacity Model (C3): how much of a [`WorkBlock`] a given task type may
//! consume.

use crate::model::BlockTypeConfig;

/// The wildcard type id that may be scheduled into any `Single` block,
/// consuming that block's full per-type capacity (Open Question (a), pinned
/// in SPEC_FULL.md §4.3: `mixed` does *not* get special combo semantics).
pub const MIXED_TYPE_ID: &str = "mixed";

/// The fraction of a block's minutes available to `type_id`, in `[0, 1]`.
pub fn type_ratio_in_block(type_id: &str, cfg: &BlockTypeConfig) -> f64 {
    match cfg {
        BlockTypeConfig::System { .. } => 0.0,
        BlockTypeConfig::Single { type_id: block_type } => {
            if block_type == type_id || type_id == MIXED_TYPE_ID {
                1.0
            } else {
                0.0
            }
        }
        BlockTypeConfig::Combo { allocations } => allocations
            .iter()
            .find(|a| a.type_id == type_id)
            .map(|a| a.ratio)
            .unwrap_or(0.0),
    }
}

/// `ratio(type_id, cfg) * total_minutes`: the minutes of `type_id` capacity a
/// block offers in total (not accounting for what's already used).
pub fn capacity_for_task_type(cfg: &BlockTypeConfig, total_minutes: i64, type_id: &str) -> i64 {
    (type_ratio_in_block(type_id, cfg) * total_minutes as f64).round() as i64
}

/// Whether a block can accept this type at all (nonzero ratio).
pub fn block_accepts_type(cfg: &BlockTypeConfig, type_id: &str) -> bool {
    type_ratio_in_block(type_id, cfg) > 0.0
}
