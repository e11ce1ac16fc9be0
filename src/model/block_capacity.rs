use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::block::BlockTypeConfig;

/// Runtime tracking of how much of a [`super::block::WorkBlock`] has been
/// consumed on a particular day. One `BlockCapacity` exists per
/// (block, day) pair materialized by the allocator.
#[derive(Debug, Clone)]
pub struct BlockCapacity {
    pub block_id: String,
    pub type_config: BlockTypeConfig,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_minutes: i64,
    pub used_minutes: i64,
    pub used_minutes_by_type: HashMap<String, i64>,
}

impl BlockCapacity {
    pub fn new(block_id: String, type_config: BlockTypeConfig, start_time: DateTime<Utc>, end_time: DateTime<Utc>, total_minutes: i64) -> Self {
        BlockCapacity {
            block_id,
            type_config,
            start_time,
            end_time,
            total_minutes,
            used_minutes: 0,
            used_minutes_by_type: HashMap::new(),
        }
    }

    pub fn record_usage(&mut self, type_id: Option<&str>, minutes: i64) {
        self.used_minutes += minutes;
        if let Some(type_id) = type_id {
            *self.used_minutes_by_type.entry(type_id.to_string()).or_insert(0) += minutes;
        }
    }
}
