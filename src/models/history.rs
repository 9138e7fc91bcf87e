use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::access_logs::{AccessDirection, AccessResult};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessHistoryItem {
    pub log_id: i64,
    pub card_id: Option<i64>,
    pub gate_id: i32,
    pub gate_name: String,
    pub direction: AccessDirection,
    pub result: AccessResult,
    pub timestamp: DateTime<Utc>,
}

/// 闸机显示名。1/2 号为普通闸机，3 号为 VIP 闸机
pub fn gate_name(gate_id: i32) -> String {
    match gate_id {
        1 => "Cổng 1".to_string(),
        2 => "Cổng 2".to_string(),
        3 => "Cổng VIP".to_string(),
        other => format!("Cổng {}", other),
    }
}

impl From<crate::entities::access_logs::Model> for AccessHistoryItem {
    fn from(log: crate::entities::access_logs::Model) -> Self {
        Self {
            log_id: log.log_id,
            card_id: log.card_id,
            gate_name: gate_name(log.gate_id),
            gate_id: log.gate_id,
            direction: log.direction,
            result: log.result,
            timestamp: log.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_name_mapping() {
        assert_eq!(gate_name(1), "Cổng 1");
        assert_eq!(gate_name(2), "Cổng 2");
        assert_eq!(gate_name(3), "Cổng VIP");
        assert_eq!(gate_name(7), "Cổng 7");
    }
}
