// --- Trading loop event stream ---

use chrono::{DateTime, Utc};
use core_types::{ExitReason, LoopPhase, OrderHandle, Signal};
use rust_decimal::Decimal;
use serde::Serialize;
use strategies::MarketSnapshot;

/// What the loop was doing when the broker call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerAction {
    EntryBuy,
    ExitCloseAll,
    ExitMarketSell,
    BuyingPower,
}

/// Everything a running loop reports to observers.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum LoopEvent {
    PhaseChanged {
        strategy_id: String,
        timestamp: DateTime<Utc>,
        phase: LoopPhase,
    },
    Evaluated {
        strategy_id: String,
        snapshot: MarketSnapshot,
        signal: Signal,
    },
    OrderSubmitted {
        strategy_id: String,
        order: OrderHandle,
    },
    BrokerFailure {
        strategy_id: String,
        timestamp: DateTime<Utc>,
        action: BrokerAction,
        message: String,
    },
    CapitalRefreshed {
        strategy_id: String,
        capital: Decimal,
    },
    Exited {
        strategy_id: String,
        timestamp: DateTime<Utc>,
        reason: ExitReason,
        ticks: u64,
    },
}

impl LoopEvent {
    /// The loop that produced this event.
    pub fn strategy_id(&self) -> &str {
        match self {
            LoopEvent::PhaseChanged { strategy_id, .. }
            | LoopEvent::Evaluated { strategy_id, .. }
            | LoopEvent::OrderSubmitted { strategy_id, .. }
            | LoopEvent::BrokerFailure { strategy_id, .. }
            | LoopEvent::CapitalRefreshed { strategy_id, .. }
            | LoopEvent::Exited { strategy_id, .. } => strategy_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn events_serialize_with_type_and_payload() {
        let event = LoopEvent::Exited {
            strategy_id: "AAPL_15m_single_ma".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap(),
            reason: ExitReason::DataUnavailable("empty series".to_string()),
            ticks: 3,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Exited");
        assert_eq!(json["payload"]["reason"]["kind"], "data_unavailable");
        assert_eq!(json["payload"]["reason"]["detail"], "empty series");
        assert_eq!(json["payload"]["ticks"], 3);
        assert_eq!(event.strategy_id(), "AAPL_15m_single_ma");
    }

    #[test]
    fn holding_phase_carries_position() {
        let event = LoopEvent::PhaseChanged {
            strategy_id: "x".to_string(),
            timestamp: Utc::now(),
            phase: LoopPhase::Holding { position: None },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["payload"]["phase"]["phase"], "holding");
        assert!(json["payload"]["phase"]["position"].is_null());
    }
}
