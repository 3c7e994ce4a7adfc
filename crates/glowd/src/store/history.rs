//! Append-only rule history, newest first.
//!
//! History lives only for the process lifetime; nothing here touches disk.

use super::state::RuleAction;
use super::state::RuleRecord;
use super::state::RuleStatus;
use super::state::State;

/// Prepend a new active rule record dated `date` (`YYYY-MM-DD`).
pub fn record(state: &mut State, action: RuleAction, description: String, date: String) -> u64 {
    let id = state.next_rule_id;
    state.next_rule_id += 1;
    state.rules.insert(
        0,
        RuleRecord {
            id,
            date,
            action,
            description,
            status: RuleStatus::Active,
        },
    );
    id
}
