use std::collections::HashMap;

use serde::Serialize;

use crate::registry::AgentEntry;

/// Registry entry annotated with derived liveness
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    #[serde(flatten)]
    pub agent: AgentEntry,
    pub alive: bool,
}

/// True when `live_windows` (window id -> instance tag) holds the agent's
/// window carrying the instance token recorded at spawn. A matching id alone
/// is not enough: a restarted server hands out the same ids again.
pub fn is_alive(agent: &AgentEntry, live_windows: &HashMap<String, String>) -> bool {
    !agent.instance_id.is_empty()
        && live_windows.get(&agent.window_id) == Some(&agent.instance_id)
}

/// Annotate each agent with `is_alive`. Order of `agents` is preserved.
pub fn annotate_liveness(
    agents: Vec<AgentEntry>,
    live_windows: &HashMap<String, String>,
) -> Vec<AgentStatus> {
    agents
        .into_iter()
        .map(|agent| {
            let alive = is_alive(&agent, live_windows);
            AgentStatus { agent, alive }
        })
        .collect()
}
