//! Diagram synthesis artifact

use serde::{Deserialize, Serialize};

/// Output of the AI-assisted diagram synthesizer: Mermaid source plus the
/// summary statistics and categorized flow lists the schema demands.
/// Best-effort by contract; only the deterministic converter guarantees
/// reproducible output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramSynthesis {
    pub mermaid_code: String,
    pub summary: String,
    pub node_count: u32,
    pub edge_count: u32,
    pub high_risk_flows: Vec<String>,
    pub cross_border_flows: Vec<String>,
    pub unencrypted_flows: Vec<String>,
}
