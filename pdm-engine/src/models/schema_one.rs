//! Structured schema (Schema-1): the canonical graph representation of a
//! vertical's data flows, feeding both the data mapping table and the
//! deterministic diagram converter.

use pdm_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn not_specified() -> String {
    "Not specified".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    ExternalEntity,
    Process,
    DataStore,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

/// A data category handled by one node, with its privacy metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDataElement {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "not_specified")]
    pub classification: String,
    #[serde(default = "not_specified")]
    pub purpose: String,
    #[serde(default = "not_specified")]
    pub retention_period: String,
    #[serde(default = "not_specified")]
    pub legal_basis: String,
    #[serde(default = "not_specified")]
    pub storage_location: String,
    #[serde(default = "not_specified")]
    pub owner: String,
}

/// A sub-step, branch, or category within a PROCESS node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubProcess {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "not_specified")]
    pub routing: String,
}

/// A system connection on a DATA_STORE node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub system: String,
    #[serde(rename = "type", default = "not_specified")]
    pub integration_type: String,
    #[serde(default = "not_specified")]
    pub direction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub data_elements: Vec<SchemaDataElement>,
    // PROCESS-specific
    #[serde(default)]
    pub sub_processes: Vec<SubProcess>,
    #[serde(default = "not_specified")]
    pub sla: String,
    // DATA_STORE-specific
    #[serde(default)]
    pub integrations: Vec<Integration>,
    // All nodes
    #[serde(default)]
    pub reference_documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFlow {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
    #[serde(default)]
    pub data_elements: Vec<String>,
    #[serde(default)]
    pub bi_directional: bool,
    #[serde(default = "not_specified")]
    pub transfer_mechanism: String,
    #[serde(default)]
    pub cross_border: Option<bool>,
}

/// The full structured schema document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaOne {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<SchemaMeta>,
    pub nodes: Vec<SchemaNode>,
    pub flows: Vec<SchemaFlow>,
}

impl SchemaOne {
    /// Structural validation: node ids must be unique and every flow
    /// endpoint must reference a known node.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "Duplicate node id: {}",
                    node.id
                )));
            }
        }
        for flow in &self.flows {
            for endpoint in [&flow.source, &flow.target] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(Error::InvalidInput(format!(
                        "Flow {} references unknown node id: {}",
                        flow.id, endpoint
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_schema() -> SchemaOne {
        serde_json::from_value(serde_json::json!({
            "nodes": [
                {"id": "ext_01", "type": "EXTERNAL_ENTITY", "label": "Customer"},
                {"id": "proc_01", "type": "PROCESS", "label": "Customer Care"}
            ],
            "flows": [
                {"id": "flow_01", "source": "ext_01", "target": "proc_01", "label": "Inbound call data"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_applied_on_deserialize() {
        let schema = minimal_schema();
        let node = &schema.nodes[1];
        assert_eq!(node.sla, "Not specified");
        assert!(node.data_elements.is_empty());
        let flow = &schema.flows[0];
        assert!(!flow.bi_directional);
        assert_eq!(flow.transfer_mechanism, "Not specified");
        assert_eq!(flow.cross_border, None);
    }

    #[test]
    fn test_validate_accepts_well_formed_schema() {
        assert!(minimal_schema().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_dangling_flow_endpoint() {
        let mut schema = minimal_schema();
        schema.flows[0].target = "ds_99".to_string();
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("unknown node id: ds_99"));
    }

    #[test]
    fn test_validate_rejects_duplicate_node_ids() {
        let mut schema = minimal_schema();
        schema.nodes[1].id = "ext_01".to_string();
        assert!(schema.validate().is_err());
    }
}
