//! Deterministic converter: structured schema → Mermaid DFD source
//!
//! Pure and total over well-formed schemas: the same input always yields
//! byte-identical output.

use crate::models::{NodeType, SchemaNode, SchemaOne};

/// Classification tiers that mark a node as handling sensitive data
const SENSITIVE_CLASSIFICATIONS: &[&str] = &["PII/Sensitive", "Special Category"];

/// Sanitize a label for use in Mermaid syntax
fn sanitize_label(label: &str) -> String {
    label
        .replace('"', "'")
        .replace('&', "and")
        .replace(['<', '>'], "")
}

fn style_class(node: &SchemaNode) -> &'static str {
    let has_sensitive = node
        .data_elements
        .iter()
        .any(|de| SENSITIVE_CLASSIFICATIONS.contains(&de.classification.as_str()));
    if has_sensitive {
        return "sensitive";
    }
    match node.node_type {
        NodeType::Process => "process",
        NodeType::ExternalEntity => "entity",
        NodeType::DataStore => "store",
    }
}

fn render_node(code: &mut String, node: &SchemaNode) {
    let label = sanitize_label(&node.label);
    let class = style_class(node);

    match node.node_type {
        NodeType::Process => {
            code.push_str(&format!("  {}(\"{}\"):::{}\n", node.id, label, class));
        }
        NodeType::ExternalEntity => {
            code.push_str(&format!("  {}[\"{}\"]:::{}\n", node.id, label, class));
        }
        NodeType::DataStore => {
            code.push_str(&format!("  {}[(\"{}\")]:::{}\n", node.id, label, class));
        }
    }
}

/// Render a structured schema as Mermaid flowchart source.
///
/// Nodes render with their DFD-standard shape per type, clustered into
/// typed subgraphs; a node whose data elements include a sensitive
/// classification gets the `sensitive` visual class; one edge per flow.
pub fn to_mermaid(schema: &SchemaOne) -> String {
    let mut code = String::from("graph TD\n");

    // Styling classes (DFD standard)
    code.push_str("  classDef process fill:#f9f,stroke:#333,stroke-width:2px;\n");
    code.push_str("  classDef entity fill:#ff9,stroke:#333,stroke-width:2px;\n");
    code.push_str("  classDef store fill:#eee,stroke:#333,stroke-dasharray:5 5;\n");
    code.push_str("  classDef sensitive fill:#fcc,stroke:#c33,stroke-width:2px;\n");

    // Group nodes by type using subgraphs for better layout
    let entities: Vec<_> = schema
        .nodes
        .iter()
        .filter(|n| n.node_type == NodeType::ExternalEntity)
        .collect();
    let processes: Vec<_> = schema
        .nodes
        .iter()
        .filter(|n| n.node_type == NodeType::Process)
        .collect();
    let stores: Vec<_> = schema
        .nodes
        .iter()
        .filter(|n| n.node_type == NodeType::DataStore)
        .collect();

    if !entities.is_empty() {
        code.push_str("  subgraph External Entities\n");
        for node in &entities {
            render_node(&mut code, node);
        }
        code.push_str("  end\n");
    }

    if !processes.is_empty() {
        code.push_str("  subgraph Processes\n");
        for node in &processes {
            render_node(&mut code, node);
        }
        code.push_str("  end\n");
    }

    if !stores.is_empty() {
        code.push_str("  subgraph Data Stores\n");
        for node in &stores {
            render_node(&mut code, node);
        }
        code.push_str("  end\n");
    }

    // One edge per flow
    for flow in &schema.flows {
        let label = sanitize_label(&flow.label);
        code.push_str(&format!(
            "  {} -->|\"{}\"| {}\n",
            flow.source, label, flow.target
        ));
    }

    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> SchemaOne {
        serde_json::from_value(serde_json::json!({
            "meta": {"vertical_name": "Customer Care"},
            "nodes": [
                {"id": "ext_01", "type": "EXTERNAL_ENTITY", "label": "Customer"},
                {
                    "id": "proc_01",
                    "type": "PROCESS",
                    "label": "Query Handling",
                    "data_elements": [
                        {"name": "Call Recordings", "classification": "PII/Sensitive"}
                    ]
                },
                {"id": "ds_01", "type": "DATA_STORE", "label": "Salesforce CRM"}
            ],
            "flows": [
                {"id": "flow_01", "source": "ext_01", "target": "proc_01", "label": "Inbound call data"},
                {"id": "flow_02", "source": "proc_01", "target": "ds_01", "label": "Query records"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_referential_transparency() {
        let schema = sample_schema();
        assert_eq!(to_mermaid(&schema), to_mermaid(&schema));
    }

    #[test]
    fn test_node_shapes_by_type() {
        let code = to_mermaid(&sample_schema());
        assert!(code.contains("ext_01[\"Customer\"]:::entity"));
        assert!(code.contains("proc_01(\"Query Handling\"):::sensitive"));
        assert!(code.contains("ds_01[(\"Salesforce CRM\")]:::store"));
    }

    #[test]
    fn test_sensitive_class_overrides_type_class() {
        let code = to_mermaid(&sample_schema());
        assert!(code.contains(":::sensitive"));
        assert!(!code.contains("proc_01(\"Query Handling\"):::process"));
    }

    #[test]
    fn test_typed_clusters_rendered_only_when_populated() {
        let code = to_mermaid(&sample_schema());
        assert!(code.contains("subgraph External Entities"));
        assert!(code.contains("subgraph Processes"));
        assert!(code.contains("subgraph Data Stores"));

        let empty: SchemaOne =
            serde_json::from_value(serde_json::json!({"nodes": [], "flows": []})).unwrap();
        let code = to_mermaid(&empty);
        assert!(!code.contains("subgraph"));
        assert!(code.starts_with("graph TD\n"));
    }

    #[test]
    fn test_one_edge_per_flow_with_label() {
        let code = to_mermaid(&sample_schema());
        assert!(code.contains("ext_01 -->|\"Inbound call data\"| proc_01"));
        assert!(code.contains("proc_01 -->|\"Query records\"| ds_01"));
    }

    #[test]
    fn test_label_sanitization() {
        let mut schema = sample_schema();
        schema.nodes[0].label = "Customers & \"Guests\" <VIP>".to_string();
        let code = to_mermaid(&schema);
        assert!(code.contains("ext_01[\"Customers and 'Guests' VIP\"]:::entity"));
    }
}
