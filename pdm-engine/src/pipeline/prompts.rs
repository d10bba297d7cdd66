//! Prompt templates for the generation pipeline

/// Stage 1: per-session entity extraction
pub fn entity_extraction_prompt(session_content: &str, vertical_name: &str) -> String {
    format!(
        r#"You are a privacy assessment analyst. Extract all privacy-relevant entities from this interview session transcript conducted for the "{vertical_name}" vertical.

For each entity found, categorize it as one of:
- DATA_ELEMENT: A specific type of personal or organizational data (e.g., "employee name", "customer email", "health records", "IP address")
- SYSTEM: A software system, application, or platform (e.g., "Salesforce", "HRMS", "AWS S3 bucket")
- ACTOR: A person, role, or team that interacts with data (e.g., "HR Manager", "external auditor", "marketing team")
- PROCESSING_ACTIVITY: An action performed on data (e.g., "collects", "stores", "shares with", "deletes after 2 years")
- THIRD_PARTY: An external organization (e.g., "payroll provider ADP", "cloud vendor AWS", "insurance company")

Rules:
- Be thorough - extract EVERY privacy-relevant entity mentioned.
- Normalize names (e.g., "employee email address" and "staff email" should both be "employee email").
- Include a direct or near-direct quote from the source text as context.
- Set confidence to 1.0 for explicitly mentioned entities, 0.7-0.9 for implied ones, and below 0.5 for uncertain ones.
- Do NOT invent entities that are not in the text.

Session content:
---
{session_content}
---

Return a JSON object with the schema: {{ session_id: string, entities: [{{ entity_type, name, context_quote, confidence }}] }}"#
    )
}

/// Stage 2: relationship graph construction from all extracted entities
pub fn relationship_graph_prompt(entities_json: &str, vertical_name: &str) -> String {
    format!(
        r#"You are a privacy assessment analyst. Given the following extracted entities from multiple interview sessions for the "{vertical_name}" vertical, construct a relationship graph.

For each unique DATA_ELEMENT, determine based on the extracted entity relationships:
- category: personal | sensitive_personal | non_personal | anonymized | pseudonymized
- data_subjects: who the data is about (e.g., ["employees", "customers"])
- collected_by: actors/roles that collect this data
- collection_methods: how it is collected
- systems: systems/apps that process this data
- storage_locations: where it is stored
- processing_activities: what is done with it
- access_roles: who can access it
- shared_with_internal: internal departments/teams it goes to
- shared_with_external: external parties it goes to
- cross_border: boolean, whether it crosses national borders
- cross_border_details: destination country and mechanism if applicable
- retention_info: how long it is kept
- consent_info: how consent is obtained
- source_session_ids: which session IDs mentioned this element
- confidence: overall confidence in the relationship mapping (0-1)

Rules:
- Merge entities that refer to the same thing (e.g., "employee email" and "staff email address").
- Take the UNION of information from all sessions - if Session 1 says "stored in HRMS" and Session 2 adds "also in Oracle DB", include both.
- Set confidence lower for relationships that are implied rather than explicit.
- Do NOT invent relationships not supported by the entities.

Extracted entities:
---
{entities_json}
---

Return a JSON object with the schema: {{ vertical_name: string, data_elements: [...] }}"#
    )
}

/// Stage 3: classification and enrichment
pub fn classification_prompt(
    data_elements_json: &str,
    vertical_name: &str,
    industry: &str,
    regulatory_scope: &[String],
) -> String {
    format!(
        r#"You are a privacy compliance expert. Classify the following data elements according to privacy regulations.

Vertical: {vertical_name}
Organization Industry: {industry}
Applicable Regulations: {regulations}

For each data element, populate ALL of the following fields. For any field where the source material is insufficient, set confidence_score below 0.5 and add a specific gap description to gaps_flagged.

Required fields per element:
- data_element_name, data_category, data_sub_category
- data_subjects, source_of_data, collection_method
- purpose_of_processing, legal_basis
- consent_mechanism (null if not applicable)
- processing_types, systems_applications
- storage_location, storage_format
- encryption_at_rest (yes/no/partial/unknown), encryption_in_transit (yes/no/partial/unknown)
- retention_period, retention_compliant, deletion_method
- access_roles (array of {{role, access_type}})
- data_recipients_internal, data_recipients_external
- third_party_details (array of {{party_name, purpose, agreement_type}} or null)
- cross_border_transfer, cross_border_details (null if not applicable)
- data_owner
- confidence_score (0-1, overall confidence)
- gaps_flagged (array of specific gaps like "Retention period not discussed", "Encryption status unknown")

Rules:
- NEVER fabricate data. If something was not discussed, flag it as a gap.
- Use the regulatory framework to infer legal basis where reasonable (e.g., DPDPA for India).
- Set confidence below 0.5 for any field that is inferred rather than explicitly stated.

Data elements with context:
---
{data_elements_json}
---

Return a JSON object with the schema: {{ elements: [...] }}"#,
        regulations = regulatory_scope.join(", ")
    )
}

/// Structured schema (Schema-1) synthesis from combined transcripts
pub fn schema_one_prompt(combined_transcript: &str) -> String {
    format!(
        r#"You are a Senior Data Protection and Systems Analyst performing a Privacy Impact Assessment. Read the provided interview transcript(s) and extract a Data Flow Diagram logic model enriched with data privacy metadata and process details.

## EXTRACTION RULES

### Nodes
Identify every entity in the system:
- EXTERNAL_ENTITY: People, departments, external systems, third parties, regulators, customers, employees.
- PROCESS: Any action, verb, logic step, workflow, automated task, or manual procedure that touches personal data.
- DATA_STORE: Databases, file systems, archives, cloud storage, SaaS platforms, email inboxes, spreadsheets, paper records.

For each node, extract data_elements: an array of distinct data categories the node handles, each with name, description, classification (one of "Public", "Internal", "Confidential", "PII/Sensitive", "Special Category"), purpose, retention_period, legal_basis, storage_location, and owner.

For PROCESS nodes, additionally extract sub_processes (name, description, routing) capturing every branch, IVR option, case category, and routing rule, plus an sla if mentioned.

For DATA_STORE nodes, additionally extract integrations (system, type, direction).

For all nodes, optionally extract reference_documents: policy documents, SOPs, or matrices mentioned in relation to the node.

### Flows
Identify every data flow - information moving from one node to another:
- source and target: Must reference valid node IDs.
- label: A human-readable description of what data is moving.
- data_elements: An array of data category names (strings) being transmitted.
- bi_directional: Whether data flows both ways.
- transfer_mechanism: How the data moves (e.g., "API", "Manual entry", "Email", "File transfer", "Automated sync", "Not specified").
- cross_border: Whether this flow involves cross-border data transfer (true/false/null if unknown).

## STRICT CONSTRAINTS
1. Node IDs must be unique strings prefixed by type: ext_XX, proc_XX, ds_XX.
2. type must be exactly one of: "EXTERNAL_ENTITY", "PROCESS", "DATA_STORE".
3. Every flow source and target must reference a valid node ID.
4. bi_directional must be a boolean.
5. Be EXHAUSTIVE - extract every data element, process, sub-process, and flow mentioned or implied in the transcript.
6. If a detail is not explicitly stated in the transcript, use "Not specified" rather than guessing.

Return a JSON object with the schema: {{ meta: {{ project_name?, vertical_name?, generated_at? }}, nodes: [...], flows: [...] }}

--- BEGIN TRANSCRIPTS ---
{combined_transcript}
--- END TRANSCRIPTS ---"#
    )
}

/// AI-assisted diagram synthesis from risk-scored matrix rows
pub fn diagram_synthesis_prompt(
    matrix_json: &str,
    vertical_name: &str,
    industry: &str,
) -> String {
    format!(
        r#"You are a privacy assessment analyst. Generate a Mermaid data flow diagram from the following risk-scored data matrix for the "{vertical_name}" vertical ({industry} industry).

Diagram requirements:
- Use "graph LR" flowchart syntax.
- Model data sources and external recipients as nodes, systems as processes, storage locations as data stores.
- One edge per data movement, labeled with the data element it carries.
- Mark flows of elements with risk_score >= 15 visually distinct.

Additionally compute:
- summary: a 2-3 sentence description of the overall data flow landscape.
- node_count and edge_count for the generated diagram.
- high_risk_flows: labels of flows carrying elements with risk_score >= 15.
- cross_border_flows: labels of flows where cross_border is true.
- unencrypted_flows: labels of flows where encryption at rest or in transit is "no".

Rules:
- Base the diagram ONLY on the matrix data provided; do not invent systems or recipients.
- Every listed flow label must appear in the diagram.

Data matrix:
---
{matrix_json}
---

Return a JSON object with the schema: {{ mermaid_code, summary, node_count, edge_count, high_risk_flows, cross_border_flows, unencrypted_flows }}"#
    )
}
