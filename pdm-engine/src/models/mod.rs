//! Data model types for the assessment pipeline
//!
//! Each pipeline stage has a typed input/output pair; generation output is
//! deserialized directly into these types, which is what enforces the
//! stage schemas.

pub mod classified;
pub mod diagram;
pub mod entities;
pub mod graph;
pub mod matrix;
pub mod schema_one;

pub use classified::{
    AccessRole, ClassificationResult, ClassifiedDataElement, ConsentMechanism, CrossBorderDetail,
    EncryptionStatus, RiskFactors, ScoredElement, ThirdPartyDetail,
};
pub use diagram::DiagramSynthesis;
pub use entities::{EntityExtractionResult, EntityType, ExtractedEntity};
pub use graph::{DataCategory, DataElementRelationship, RelationshipGraphResult};
pub use matrix::MatrixRow;
pub use schema_one::{NodeType, SchemaFlow, SchemaMeta, SchemaNode, SchemaOne};
