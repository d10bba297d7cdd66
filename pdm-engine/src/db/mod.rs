//! Database access for pdm-engine
//!
//! SQLite via sqlx; tables are created on startup with
//! `CREATE TABLE IF NOT EXISTS`. Array- and object-valued fields are
//! stored as JSON text columns.

pub mod dfd;
pub mod matrix;
pub mod sessions;
pub mod verticals;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create engine tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS verticals (
            vertical_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            industry TEXT NOT NULL DEFAULT 'General',
            regulatory_scope TEXT NOT NULL DEFAULT '[]',
            assessment_status TEXT NOT NULL DEFAULT 'pending'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interview_sessions (
            session_id TEXT PRIMARY KEY,
            vertical_id TEXT NOT NULL,
            session_number INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'draft',
            raw_text_notes TEXT,
            transcribed_text TEXT,
            interviewee_names TEXT NOT NULL DEFAULT '[]',
            interviewee_roles TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS data_matrix (
            vertical_id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'draft',
            generation_metadata TEXT,
            schema_one TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS data_matrix_rows (
            row_id TEXT PRIMARY KEY,
            vertical_id TEXT NOT NULL,
            data_element_name TEXT NOT NULL,
            data_category TEXT NOT NULL,
            data_sub_category TEXT,
            data_subjects TEXT NOT NULL DEFAULT '[]',
            source_of_data TEXT NOT NULL,
            collection_method TEXT NOT NULL,
            purpose_of_processing TEXT NOT NULL,
            legal_basis TEXT NOT NULL,
            consent_mechanism TEXT,
            processing_types TEXT NOT NULL DEFAULT '[]',
            systems_applications TEXT NOT NULL DEFAULT '[]',
            storage_location TEXT NOT NULL,
            storage_format TEXT NOT NULL,
            encryption_at_rest TEXT NOT NULL,
            encryption_in_transit TEXT NOT NULL,
            retention_period TEXT,
            retention_compliant INTEGER,
            deletion_method TEXT,
            access_roles TEXT NOT NULL DEFAULT '[]',
            data_recipients_internal TEXT NOT NULL DEFAULT '[]',
            data_recipients_external TEXT NOT NULL DEFAULT '[]',
            third_party_details TEXT,
            cross_border_transfer INTEGER NOT NULL DEFAULT 0,
            cross_border_details TEXT,
            data_owner TEXT NOT NULL,
            sensitivity_weight INTEGER NOT NULL,
            processing_risk INTEGER NOT NULL,
            volume_indicator INTEGER NOT NULL,
            exposure_factor INTEGER NOT NULL,
            risk_score INTEGER NOT NULL,
            confidence_score REAL NOT NULL,
            gaps_flagged TEXT NOT NULL DEFAULT '[]',
            source_session_ids TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL DEFAULT 'draft',
            generated_by TEXT NOT NULL DEFAULT 'ai'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS dfd_graphs (
            vertical_id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            mermaid_code TEXT NOT NULL,
            summary TEXT,
            node_count INTEGER NOT NULL DEFAULT 0,
            edge_count INTEGER NOT NULL DEFAULT 0,
            high_risk_flows TEXT NOT NULL DEFAULT '[]',
            cross_border_flows TEXT NOT NULL DEFAULT '[]',
            unencrypted_flows TEXT NOT NULL DEFAULT '[]',
            generated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (verticals, interview_sessions, data_matrix, data_matrix_rows, dfd_graphs)"
    );

    Ok(())
}
