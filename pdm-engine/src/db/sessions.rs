//! Interview session record access (pipeline boundary)

use pdm_common::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// One interview session: free-text notes plus optional file-derived text.
/// Read-only input to the pipeline; only finalized sessions are eligible.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewSession {
    pub session_id: Uuid,
    pub vertical_id: Uuid,
    pub session_number: i64,
    pub status: String,
    pub raw_text_notes: Option<String>,
    pub transcribed_text: Option<String>,
    pub interviewee_names: Vec<String>,
    pub interviewee_roles: Vec<String>,
}

impl InterviewSession {
    /// Combined textual content for generation prompts (empty when the
    /// session carries no text at all)
    pub fn combined_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(notes) = &self.raw_text_notes {
            if !notes.trim().is_empty() {
                parts.push(notes.clone());
            }
        }
        if let Some(transcript) = &self.transcribed_text {
            if !transcript.trim().is_empty() {
                parts.push(format!("Transcribed documents:\n{}", transcript));
            }
        }
        parts.join("\n\n")
    }
}

pub async fn save_session(pool: &SqlitePool, session: &InterviewSession) -> Result<()> {
    let interviewee_names = serde_json::to_string(&session.interviewee_names)
        .map_err(|e| Error::serialize("interviewee names", e))?;
    let interviewee_roles = serde_json::to_string(&session.interviewee_roles)
        .map_err(|e| Error::serialize("interviewee roles", e))?;

    sqlx::query(
        r#"
        INSERT INTO interview_sessions (
            session_id, vertical_id, session_number, status,
            raw_text_notes, transcribed_text, interviewee_names, interviewee_roles
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(session_id) DO UPDATE SET
            status = excluded.status,
            raw_text_notes = excluded.raw_text_notes,
            transcribed_text = excluded.transcribed_text,
            interviewee_names = excluded.interviewee_names,
            interviewee_roles = excluded.interviewee_roles
        "#,
    )
    .bind(session.session_id.to_string())
    .bind(session.vertical_id.to_string())
    .bind(session.session_number)
    .bind(&session.status)
    .bind(&session.raw_text_notes)
    .bind(&session.transcribed_text)
    .bind(&interviewee_names)
    .bind(&interviewee_roles)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the finalized sessions for a vertical, ordered by session number
pub async fn load_finalized_sessions(
    pool: &SqlitePool,
    vertical_id: Uuid,
) -> Result<Vec<InterviewSession>> {
    let rows = sqlx::query(
        r#"
        SELECT session_id, vertical_id, session_number, status,
               raw_text_notes, transcribed_text, interviewee_names, interviewee_roles
        FROM interview_sessions
        WHERE vertical_id = ? AND status = 'finalized'
        ORDER BY session_number ASC
        "#,
    )
    .bind(vertical_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let session_id: String = row.get("session_id");
            let vertical_id: String = row.get("vertical_id");
            let names: String = row.get("interviewee_names");
            let roles: String = row.get("interviewee_roles");

            Ok(InterviewSession {
                session_id: Uuid::parse_str(&session_id)
                    .map_err(|e| Error::corrupt("session id", e))?,
                vertical_id: Uuid::parse_str(&vertical_id)
                    .map_err(|e| Error::corrupt("vertical id", e))?,
                session_number: row.get("session_number"),
                status: row.get("status"),
                raw_text_notes: row.get("raw_text_notes"),
                transcribed_text: row.get("transcribed_text"),
                interviewee_names: serde_json::from_str(&names)
                    .map_err(|e| Error::corrupt("interviewee names", e))?,
                interviewee_roles: serde_json::from_str(&roles)
                    .map_err(|e| Error::corrupt("interviewee roles", e))?,
            })
        })
        .collect()
}
