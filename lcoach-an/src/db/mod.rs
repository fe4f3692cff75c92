//! Result persistence
//!
//! Finished reports land in a local SQLite database. The stored rows
//! carry the creation timestamp; rubric results themselves stay
//! timestamp-free so scoring remains deterministic.

use crate::error::{AnalysisError, AnalysisResult};
use crate::pipeline::{AnalysisReport, ResultStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use uuid::Uuid;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> AnalysisResult<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc creates the file on first use
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;
    Ok(pool)
}

async fn init_tables(pool: &SqlitePool) -> AnalysisResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
            analysis_id TEXT PRIMARY KEY,
            pipeline_id TEXT NOT NULL,
            video_path TEXT NOT NULL,
            total_score REAL NOT NULL,
            grade TEXT NOT NULL,
            overall_confidence REAL NOT NULL,
            preset TEXT NOT NULL,
            version TEXT NOT NULL,
            dimension_scores TEXT NOT NULL,
            report TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_analyses_video_path ON analyses(video_path, created_at)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (analyses)");
    Ok(())
}

/// One dimension as it is stored, queryable without the full report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionRecord {
    /// Korean dimension label
    pub name: String,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    /// Band label for this dimension
    pub grade: String,
    pub confidence: f64,
}

/// One stored evaluation, as the growth analyzer consumes it
#[derive(Debug, Clone)]
pub struct ScoreSnapshot {
    pub analysis_id: Uuid,
    pub video_path: String,
    pub created_at: DateTime<Utc>,
    pub total_score: f64,
    pub preset: String,
    pub version: String,
    pub dimensions: Vec<DimensionRecord>,
}

/// SQLite-backed report store
#[derive(Clone)]
pub struct SqliteResultStore {
    pool: SqlitePool,
}

impl SqliteResultStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stored evaluations whose video path starts with `video_prefix`,
    /// oldest first
    pub async fn history(
        &self,
        video_prefix: &str,
        limit: u32,
    ) -> AnalysisResult<Vec<ScoreSnapshot>> {
        let pattern = format!("{}%", video_prefix);
        let rows = sqlx::query(
            r#"
            SELECT analysis_id, video_path, created_at, total_score,
                   preset, version, dimension_scores
            FROM analyses
            WHERE video_path LIKE ?
            ORDER BY created_at ASC
            LIMIT ?
            "#,
        )
        .bind(&pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in rows {
            let analysis_id: String = row.get("analysis_id");
            let created_at: String = row.get("created_at");
            let dimension_scores: String = row.get("dimension_scores");
            snapshots.push(ScoreSnapshot {
                analysis_id: Uuid::parse_str(&analysis_id)
                    .map_err(|e| AnalysisError::InvalidInput(format!("bad analysis_id: {e}")))?,
                video_path: row.get("video_path"),
                created_at: DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| AnalysisError::InvalidInput(format!("bad created_at: {e}")))?
                    .with_timezone(&Utc),
                total_score: row.get("total_score"),
                preset: row.get("preset"),
                version: row.get("version"),
                dimensions: serde_json::from_str(&dimension_scores)?,
            });
        }
        Ok(snapshots)
    }

    /// Full stored report by id
    pub async fn load(&self, analysis_id: Uuid) -> AnalysisResult<Option<serde_json::Value>> {
        let row = sqlx::query("SELECT report FROM analyses WHERE analysis_id = ?")
            .bind(analysis_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let report: String = row.get("report");
                Ok(Some(serde_json::from_str(&report)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn save(&self, report: &AnalysisReport) -> AnalysisResult<Uuid> {
        let analysis_id = Uuid::new_v4();
        let dimensions: Vec<DimensionRecord> = report
            .rubric
            .dimension_scores
            .iter()
            .map(|d| DimensionRecord {
                name: d.dimension.label().to_string(),
                score: d.score,
                max_score: d.max_score,
                percentage: d.ratio() * 100.0,
                grade: d.band.label().to_string(),
                confidence: d.confidence,
            })
            .collect();

        sqlx::query(
            r#"
            INSERT INTO analyses (
                analysis_id, pipeline_id, video_path, total_score, grade,
                overall_confidence, preset, version, dimension_scores,
                report, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(analysis_id.to_string())
        .bind(report.pipeline_id.to_string())
        .bind(&report.video_path)
        .bind(report.rubric.total_score)
        .bind(&report.rubric.grade)
        .bind(report.rubric.confidence.overall_confidence)
        .bind(&report.rubric.preset)
        .bind(&report.rubric.version)
        .bind(serde_json::to_string(&dimensions)?)
        .bind(serde_json::to_string(report)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            analysis_id = %analysis_id,
            video_path = %report.video_path,
            "Analysis persisted"
        );
        Ok(analysis_id)
    }
}
