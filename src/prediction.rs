//! Prediction pipeline orchestration.
//!
//! Single-pass per request: credit check, pure chart/score/advice
//! computation, narrative (remote or fallback), recommendation, then one
//! persistence write fused with the credit decrement.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::bazi::chart::derive_chart;
use crate::bazi::elements;
use crate::bazi::fengshui;
use crate::bazi::fortune;
use crate::bazi::BirthChart;
use crate::bazi::ElementAnalysis;
use crate::bazi::FengShuiAdvice;
use crate::bazi::FortuneScore;
use crate::database::Database;
use crate::database::NewPrediction;
use crate::errors::CrystalPathError;
use crate::models::CreatePredictionRequest;
use crate::models::PredictionRow;
use crate::models::User;
use crate::narrative::NarrativeAnalysis;
use crate::narrative::NarrativeService;
use crate::recommend;
use crate::recommend::RecommendationBundle;
use crate::Result;

/// Chart plus its element analysis, stored as one blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaziResult {
    pub chart: BirthChart,
    pub element_analysis: ElementAnalysis,
    pub location: String,
}

/// Fortune scores plus feng-shui advice, stored as one blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FortuneAnalysis {
    pub fortune: FortuneScore,
    pub feng_shui_advice: FengShuiAdvice,
}

/// A stored prediction with all blobs decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub user_id: i64,
    pub birth_date: String,
    pub birth_time: String,
    pub birth_location: String,
    pub bazi: BaziResult,
    pub fortune: FortuneAnalysis,
    pub recommendations: RecommendationBundle,
    pub narrative: NarrativeAnalysis,
    pub created_at: NaiveDateTime,
}

impl TryFrom<PredictionRow> for PredictionRecord {
    type Error = CrystalPathError;

    fn try_from(row: PredictionRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            birth_date: row.birth_date,
            birth_time: row.birth_time,
            birth_location: row.birth_location,
            bazi: serde_json::from_str(&row.chart)?,
            fortune: serde_json::from_str(&row.fortune)?,
            recommendations: serde_json::from_str(&row.recommendations)?,
            narrative: serde_json::from_str(&row.narrative)?,
            created_at: row.created_at,
        })
    }
}

/// Result of a successful prediction request.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutcome {
    pub id: i64,
    pub bazi: BaziResult,
    pub fortune: FortuneAnalysis,
    pub recommendations: RecommendationBundle,
    pub narrative: NarrativeAnalysis,
    pub remaining_credits: i64,
}

/// Per-request prediction pipeline over injected collaborators.
pub struct PredictionService {
    database: Arc<Database>,
    narrative: Arc<NarrativeService>,
}

impl PredictionService {
    pub fn new(database: Arc<Database>, narrative: Arc<NarrativeService>) -> Self {
        Self {
            database,
            narrative,
        }
    }

    /// Run the full pipeline for one authenticated user.
    pub async fn create(
        &self,
        user: &User,
        request: &CreatePredictionRequest,
    ) -> Result<PredictionOutcome> {
        // Credit sufficiency gates all computation: a request with zero
        // credits does no chart work at all.
        if user.prediction_credits <= 0 {
            return Err(CrystalPathError::InsufficientCredits);
        }

        let chart = derive_chart(&request.birth_date, &request.birth_time)?;
        let analysis = elements::analyze(&chart);
        let score = fortune::score(chart.day_master(), &analysis);
        let advice = fengshui::advise(&analysis);

        // Remote narrative with guaranteed local substitution on failure.
        let narrative = self.narrative.analyze(&chart, &analysis, &score).await;

        let catalog = self.database.list_crystals().await?;
        let bundle = recommend::recommend(&analysis, &score, &catalog, &narrative);

        let bazi = BaziResult {
            chart,
            element_analysis: analysis,
            location: request.birth_location.clone(),
        };
        let fortune_analysis = FortuneAnalysis {
            fortune: score,
            feng_shui_advice: advice,
        };

        let new_prediction = NewPrediction {
            user_id: user.id,
            birth_date: request.birth_date.clone(),
            birth_time: request.birth_time.clone(),
            birth_location: request.birth_location.clone(),
            chart: serde_json::to_string(&bazi)?,
            fortune: serde_json::to_string(&fortune_analysis)?,
            recommendations: serde_json::to_string(&bundle)?,
            narrative: serde_json::to_string(&narrative)?,
        };

        // One transaction: persist the record and consume the credit, or
        // neither.
        let id = self
            .database
            .create_prediction_consuming_credit(&new_prediction)
            .await?;

        let remaining_credits = self
            .database
            .get_user_by_id(user.id)
            .await?
            .map_or(0, |u| u.prediction_credits);

        info!(
            "Prediction {id} created for user {} ({} credits left)",
            user.id, remaining_credits
        );

        Ok(PredictionOutcome {
            id,
            bazi,
            fortune: fortune_analysis,
            recommendations: bundle,
            narrative,
            remaining_credits,
        })
    }

    /// Per-user history, newest first.
    pub async fn list(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PredictionRecord>> {
        let rows = self.database.list_predictions(user_id, limit, offset).await?;
        rows.into_iter().map(PredictionRecord::try_from).collect()
    }

    /// Single record, scoped to its owner.
    pub async fn get(&self, id: i64, user_id: i64) -> Result<Option<PredictionRecord>> {
        let row = self.database.get_prediction(id, user_id).await?;
        row.map(PredictionRecord::try_from).transpose()
    }
}
