use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Login answers either `{code, message, token}` or `{code, message, data: {token}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub token: Option<String>,
    pub data: Option<LoginData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: String,
}

impl LoginResponse {
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .or_else(|| self.data.as_ref().map(|d| d.token.as_str()))
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interviewer {
    pub id: i64,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub position_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub position_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub interviewers: Vec<Interviewer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordParams {
    pub position_id: i64,
    pub interviewer_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub id: i64,
    pub user_id: i64,
    pub position_id: i64,
    pub interviewer_id: i64,
    pub time: NaiveDateTime,
    pub position_name: Option<String>,
    pub interviewer_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyOption {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyQuestion {
    pub id: String,
    pub title: String,
    #[serde(default = "default_required")]
    pub required: bool,
    pub options: Vec<SurveyOption>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetencyRadarItem {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotivationValues {
    pub maslow_focus: Vec<String>,
    pub motivation_summary: String,
    pub ideal_environment: Vec<String>,
    pub risk_warnings: Vec<String>,
}

/// Personality assessment report produced from the written survey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterReport {
    pub total: f64,
    pub personality_type: String,
    pub career_preferences: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub summary: String,
    pub competency_radar: Vec<CompetencyRadarItem>,
    pub motivation_values: MotivationValues,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionLevel {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    pub question: String,
    pub score: f64,
    pub comments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallScore {
    pub communication: f64,
    pub logic: f64,
    pub stress: f64,
    pub total: f64,
}

/// Post-interview report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewReport {
    pub name: String,
    pub position: String,
    pub date: String,
    pub duration: String,
    pub emotions: Vec<EmotionLevel>,
    pub question_analysis: Vec<QuestionAnalysis>,
    pub overall_score: OverallScore,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub summary: String,
}

/// Job details submitted alongside the résumé.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobApplication {
    pub job_name: String,
    pub job_desc: String,
    pub company_name: String,
    pub company_desc: String,
    /// Résumé text pasted by the candidate, independent of the uploaded file.
    pub resume_text: String,
}

/// The upload endpoint accepts the file and processes it in the background.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub message: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "sessionId")]
    pub session_id: Option<String>,
}
