use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub label: String,
    pub confidence: f64,
    pub suggestion: String,
    pub analysis_id: Uuid,
    pub audio_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub label: String,
    pub suggestion: String,
    pub audio_file_name: String,
    pub audio_url: Option<String>,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_response_serialization() {
        let response = AnalyzeResponse {
            label: "not_depressed".into(),
            confidence: 0.87,
            suggestion: "keep it up".into(),
            analysis_id: Uuid::new_v4(),
            audio_url: Some("s3://bucket/audio/key.wav".into()),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("not_depressed"));
        assert!(json.contains("analysis_id"));
        assert!(json.contains("s3://bucket/audio/key.wav"));
    }
}
