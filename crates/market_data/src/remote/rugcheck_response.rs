use common::models::SafetyReport;
use serde::Deserialize;

/// Scores at or above this are treated as too risky to trade.
pub const RISK_SCORE_CUTOFF: i64 = 5000;

#[derive(Debug, Deserialize)]
pub struct TokenReportResponse {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub risks: Vec<RiskItem>,
}

#[derive(Debug, Deserialize)]
pub struct RiskItem {
    #[serde(default)]
    pub name: String,
}

impl TokenReportResponse {
    pub fn to_report(&self) -> SafetyReport {
        SafetyReport {
            is_safe: self.score < RISK_SCORE_CUTOFF,
            score: self.score,
            risks: self.risks.iter().map(|r| r.name.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_below_cutoff_is_safe() {
        let report: TokenReportResponse = serde_json::from_str(
            r#"{ "score": 4999, "risks": [ { "name": "Low Liquidity" } ] }"#,
        )
        .unwrap();

        let safety = report.to_report();
        assert!(safety.is_safe);
        assert_eq!(safety.score, 4999);
        assert_eq!(safety.risks, vec!["Low Liquidity".to_string()]);
    }

    #[test]
    fn score_at_cutoff_is_flagged() {
        let report: TokenReportResponse =
            serde_json::from_str(r#"{ "score": 5000 }"#).unwrap();

        assert!(!report.to_report().is_safe);
    }
}
