//! Recommendation reports for display.

use serde::{Deserialize, Serialize};

use crate::models::ScoredMolecule;

use super::escape_csv;

/// Recommendation report metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationMetadata {
    pub consultation_id: String,
    /// Molecules the scorer recommended
    pub total: usize,
    /// Molecules included in this report
    pub shown: usize,
    /// Export timestamp
    pub exported_at: String,
}

/// The ranked recommendations of a consultation, possibly cut to a display
/// limit. The ranking itself is never truncated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub metadata: RecommendationMetadata,
    pub recommendations: Vec<ScoredMolecule>,
}

impl RecommendationReport {
    /// Build a report showing at most `limit` molecules, best first.
    pub fn from_ranked(consultation_id: &str, ranked: &[ScoredMolecule], limit: Option<usize>) -> Self {
        let shown = limit.map_or(ranked.len(), |l| l.min(ranked.len()));
        Self {
            metadata: RecommendationMetadata {
                consultation_id: consultation_id.to_string(),
                total: ranked.len(),
                shown,
                exported_at: chrono::Utc::now().to_rfc3339(),
            },
            recommendations: ranked[..shown].to_vec(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text summary, one block per molecule.
    pub fn to_text(&self) -> String {
        if self.recommendations.is_empty() {
            return "No molecule matches the clinical inputs.\n".to_string();
        }

        let mut text = String::new();
        for (rank, m) in self.recommendations.iter().enumerate() {
            text.push_str(&format!("{}. {} (score {})\n", rank + 1, m.name, m.score));
            push_field(&mut text, "Indications", &m.indications);
            push_field(&mut text, "Precautions", &m.precautions);
            push_field(&mut text, "Side effects", &m.side_effects);
            push_field(&mut text, "Commercial names", &m.commercial_names);
            push_field(&mut text, "Medical classes", &m.medical_classes);
        }
        if self.metadata.shown < self.metadata.total {
            text.push_str(&format!(
                "({} more not shown)\n",
                self.metadata.total - self.metadata.shown
            ));
        }
        text
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str("rank,molecule_id,name,score,indications,precautions,side_effects,commercial_names,medical_classes\n");

        for (rank, m) in self.recommendations.iter().enumerate() {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                rank + 1,
                m.molecule_id,
                escape_csv(&m.name),
                m.score,
                escape_csv(&m.indications),
                escape_csv(&m.precautions),
                escape_csv(&m.side_effects),
                escape_csv(&m.commercial_names),
                escape_csv(&m.medical_classes),
            ));
        }
        csv
    }
}

fn push_field(text: &mut String, label: &str, value: &str) {
    if !value.is_empty() {
        text.push_str(&format!("   {}: {}\n", label, value));
    }
}
