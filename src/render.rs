//! Maps a prediction reply into a renderer-agnostic view. Nothing here touches
//! workflow state; every function is a pure mapping.

use crate::{
    error::SubmissionError,
    service::{InputFeatures, Match, PredictResponse},
    util::to_fixed,
};
use serde::Serialize;
use std::fmt::Write as _;

pub const VALUE_DECIMALS: usize = 6;
pub const MAX_TOP_MATCHES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub predicted_label: String,
    pub is_non_target_class: bool,
    pub features: InputFeatures,
    pub closest_match: Option<Match>,
    pub top_matches: Vec<Match>,
}

impl ClassificationResult {
    /// Accepts the reply only if it reports success or carries a prediction.
    pub fn from_response(
        resp: PredictResponse,
        non_target_marker: &str,
    ) -> Result<Self, SubmissionError> {
        if !resp.is_success() {
            let message = resp
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Classification failed".to_string());
            return Err(SubmissionError::Classification { message });
        }

        let Some(predicted_label) = resp.model_prediction else {
            return Err(SubmissionError::Classification {
                message: "Classification response is missing model_prediction".to_string(),
            });
        };
        let Some(features) = resp.input_features else {
            return Err(SubmissionError::Classification {
                message: "Classification response is missing input_features".to_string(),
            });
        };

        let is_non_target_class =
            !non_target_marker.is_empty() && predicted_label.contains(non_target_marker);

        Ok(Self {
            predicted_label,
            is_non_target_class,
            features,
            closest_match: resp.closest_match,
            top_matches: resp
                .top_5_matches
                .unwrap_or_default()
                .into_iter()
                .take(MAX_TOP_MATCHES)
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Good,
    Moderate,
    Poor,
}

impl ConfidenceBand {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 70.0 {
            ConfidenceBand::Good
        } else if percent > 40.0 {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Poor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceBand::Good => "good",
            ConfidenceBand::Moderate => "moderate",
            ConfidenceBand::Poor => "poor",
        }
    }
}

/// Display heuristic only: `max(0, 100 - distance * 10)`.
pub fn confidence_percent(distance: f64) -> f64 {
    (100.0 - distance * 10.0).max(0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureField {
    pub name: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchView {
    pub label: String,
    pub index: i64,
    pub distance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub rank: usize,
    pub label: String,
    pub index: i64,
    pub distance: String,
    pub confidence_percent: f64,
    pub confidence: String,
    pub band: ConfidenceBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub display_mode: DisplayMode,
    pub prediction: String,
    pub features: Vec<FeatureField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closest_match: Option<MatchView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_matches: Vec<RankedMatch>,
}

pub fn render(result: &ClassificationResult) -> ResultView {
    let f = &result.features;
    let features = vec![
        feature("contrast", f.contrast),
        feature("correlation", f.correlation),
        feature("energy", f.energy),
        feature("homogeneity", f.homogeneity),
    ];

    if result.is_non_target_class {
        return ResultView {
            display_mode: DisplayMode::Rejected,
            prediction: result.predicted_label.clone(),
            features,
            closest_match: None,
            top_matches: Vec::new(),
        };
    }

    let closest_match = result.closest_match.as_ref().map(|m| MatchView {
        label: m.label.clone(),
        index: m.index,
        distance: to_fixed(m.distance, VALUE_DECIMALS),
    });

    // Server order is the ranking.
    let top_matches = result
        .top_matches
        .iter()
        .take(MAX_TOP_MATCHES)
        .enumerate()
        .map(|(i, m)| {
            let percent = confidence_percent(m.distance);
            RankedMatch {
                rank: i + 1,
                label: m.label.clone(),
                index: m.index,
                distance: to_fixed(m.distance, VALUE_DECIMALS),
                confidence_percent: percent,
                confidence: format!("{}% match", to_fixed(percent, 1)),
                band: ConfidenceBand::from_percent(percent),
            }
        })
        .collect();

    ResultView {
        display_mode: DisplayMode::Accepted,
        prediction: result.predicted_label.clone(),
        features,
        closest_match,
        top_matches,
    }
}

fn feature(name: &'static str, value: f64) -> FeatureField {
    FeatureField {
        name,
        value: to_fixed(value, VALUE_DECIMALS),
    }
}

/// Plain-text rendering for terminal hosts.
pub fn render_text(view: &ResultView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Prediction: {}", view.prediction);
    if view.display_mode == DisplayMode::Rejected {
        let _ = writeln!(out, "  (image not recognised as the expected leaf type)");
    }

    let _ = writeln!(out, "GLCM features:");
    for f in &view.features {
        let _ = writeln!(out, "  {:<12} {}", f.name, f.value);
    }

    if let Some(m) = &view.closest_match {
        let _ = writeln!(
            out,
            "Closest match: {} (index {}), distance {}",
            m.label, m.index, m.distance
        );
    }

    if !view.top_matches.is_empty() {
        let _ = writeln!(out, "Top matches:");
        for m in &view.top_matches {
            let _ = writeln!(
                out,
                "  {}. {} (index {})  distance {}  {} [{}]",
                m.rank,
                m.label,
                m.index,
                m.distance,
                m.confidence,
                m.band.as_str()
            );
        }
    }
    out
}
