//! Risk scoring engine.
//!
//! Pure function over a static question catalog: 30 weighted multiple-choice
//! questions across 6 sections. Option weights are always drawn from
//! {1, 3, 5, 30} (the 30-weight marks a stop-and-reassess condition). The
//! total maps onto four risk bands with canned recommendation text.
//!
//! Answers referencing an unknown question id, a weight outside the allowed
//! set, or answering the same question twice are rejected outright rather
//! than silently dropped.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ApiError;

/// The only weights a catalog option may carry.
pub const ALLOWED_WEIGHTS: [i64; 4] = [1, 3, 5, 30];

/// One answer to a catalog question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnswer {
    pub question_id: String,
    pub selected_score: i64,
}

/// Risk bands derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// Band boundaries are inclusive on the upper end.
    pub fn from_total(total: i64) -> Self {
        match total {
            t if t <= 20 => RiskLevel::Low,
            t if t <= 40 => RiskLevel::Medium,
            t if t <= 60 => RiskLevel::High,
            _ => RiskLevel::VeryHigh,
        }
    }

    pub fn recommended_actions(&self) -> &'static str {
        match self {
            RiskLevel::Low => {
                "Proceed with the mission under standard operating procedures. \
                 Maintain routine monitoring throughout."
            }
            RiskLevel::Medium => {
                "Proceed with caution. Brief the crew on the identified risk \
                 factors and apply additional mitigations before launch."
            }
            RiskLevel::High => {
                "Supervisor review required before proceeding. Re-plan the \
                 mission to reduce the highest-scoring factors."
            }
            RiskLevel::VeryHigh => {
                "Do not proceed. Stop work, escalate to the supervisor on \
                 duty, and reassess the mission plan from the start."
            }
        }
    }
}

/// Per-section score breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionScore {
    pub section: String,
    pub score: i64,
    pub question_count: usize,
}

/// Full scoring result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    pub total_score: i64,
    pub section_scores: Vec<SectionScore>,
    pub risk_level: RiskLevel,
    pub recommended_actions: String,
}

// ============================================================================
// Question catalog
// ============================================================================

/// Catalog entry. Option texts live in the frontend; the engine only needs
/// the id, section, and prompt.
#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub id: &'static str,
    pub section: &'static str,
    pub prompt: &'static str,
}

pub const SECTIONS: [&str; 6] = [
    "Flight Crew & Personnel",
    "Weather & Environment",
    "Airspace & Location",
    "Equipment & Aircraft",
    "Site Hazards",
    "Mission Complexity",
];

/// Static catalog: 5 questions per section, 30 total.
pub const CATALOG: [Question; 30] = [
    Question { id: "q1", section: "Flight Crew & Personnel", prompt: "Pilot currency on this aircraft type" },
    Question { id: "q2", section: "Flight Crew & Personnel", prompt: "Crew rest in the preceding 24 hours" },
    Question { id: "q3", section: "Flight Crew & Personnel", prompt: "Crew familiarity with the mission profile" },
    Question { id: "q4", section: "Flight Crew & Personnel", prompt: "Visual observer availability" },
    Question { id: "q5", section: "Flight Crew & Personnel", prompt: "Crew communication plan" },
    Question { id: "q6", section: "Weather & Environment", prompt: "Forecast wind relative to aircraft limits" },
    Question { id: "q7", section: "Weather & Environment", prompt: "Visibility and cloud ceiling" },
    Question { id: "q8", section: "Weather & Environment", prompt: "Precipitation risk during the window" },
    Question { id: "q9", section: "Weather & Environment", prompt: "Temperature relative to battery limits" },
    Question { id: "q10", section: "Weather & Environment", prompt: "Daylight remaining at completion" },
    Question { id: "q11", section: "Airspace & Location", prompt: "Airspace classification at the site" },
    Question { id: "q12", section: "Airspace & Location", prompt: "Proximity to aerodromes or heliports" },
    Question { id: "q13", section: "Airspace & Location", prompt: "NOTAM and TFR review" },
    Question { id: "q14", section: "Airspace & Location", prompt: "Manned traffic expected at altitude" },
    Question { id: "q15", section: "Airspace & Location", prompt: "Authorization requirements satisfied" },
    Question { id: "q16", section: "Equipment & Aircraft", prompt: "Aircraft maintenance status" },
    Question { id: "q17", section: "Equipment & Aircraft", prompt: "Battery health and charge cycles" },
    Question { id: "q18", section: "Equipment & Aircraft", prompt: "Control link reliability at the site" },
    Question { id: "q19", section: "Equipment & Aircraft", prompt: "Payload weight relative to limits" },
    Question { id: "q20", section: "Equipment & Aircraft", prompt: "Return-to-home configuration verified" },
    Question { id: "q21", section: "Site Hazards", prompt: "Overhead lines and vertical obstructions" },
    Question { id: "q22", section: "Site Hazards", prompt: "Bystander density in the operating area" },
    Question { id: "q23", section: "Site Hazards", prompt: "Ground crew separation from live plant" },
    Question { id: "q24", section: "Site Hazards", prompt: "Electromagnetic interference sources" },
    Question { id: "q25", section: "Site Hazards", prompt: "Launch and recovery area condition" },
    Question { id: "q26", section: "Mission Complexity", prompt: "Flight beyond visual line of sight" },
    Question { id: "q27", section: "Mission Complexity", prompt: "Night or low-light operation" },
    Question { id: "q28", section: "Mission Complexity", prompt: "Proximity flying to structures" },
    Question { id: "q29", section: "Mission Complexity", prompt: "Number of concurrent aircraft" },
    Question { id: "q30", section: "Mission Complexity", prompt: "Deviation from the standard mission profile" },
];

fn find_question(id: &str) -> Option<&'static Question> {
    CATALOG.iter().find(|q| q.id == id)
}

// ============================================================================
// Scoring
// ============================================================================

/// Score a set of answers against the catalog. Deterministic, no side
/// effects, no persistence.
pub fn score(answers: &[RiskAnswer]) -> Result<RiskScore, ApiError> {
    let mut details = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for answer in answers {
        if find_question(&answer.question_id).is_none() {
            details.push(format!("unknown question id '{}'", answer.question_id));
            continue;
        }
        if !ALLOWED_WEIGHTS.contains(&answer.selected_score) {
            details.push(format!(
                "invalid score {} for question '{}'",
                answer.selected_score, answer.question_id
            ));
        }
        if !seen.insert(answer.question_id.as_str()) {
            details.push(format!(
                "duplicate answer for question '{}'",
                answer.question_id
            ));
        }
    }

    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }

    let mut total = 0i64;
    let mut section_scores: Vec<SectionScore> = SECTIONS
        .iter()
        .map(|s| SectionScore {
            section: (*s).to_string(),
            score: 0,
            question_count: 0,
        })
        .collect();

    for answer in answers {
        // Catalog membership was validated above.
        let Some(question) = find_question(&answer.question_id) else {
            continue;
        };
        total += answer.selected_score;
        if let Some(entry) = section_scores
            .iter_mut()
            .find(|e| e.section == question.section)
        {
            entry.score += answer.selected_score;
            entry.question_count += 1;
        }
    }

    let risk_level = RiskLevel::from_total(total);
    Ok(RiskScore {
        total_score: total,
        section_scores,
        risk_level,
        recommended_actions: risk_level.recommended_actions().to_string(),
    })
}
