//! The rule-based action detector.
//!
//! Runs five independent per-type matchers over a clinician utterance and
//! returns zero or more scored actions. Stateless and reentrant: all
//! mutable work happens on locals, so one detector can serve concurrent
//! utterances.

use medbridge_core::config::DetectionConfig;
use medbridge_core::Speaker;
use tracing::warn;

use crate::error::DetectionError;
use crate::patterns::DetectionPatterns;
use crate::terms::{boost_near_dosage, MedicalTermIndex};
use crate::types::{
    ActionDetails, DetectedAction, DetectionContext, MedActionType, TermCategory, Urgency,
};

const LAB_ORDER_PHRASE_CONFIDENCE: f32 = 0.9;
const LAB_ORDER_TERM_CONFIDENCE: f32 = 0.7;
const REFERRAL_CONFIDENCE: f32 = 0.8;
const FOLLOW_UP_CONFIDENCE: f32 = 0.85;
const DIAGNOSTIC_TERM_CONFIDENCE: f32 = 0.8;
const DIAGNOSTIC_PATTERN_CONFIDENCE: f32 = 0.7;

/// Additive score components for the prescription matcher.
const DOSAGE_WEIGHT: f32 = 0.3;
const FREQUENCY_WEIGHT: f32 = 0.2;
const DURATION_WEIGHT: f32 = 0.2;
const PRESCRIBE_KEYWORD_WEIGHT: f32 = 0.3;
const TERM_CONFIDENCE_WEIGHT: f32 = 0.3;

type MatcherResult = Result<Option<DetectedAction>, DetectionError>;

/// Stateless rule engine extracting clinical actions from utterances.
pub struct ActionDetector {
    index: MedicalTermIndex,
    patterns: DetectionPatterns,
    enabled: bool,
    min_prescription_confidence: f32,
}

impl Default for ActionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionDetector {
    /// Build a detector with default thresholds.
    pub fn new() -> Self {
        Self::with_config(&DetectionConfig::default())
    }

    /// Build a detector from configuration.
    pub fn with_config(config: &DetectionConfig) -> Self {
        Self {
            index: MedicalTermIndex::new(),
            patterns: DetectionPatterns::new(),
            enabled: config.enabled,
            min_prescription_confidence: config.min_prescription_confidence,
        }
    }

    /// Detect clinical actions in one utterance.
    ///
    /// Non-clinician speech is skipped entirely. Each matcher contributes at
    /// most one action of its type; a matcher failure is logged and does not
    /// prevent the remaining matchers from running.
    pub fn detect(
        &self,
        text: &str,
        speaker: Speaker,
        context: &DetectionContext,
    ) -> Vec<DetectedAction> {
        if speaker != Speaker::Clinician || !self.enabled {
            return Vec::new();
        }

        let matchers: [(MedActionType, MatcherResult); 5] = [
            (MedActionType::Prescription, self.match_prescription(text)),
            (MedActionType::LabOrder, self.match_lab_order(text)),
            (MedActionType::Referral, self.match_referral(text)),
            (MedActionType::FollowUp, self.match_follow_up(text)),
            (
                MedActionType::DiagnosticTest,
                self.match_diagnostic_test(text),
            ),
        ];

        let mut actions = Vec::new();
        for (action_type, result) in matchers {
            match result {
                Ok(Some(action)) => actions.push(action),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        matcher = %action_type,
                        utterance_id = %context.utterance_id,
                        "Matcher failed, continuing with the rest: {}",
                        e
                    );
                }
            }
        }
        actions
    }

    /// Prescription: a medication term plus additive evidence.
    ///
    /// Score = 0.3 dosage + 0.2 frequency + 0.2 duration + 0.3 prescribing
    /// keyword + term confidence * 0.3, capped at 1.0. Rejected below the
    /// configured threshold.
    fn match_prescription(&self, text: &str) -> MatcherResult {
        let mut med_matches = self
            .index
            .find_matches_in_category(text, TermCategory::Medication);
        if med_matches.is_empty() {
            return Ok(None);
        }

        let dosage_positions = self.patterns.dosage_positions(text);
        boost_near_dosage(&mut med_matches, &dosage_positions);

        let best = med_matches
            .iter()
            .max_by(|a, b| {
                a.confidence
                    .total_cmp(&b.confidence)
                    .then_with(|| b.position.cmp(&a.position))
            })
            .expect("non-empty medication matches");

        let dosage = self.patterns.find_dosage(text);
        let frequency = self.patterns.find_frequency(text);
        let duration = self.patterns.find_duration(text);

        let mut score = 0.0f32;
        if dosage.is_some() {
            score += DOSAGE_WEIGHT;
        }
        if frequency.is_some() {
            score += FREQUENCY_WEIGHT;
        }
        if duration.is_some() {
            score += DURATION_WEIGHT;
        }
        if self.patterns.has_prescribe_keyword(text) {
            score += PRESCRIBE_KEYWORD_WEIGHT;
        }
        score += best.confidence * TERM_CONFIDENCE_WEIGHT;
        let score = score.min(1.0);

        if score < self.min_prescription_confidence {
            return Ok(None);
        }

        let details = ActionDetails::Prescription {
            medication: best.term.clone(),
            dosage,
            frequency,
            duration,
        };
        Ok(Some(DetectedAction::new(details, score, text, med_matches)))
    }

    /// Lab order: an explicit ordering phrase (0.9) or a lab term (0.7).
    fn match_lab_order(&self, text: &str) -> MatcherResult {
        let lab_matches = self.index.find_matches_in_category(text, TermCategory::Lab);
        let phrase = self.patterns.has_lab_order_phrase(text);
        if !phrase && lab_matches.is_empty() {
            return Ok(None);
        }

        let confidence = if phrase {
            LAB_ORDER_PHRASE_CONFIDENCE
        } else {
            LAB_ORDER_TERM_CONFIDENCE
        };

        let mut tests: Vec<String> = Vec::new();
        for m in &lab_matches {
            if !tests.contains(&m.term) {
                tests.push(m.term.clone());
            }
        }

        let details = ActionDetails::LabOrder {
            tests,
            urgency: Urgency::from_text(text),
        };
        Ok(Some(DetectedAction::new(
            details,
            confidence,
            text,
            lab_matches,
        )))
    }

    /// Referral: a referral phrase with a validated specialty. Fixed 0.8.
    fn match_referral(&self, text: &str) -> MatcherResult {
        let Some(specialty) = self.patterns.find_referral_specialty(text) else {
            return Ok(None);
        };
        let details = ActionDetails::Referral {
            specialty,
            urgency: Urgency::from_text(text),
        };
        Ok(Some(DetectedAction::new(
            details,
            REFERRAL_CONFIDENCE,
            text,
            Vec::new(),
        )))
    }

    /// Follow-up: a scheduling phrase with a captured time expression.
    /// Fixed 0.85.
    fn match_follow_up(&self, text: &str) -> MatcherResult {
        let Some(timeframe) = self.patterns.find_follow_up_timeframe(text) else {
            return Ok(None);
        };
        let details = ActionDetails::FollowUp { timeframe };
        Ok(Some(DetectedAction::new(
            details,
            FOLLOW_UP_CONFIDENCE,
            text,
            Vec::new(),
        )))
    }

    /// Diagnostic test: a procedure term (0.8) or a generic imaging
    /// pattern (0.7).
    fn match_diagnostic_test(&self, text: &str) -> MatcherResult {
        let proc_matches = self
            .index
            .find_matches_in_category(text, TermCategory::Procedure);

        if let Some(first) = proc_matches.first() {
            let details = ActionDetails::DiagnosticTest {
                test_name: first.term.clone(),
                urgency: Urgency::from_text(text),
            };
            return Ok(Some(DetectedAction::new(
                details,
                DIAGNOSTIC_TERM_CONFIDENCE,
                text,
                proc_matches,
            )));
        }

        if let Some(test_name) = self.patterns.find_imaging(text) {
            let details = ActionDetails::DiagnosticTest {
                test_name,
                urgency: Urgency::from_text(text),
            };
            return Ok(Some(DetectedAction::new(
                details,
                DIAGNOSTIC_PATTERN_CONFIDENCE,
                text,
                Vec::new(),
            )));
        }

        Ok(None)
    }
}

// =============================================================================
// Tests
// =============================================================================
