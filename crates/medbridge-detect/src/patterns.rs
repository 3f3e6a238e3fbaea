//! Compiled regex pattern sets for the per-type matchers.
//!
//! All patterns are compiled once at detector construction and reused for
//! every utterance.

use regex::Regex;

/// Specialties accepted by the referral matcher, beyond generic
/// "specialist"/"doctor" phrasing.
const KNOWN_SPECIALTIES: &[&str] = &[
    "cardiologist",
    "cardiology",
    "dermatologist",
    "dermatology",
    "neurologist",
    "neurology",
    "orthopedist",
    "orthopedics",
    "gastroenterologist",
    "gastroenterology",
    "endocrinologist",
    "endocrinology",
    "oncologist",
    "oncology",
    "psychiatrist",
    "psychiatry",
    "psychologist",
    "rheumatologist",
    "rheumatology",
    "pulmonologist",
    "pulmonology",
    "nephrologist",
    "nephrology",
    "urologist",
    "urology",
    "ophthalmologist",
    "ophthalmology",
    "allergist",
    "podiatrist",
    "surgeon",
    "ent",
    "physical therapist",
    "physical therapy",
];

/// Regex sets backing the five action matchers.
pub struct DetectionPatterns {
    dosage: Regex,
    frequency: Vec<Regex>,
    duration: Regex,
    prescribe_keyword: Regex,
    ordering_verb: Regex,
    lab_noun: Regex,
    referral: Regex,
    follow_up_trigger: Regex,
    follow_up_time: Vec<Regex>,
    imaging: Regex,
}

impl Default for DetectionPatterns {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionPatterns {
    /// Compile all pattern sets.
    pub fn new() -> Self {
        let frequency = vec![
            Regex::new(
                r"(?i)\b(?:once|twice|(?:two|three|four|five|six)\s+times|\d+\s*times)\s+(?:a|per|each)?\s*(?:day|daily|week|weekly|month|monthly|hour)\b",
            )
            .expect("valid frequency regex"),
            Regex::new(r"(?i)\bevery\s+\d+\s+(?:hours?|days?|weeks?)\b")
                .expect("valid frequency regex"),
            Regex::new(r"(?i)\b(?:bid|tid|qid|qd|qhs|prn|q\d+h)\b").expect("valid frequency regex"),
            Regex::new(
                r"(?i)\b(?:daily|nightly|weekly|every\s+(?:morning|night|evening)|at\s+bedtime|as\s+needed|with\s+meals)\b",
            )
            .expect("valid frequency regex"),
        ];

        let follow_up_time = vec![
            Regex::new(
                r"(?i)\bin\s+((?:\d+|a|an|one|two|three|four|five|six|seven|eight|nine|ten|couple\s+of|few)\s+(?:days?|weeks?|months?))\b",
            )
            .expect("valid follow-up time regex"),
            Regex::new(r"(?i)\b(next\s+(?:week|month))\b").expect("valid follow-up time regex"),
        ];

        Self {
            dosage: Regex::new(r"(?i)\b\d+(?:\.\d+)?\s*(?:mg|g|ml|cc|mcg|units?)\b")
                .expect("valid dosage regex"),
            frequency,
            duration: Regex::new(
                r"(?i)\bfor\s+(?:\d+|a|an|one|two|three|four|five|six|seven|eight|nine|ten)\s+(?:days?|weeks?|months?)\b",
            )
            .expect("valid duration regex"),
            prescribe_keyword: Regex::new(r"(?i)\b(?:prescrib(?:e|ing|ed)|prescription|rx)\b")
                .expect("valid prescribe regex"),
            ordering_verb: Regex::new(r"(?i)\b(?:order(?:ing)?|need|get|run|check|draw)\b")
                .expect("valid ordering verb regex"),
            lab_noun: Regex::new(
                r"(?i)\b(?:tests?|labs?|lab\s+work|blood\s+work|panels?|count|levels?|cultures?)\b",
            )
            .expect("valid lab noun regex"),
            referral: Regex::new(
                r"(?i)\b(?:refer(?:ring)?(?:\s+\w+)?\s+to|see\s+an?|consult(?:ation)?\s+with)\s+(?:a\s+|an\s+|the\s+)?([a-zA-Z-]+(?:\s+[a-zA-Z-]+)?)",
            )
            .expect("valid referral regex"),
            follow_up_trigger: Regex::new(
                r"(?i)\b(?:come\s+back|follow\s+up|follow-up|see\s+you|return|schedule)\b",
            )
            .expect("valid follow-up trigger regex"),
            follow_up_time,
            imaging: Regex::new(
                r"(?i)\b(x[- ]?ray|mri|ct\s+scan|cat\s+scan|ultrasound|echo(?:cardiogram)?|ekg|ecg)\b",
            )
            .expect("valid imaging regex"),
        }
    }

    /// First dosage mention, e.g. "400 mg".
    pub fn find_dosage(&self, text: &str) -> Option<String> {
        self.dosage.find(text).map(|m| m.as_str().to_string())
    }

    /// Byte offsets of every dosage mention.
    pub fn dosage_positions(&self, text: &str) -> Vec<usize> {
        self.dosage.find_iter(text).map(|m| m.start()).collect()
    }

    /// First frequency mention, e.g. "three times daily" or "bid".
    pub fn find_frequency(&self, text: &str) -> Option<String> {
        self.frequency
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().to_string())
    }

    /// First duration mention, e.g. "for ten days".
    pub fn find_duration(&self, text: &str) -> Option<String> {
        self.duration.find(text).map(|m| m.as_str().to_string())
    }

    /// True when the utterance carries an explicit prescribing keyword.
    pub fn has_prescribe_keyword(&self, text: &str) -> bool {
        self.prescribe_keyword.is_match(text)
    }

    /// True when the utterance reads as an explicit lab ordering phrase:
    /// an ordering verb plus a lab noun ("order ... blood work",
    /// "ordering a complete blood count").
    pub fn has_lab_order_phrase(&self, text: &str) -> bool {
        self.ordering_verb.is_match(text) && self.lab_noun.is_match(text)
    }

    /// Extract and validate the referral specialty, if any.
    ///
    /// The captured token is accepted when it is a known specialty or
    /// contains "specialist"/"doctor"; trailing captured words are dropped
    /// if the shorter candidate validates.
    pub fn find_referral_specialty(&self, text: &str) -> Option<String> {
        let caps = self.referral.captures(text)?;
        let captured = caps.get(1)?.as_str().trim().to_lowercase();

        let mut candidates: Vec<String> = vec![captured.clone()];
        if let Some(first) = captured.split_whitespace().next() {
            if first != captured {
                candidates.push(first.to_string());
            }
        }

        candidates.into_iter().find(|candidate| {
            KNOWN_SPECIALTIES.contains(&candidate.as_str())
                || candidate.contains("specialist")
                || candidate.contains("doctor")
        })
    }

    /// Extract the follow-up timeframe, requiring both a scheduling
    /// trigger and a time expression.
    pub fn find_follow_up_timeframe(&self, text: &str) -> Option<String> {
        if !self.follow_up_trigger.is_match(text) {
            return None;
        }
        self.follow_up_time
            .iter()
            .find_map(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// First generic imaging/test mention, e.g. "x-ray" or "ct scan".
    pub fn find_imaging(&self, text: &str) -> Option<String> {
        self.imaging
            .find(text)
            .map(|m| m.as_str().to_lowercase())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> DetectionPatterns {
        DetectionPatterns::new()
    }

    // ---- Dosage ----

    #[test]
    fn test_dosage_units() {
        let p = patterns();
        assert_eq!(p.find_dosage("take 400 mg now"), Some("400 mg".to_string()));
        assert_eq!(p.find_dosage("a 2.5mg tablet"), Some("2.5mg".to_string()));
        assert_eq!(p.find_dosage("inject 10 units"), Some("10 units".to_string()));
        assert_eq!(p.find_dosage("5 ml twice"), Some("5 ml".to_string()));
    }

    #[test]
    fn test_dosage_requires_number() {
        assert!(patterns().find_dosage("a few mg maybe").is_none());
    }

    #[test]
    fn test_dosage_positions_multiple() {
        let text = "start 400 mg, then drop to 200 mg";
        let positions = patterns().dosage_positions(text);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0], text.find("400").unwrap());
    }

    // ---- Frequency ----

    #[test]
    fn test_frequency_times_daily() {
        let p = patterns();
        assert_eq!(
            p.find_frequency("three times daily"),
            Some("three times daily".to_string())
        );
        assert_eq!(
            p.find_frequency("two times a day"),
            Some("two times a day".to_string())
        );
        assert_eq!(
            p.find_frequency("4 times per day"),
            Some("4 times per day".to_string())
        );
    }

    #[test]
    fn test_frequency_every_n_hours() {
        assert_eq!(
            patterns().find_frequency("take it every 6 hours"),
            Some("every 6 hours".to_string())
        );
    }

    #[test]
    fn test_frequency_latin_abbreviations() {
        let p = patterns();
        assert_eq!(p.find_frequency("amoxicillin tid"), Some("tid".to_string()));
        assert_eq!(p.find_frequency("take prn"), Some("prn".to_string()));
        assert_eq!(p.find_frequency("one q8h"), Some("q8h".to_string()));
    }

    #[test]
    fn test_frequency_none() {
        assert!(patterns().find_frequency("take with water").is_none());
    }

    // ---- Duration ----

    #[test]
    fn test_duration_variants() {
        let p = patterns();
        assert_eq!(
            p.find_duration("for 10 days"),
            Some("for 10 days".to_string())
        );
        assert_eq!(
            p.find_duration("continue for two weeks"),
            Some("for two weeks".to_string())
        );
        assert_eq!(
            p.find_duration("keep it up for a month"),
            Some("for a month".to_string())
        );
    }

    #[test]
    fn test_duration_requires_for() {
        assert!(patterns().find_duration("ten days of rest").is_none());
    }

    // ---- Prescribe keyword ----

    #[test]
    fn test_prescribe_keyword_forms() {
        let p = patterns();
        assert!(p.has_prescribe_keyword("I'm prescribing ibuprofen"));
        assert!(p.has_prescribe_keyword("here's a prescription"));
        assert!(p.has_prescribe_keyword("I'll send the rx over"));
        assert!(!p.has_prescribe_keyword("described in the chart"));
    }

    // ---- Lab ordering phrase ----

    #[test]
    fn test_lab_order_phrase() {
        let p = patterns();
        assert!(p.has_lab_order_phrase("let's order some blood work"));
        assert!(p.has_lab_order_phrase("I'm ordering a complete blood count"));
        assert!(p.has_lab_order_phrase("we need to check your thyroid levels"));
        assert!(!p.has_lab_order_phrase("your labs looked fine")); // no ordering verb
        assert!(!p.has_lab_order_phrase("order a wheelchair")); // no lab noun
    }

    // ---- Referral ----

    #[test]
    fn test_referral_known_specialty() {
        let p = patterns();
        assert_eq!(
            p.find_referral_specialty("I'm referring you to a cardiologist"),
            Some("cardiologist".to_string())
        );
        assert_eq!(
            p.find_referral_specialty("you should see a neurologist"),
            Some("neurologist".to_string())
        );
        assert_eq!(
            p.find_referral_specialty("we'll set up a consultation with the oncologist"),
            Some("oncologist".to_string())
        );
    }

    #[test]
    fn test_referral_specialist_phrase() {
        assert_eq!(
            patterns().find_referral_specialty("I'll refer you to a heart specialist"),
            Some("heart specialist".to_string())
        );
    }

    #[test]
    fn test_referral_trailing_words_dropped() {
        assert_eq!(
            patterns().find_referral_specialty("see a cardiologist next week"),
            Some("cardiologist".to_string())
        );
    }

    #[test]
    fn test_referral_unknown_specialty_rejected() {
        assert!(patterns()
            .find_referral_specialty("I'm referring you to a plumber")
            .is_none());
    }

    #[test]
    fn test_referral_no_trigger() {
        assert!(patterns()
            .find_referral_specialty("the cardiologist called earlier")
            .is_none());
    }

    // ---- Follow-up ----

    #[test]
    fn test_follow_up_timeframe() {
        let p = patterns();
        assert_eq!(
            p.find_follow_up_timeframe("follow up in two weeks"),
            Some("two weeks".to_string())
        );
        assert_eq!(
            p.find_follow_up_timeframe("come back in 3 days"),
            Some("3 days".to_string())
        );
        assert_eq!(
            p.find_follow_up_timeframe("I'll see you in a month"),
            Some("a month".to_string())
        );
        assert_eq!(
            p.find_follow_up_timeframe("schedule a visit next week"),
            Some("next week".to_string())
        );
    }

    #[test]
    fn test_follow_up_requires_both_trigger_and_time() {
        let p = patterns();
        // time without trigger
        assert!(p.find_follow_up_timeframe("in two weeks it should heal").is_none());
        // trigger without time
        assert!(p.find_follow_up_timeframe("please follow up with the nurse").is_none());
    }

    // ---- Imaging ----

    #[test]
    fn test_imaging_variants() {
        let p = patterns();
        assert_eq!(p.find_imaging("get a chest x-ray"), Some("x-ray".to_string()));
        assert_eq!(p.find_imaging("an MRI of the knee"), Some("mri".to_string()));
        assert_eq!(p.find_imaging("we'll do a CT scan"), Some("ct scan".to_string()));
        assert_eq!(p.find_imaging("an echo of the heart"), Some("echo".to_string()));
        assert!(p.find_imaging("just rest for now").is_none());
    }
}
