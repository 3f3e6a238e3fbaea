//! Static medical term index.
//!
//! Clinical vocabulary (terms, synonyms, external codes) used for
//! pattern matching. Built once at detector construction and never
//! mutated at runtime.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::TermCategory;

/// External code lists attached to a term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCodes {
    /// ICD-10 diagnosis codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icd10: Vec<String>,
    /// RxNorm drug concept ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rxnorm: Vec<String>,
    /// LOINC lab codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loinc: Vec<String>,
    /// CPT procedure codes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpt: Vec<String>,
}

impl TermCodes {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn drug(codes: &[&str]) -> Self {
        Self {
            rxnorm: codes.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn diagnosis(codes: &[&str]) -> Self {
        Self {
            icd10: codes.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn lab(codes: &[&str]) -> Self {
        Self {
            loinc: codes.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn procedure(codes: &[&str]) -> Self {
        Self {
            cpt: codes.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// A canonical clinical term with its synonyms and codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalTerm {
    pub term: String,
    pub category: TermCategory,
    pub synonyms: Vec<String>,
    pub codes: TermCodes,
}

/// One occurrence of a term (or synonym) in an utterance.
///
/// `confidence` is 1.0 for a canonical hit, 0.9 for a synonym, possibly
/// boosted by dosage proximity for medications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermMatch {
    pub term: String,
    pub category: TermCategory,
    pub confidence: f32,
    /// Byte offset of the match in the source text.
    pub position: usize,
    pub matched_text: String,
}

struct CompiledTerm {
    term: MedicalTerm,
    /// Word-boundary, case-insensitive patterns paired with their hit
    /// confidence: canonical first (1.0), then each synonym (0.9).
    patterns: Vec<(Regex, f32)>,
}

/// Static lookup of clinical terms with word-boundary matching.
pub struct MedicalTermIndex {
    terms: Vec<CompiledTerm>,
}

const CANONICAL_CONFIDENCE: f32 = 1.0;
const SYNONYM_CONFIDENCE: f32 = 0.9;

/// Max distance (bytes) between a dosage mention and a medication term
/// for the proximity confidence boost.
const DOSAGE_PROXIMITY_CHARS: usize = 50;
const DOSAGE_PROXIMITY_BOOST: f32 = 0.1;

fn word_pattern(term: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term))).expect("valid term regex")
}

fn compile(
    term: &str,
    category: TermCategory,
    synonyms: &[&str],
    codes: TermCodes,
) -> CompiledTerm {
    let mut patterns = vec![(word_pattern(term), CANONICAL_CONFIDENCE)];
    for synonym in synonyms {
        patterns.push((word_pattern(synonym), SYNONYM_CONFIDENCE));
    }
    CompiledTerm {
        term: MedicalTerm {
            term: term.to_string(),
            category,
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            codes,
        },
        patterns,
    }
}

impl Default for MedicalTermIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl MedicalTermIndex {
    /// Build the index with all compiled term patterns.
    pub fn new() -> Self {
        use TermCategory::*;

        let terms = vec![
            // Medications
            compile("ibuprofen", Medication, &["advil", "motrin"], TermCodes::drug(&["5640"])),
            compile(
                "acetaminophen",
                Medication,
                &["tylenol", "paracetamol"],
                TermCodes::drug(&["161"]),
            ),
            compile("amoxicillin", Medication, &["amoxil"], TermCodes::drug(&["723"])),
            compile(
                "azithromycin",
                Medication,
                &["zithromax", "z-pack"],
                TermCodes::drug(&["18631"]),
            ),
            compile(
                "lisinopril",
                Medication,
                &["prinivil", "zestril"],
                TermCodes::drug(&["29046"]),
            ),
            compile("metformin", Medication, &["glucophage"], TermCodes::drug(&["6809"])),
            compile("atorvastatin", Medication, &["lipitor"], TermCodes::drug(&["83367"])),
            compile("omeprazole", Medication, &["prilosec"], TermCodes::drug(&["7646"])),
            compile("amlodipine", Medication, &["norvasc"], TermCodes::drug(&["17767"])),
            compile("prednisone", Medication, &["deltasone"], TermCodes::drug(&["8640"])),
            compile(
                "albuterol",
                Medication,
                &["ventolin", "proventil"],
                TermCodes::drug(&["435"]),
            ),
            compile("gabapentin", Medication, &["neurontin"], TermCodes::drug(&["25480"])),
            compile("sertraline", Medication, &["zoloft"], TermCodes::drug(&["36437"])),
            compile(
                "levothyroxine",
                Medication,
                &["synthroid"],
                TermCodes::drug(&["10582"]),
            ),
            // Labs
            compile(
                "complete blood count",
                Lab,
                &["cbc"],
                TermCodes::lab(&["58410-2"]),
            ),
            compile(
                "basic metabolic panel",
                Lab,
                &["bmp"],
                TermCodes::lab(&["51990-0"]),
            ),
            compile(
                "comprehensive metabolic panel",
                Lab,
                &["cmp"],
                TermCodes::lab(&["24323-8"]),
            ),
            compile(
                "hemoglobin a1c",
                Lab,
                &["a1c", "hba1c"],
                TermCodes::lab(&["4548-4"]),
            ),
            compile(
                "lipid panel",
                Lab,
                &["cholesterol panel"],
                TermCodes::lab(&["57698-3"]),
            ),
            compile(
                "thyroid stimulating hormone",
                Lab,
                &["tsh"],
                TermCodes::lab(&["3016-3"]),
            ),
            compile("urinalysis", Lab, &["urine test"], TermCodes::lab(&["24356-8"])),
            compile(
                "liver function tests",
                Lab,
                &["lfts", "hepatic panel"],
                TermCodes::lab(&["24325-3"]),
            ),
            // Procedures
            compile("x-ray", Procedure, &["radiograph", "xray"], TermCodes::procedure(&["71045"])),
            compile(
                "mri",
                Procedure,
                &["magnetic resonance imaging"],
                TermCodes::procedure(&["70551"]),
            ),
            compile(
                "ct scan",
                Procedure,
                &["cat scan", "computed tomography"],
                TermCodes::procedure(&["74150"]),
            ),
            compile("ultrasound", Procedure, &["sonogram"], TermCodes::procedure(&["76700"])),
            compile(
                "echocardiogram",
                Procedure,
                &["echo"],
                TermCodes::procedure(&["93306"]),
            ),
            compile(
                "electrocardiogram",
                Procedure,
                &["ekg", "ecg"],
                TermCodes::procedure(&["93000"]),
            ),
            compile("colonoscopy", Procedure, &[], TermCodes::procedure(&["45378"])),
            // Conditions
            compile(
                "hypertension",
                Condition,
                &["high blood pressure"],
                TermCodes::diagnosis(&["I10"]),
            ),
            compile(
                "diabetes",
                Condition,
                &["diabetes mellitus"],
                TermCodes::diagnosis(&["E11.9"]),
            ),
            compile("asthma", Condition, &[], TermCodes::diagnosis(&["J45.909"])),
            compile("pneumonia", Condition, &[], TermCodes::diagnosis(&["J18.9"])),
            compile("migraine", Condition, &[], TermCodes::diagnosis(&["G43.909"])),
            compile(
                "hyperlipidemia",
                Condition,
                &["high cholesterol"],
                TermCodes::diagnosis(&["E78.5"]),
            ),
            compile(
                "gastroesophageal reflux",
                Condition,
                &["gerd", "acid reflux"],
                TermCodes::diagnosis(&["K21.9"]),
            ),
            // Anatomy
            compile("chest", Anatomy, &[], TermCodes::none()),
            compile("abdomen", Anatomy, &["belly", "stomach"], TermCodes::none()),
            compile("heart", Anatomy, &[], TermCodes::none()),
            compile("lungs", Anatomy, &["lung"], TermCodes::none()),
            compile("kidney", Anatomy, &["kidneys"], TermCodes::none()),
            compile("thyroid", Anatomy, &[], TermCodes::none()),
        ];

        Self { terms }
    }

    /// Number of canonical terms in the index.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Look up a term definition by its canonical name.
    pub fn get(&self, canonical: &str) -> Option<&MedicalTerm> {
        self.terms
            .iter()
            .map(|c| &c.term)
            .find(|t| t.term == canonical)
    }

    /// Find every term/synonym occurrence in `text`.
    ///
    /// All distinct text positions are kept; duplicate hits of the same
    /// `(term, position)` pair are deduplicated keeping the highest
    /// confidence. Results are ordered by position.
    pub fn find_matches(&self, text: &str) -> Vec<TermMatch> {
        let mut matches = Vec::new();
        for compiled in &self.terms {
            for (regex, confidence) in &compiled.patterns {
                for m in regex.find_iter(text) {
                    matches.push(TermMatch {
                        term: compiled.term.term.clone(),
                        category: compiled.term.category,
                        confidence: *confidence,
                        position: m.start(),
                        matched_text: m.as_str().to_string(),
                    });
                }
            }
        }

        matches.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.term.cmp(&b.term))
                .then_with(|| b.confidence.total_cmp(&a.confidence))
        });
        matches.dedup_by(|current, kept| {
            current.term == kept.term && current.position == kept.position
        });
        matches
    }

    /// Find matches of a single category.
    pub fn find_matches_in_category(
        &self,
        text: &str,
        category: TermCategory,
    ) -> Vec<TermMatch> {
        self.find_matches(text)
            .into_iter()
            .filter(|m| m.category == category)
            .collect()
    }
}

/// Boost medication matches that sit near a dosage mention.
///
/// `dosage_positions` are byte offsets of dosage pattern matches in the
/// same text. A medication within 50 chars of one gets +0.1, capped at 1.0.
pub fn boost_near_dosage(matches: &mut [TermMatch], dosage_positions: &[usize]) {
    for m in matches
        .iter_mut()
        .filter(|m| m.category == TermCategory::Medication)
    {
        let near = dosage_positions
            .iter()
            .any(|&p| p.abs_diff(m.position) <= DOSAGE_PROXIMITY_CHARS);
        if near {
            m.confidence = (m.confidence + DOSAGE_PROXIMITY_BOOST).min(1.0);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
