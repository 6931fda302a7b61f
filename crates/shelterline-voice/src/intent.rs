use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use shelterline_core::Language;

/// The closed set of caller intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BedInquiry,
    Chapel,
    Volunteer,
    Donation,
    Crisis,
    Other,
}

/// The closed multilingual self-harm keyword list that routes to the
/// crisis flow.
///
/// Loaded from configuration; additions require redeploy. The default set
/// ships compiled in. Classification is deliberately strict: statements of
/// homelessness, hunger or urgency are shelter need, never crisis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrisisLexicon {
    phrases: HashMap<Language, Vec<String>>,
}

impl CrisisLexicon {
    pub fn new(phrases: HashMap<Language, Vec<String>>) -> Self {
        Self { phrases }
    }

    /// The language whose crisis phrase matches the utterance, if any.
    pub fn matches(&self, utterance_lower: &str) -> Option<Language> {
        for (&language, phrases) in &self.phrases {
            if phrases.iter().any(|p| utterance_lower.contains(p.as_str())) {
                return Some(language);
            }
        }
        None
    }
}

impl Default for CrisisLexicon {
    fn default() -> Self {
        let mut phrases = HashMap::new();
        phrases.insert(
            Language::English,
            vec![
                "kill myself".to_string(),
                "suicide".to_string(),
                "want to die".to_string(),
                "end my life".to_string(),
                "hurt myself".to_string(),
            ],
        );
        phrases.insert(
            Language::Spanish,
            vec![
                "suicidio".to_string(),
                "matarme".to_string(),
                "quitarme la vida".to_string(),
                "quiero morir".to_string(),
                "lastimarme".to_string(),
            ],
        );
        phrases.insert(
            Language::Portuguese,
            vec![
                "suicídio".to_string(),
                "me matar".to_string(),
                "quero morrer".to_string(),
                "me machucar".to_string(),
            ],
        );
        phrases.insert(
            Language::French,
            vec![
                "me tuer".to_string(),
                "veux mourir".to_string(),
                "me blesser".to_string(),
                "me suicider".to_string(),
            ],
        );
        Self { phrases }
    }
}

/// Keyword-driven intent classifier over the closed intent set.
///
/// Crisis is checked first and only against the configured lexicon; the
/// remaining intents match on multilingual topic keywords, with
/// `bed_inquiry` taking precedence so a caller who mentions both a bed and
/// a donation is routed to shelter intake.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    crisis: CrisisLexicon,
}

const BED_WORDS: &[&str] = &[
    "bed", "beds", "sleep", "stay", "shelter", "homeless", "cama", "camas", "sin hogar",
    "dormir", "leito", "abrigo", "sem-teto", "sem teto", "lit", "sans-abri", "sans abri",
    "hébergement",
];

const CHAPEL_WORDS: &[&str] = &[
    "chapel", "worship", "sermon", "preach", "capilla", "culto", "capela", "chapelle",
];

const VOLUNTEER_WORDS: &[&str] = &[
    "volunteer", "volunteering", "voluntario", "voluntaria", "voluntário", "bénévole",
    "benevole",
];

const DONATION_WORDS: &[&str] = &[
    "donate", "donation", "donar", "donación", "doar", "doação", "faire un don",
];

impl IntentClassifier {
    pub fn new(crisis: CrisisLexicon) -> Self {
        Self { crisis }
    }

    /// Classify one utterance. Empty input is `Other`.
    pub fn classify(&self, utterance: &str) -> Intent {
        let lower = utterance.to_lowercase();
        if lower.trim().is_empty() {
            return Intent::Other;
        }
        if self.crisis.matches(&lower).is_some() {
            return Intent::Crisis;
        }
        if contains_any(&lower, BED_WORDS) {
            return Intent::BedInquiry;
        }
        if contains_any(&lower, CHAPEL_WORDS) {
            return Intent::Chapel;
        }
        if contains_any(&lower, VOLUNTEER_WORDS) {
            return Intent::Volunteer;
        }
        if contains_any(&lower, DONATION_WORDS) {
            return Intent::Donation;
        }
        Intent::Other
    }

    /// Whether the utterance contains a configured crisis phrase, and in
    /// which language. Used by the session for preemption from any state.
    pub fn crisis_language(&self, utterance: &str) -> Option<Language> {
        self.crisis.matches(&utterance.to_lowercase())
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Guess the caller's language from lexical markers in an utterance.
/// Defaults to English when nothing distinctive appears.
pub fn detect_language(utterance: &str) -> Language {
    let lower = utterance.to_lowercase();
    let scores = [
        (
            Language::Spanish,
            count_hits(
                &lower,
                &[
                    "necesito", "cama", "hola", "quiero", "estoy", "gracias", "una", "sin hogar",
                    "ayuda", "por favor",
                ],
            ),
        ),
        (
            Language::Portuguese,
            count_hits(
                &lower,
                &[
                    "preciso", "leito", "olá", "obrigado", "obrigada", "estou", "uma cama",
                    "ajuda", "por favor", "sem teto",
                ],
            ),
        ),
        (
            Language::French,
            count_hits(
                &lower,
                &[
                    "bonjour", "besoin", "lit", "merci", "je suis", "j'ai", "aidez", "s'il vous",
                ],
            ),
        ),
    ];

    scores
        .into_iter()
        .filter(|(_, hits)| *hits > 0)
        .max_by_key(|(_, hits)| *hits)
        .map(|(language, _)| language)
        .unwrap_or(Language::English)
}

fn count_hits(haystack: &str, markers: &[&str]) -> usize {
    markers.iter().filter(|m| haystack.contains(*m)).count()
}
