//! Lexicon-based polarity analyzer.
//!
//! Averages the polarity of every opinion word found in the text. An intensifier
//! directly before an opinion word scales it, a negation earlier in the same
//! sentence flips it at half strength, and a handful of emoticons carry their
//! own polarity. Text without any opinion word scores exactly 0.0.

use super::PolarityAnalyzer;
use anyhow::Result;
use lazy_static::lazy_static;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

const NEGATION_FACTOR: f64 = -0.5;

const NEGATIONS: &[&str] = &["no", "not", "never", "nothing", "neither", "nor", "without"];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("absolutely", 1.5),
    ("totally", 1.3),
    ("highly", 1.3),
    ("incredibly", 1.5),
    ("super", 1.3),
    ("quite", 1.1),
    ("truly", 1.3),
];

const EMOTICONS: &[(&str, f64)] = &[
    (":)", 0.5),
    (":-)", 0.5),
    ("(:", 0.5),
    (":D", 1.0),
    (":-D", 1.0),
    (";)", 0.25),
    (":(", -0.75),
    (":-(", -0.75),
    ("):", -0.75),
    (":'(", -1.0),
    (":/", -0.25),
];

const OPINION_WORDS: &[(&str, f64)] = &[
    // positive
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("best", 1.0),
    ("better", 0.5),
    ("beautiful", 0.85),
    ("brilliant", 0.9),
    ("delicious", 1.0),
    ("tasty", 0.6),
    ("yummy", 0.8),
    ("fresh", 0.3),
    ("hot", 0.25),
    ("fast", 0.2),
    ("quick", 0.33),
    ("friendly", 0.4),
    ("polite", 0.4),
    ("helpful", 0.5),
    ("happy", 0.8),
    ("glad", 0.5),
    ("love", 0.5),
    ("loved", 0.7),
    ("lovely", 0.5),
    ("like", 0.2),
    ("liked", 0.3),
    ("nice", 0.6),
    ("fine", 0.4),
    ("okay", 0.5),
    ("ok", 0.5),
    ("perfect", 1.0),
    ("wonderful", 1.0),
    ("fantastic", 0.4),
    ("superb", 1.0),
    ("outstanding", 0.5),
    ("recommend", 0.4),
    ("recommended", 0.4),
    ("worth", 0.3),
    ("satisfied", 0.5),
    ("pleasant", 0.7),
    ("enjoyed", 0.5),
    ("enjoy", 0.4),
    ("affordable", 0.3),
    ("cheap", 0.4),
    ("reasonable", 0.2),
    ("convenient", 0.3),
    ("reliable", 0.4),
    ("smooth", 0.4),
    ("impressive", 1.0),
    ("thanks", 0.2),
    ("thank", 0.2),
    ("top", 0.5),
    ("wow", 0.1),
    ("generous", 0.5),
    ("clean", 0.37),
    ("favourite", 0.5),
    ("favorite", 0.5),
    ("correct", 0.3),
    ("easy", 0.43),
    ("safe", 0.5),
    // negative
    ("bad", -0.7),
    ("worse", -0.4),
    ("worst", -1.0),
    ("terrible", -1.0),
    ("horrible", -1.0),
    ("awful", -1.0),
    ("pathetic", -1.0),
    ("disgusting", -1.0),
    ("poor", -0.4),
    ("slow", -0.3),
    ("late", -0.3),
    ("delayed", -0.4),
    ("cold", -0.6),
    ("stale", -0.5),
    ("bland", -0.5),
    ("expensive", -0.5),
    ("overpriced", -0.6),
    ("rude", -0.6),
    ("wrong", -0.5),
    ("missing", -0.2),
    ("broken", -0.4),
    ("dirty", -0.6),
    ("sad", -0.5),
    ("angry", -0.5),
    ("annoying", -0.8),
    ("annoyed", -0.6),
    ("disappointing", -0.6),
    ("disappointed", -0.75),
    ("useless", -0.5),
    ("waste", -0.2),
    ("hate", -0.8),
    ("hated", -0.9),
    ("unacceptable", -0.8),
    ("scam", -0.8),
    ("fraud", -0.8),
    ("refund", -0.1),
    ("cancelled", -0.3),
    ("canceled", -0.3),
    ("sick", -0.71),
    ("unhygienic", -0.7),
    ("unprofessional", -0.6),
    ("frustrating", -0.4),
    ("frustrated", -0.7),
    ("mediocre", -0.3),
    ("avoid", -0.4),
    ("problem", -0.2),
    ("issue", -0.1),
    ("hungry", -0.2),
    ("difficult", -0.5),
    ("unfortunately", -0.5),
    ("unsafe", -0.5),
];

lazy_static! {
    static ref OPINION_LEXICON: HashMap<&'static str, f64> =
        OPINION_WORDS.iter().copied().collect();
    static ref INTENSITY: HashMap<&'static str, f64> = INTENSIFIERS.iter().copied().collect();
    static ref EMOTICON_POLARITY: HashMap<&'static str, f64> =
        EMOTICONS.iter().copied().collect();
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconAnalyzer;

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn assess(&self, text: &str) -> Vec<f64> {
        let mut assessments = Vec::new();

        for token in text.split_whitespace() {
            if let Some(polarity) = EMOTICON_POLARITY.get(token) {
                assessments.push(*polarity);
            }
        }

        for sentence in text.split_terminator(['.', '!', '?', ';']) {
            let mut negated = false;
            let mut multiplier: Option<f64> = None;

            for word in sentence.unicode_words() {
                let word = word.to_lowercase();
                if is_negation(&word) {
                    negated = true;
                    multiplier = None;
                    continue;
                }
                if let Some(intensity) = INTENSITY.get(word.as_str()) {
                    multiplier = Some(multiplier.unwrap_or(1.0) * intensity);
                    continue;
                }
                match OPINION_LEXICON.get(word.as_str()) {
                    Some(polarity) => {
                        let mut value = polarity * multiplier.unwrap_or(1.0);
                        if negated {
                            value *= NEGATION_FACTOR;
                            negated = false;
                        }
                        assessments.push(value.clamp(-1.0, 1.0));
                        multiplier = None;
                    }
                    None => multiplier = None,
                }
            }
        }

        assessments
    }
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't") || word.ends_with("n’t")
}

impl PolarityAnalyzer for LexiconAnalyzer {
    fn polarity(&self, text: &str) -> Result<f64> {
        let assessments = self.assess(text);
        if assessments.is_empty() {
            return Ok(0.0);
        }
        let mean = assessments.iter().sum::<f64>() / assessments.len() as f64;
        Ok(mean.clamp(-1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polarity(text: &str) -> f64 {
        LexiconAnalyzer::new().polarity(text).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_no_opinion_words_is_zero() {
        assert_eq!(polarity(""), 0.0);
        assert_eq!(polarity("The order arrived at 9 pm"), 0.0);
    }

    #[test]
    fn test_single_word_polarity() {
        assert!(approx(polarity("The food was good"), 0.7));
        assert!(approx(polarity("Terrible delivery"), -1.0));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(approx(polarity("GOOD"), 0.7));
    }

    #[test]
    fn test_intensifier_scales_next_word() {
        assert!(approx(polarity("very good"), 0.91));
    }

    #[test]
    fn test_intensifier_is_capped() {
        assert!(approx(polarity("extremely excellent"), 1.0));
    }

    #[test]
    fn test_negation_flips_at_half_strength() {
        assert!(approx(polarity("not good"), -0.35));
        assert!(approx(polarity("The food wasn't good"), -0.35));
        assert!(approx(polarity("never a bad meal"), 0.35));
    }

    #[test]
    fn test_negation_does_not_cross_sentences() {
        assert!(approx(polarity("Not today. Good food"), 0.7));
    }

    #[test]
    fn test_mean_of_assessments() {
        let p = polarity("The food was great but delivery was terrible");
        assert!(approx(p, -0.1));
    }

    #[test]
    fn test_emoticons_count() {
        assert!(approx(polarity("arrived :)"), 0.5));
        assert!(approx(polarity("good :("), (0.7 - 0.75) / 2.0));
    }
}
