//! Rating tags embedded in free-text tranche names.
//!
//! A tranche called "Senior AAA" or "Class BBB- Notes" carries its rating in
//! the name. Parsing splits the name into alphanumeric words and takes the
//! first word that is exactly one of the rating tokens, ignoring case. Whole
//! word matching keeps "AAA" from reading as "A" and ignores the letters
//! inside words such as "Mezzanine".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter rating recognised in a tranche name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "AAA")]
    Aaa,
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "BBB")]
    Bbb,
    #[serde(rename = "BB")]
    Bb,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "CCC")]
    Ccc,
    #[serde(rename = "CC")]
    Cc,
    #[serde(rename = "C")]
    C,
    Unrated,
}

/// Recognised tokens, longest first within each letter family.
const RATING_TOKENS: [(&str, Rating); 9] = [
    ("AAA", Rating::Aaa),
    ("AA", Rating::Aa),
    ("A", Rating::A),
    ("BBB", Rating::Bbb),
    ("BB", Rating::Bb),
    ("B", Rating::B),
    ("CCC", Rating::Ccc),
    ("CC", Rating::Cc),
    ("C", Rating::C),
];

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Aaa => "AAA",
            Rating::Aa => "AA",
            Rating::A => "A",
            Rating::Bbb => "BBB",
            Rating::Bb => "BB",
            Rating::B => "B",
            Rating::Ccc => "CCC",
            Rating::Cc => "CC",
            Rating::C => "C",
            Rating::Unrated => "Unrated",
        }
    }

    pub fn is_rated(&self) -> bool {
        !matches!(self, Rating::Unrated)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse the rating tag from a tranche name, or `Rating::Unrated`.
pub fn parse_rating(name: &str) -> Rating {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .find_map(|word| {
            RATING_TOKENS
                .iter()
                .find(|(token, _)| word.eq_ignore_ascii_case(token))
                .map(|(_, rating)| *rating)
        })
        .unwrap_or(Rating::Unrated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_senior_aaa() {
        assert_eq!(parse_rating("Senior AAA"), Rating::Aaa);
    }

    #[test]
    fn test_class_a_notes() {
        assert_eq!(parse_rating("Class A Notes"), Rating::A);
    }

    #[test]
    fn test_equity_unrated() {
        assert_eq!(parse_rating("Equity"), Rating::Unrated);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(parse_rating("senior aa tranche"), Rating::Aa);
    }

    #[test]
    fn test_letters_inside_words_ignored() {
        // "Mezzanine", "Subordinated" and "Class" all contain rating letters
        assert_eq!(parse_rating("Mezzanine"), Rating::Unrated);
        assert_eq!(parse_rating("Subordinated Class"), Rating::Unrated);
    }

    #[test]
    fn test_notch_suffix() {
        assert_eq!(parse_rating("Class BBB- Notes"), Rating::Bbb);
        assert_eq!(parse_rating("BB+"), Rating::Bb);
    }

    #[test]
    fn test_first_word_wins() {
        assert_eq!(parse_rating("CCC tranche formerly B"), Rating::Ccc);
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(parse_rating(""), Rating::Unrated);
    }

    #[test]
    fn test_serializes_as_token() {
        assert_eq!(serde_json::to_string(&Rating::Bbb).unwrap(), "\"BBB\"");
        assert_eq!(Rating::Unrated.to_string(), "Unrated");
    }
}
