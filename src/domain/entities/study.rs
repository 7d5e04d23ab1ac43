use serde::{Deserialize, Serialize};

/// Delimiter between the two halves of a flashcard or practice question line.
pub const PAIR_DELIMITER: &str = ">>";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Detailed,
}

impl SummaryLength {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Short => "Short",
            Self::Medium => "Medium",
            Self::Detailed => "Detailed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    #[default]
    General,
    Physics,
    Chemistry,
    Biology,
    Geography,
    HistoryAndCivics,
}

impl Subject {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Physics => "Physics",
            Self::Chemistry => "Chemistry",
            Self::Biology => "Biology",
            Self::Geography => "Geography",
            Self::HistoryAndCivics => "History & Civics",
        }
    }
}

/// One `prompt>>answer` line: a flashcard term/definition or a question/answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPair {
    pub prompt: String,
    pub answer: String,
}

/// Parses model output in the `left>>right` line format.
///
/// Each line is split on its first `>>`; lines without a delimiter or with an
/// empty side are skipped. Surrounding Markdown bullets and bold markers are
/// stripped from the left side.
pub fn parse_delimited_pairs(text: &str) -> Vec<StudyPair> {
    text.lines()
        .filter_map(|line| {
            let (left, right) = line.split_once(PAIR_DELIMITER)?;
            let prompt = left
                .trim()
                .trim_start_matches(['*', '-'])
                .trim()
                .trim_matches('*')
                .trim();
            let answer = right.trim().trim_matches('*').trim();
            if prompt.is_empty() || answer.is_empty() {
                return None;
            }
            Some(StudyPair {
                prompt: prompt.to_string(),
                answer: answer.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs_skips_blank_and_undelimited_lines() {
        let text = "Osmosis>>Movement of water across a membrane\n\nFlashcards:\nMitosis>>Cell division";
        let pairs = parse_delimited_pairs(text);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].prompt, "Osmosis");
        assert_eq!(pairs[1].answer, "Cell division");
    }

    #[test]
    fn test_parse_pairs_splits_on_first_delimiter() {
        let pairs = parse_delimited_pairs("What does a>>b mean?>>Shift right");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].prompt, "What does a");
        assert_eq!(pairs[0].answer, "b mean?>>Shift right");
    }

    #[test]
    fn test_parse_pairs_strips_markdown_bullets() {
        let pairs = parse_delimited_pairs("- **Atom**>>Smallest unit of matter");
        assert_eq!(pairs[0].prompt, "Atom");
    }

    #[test]
    fn test_subject_serde_names() {
        let subject: Subject = serde_json::from_str("\"history_and_civics\"").unwrap();
        assert_eq!(subject.display_name(), "History & Civics");
    }
}
