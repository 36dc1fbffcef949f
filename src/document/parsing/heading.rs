//! Headline detection
//!
//! Section boundaries in a test description are ordinary paragraphs whose
//! text follows a fixed pattern and whose runs are all bold. The rules are
//! kept in a table so new conventions only need a new entry.

use once_cell::sync::Lazy;
use regex::Regex;

use super::formatting::{extract_paragraph_text, run_boldness};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Headline {
    TestCase,
    TestSpecification,
    ExperimentSpecification,
    QualificationStrategy,
    MappingToResearchInfrastructure,
}

impl Headline {
    /// Record label for sub-fields captured after this headline
    pub fn field_label(self) -> Option<&'static str> {
        match self {
            Headline::QualificationStrategy => Some("Qualification Strategy"),
            Headline::MappingToResearchInfrastructure => {
                Some("Mapping to Research Infrastructure")
            }
            _ => None,
        }
    }
}

static TEST_CASE_HEADLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Test Case\s(.*)").unwrap());
static TEST_SPECIFICATION_HEADLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Test Specification\s(.*)").unwrap());
static EXPERIMENT_SPECIFICATION_HEADLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Experiment Specification\s(.*)").unwrap());

enum TextRule {
    /// Anchored pattern whose first group is the section identifier
    Prefix(&'static Lazy<Regex>),
    /// Whole text, ignoring surrounding whitespace
    Exact(&'static str),
}

impl TextRule {
    fn matches(&self, text: &str) -> bool {
        match self {
            TextRule::Prefix(pattern) => pattern.is_match(text),
            TextRule::Exact(expected) => text.trim() == *expected,
        }
    }
}

struct HeadlineRule {
    headline: Headline,
    text: TextRule,
}

static HEADLINE_RULES: [HeadlineRule; 5] = [
    HeadlineRule {
        headline: Headline::TestCase,
        text: TextRule::Prefix(&TEST_CASE_HEADLINE),
    },
    HeadlineRule {
        headline: Headline::TestSpecification,
        text: TextRule::Prefix(&TEST_SPECIFICATION_HEADLINE),
    },
    HeadlineRule {
        headline: Headline::ExperimentSpecification,
        text: TextRule::Prefix(&EXPERIMENT_SPECIFICATION_HEADLINE),
    },
    HeadlineRule {
        headline: Headline::QualificationStrategy,
        text: TextRule::Exact("Qualification Strategy"),
    },
    HeadlineRule {
        headline: Headline::MappingToResearchInfrastructure,
        text: TextRule::Exact("Mapping to Research Infrastructure"),
    },
];

/// The parts of a paragraph headline detection looks at
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParagraphSummary {
    pub text: String,
    pub runs_bold: Vec<bool>,
}

impl ParagraphSummary {
    pub fn of(para: &docx_rs::Paragraph) -> Self {
        Self {
            text: extract_paragraph_text(para),
            runs_bold: run_boldness(para),
        }
    }

    /// A paragraph without runs is not bold
    pub fn is_bold(&self) -> bool {
        !self.runs_bold.is_empty() && self.runs_bold.iter().all(|&bold| bold)
    }

    /// Classify the paragraph, `None` for body text
    pub fn headline(&self) -> Option<Headline> {
        HEADLINE_RULES
            .iter()
            .find(|rule| rule.text.matches(&self.text))
            .filter(|_| self.is_bold())
            .map(|rule| rule.headline)
    }

    pub fn is_headline(&self, headline: Headline) -> bool {
        self.headline() == Some(headline)
    }
}

/// Identifier captured by an identifier-carrying headline, trimmed
pub(crate) fn headline_id(headline: Headline, text: &str) -> Option<String> {
    let pattern = match headline {
        Headline::TestCase => &TEST_CASE_HEADLINE,
        Headline::TestSpecification => &TEST_SPECIFICATION_HEADLINE,
        Headline::ExperimentSpecification => &EXPERIMENT_SPECIFICATION_HEADLINE,
        _ => return None,
    };
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().trim().to_string())
}
