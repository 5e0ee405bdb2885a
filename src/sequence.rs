//! Sentence generation
//!
//! Turns a phrase template and a number range into the ordered list of
//! sentences that will be offered one by one.

use crate::error::SequenceError;

/// The pieces of a numbered sentence: `prefix N word [suffix]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PhraseTemplate {
    /// Words before the number ("I climbed")
    pub prefix: String,
    /// Word used when the number is exactly 1 ("step")
    pub singular: String,
    /// Word used for every other number ("steps")
    pub plural: String,
    /// Optional words after the counted word ("today"), empty for none
    pub suffix: String,
}

impl PhraseTemplate {
    pub fn new(
        prefix: impl Into<String>,
        singular: impl Into<String>,
        plural: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            singular: singular.into(),
            plural: plural.into(),
            suffix: suffix.into(),
        }
    }

    /// Template from typed answers, with surrounding whitespace removed
    pub fn from_input(prefix: &str, singular: &str, plural: &str, suffix: &str) -> Self {
        Self::new(prefix.trim(), singular.trim(), plural.trim(), suffix.trim())
    }

    /// Pick the word for `n`. Only the literal value 1 is singular.
    pub fn word_for(&self, n: i64) -> &str {
        if n == 1 {
            &self.singular
        } else {
            &self.plural
        }
    }

    /// Render the sentence for `n`
    pub fn render(&self, n: i64) -> String {
        let mut line = format!("{} {} {}", self.prefix, n, self.word_for(n));
        if !self.suffix.is_empty() {
            line.push(' ');
            line.push_str(&self.suffix);
        }
        line
    }
}

/// Build every sentence from `start` to `end`, inclusive
pub fn generate(
    template: &PhraseTemplate,
    start: i64,
    end: i64,
) -> Result<Vec<String>, SequenceError> {
    let count = validate(template, start, end)?;
    if usize::try_from(count).is_err() {
        return Err(SequenceError::RangeTooLarge { start, end });
    }
    Ok((start..=end).map(|n| template.render(n)).collect())
}

/// First `limit` sentences of the range, and how many were left out
pub fn preview(
    template: &PhraseTemplate,
    start: i64,
    end: i64,
    limit: usize,
) -> Result<(Vec<String>, u64), SequenceError> {
    let count = validate(template, start, end)?;
    let shown: Vec<String> = (start..=end).take(limit).map(|n| template.render(n)).collect();
    let hidden = count - shown.len() as u64;
    Ok((shown, hidden))
}

/// Check the template and range; returns the number of sentences
///
/// A range of every i64 holds 2^64 values, one more than a u64 can count.
fn validate(template: &PhraseTemplate, start: i64, end: i64) -> Result<u64, SequenceError> {
    if template.prefix.trim().is_empty() {
        return Err(SequenceError::EmptyPrefix);
    }
    if start > end {
        return Err(SequenceError::InvalidRange { start, end });
    }
    let count = i128::from(end) - i128::from(start) + 1;
    u64::try_from(count).map_err(|_| SequenceError::RangeTooLarge { start, end })
}
