use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};

/// Label of an exam subject, e.g. `憲法 (Constitution)`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(Arc<str>);

impl Subject {
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// First whitespace separated token of the label. For `憲法 (Constitution)` this is `憲法`.
    pub fn short_name(&self) -> &str {
        self.0.split_whitespace().next().unwrap_or(&self.0)
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        Subject::new(value)
    }
}

/// Configured set of subjects, kept in the order they were configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSet {
    subjects: Vec<Subject>,
}

impl SubjectSet {
    /// Returns `None` for an empty list or when two subjects share a label.
    pub fn new_opt(labels: impl IntoIterator<Item = impl Into<Arc<str>>>) -> Option<Self> {
        let mut subjects = Vec::<Subject>::new();
        for label in labels {
            let subject = Subject::new(label);
            if subject.label().trim().is_empty() || subjects.contains(&subject) {
                return None;
            }
            subjects.push(subject);
        }
        if subjects.is_empty() {
            None
        } else {
            Some(Self { subjects })
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Finds a subject by its full label or its short name.
    pub fn resolve(&self, input: &str) -> Option<&Subject> {
        let input = input.trim();
        self.subjects
            .iter()
            .find(|v| v.label() == input)
            .or_else(|| self.subjects.iter().find(|v| v.short_name() == input))
    }
}
