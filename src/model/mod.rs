//! Data the rest of the crate passes around: [entry::StudyEntry] records, the
//! [entry::StudyLog] snapshot and the configured [subject::SubjectSet].

pub mod entry;
pub mod subject;
