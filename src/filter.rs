use crate::error::Error;
use crate::job::{DocumentKind, FileCandidate};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

/// Validated allow-list of legacy extensions. Always passed explicitly; there is
/// no implicit default set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    kinds: BTreeSet<DocumentKind>,
}

impl ExtensionSet {
    /// Accepts entries like `doc`, `.XLS` or ` .xls `. Anything outside
    /// `{doc, xls}` is rejected, as is an empty list.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self, Error> {
        let mut kinds = BTreeSet::new();
        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let kind = DocumentKind::from_extension(entry)
                .ok_or_else(|| Error::UnsupportedExtension(entry.to_string()))?;
            kinds.insert(kind);
        }
        if kinds.is_empty() {
            return Err(Error::NoFileTypes);
        }
        Ok(Self { kinds })
    }

    /// Case-insensitive; a leading dot is ignored.
    pub fn contains_extension(&self, ext: &str) -> bool {
        DocumentKind::from_extension(ext)
            .map(|kind| self.kinds.contains(&kind))
            .unwrap_or(false)
    }

    pub fn kinds(&self) -> impl Iterator<Item = DocumentKind> + '_ {
        self.kinds.iter().copied()
    }
}

/// The instant `days` days before `now`.
pub fn cutoff_days_before(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, Error> {
    if days < 0 {
        return Err(Error::InvalidSetting(format!(
            "days must not be negative (got {})",
            days
        )));
    }
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| Error::InvalidSetting(format!("days out of range: {}", days)))
}

/// A candidate is in scope iff its extension is allowed and it was modified
/// strictly after the cutoff.
pub fn accept(candidate: &FileCandidate, cutoff: DateTime<Utc>, extensions: &ExtensionSet) -> bool {
    extensions.contains_extension(&candidate.extension) && candidate.modified_at > cutoff
}

#[derive(Debug, Clone)]
pub struct AgeFilter {
    pub cutoff: DateTime<Utc>,
    pub extensions: ExtensionSet,
}

impl AgeFilter {
    pub fn new(cutoff: DateTime<Utc>, extensions: ExtensionSet) -> Self {
        Self { cutoff, extensions }
    }

    pub fn accepts(&self, candidate: &FileCandidate) -> bool {
        accept(candidate, self.cutoff, &self.extensions)
    }
}
