//! # Audit Trail
//!
//! Append-only log of committed transitions. Each record's digest covers its
//! content and its predecessor's digest, so editing, dropping or reordering
//! any record breaks [`verify_chain`].
//!
//! Readers page through the log with [`AuditLog::page`]. A page is checked
//! against the record just before it, so verifying one page costs the page,
//! not the whole trail.

use licgate_core::{sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest, Timestamp};
use serde::Serialize;

use crate::error::AuditError;
use crate::license::{LicenseTransition, LicenseTransitionRecord};

/// The hashed portion of a record.
#[derive(Serialize)]
struct RecordBody<'a> {
    sequence: u64,
    #[serde(flatten)]
    transition: &'a LicenseTransition,
    timestamp: &'a Timestamp,
    prev_digest: Option<&'a ContentDigest>,
}

fn record_digest(
    sequence: u64,
    transition: &LicenseTransition,
    timestamp: &Timestamp,
    prev_digest: Option<&ContentDigest>,
) -> Result<ContentDigest, CanonicalizationError> {
    let body = RecordBody {
        sequence,
        transition,
        timestamp,
        prev_digest,
    };
    Ok(sha256_digest(&CanonicalBytes::new(&body)?))
}

/// In-memory hash-chained log.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    records: Vec<LicenseTransitionRecord>,
}

impl AuditLog {
    /// An empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence, timestamp, link and append `transition`.
    pub fn append(
        &mut self,
        transition: LicenseTransition,
    ) -> Result<&LicenseTransitionRecord, CanonicalizationError> {
        let sequence = self.records.len() as u64;
        let timestamp = Timestamp::now();
        let prev_digest = self.head().copied();
        let digest = record_digest(sequence, &transition, &timestamp, prev_digest.as_ref())?;
        let index = self.records.len();
        self.records.push(LicenseTransitionRecord {
            sequence,
            transition,
            timestamp,
            prev_digest,
            digest,
        });
        Ok(&self.records[index])
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[LicenseTransitionRecord] {
        &self.records
    }

    /// Digest of the newest record.
    pub fn head(&self) -> Option<&ContentDigest> {
        self.records.last().map(|r| &r.digest)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check every link and digest in this log.
    pub fn verify_chain(&self) -> Result<(), AuditError> {
        verify_chain(&self.records)
    }

    /// Up to `limit` records starting at sequence `from`. Empty past the end.
    pub fn page(&self, from: u64, limit: usize) -> &[LicenseTransitionRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        let end = start.saturating_add(limit).min(self.records.len());
        &self.records[start..end]
    }

    /// Verify the records [`AuditLog::page`] returns for the same window,
    /// including the first record's link to its predecessor.
    pub fn verify_page(&self, from: u64, limit: usize) -> Result<(), AuditError> {
        let page = self.page(from, limit);
        let Some(first) = page.first() else {
            return Ok(());
        };
        let prev = first
            .sequence
            .checked_sub(1)
            .and_then(|s| usize::try_from(s).ok())
            .and_then(|i| self.records.get(i));
        verify_segment(page, prev)
    }
}

/// Check sequence numbers, back-links and digests of an exported trail.
pub fn verify_chain(records: &[LicenseTransitionRecord]) -> Result<(), AuditError> {
    verify_segment(records, None)
}

/// Check a contiguous run of records that follows `prev`, or starts the
/// trail when `prev` is `None`.
pub fn verify_segment(
    records: &[LicenseTransitionRecord],
    prev: Option<&LicenseTransitionRecord>,
) -> Result<(), AuditError> {
    let mut expected = prev.map_or(0, |p| p.sequence.saturating_add(1));
    let mut prev: Option<&ContentDigest> = prev.map(|p| &p.digest);
    for record in records {
        if record.sequence != expected {
            return Err(AuditError::SequenceGap {
                expected,
                found: record.sequence,
            });
        }
        if record.prev_digest.as_ref() != prev {
            return Err(AuditError::BrokenLink {
                sequence: record.sequence,
            });
        }
        let digest = record_digest(
            record.sequence,
            &record.transition,
            &record.timestamp,
            record.prev_digest.as_ref(),
        )?;
        if digest != record.digest {
            return Err(AuditError::DigestMismatch {
                sequence: record.sequence,
            });
        }
        prev = Some(&record.digest);
        expected = expected.saturating_add(1);
    }
    Ok(())
}
