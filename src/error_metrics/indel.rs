//! Locating a read's bases and indels at a locus, and charging each indel
//! once per alignment.

use crate::error_metrics::types::{ReadKey, ReadObservation};
use rust_htslib::bam::record::Cigar;
use std::collections::{HashMap, HashSet};

/// Observations a read with `cigar` starting at `alignment_start` contributes
/// at `position`: an aligned base, a deletion, and/or an insertion anchored
/// there.
///
/// Adjacent `D` elements form one deletion run and adjacent `I` elements one
/// insertion. An insertion is anchored at the last reference base before it,
/// or at the first aligned locus when it leads the alignment.
pub fn observations_at(cigar: &[Cigar], alignment_start: u32, position: u32) -> Vec<ReadObservation> {
    let mut observations = Vec::new();
    let position = position as u64;
    let mut ref_pos = alignment_start as u64;
    let mut read_pos = 0usize;
    let mut consumed_reference = false;

    let mut i = 0;
    while i < cigar.len() {
        match cigar[i] {
            Cigar::Match(len) | Cigar::Equal(len) | Cigar::Diff(len) => {
                let len = len as u64;
                if position >= ref_pos && position < ref_pos + len {
                    observations.push(ReadObservation::aligned(read_pos + (position - ref_pos) as usize));
                }
                ref_pos += len;
                read_pos += len as usize;
                consumed_reference = true;
                i += 1;
            }
            Cigar::Del(_) => {
                let mut run = 0u32;
                while let Some(Cigar::Del(len)) = cigar.get(i) {
                    run += len;
                    i += 1;
                }
                if position >= ref_pos && position < ref_pos + run as u64 {
                    observations.push(ReadObservation::deletion(read_pos, run, ref_pos as u32));
                }
                ref_pos += run as u64;
                consumed_reference = true;
            }
            Cigar::Ins(_) => {
                let mut run = 0u32;
                while let Some(Cigar::Ins(len)) = cigar.get(i) {
                    run += len;
                    i += 1;
                }
                let anchor = if consumed_reference { ref_pos - 1 } else { ref_pos };
                if anchor == position {
                    observations.push(ReadObservation::insertion(read_pos, run));
                }
                read_pos += run as usize;
            }
            Cigar::SoftClip(len) => {
                read_pos += len as usize;
                i += 1;
            }
            Cigar::RefSkip(len) => {
                ref_pos += len as u64;
                consumed_reference = true;
                i += 1;
            }
            Cigar::HardClip(_) | Cigar::Pad(_) => i += 1,
        }
    }
    observations
}

/// Where a read stands in its current deletion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionState {
    #[default]
    NotYetSeen,
    InProgress,
    Charged,
}

#[derive(Debug)]
struct ReadLedger {
    alignment_end: u32,
    state: DeletionState,
    /// Deletion run start -> locus at which the run was charged.
    charged_deletions: HashMap<u32, u32>,
    charged_insertions: HashSet<u32>,
}

impl ReadLedger {
    fn new(alignment_end: u32) -> Self {
        Self {
            alignment_end,
            state: DeletionState::NotYetSeen,
            charged_deletions: HashMap::new(),
            charged_insertions: HashSet::new(),
        }
    }
}

/// Per-read indel bookkeeping for the reads overlapping the current locus.
#[derive(Debug, Default)]
pub struct IndelLedger {
    reads: HashMap<ReadKey, ReadLedger>,
}

impl IndelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the last reference position of `read` so its entry can be
    /// retired once the locus stream moves past it.
    pub fn track(&mut self, read: &ReadKey, alignment_end: u32) {
        self.reads
            .entry(read.clone())
            .or_insert_with(|| ReadLedger::new(alignment_end))
            .alignment_end = alignment_end;
    }

    /// True when `locus` lies in the deletion run of `read` starting at
    /// `run_start` and that run was already counted at an earlier locus.
    ///
    /// The run is counted at the first of its loci that is queried, so loci
    /// skipped inside a run never cause a second charge. Asking again about
    /// the same locus gives the same answer.
    pub fn process_deletion_locus(&mut self, read: &ReadKey, run_start: u32, locus: u32) -> bool {
        let entry = self
            .reads
            .entry(read.clone())
            .or_insert_with(|| ReadLedger::new(u32::MAX));

        let charged_at = *entry.charged_deletions.entry(run_start).or_insert(locus);
        let already_processed = charged_at != locus;
        entry.state = if already_processed {
            DeletionState::Charged
        } else {
            DeletionState::InProgress
        };
        already_processed
    }

    /// True the first time the insertion of `read` anchored at `locus` is
    /// charged, false afterwards.
    pub fn charge_insertion(&mut self, read: &ReadKey, locus: u32) -> bool {
        self.reads
            .entry(read.clone())
            .or_insert_with(|| ReadLedger::new(u32::MAX))
            .charged_insertions
            .insert(locus)
    }

    pub fn deletion_state(&self, read: &ReadKey) -> DeletionState {
        self.reads
            .get(read)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Drops every read whose alignment ends before `locus`.
    pub fn retire_before(&mut self, locus: u32) {
        self.reads.retain(|_, entry| entry.alignment_end >= locus);
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}
