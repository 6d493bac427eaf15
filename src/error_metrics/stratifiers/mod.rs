pub mod bins;

use crate::error_metrics::errors::Result;
use crate::error_metrics::options::MetricsSettings;
use crate::error_metrics::read::ReadContext;
use crate::error_metrics::types::{AlignmentType, LocusContext, ReadObservation};
use bins::{CycleBin, HomopolymerBin, PairOrientation, ReadDirection, ReadOrdinality};

/// One read's observation at one locus, as seen by the stratifiers.
#[derive(Debug, Clone, Copy)]
pub struct ObservedBase<'a> {
    pub read: &'a ReadContext,
    pub locus: &'a LocusContext<'a>,
    pub observation: ReadObservation,
}

impl<'a> ObservedBase<'a> {
    pub fn new(read: &'a ReadContext, locus: &'a LocusContext<'a>, observation: ReadObservation) -> Self {
        Self {
            read,
            locus,
            observation,
        }
    }

    fn offset(&self) -> usize {
        self.observation.offset
    }

    /// Read base at `offset`, uppercase, on the reference strand.
    pub fn read_base(&self) -> Option<u8> {
        self.read.bases.get(self.offset()).copied()
    }

    /// Read base `step` positions away in read direction (negative looks back).
    fn base_in_read_direction(&self, step: isize) -> Option<u8> {
        let step = if self.read.is_reverse { -step } else { step };
        let index = self.offset() as isize + step;
        if index < 0 {
            return None;
        }
        let base = *self.read.bases.get(index as usize)?;
        Some(self.orient(base))
    }

    fn orient(&self, base: u8) -> u8 {
        if self.read.is_reverse {
            complement(base)
        } else {
            base
        }
    }

    /// The run of identical bases preceding the observation in read direction,
    /// restricted to the aligned part of the read.
    fn preceding_homopolymer(&self) -> Option<(usize, u8)> {
        let read = self.read;
        let offset = self.offset();
        let start = read.aligned_query_start;
        let end = read.aligned_query_end;

        let indices: Box<dyn Iterator<Item = usize>> = if read.is_reverse {
            Box::new((offset + 1)..end)
        } else {
            Box::new((start..offset.min(end)).rev())
        };

        let mut run_base = None;
        let mut length = 0;
        for index in indices {
            let base = read.bases[index];
            match run_base {
                None => run_base = Some(base),
                Some(b) if b != base => break,
                Some(_) => {}
            }
            length += 1;
        }
        run_base.map(|base| (length, self.orient(base)))
    }

    fn padded_context(&self, padding: usize) -> Option<String> {
        let offset = self.offset();
        let first = offset.checked_sub(padding)?;
        let window = self.read.bases.get(first..=offset + padding)?;
        let oriented: Vec<u8> = if self.read.is_reverse {
            window.iter().rev().map(|&b| complement(b)).collect()
        } else {
            window.to_vec()
        };
        Some(String::from_utf8_lossy(&oriented).into_owned())
    }

    pub fn is_mismatch(&self) -> bool {
        if self.observation.alignment != AlignmentType::Match {
            return false;
        }
        let reference = self.locus.reference_base;
        match self.read_base() {
            Some(base) => base != reference && base != b'N' && reference != b'N',
            None => false,
        }
    }
}

pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        b'a' => b't',
        b'c' => b'g',
        b'g' => b'c',
        b't' => b'a',
        other => other,
    }
}

/// The closed set of covariates a directive can stratify on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stratifier {
    GcContent,
    ReadOrdinality,
    ReadBase,
    ReferenceBase,
    PreDinuc,
    PostDinuc,
    HomopolymerLength,
    Homopolymer,
    BinnedHomopolymer,
    FlowcellTile,
    FlowcellX,
    FlowcellY,
    ReadDirection,
    PairOrientation,
    PairProperness,
    Cycle,
    BinnedCycle,
    SoftClips,
    InsertLength,
    IndelLength,
    BaseQuality,
    MappingQuality,
    ReadGroup,
    MismatchesInRead,
    OneBasePaddedContext,
    TwoBasePaddedContext,
    Consensus,
    NsInRead,
}

impl Stratifier {
    pub const ALL: [Stratifier; 28] = [
        Stratifier::GcContent,
        Stratifier::ReadOrdinality,
        Stratifier::ReadBase,
        Stratifier::ReferenceBase,
        Stratifier::PreDinuc,
        Stratifier::PostDinuc,
        Stratifier::HomopolymerLength,
        Stratifier::Homopolymer,
        Stratifier::BinnedHomopolymer,
        Stratifier::FlowcellTile,
        Stratifier::FlowcellX,
        Stratifier::FlowcellY,
        Stratifier::ReadDirection,
        Stratifier::PairOrientation,
        Stratifier::PairProperness,
        Stratifier::Cycle,
        Stratifier::BinnedCycle,
        Stratifier::SoftClips,
        Stratifier::InsertLength,
        Stratifier::IndelLength,
        Stratifier::BaseQuality,
        Stratifier::MappingQuality,
        Stratifier::ReadGroup,
        Stratifier::MismatchesInRead,
        Stratifier::OneBasePaddedContext,
        Stratifier::TwoBasePaddedContext,
        Stratifier::Consensus,
        Stratifier::NsInRead,
    ];

    /// Token accepted in a directive.
    pub fn token(&self) -> &'static str {
        match self {
            Stratifier::GcContent => "GC_CONTENT",
            Stratifier::ReadOrdinality => "READ_ORDINALITY",
            Stratifier::ReadBase => "READ_BASE",
            Stratifier::ReferenceBase => "REFERENCE_BASE",
            Stratifier::PreDinuc => "PRE_DINUC",
            Stratifier::PostDinuc => "POST_DINUC",
            Stratifier::HomopolymerLength => "HOMOPOLYMER_LENGTH",
            Stratifier::Homopolymer => "HOMOPOLYMER",
            Stratifier::BinnedHomopolymer => "BINNED_HOMOPOLYMER",
            Stratifier::FlowcellTile => "FLOWCELL_TILE",
            Stratifier::FlowcellX => "FLOWCELL_X",
            Stratifier::FlowcellY => "FLOWCELL_Y",
            Stratifier::ReadDirection => "READ_DIRECTION",
            Stratifier::PairOrientation => "PAIR_ORIENTATION",
            Stratifier::PairProperness => "PAIR_PROPERNESS",
            Stratifier::Cycle => "CYCLE",
            Stratifier::BinnedCycle => "BINNED_CYCLE",
            Stratifier::SoftClips => "SOFT_CLIPS",
            Stratifier::InsertLength => "INSERT_LENGTH",
            Stratifier::IndelLength => "INDEL_LENGTH",
            Stratifier::BaseQuality => "BASE_QUALITY",
            Stratifier::MappingQuality => "MAPPING_QUALITY",
            Stratifier::ReadGroup => "READ_GROUP",
            Stratifier::MismatchesInRead => "MISMATCHES_IN_READ",
            Stratifier::OneBasePaddedContext => "ONE_BASE_PADDED_CONTEXT",
            Stratifier::TwoBasePaddedContext => "TWO_BASE_PADDED_CONTEXT",
            Stratifier::Consensus => "CONSENSUS",
            Stratifier::NsInRead => "NS_IN_READ",
        }
    }

    /// Fragment used in output file suffixes.
    pub fn suffix(&self) -> &'static str {
        match self {
            Stratifier::GcContent => "gc",
            Stratifier::ReadOrdinality => "read_ordinality",
            Stratifier::ReadBase => "read_base",
            Stratifier::ReferenceBase => "ref_base",
            Stratifier::PreDinuc => "pre_dinuc",
            Stratifier::PostDinuc => "post_dinuc",
            Stratifier::HomopolymerLength => "homopolymer_length",
            Stratifier::Homopolymer => "homopolymer_and_following_ref_base",
            Stratifier::BinnedHomopolymer => "binned_length_homopolymer_and_following_ref_base",
            Stratifier::FlowcellTile => "tile",
            Stratifier::FlowcellX => "x",
            Stratifier::FlowcellY => "y",
            Stratifier::ReadDirection => "read_direction",
            Stratifier::PairOrientation => "pair_orientation",
            Stratifier::PairProperness => "pair_proper",
            Stratifier::Cycle => "cycle",
            Stratifier::BinnedCycle => "binned_cycle",
            Stratifier::SoftClips => "soft_clipped_bases",
            Stratifier::InsertLength => "insert_length",
            Stratifier::IndelLength => "indel_length",
            Stratifier::BaseQuality => "base_quality",
            Stratifier::MappingQuality => "mapping_quality",
            Stratifier::ReadGroup => "read_group",
            Stratifier::MismatchesInRead => "mismatches_in_read",
            Stratifier::OneBasePaddedContext => "one_base_padded_context",
            Stratifier::TwoBasePaddedContext => "two_base_padded_context",
            Stratifier::Consensus => "consensus",
            Stratifier::NsInRead => "ns_in_read",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.token() == token)
    }

    /// Label of `base` on this covariate, `None` when the covariate is
    /// undefined for it.
    pub fn classify(&self, base: &ObservedBase, settings: &MetricsSettings) -> Result<Option<String>> {
        let read = base.read;
        let offset = base.observation.offset;

        let label = match self {
            Stratifier::GcContent => Some(format!("{:?}", read.gc_content)),
            Stratifier::ReadOrdinality => {
                let ordinality = if read.is_paired && read.is_second_of_pair {
                    ReadOrdinality::Second
                } else {
                    ReadOrdinality::First
                };
                Some(ordinality.to_string())
            }
            Stratifier::ReadBase => base
                .read_base()
                .map(|b| (base.orient(b) as char).to_string()),
            Stratifier::ReferenceBase => {
                Some((base.orient(base.locus.reference_base) as char).to_string())
            }
            Stratifier::PreDinuc => match (base.base_in_read_direction(-1), base.base_in_read_direction(0)) {
                (Some(previous), Some(current)) => {
                    Some(format!("{},{}", previous as char, current as char))
                }
                _ => None,
            },
            Stratifier::PostDinuc => match (base.base_in_read_direction(0), base.base_in_read_direction(1)) {
                (Some(current), Some(next)) => Some(format!("{},{}", current as char, next as char)),
                _ => None,
            },
            Stratifier::HomopolymerLength => base
                .preceding_homopolymer()
                .map(|(length, _)| length.to_string()),
            Stratifier::Homopolymer => base.preceding_homopolymer().map(|(length, run_base)| {
                format!(
                    "{},{},{}",
                    length,
                    run_base as char,
                    base.orient(base.locus.reference_base) as char
                )
            }),
            Stratifier::BinnedHomopolymer => base.preceding_homopolymer().map(|(length, run_base)| {
                format!(
                    "{},{},{}",
                    HomopolymerBin::from_length(length, settings.long_homopolymer),
                    run_base as char,
                    base.orient(base.locus.reference_base) as char
                )
            }),
            Stratifier::FlowcellTile => read.flowcell.map(|c| c.tile.to_string()),
            Stratifier::FlowcellX => read.flowcell.map(|c| c.x.to_string()),
            Stratifier::FlowcellY => read.flowcell.map(|c| c.y.to_string()),
            Stratifier::ReadDirection => {
                let direction = if read.is_reverse {
                    ReadDirection::Negative
                } else {
                    ReadDirection::Positive
                };
                Some(direction.to_string())
            }
            Stratifier::PairOrientation => PairOrientation::of(
                read.is_paired,
                read.is_mate_unmapped,
                !read.is_second_of_pair,
                read.is_reverse,
                read.is_mate_reverse,
            )
            .map(|o| o.to_string()),
            Stratifier::PairProperness => {
                if !read.is_paired {
                    None
                } else if read.is_proper_pair {
                    Some("PROPER".to_string())
                } else {
                    Some("IMPROPER".to_string())
                }
            }
            Stratifier::Cycle => {
                (offset < read.len()).then(|| read.cycle(offset).to_string())
            }
            Stratifier::BinnedCycle => {
                if offset < read.len() {
                    Some(CycleBin::from_cycle(read.cycle(offset), read.len())?.to_string())
                } else {
                    None
                }
            }
            Stratifier::SoftClips => Some(read.soft_clipped_bases.to_string()),
            Stratifier::InsertLength => {
                if read.is_paired && !read.is_mate_unmapped && read.template_length != 0 {
                    Some(read.template_length.abs().to_string())
                } else {
                    None
                }
            }
            Stratifier::IndelLength => match base.observation.alignment {
                AlignmentType::Match => None,
                _ => Some(base.observation.indel_length.to_string()),
            },
            Stratifier::BaseQuality => {
                // a deletion at the end of the read takes the last aligned base's quality
                let index = match base.observation.alignment {
                    AlignmentType::Deletion if offset >= read.len() => offset.checked_sub(1),
                    _ => Some(offset),
                };
                index
                    .and_then(|i| read.qualities.get(i))
                    .map(|q| q.to_string())
            }
            Stratifier::MappingQuality => Some(read.mapping_quality.to_string()),
            Stratifier::ReadGroup => read.read_group.clone(),
            Stratifier::MismatchesInRead => {
                let own = usize::from(base.is_mismatch());
                Some(read.mismatch_count.saturating_sub(own).to_string())
            }
            Stratifier::OneBasePaddedContext => base.padded_context(1),
            Stratifier::TwoBasePaddedContext => base.padded_context(2),
            Stratifier::Consensus => Some(read.consensus.to_string()),
            Stratifier::NsInRead => Some(read.n_count.to_string()),
        };
        Ok(label)
    }
}
