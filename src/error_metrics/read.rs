use crate::error_metrics::stratifiers::bins::ConsensusType;
use crate::error_metrics::types::ReadKey;
use rust_htslib::bam;
use rust_htslib::bam::record::{Aux, Cigar};

/// The alignment attributes the error-metric engine reads from a record.
///
/// Implemented for `rust_htslib::bam::Record`; positions are 0-based.
pub trait AlignedRead {
    fn read_name(&self) -> &[u8];
    fn read_bases(&self) -> Vec<u8>;
    fn base_qualities(&self) -> &[u8];
    fn cigar_ops(&self) -> Vec<Cigar>;
    fn alignment_start(&self) -> i64;
    fn mapping_quality(&self) -> u8;
    fn is_reverse_strand(&self) -> bool;
    fn is_mate_reverse_strand(&self) -> bool;
    fn is_paired(&self) -> bool;
    fn is_first_of_pair(&self) -> bool;
    fn is_second_of_pair(&self) -> bool;
    fn is_proper_pair(&self) -> bool;
    fn is_mate_unmapped(&self) -> bool;
    fn template_length(&self) -> i64;
    fn string_tag(&self, tag: &[u8]) -> Option<String>;
    fn integer_tag(&self, tag: &[u8]) -> Option<i64>;
}

impl AlignedRead for bam::Record {
    fn read_name(&self) -> &[u8] {
        self.qname()
    }

    fn read_bases(&self) -> Vec<u8> {
        self.seq().as_bytes()
    }

    fn base_qualities(&self) -> &[u8] {
        self.qual()
    }

    fn cigar_ops(&self) -> Vec<Cigar> {
        self.cigar().iter().cloned().collect()
    }

    fn alignment_start(&self) -> i64 {
        self.pos()
    }

    fn mapping_quality(&self) -> u8 {
        self.mapq()
    }

    fn is_reverse_strand(&self) -> bool {
        bam::Record::is_reverse(self)
    }

    fn is_mate_reverse_strand(&self) -> bool {
        bam::Record::is_mate_reverse(self)
    }

    fn is_paired(&self) -> bool {
        bam::Record::is_paired(self)
    }

    fn is_first_of_pair(&self) -> bool {
        self.is_first_in_template()
    }

    fn is_second_of_pair(&self) -> bool {
        self.is_last_in_template()
    }

    fn is_proper_pair(&self) -> bool {
        bam::Record::is_proper_pair(self)
    }

    fn is_mate_unmapped(&self) -> bool {
        bam::Record::is_mate_unmapped(self)
    }

    fn template_length(&self) -> i64 {
        self.insert_size()
    }

    fn string_tag(&self, tag: &[u8]) -> Option<String> {
        match self.aux(tag) {
            Ok(Aux::String(value)) => Some(value.to_string()),
            Ok(Aux::Char(value)) => Some((value as char).to_string()),
            _ => None,
        }
    }

    fn integer_tag(&self, tag: &[u8]) -> Option<i64> {
        match self.aux(tag) {
            Ok(Aux::I8(v)) => Some(v as i64),
            Ok(Aux::U8(v)) => Some(v as i64),
            Ok(Aux::I16(v)) => Some(v as i64),
            Ok(Aux::U16(v)) => Some(v as i64),
            Ok(Aux::I32(v)) => Some(v as i64),
            Ok(Aux::U32(v)) => Some(v as i64),
            _ => None,
        }
    }
}

/// Tile and in-tile coordinates parsed from an Illumina read name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowcellCoordinates {
    pub tile: u32,
    pub x: u32,
    pub y: u32,
}

impl FlowcellCoordinates {
    /// Parse Illumina-style read names.
    /// Format: <instrument>:<run>:<flowcell>:<lane>:<tile>:<x>:<y>
    /// Older format: <machine>:<lane>:<tile>:<x>:<y>
    pub fn from_read_name(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split(':').collect();
        let (tile, x, y) = match parts.len() {
            n if n >= 7 => (parts[4], parts[5], parts[6]),
            5 => (parts[2], parts[3], parts[4]),
            _ => return None,
        };
        Some(Self {
            tile: tile.parse().ok()?,
            x: x.parse().ok()?,
            y: y.parse().ok()?,
        })
    }
}

/// Per-read values computed once, when the read is first seen, and shared by
/// every locus the read covers.
#[derive(Debug, Clone)]
pub struct ReadContext {
    pub name: Vec<u8>,
    /// Upper-cased bases, soft clips included, in reference orientation.
    pub bases: Vec<u8>,
    pub qualities: Vec<u8>,
    pub cigar: Vec<Cigar>,
    pub alignment_start: u32,
    /// Last reference position covered by the alignment (inclusive).
    pub alignment_end: u32,
    /// First read offset that is not soft clipped.
    pub aligned_query_start: usize,
    /// One past the last read offset that is not soft clipped.
    pub aligned_query_end: usize,
    pub mapping_quality: u8,
    pub is_reverse: bool,
    pub is_mate_reverse: bool,
    pub is_paired: bool,
    pub is_first_of_pair: bool,
    pub is_second_of_pair: bool,
    pub is_proper_pair: bool,
    pub is_mate_unmapped: bool,
    pub template_length: i64,
    pub read_group: Option<String>,
    pub flowcell: Option<FlowcellCoordinates>,
    pub consensus: ConsensusType,
    /// GC fraction over all bases, rounded to two decimals.
    pub gc_content: f64,
    pub n_count: usize,
    pub mismatch_count: usize,
    pub soft_clipped_bases: usize,
}

impl ReadContext {
    /// `reference` holds the bases of the contig the read is aligned to.
    pub fn new<R: AlignedRead>(read: &R, reference: &[u8]) -> Self {
        let bases: Vec<u8> = read
            .read_bases()
            .iter()
            .map(|b| b.to_ascii_uppercase())
            .collect();
        let cigar = read.cigar_ops();
        let alignment_start = read.alignment_start().max(0) as u32;

        let reference_length: u32 = cigar
            .iter()
            .map(|op| match op {
                Cigar::Match(l) | Cigar::Equal(l) | Cigar::Diff(l) | Cigar::Del(l) | Cigar::RefSkip(l) => *l,
                _ => 0,
            })
            .sum();
        let alignment_end = alignment_start + reference_length.max(1) - 1;

        let leading_clip = cigar
            .iter()
            .take_while(|op| matches!(op, Cigar::SoftClip(_) | Cigar::HardClip(_)))
            .map(|op| match op {
                Cigar::SoftClip(l) => *l as usize,
                _ => 0,
            })
            .sum::<usize>();
        let trailing_clip = cigar
            .iter()
            .rev()
            .take_while(|op| matches!(op, Cigar::SoftClip(_) | Cigar::HardClip(_)))
            .map(|op| match op {
                Cigar::SoftClip(l) => *l as usize,
                _ => 0,
            })
            .sum::<usize>();
        let soft_clipped_bases = cigar
            .iter()
            .map(|op| match op {
                Cigar::SoftClip(l) => *l as usize,
                _ => 0,
            })
            .sum();

        let gc_content = if bases.is_empty() {
            0.0
        } else {
            let gc = bases.iter().filter(|&&b| b == b'G' || b == b'C').count();
            (100.0 * gc as f64 / bases.len() as f64).round() / 100.0
        };
        let n_count = bases.iter().filter(|&&b| b == b'N').count();
        let mismatch_count = count_mismatches(&bases, &cigar, alignment_start, reference);

        let name = read.read_name().to_vec();
        let flowcell = std::str::from_utf8(&name)
            .ok()
            .and_then(FlowcellCoordinates::from_read_name);

        Self {
            aligned_query_start: leading_clip.min(bases.len()),
            aligned_query_end: bases.len().saturating_sub(trailing_clip),
            qualities: read.base_qualities().to_vec(),
            mapping_quality: read.mapping_quality(),
            is_reverse: read.is_reverse_strand(),
            is_mate_reverse: read.is_mate_reverse_strand(),
            is_paired: read.is_paired(),
            is_first_of_pair: read.is_first_of_pair(),
            is_second_of_pair: read.is_second_of_pair(),
            is_proper_pair: read.is_proper_pair(),
            is_mate_unmapped: read.is_mate_unmapped(),
            template_length: read.template_length(),
            read_group: read.string_tag(b"RG"),
            consensus: ConsensusType::of(read),
            name,
            bases,
            cigar,
            alignment_start,
            alignment_end,
            flowcell,
            gc_content,
            n_count,
            mismatch_count,
            soft_clipped_bases,
        }
    }

    pub fn key(&self) -> ReadKey {
        ReadKey {
            name: self.name.clone(),
            first_of_pair: !self.is_second_of_pair,
            alignment_start: self.alignment_start,
        }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// 1-based sequencing cycle of a read offset.
    pub fn cycle(&self, offset: usize) -> usize {
        if self.is_reverse {
            self.bases.len() - offset
        } else {
            offset + 1
        }
    }
}

pub fn read_key<R: AlignedRead>(read: &R) -> ReadKey {
    ReadKey {
        name: read.read_name().to_vec(),
        first_of_pair: !read.is_second_of_pair(),
        alignment_start: read.alignment_start().max(0) as u32,
    }
}

/// Aligned bases that differ from the reference, ignoring no-calls on either
/// side.
fn count_mismatches(bases: &[u8], cigar: &[Cigar], alignment_start: u32, reference: &[u8]) -> usize {
    let mut ref_pos = alignment_start as usize;
    let mut read_pos = 0usize;
    let mut mismatches = 0;

    for op in cigar {
        match op {
            Cigar::Match(l) | Cigar::Equal(l) | Cigar::Diff(l) => {
                let len = *l as usize;
                for i in 0..len {
                    if let (Some(&read_base), Some(&ref_base)) =
                        (bases.get(read_pos + i), reference.get(ref_pos + i))
                    {
                        let ref_base = ref_base.to_ascii_uppercase();
                        if read_base != b'N' && ref_base != b'N' && read_base != ref_base {
                            mismatches += 1;
                        }
                    }
                }
                read_pos += len;
                ref_pos += len;
            }
            Cigar::Del(l) | Cigar::RefSkip(l) => ref_pos += *l as usize,
            Cigar::Ins(l) | Cigar::SoftClip(l) => read_pos += *l as usize,
            Cigar::HardClip(_) | Cigar::Pad(_) => {}
        }
    }
    mismatches
}
