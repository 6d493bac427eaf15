/// How a read relates to the reference at one locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentType {
    Match,
    Insertion,
    Deletion,
}

/// A single reference coordinate together with the reference base there.
#[derive(Debug, Clone, Copy)]
pub struct LocusContext<'a> {
    pub contig: &'a str,
    /// 0-based reference position
    pub position: u32,
    pub reference_base: u8,
}

impl<'a> LocusContext<'a> {
    pub fn new(contig: &'a str, position: u32, reference_base: u8) -> Self {
        Self {
            contig,
            position,
            reference_base: reference_base.to_ascii_uppercase(),
        }
    }
}

/// What one read contributes at one locus.
///
/// `offset` indexes the read's bases (soft clips included). For a deletion it
/// points at the first read base after the deletion; for an insertion at the
/// first inserted base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadObservation {
    pub offset: usize,
    pub alignment: AlignmentType,
    /// Length of the insertion or deletion run, 0 for aligned bases.
    pub indel_length: u32,
    /// First reference position of the deletion run this locus falls in.
    pub deletion_start: Option<u32>,
}

impl ReadObservation {
    pub fn aligned(offset: usize) -> Self {
        Self {
            offset,
            alignment: AlignmentType::Match,
            indel_length: 0,
            deletion_start: None,
        }
    }

    pub fn insertion(offset: usize, length: u32) -> Self {
        Self {
            offset,
            alignment: AlignmentType::Insertion,
            indel_length: length,
            deletion_start: None,
        }
    }

    pub fn deletion(offset: usize, length: u32, run_start: u32) -> Self {
        Self {
            offset,
            alignment: AlignmentType::Deletion,
            indel_length: length,
            deletion_start: Some(run_start),
        }
    }
}

/// Identity of one alignment record while it is being walked along the
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadKey {
    pub name: Vec<u8>,
    pub first_of_pair: bool,
    pub alignment_start: u32,
}

/// How a base relates to its overlapping mate base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MateAgreement {
    AgreesWithReference,
    /// Read and mate agree with each other but not with the reference.
    DisagreesWithReferenceOnly,
    /// Read disagrees with both the reference and the mate, which agree.
    DisagreesWithReferenceAndMate,
    ThreeWayDisagreement,
}

impl MateAgreement {
    /// Bases are compared on the reference strand, case-insensitively.
    pub fn classify(read_base: u8, mate_base: u8, reference_base: u8) -> Self {
        let read = read_base.to_ascii_uppercase();
        let mate = mate_base.to_ascii_uppercase();
        let reference = reference_base.to_ascii_uppercase();
        if read == reference {
            MateAgreement::AgreesWithReference
        } else if mate == read {
            MateAgreement::DisagreesWithReferenceOnly
        } else if mate == reference {
            MateAgreement::DisagreesWithReferenceAndMate
        } else {
            MateAgreement::ThreeWayDisagreement
        }
    }
}

/// The countable outcome of one observation, shared by every directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorEvent {
    Base {
        is_error: bool,
        overlap: Option<MateAgreement>,
    },
    Insertion {
        length: u32,
    },
    Deletion {
        length: u32,
    },
}
