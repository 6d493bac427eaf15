use crate::error_metrics::errors::{ErrorMetricsError, Result};
use crate::error_metrics::read::AlignedRead;
use std::fmt;

/// Quintile of the read a cycle falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CycleBin {
    Quintile1,
    Quintile2,
    Quintile3,
    Quintile4,
    Quintile5,
}

impl CycleBin {
    /// `position` is the relative read position in `[0, 1]`.
    pub fn from_relative_position(position: f64) -> Result<Self> {
        // NaN fails every comparison below
        if !(0.0..=1.0).contains(&position) {
            return Err(ErrorMetricsError::RelativePositionOutOfRange { value: position });
        }
        let bin = if position <= 0.2 {
            CycleBin::Quintile1
        } else if position <= 0.4 {
            CycleBin::Quintile2
        } else if position <= 0.6 {
            CycleBin::Quintile3
        } else if position <= 0.8 {
            CycleBin::Quintile4
        } else {
            CycleBin::Quintile5
        };
        Ok(bin)
    }

    /// 1-based `cycle` of a read with `read_length` bases.
    pub fn from_cycle(cycle: usize, read_length: usize) -> Result<Self> {
        let position = if read_length <= 1 {
            0.0
        } else {
            (cycle as f64 - 1.0) / (read_length as f64 - 1.0)
        };
        Self::from_relative_position(position)
    }
}

impl fmt::Display for CycleBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleBin::Quintile1 => "QUINTILE_1",
            CycleBin::Quintile2 => "QUINTILE_2",
            CycleBin::Quintile3 => "QUINTILE_3",
            CycleBin::Quintile4 => "QUINTILE_4",
            CycleBin::Quintile5 => "QUINTILE_5",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomopolymerBin {
    NotHomopolymer,
    ShortHomopolymer,
    LongHomopolymer,
}

impl HomopolymerBin {
    pub fn from_length(length: usize, long_threshold: usize) -> Self {
        if length <= 1 {
            HomopolymerBin::NotHomopolymer
        } else if length < long_threshold {
            HomopolymerBin::ShortHomopolymer
        } else {
            HomopolymerBin::LongHomopolymer
        }
    }
}

impl fmt::Display for HomopolymerBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HomopolymerBin::NotHomopolymer => "NOT_HOMOPOLYMER",
            HomopolymerBin::ShortHomopolymer => "SHORT_HOMOPOLYMER",
            HomopolymerBin::LongHomopolymer => "LONG_HOMOPOLYMER",
        };
        write!(f, "{}", label)
    }
}

/// Consensus class derived from the `cD`/`aD`/`bD` depth tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsensusType {
    SimplexSingleton,
    SimplexConsensus,
    DuplexSingleton,
    DuplexConsensus,
    Unknown,
}

impl ConsensusType {
    pub fn of<R: AlignedRead>(read: &R) -> Self {
        let Some(depth) = read.integer_tag(b"cD") else {
            return ConsensusType::Unknown;
        };
        let a_depth = read.integer_tag(b"aD").unwrap_or(0);
        let b_depth = read.integer_tag(b"bD").unwrap_or(0);

        if a_depth > 0 && b_depth > 0 {
            if a_depth == 1 && b_depth == 1 {
                ConsensusType::DuplexSingleton
            } else {
                ConsensusType::DuplexConsensus
            }
        } else if depth == 1 {
            ConsensusType::SimplexSingleton
        } else {
            ConsensusType::SimplexConsensus
        }
    }
}

impl fmt::Display for ConsensusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConsensusType::SimplexSingleton => "SIMPLEX_SINGLETON",
            ConsensusType::SimplexConsensus => "SIMPLEX_CONSENSUS",
            ConsensusType::DuplexSingleton => "DUPLEX_SINGLETON",
            ConsensusType::DuplexConsensus => "DUPLEX_CONSENSUS",
            ConsensusType::Unknown => "UNKNOWN",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOrdinality {
    First,
    Second,
}

impl fmt::Display for ReadOrdinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadOrdinality::First => write!(f, "FIRST"),
            ReadOrdinality::Second => write!(f, "SECOND"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadDirection {
    Positive,
    Negative,
}

impl fmt::Display for ReadDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadDirection::Positive => write!(f, "POSITIVE"),
            ReadDirection::Negative => write!(f, "NEGATIVE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOrientation {
    F1R2,
    F2R1,
}

impl PairOrientation {
    /// `None` for unpaired reads, unmapped mates and same-strand pairs.
    pub fn of(
        is_paired: bool,
        is_mate_unmapped: bool,
        is_first_of_pair: bool,
        is_reverse: bool,
        is_mate_reverse: bool,
    ) -> Option<Self> {
        if !is_paired || is_mate_unmapped || is_reverse == is_mate_reverse {
            return None;
        }
        if is_first_of_pair != is_reverse {
            Some(PairOrientation::F1R2)
        } else {
            Some(PairOrientation::F2R1)
        }
    }
}

impl fmt::Display for PairOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairOrientation::F1R2 => write!(f, "F1R2"),
            PairOrientation::F2R1 => write!(f, "F2R1"),
        }
    }
}
