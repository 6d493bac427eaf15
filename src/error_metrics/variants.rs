//! Known-variant lookup across several variant sources.

use crate::error_metrics::errors::ErrorMetricsError;
use anyhow::Result;
use log::debug;
use rust_htslib::bcf::{self, Read as _};
use std::collections::VecDeque;
use std::ops::Index;

/// A variant covering `[start, end]` (0-based, inclusive) on `contig`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub contig: String,
    pub start: u32,
    pub end: u32,
    pub id: Option<String>,
}

impl VariantRecord {
    pub fn new(contig: &str, start: u32, end: u32) -> Self {
        Self {
            contig: contig.to_string(),
            start,
            end: end.max(start),
            id: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn overlaps(&self, position: u32) -> bool {
        self.start <= position && position <= self.end
    }
}

/// A provider of known variants, read one contig at a time.
pub trait VariantSource {
    fn name(&self) -> &str;

    /// Every record on `contig`; empty when the source does not know it.
    fn records_for_contig(&mut self, contig: &str) -> Result<Vec<VariantRecord>>;
}

#[derive(Debug, Clone)]
pub struct InMemoryVariantSource {
    name: String,
    records: Vec<VariantRecord>,
}

impl InMemoryVariantSource {
    pub fn new(name: &str, records: Vec<VariantRecord>) -> Self {
        Self {
            name: name.to_string(),
            records,
        }
    }
}

impl VariantSource for InMemoryVariantSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn records_for_contig(&mut self, contig: &str) -> Result<Vec<VariantRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.contig == contig)
            .cloned()
            .collect())
    }
}

/// Indexed VCF/BCF file.
pub struct VcfVariantSource {
    name: String,
    reader: bcf::IndexedReader,
}

impl VcfVariantSource {
    pub fn from_path(path: &str) -> Result<Self> {
        let reader = bcf::IndexedReader::from_path(path)?;
        Ok(Self {
            name: path.to_string(),
            reader,
        })
    }
}

impl VariantSource for VcfVariantSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn records_for_contig(&mut self, contig: &str) -> Result<Vec<VariantRecord>> {
        let rid = match self.reader.header().name2rid(contig.as_bytes()) {
            Ok(rid) => rid,
            Err(_) => return Ok(Vec::new()),
        };
        self.reader.fetch(rid, 0, None)?;

        let mut records = Vec::new();
        let mut record = self.reader.empty_record();
        while let Some(result) = self.reader.read(&mut record) {
            result?;
            let start = record.pos().max(0) as u32;
            let end = (record.end() - 1).max(record.pos()).max(0) as u32;
            let id = String::from_utf8_lossy(&record.id()).into_owned();
            let mut variant = VariantRecord::new(contig, start, end);
            if id != "." {
                variant = variant.with_id(&id);
            }
            records.push(variant);
        }
        Ok(records)
    }
}

/// One source's sliding window over the current contig.
struct SourceCursor {
    source: Box<dyn VariantSource>,
    contig: Option<String>,
    pending: VecDeque<VariantRecord>,
    window: Vec<VariantRecord>,
    last_position: Option<u32>,
}

impl SourceCursor {
    fn new(source: Box<dyn VariantSource>) -> Self {
        Self {
            source,
            contig: None,
            pending: VecDeque::new(),
            window: Vec::new(),
            last_position: None,
        }
    }

    fn load(&mut self, contig: &str) -> Result<()> {
        let mut records = self.source.records_for_contig(contig)?;
        records.sort_by_key(|r| (r.start, r.end));
        debug!(
            "Loaded {} variants on {} from {}",
            records.len(),
            contig,
            self.source.name()
        );
        self.pending = records.into();
        self.window.clear();
        self.last_position = None;
        self.contig = Some(contig.to_string());
        Ok(())
    }

    fn query(&mut self, contig: &str, position: u32) -> Result<Vec<VariantRecord>> {
        if self.contig.as_deref() != Some(contig) {
            self.load(contig)?;
        }

        // one base of lookbehind is allowed
        if let Some(last) = self.last_position {
            if position.saturating_add(1) < last {
                return Err(ErrorMetricsError::LocusOutOfOrder {
                    source_name: self.source.name().to_string(),
                    contig: contig.to_string(),
                    position,
                    last_position: last,
                }
                .into());
            }
        }

        let high = self.last_position.map_or(position, |last| last.max(position));
        while self.pending.front().is_some_and(|r| r.start <= high) {
            if let Some(record) = self.pending.pop_front() {
                self.window.push(record);
            }
        }
        self.window.retain(|r| r.end.saturating_add(1) >= high);
        self.last_position = Some(high);

        Ok(self
            .window
            .iter()
            .filter(|r| r.overlaps(position))
            .cloned()
            .collect())
    }
}

/// Per-source overlaps at one locus, in source order.
///
/// Indexing accepts negative positions counted from the end, so
/// `overlaps[-1]` is the last source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocusOverlaps {
    per_source: Vec<Vec<VariantRecord>>,
}

impl LocusOverlaps {
    pub fn new(per_source: Vec<Vec<VariantRecord>>) -> Self {
        Self { per_source }
    }

    pub fn get(&self, index: isize) -> Option<&[VariantRecord]> {
        let len = self.per_source.len() as isize;
        let resolved = if index < 0 { index + len } else { index };
        if resolved < 0 || resolved >= len {
            return None;
        }
        Some(&self.per_source[resolved as usize])
    }

    pub fn len(&self) -> usize {
        self.per_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_source.is_empty()
    }

    /// True when any source has a record at the locus.
    pub fn is_variant(&self) -> bool {
        self.per_source.iter().any(|records| !records.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = &[VariantRecord]> {
        self.per_source.iter().map(Vec::as_slice)
    }
}

impl Index<isize> for LocusOverlaps {
    type Output = [VariantRecord];

    fn index(&self, index: isize) -> &Self::Output {
        match self.get(index) {
            Some(records) => records,
            None => panic!(
                "source index {} out of range for {} sources",
                index,
                self.per_source.len()
            ),
        }
    }
}

/// Answers "is this locus a known variant" for a locus-ordered stream.
pub struct VariantOverlapFilter {
    cursors: Vec<SourceCursor>,
}

impl VariantOverlapFilter {
    pub fn new(sources: Vec<Box<dyn VariantSource>>) -> Self {
        Self {
            cursors: sources.into_iter().map(SourceCursor::new).collect(),
        }
    }

    pub fn from_vcf_paths(paths: &[String]) -> Result<Self> {
        let mut sources: Vec<Box<dyn VariantSource>> = Vec::with_capacity(paths.len());
        for path in paths {
            sources.push(Box::new(VcfVariantSource::from_path(path)?));
        }
        Ok(Self::new(sources))
    }

    pub fn source_count(&self) -> usize {
        self.cursors.len()
    }

    pub fn check_locus(&mut self, contig: &str, position: u32) -> Result<LocusOverlaps> {
        let per_source = self
            .cursors
            .iter_mut()
            .map(|cursor| cursor.query(contig, position))
            .collect::<Result<Vec<_>>>()?;
        Ok(LocusOverlaps::new(per_source))
    }
}
