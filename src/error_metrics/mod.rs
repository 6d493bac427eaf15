pub mod covariate;
pub mod directive;
pub mod errors;
pub mod indel;
pub mod metrics;
pub mod options;
pub mod read;
pub mod report;
pub mod stratifiers;
pub mod table;
pub mod types;
pub mod variants;

pub use directive::{Directive, ErrorKind};
pub use errors::{ErrorClass, ErrorMetricsError};
pub use options::{ErrorMetricsOptions, MetricsSettings};
pub use table::{DirectiveMetrics, ErrorMetricsCollector, MetricRows};
pub use variants::{LocusOverlaps, VariantOverlapFilter, VariantRecord, VariantSource};

use crate::utils::bam_reader::BamReaderFactory;
use crate::utils::progress_manager::ProgressManager;
use anyhow::{bail, Context, Result};
use bio::io::fasta::IndexedReader;
use log::{debug, info};
use rust_htslib::bam::{self, Read};
use std::collections::HashSet;
use std::path::PathBuf;
use types::LocusContext;

/// Whether a record takes part in error counting at all.
pub fn passes_read_filters(record: &bam::Record, min_mapping_quality: u8) -> bool {
    !record.is_unmapped()
        && !record.is_secondary()
        && !record.is_supplementary()
        && !record.is_duplicate()
        && !record.is_quality_check_failed()
        && record.mapq() >= min_mapping_quality
}

/// Walks every covered, non-variant locus of the selected contigs and writes
/// one metrics table per directive to `{output_prefix}.{suffix}`.
pub fn run(
    bam_file: String,
    reference_file: String,
    output_prefix: String,
    options: ErrorMetricsOptions,
    command_line: String,
) -> Result<Vec<PathBuf>> {
    info!(
        "Collecting {} error metric tables from {}",
        options.directives.len(),
        bam_file
    );
    for directive in &options.directives {
        debug!("Directive {} -> {}", directive, directive.suffix());
    }

    // configuration problems surface before any locus is read
    let mut collector = ErrorMetricsCollector::new(
        &options.directives,
        options.settings,
        options.min_base_quality,
    )?;
    let mut variants = VariantOverlapFilter::from_vcf_paths(&options.vcf_paths)?;
    info!("Using {} known-variant sources", variants.source_count());

    let mut bam = BamReaderFactory::open_indexed(&bam_file, Some(&reference_file))?;
    let header = bam.header().clone();
    let mut fasta = IndexedReader::from_file(&reference_file)
        .with_context(|| format!("Failed to open indexed reference {}", reference_file))?;

    let selected_contigs: Option<HashSet<String>> = options
        .selected_contigs
        .as_ref()
        .map(|contigs| contigs.iter().cloned().collect());

    let mut contigs = Vec::new();
    for tid in 0..header.target_count() {
        let name = std::str::from_utf8(header.tid2name(tid))?.to_string();
        if let Some(ref selected) = selected_contigs {
            if !selected.contains(&name) {
                continue;
            }
        }
        contigs.push((tid, name, header.target_len(tid).unwrap_or(0)));
    }
    if let Some(ref selected) = selected_contigs {
        if contigs.is_empty() {
            let mut names: Vec<&str> = selected.iter().map(|s| s.as_str()).collect();
            names.sort();
            bail!(
                "None of the specified contigs ({}) were found in the BAM file",
                names.join(", ")
            );
        }
    }

    let progress = ProgressManager::new();
    let main_progress = progress.add_spinner("Collecting error metrics...");
    let max_depth = if options.max_depth > 0 {
        options.max_depth
    } else {
        500
    };

    let mut loci_counted: u64 = 0;
    let mut variant_loci: u64 = 0;
    'contigs: for (tid, name, length) in contigs {
        main_progress.set_message(format!("Processing {}...", name));
        let reference = load_contig(&mut fasta, &name)?;
        let contig_progress = progress.add_contig_bar(&name, length as usize);

        bam.fetch((tid, 0, length))?;
        let mut pileup = bam.pileup();
        pileup.set_max_depth(max_depth);

        for p in pileup {
            let pileup = p?;
            if pileup.tid() != tid {
                break;
            }
            let pos = pileup.pos();
            contig_progress.set_position(pos as u64);

            let Some(&reference_base) = reference.get(pos as usize) else {
                continue;
            };
            if reference_base == b'N' {
                continue;
            }
            if variants.check_locus(&name, pos)?.is_variant() {
                variant_loci += 1;
                continue;
            }

            let reads: Vec<bam::Record> = pileup
                .alignments()
                .filter(|align| !align.is_refskip())
                .map(|align| align.record())
                .filter(|record| passes_read_filters(record, options.min_mapping_quality))
                .collect();

            let locus = LocusContext::new(&name, pos, reference_base);
            collector.process_locus(&locus, &reference, &reads)?;

            loci_counted += 1;
            if options.max_loci.is_some_and(|max| loci_counted >= max) {
                contig_progress.finish_with_message(format!("{} (stopped at locus limit)", name));
                info!("Stopping after {} loci", loci_counted);
                break 'contigs;
            }
        }
        contig_progress.finish_with_message(format!("{} complete", name));
        debug!("{}: {} loci skipped as known variants so far", name, variant_loci);
    }
    main_progress.finish_with_message("Error metric collection complete!");

    info!(
        "Counted {} loci; skipped {} known-variant loci",
        loci_counted, variant_loci
    );

    let tables = collector.finish();
    report::write_all(&output_prefix, &tables, &command_line)
}

/// Whole contig sequence, upper-cased.
fn load_contig(fasta: &mut IndexedReader<std::fs::File>, contig: &str) -> Result<Vec<u8>> {
    let mut seq = Vec::new();
    fasta
        .fetch_all(contig)
        .with_context(|| format!("Contig {} not found in reference", contig))?;
    fasta.read(&mut seq)?;
    seq.make_ascii_uppercase();
    Ok(seq)
}
