use crate::cli::CollectArgs;
use crate::config::Config;
use crate::error_metrics::directive::parse_directives;
use crate::error_metrics::{self, ErrorMetricsOptions, MetricsSettings};
use anyhow::Result;
use log::info;

/// Resolves CLI flags over the configured defaults. Directives given on the
/// command line replace the configured list.
pub fn build_options(args: &CollectArgs, config: &Config) -> Result<ErrorMetricsOptions> {
    let directives = if args.error_metrics.is_empty() {
        parse_directives(config.directives.iter().map(String::as_str))?
    } else {
        parse_directives(args.error_metrics.iter().map(String::as_str))?
    };
    let settings = MetricsSettings::new(
        args.long_homopolymer.unwrap_or(config.long_homopolymer),
        args.prior_q.unwrap_or(config.prior_q),
    )?;

    Ok(ErrorMetricsOptions::new(
        directives,
        settings,
        args.min_mapping_quality.unwrap_or(config.min_mapping_quality),
        args.min_base_quality.unwrap_or(config.min_base_quality),
        args.max_depth.unwrap_or(config.max_depth),
    )
    .with_vcfs(args.vcf.clone())
    .with_contigs(args.contigs.clone())
    .with_max_loci(args.max_loci))
}

pub fn run(args: CollectArgs) -> Result<()> {
    let config = Config::load();
    let options = build_options(&args, &config)?;
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");

    let written = error_metrics::run(
        args.bam_file,
        args.reference_file,
        args.output_prefix,
        options,
        command_line,
    )?;
    info!("Wrote {} metric files", written.len());
    Ok(())
}
