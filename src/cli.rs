use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect stratified base, overlapping-mate and indel error metrics
    Collect(CollectArgs),

    /// List the covariates a directive can stratify on
    Covariates,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CollectArgs {
    /// Indexed BAM or CRAM file
    pub bam_file: String,

    /// Indexed FASTA reference the reads are aligned to
    #[arg(short = 'r', long = "reference")]
    pub reference_file: String,

    /// Prefix of the metric files; one `{prefix}.{suffix}` file per directive
    #[arg(short = 'o', long = "output")]
    pub output_prefix: String,

    /// Indexed VCF/BCF of known variants to exclude (repeatable)
    #[arg(long = "vcf")]
    pub vcf: Vec<String>,

    /// Directives such as ERROR:CYCLE or INDEL_ERROR:INDEL_LENGTH (replaces the defaults)
    #[arg(short = 'e', long = "error-metrics")]
    pub error_metrics: Vec<String>,

    /// Minimum mapping quality of reads to count (default from config: 20)
    #[arg(long)]
    pub min_mapping_quality: Option<u8>,

    /// Minimum base quality of bases to count (default from config: 20)
    #[arg(long)]
    pub min_base_quality: Option<u8>,

    /// Prior quality blended into every error rate (default from config: 30)
    #[arg(long)]
    pub prior_q: Option<u8>,

    /// Homopolymer length treated as long (default from config: 6)
    #[arg(long)]
    pub long_homopolymer: Option<usize>,

    /// Stop after this many loci have been counted
    #[arg(long)]
    pub max_loci: Option<u64>,

    /// Restrict to these contigs
    #[arg(long, num_args = 1..)]
    pub contigs: Option<Vec<String>>,

    /// Maximum pileup depth per locus
    #[arg(long)]
    pub max_depth: Option<u32>,
}
