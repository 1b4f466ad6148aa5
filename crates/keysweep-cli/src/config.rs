use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use keysweep::{Alphabet, DEFAULT_ALPHABET, total};
use std::path::PathBuf;

/// Transform applied by every worker to every generated key.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    /// Enumerate only; keys are not transformed.
    None,
    /// MD5 of each key.
    Md5,
    /// SHA-256 of each key.
    Sha256,
    /// BLAKE3 of each key.
    Blake3,
}

/// Runtime configuration for the `keysweep` binary.
///
/// The binary sweeps every key length in `[min_length, max_length]`, and for
/// each length times a full sweep with every worker count in
/// `[1, max_workers]`. All values are parsed from CLI arguments or environment
/// variables (a `.env` file is honoured).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "keysweep",
    version,
    about = "Measure exhaustive keyspace throughput across worker processes"
)]
pub struct CliArgs {
    /// Shortest key length to sweep.
    ///
    /// Environment variable: `MIN_LENGTH`
    #[arg(long, env = "MIN_LENGTH", default_value_t = 1)]
    pub min_length: usize,

    /// Longest key length to sweep.
    ///
    /// The keyspace grows as `|alphabet|^length`, so every additional symbol
    /// multiplies the runtime of the whole sweep.
    ///
    /// Environment variable: `MAX_LENGTH`
    #[arg(long, env = "MAX_LENGTH", default_value_t = 5)]
    pub max_length: usize,

    /// Largest number of worker processes to time. Every count from 1 up to
    /// this value is measured. Defaults to the number of logical CPUs.
    ///
    /// Environment variable: `MAX_WORKERS`
    #[arg(long, env = "MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Symbols keys are built from. Sorted and deduplicated before use.
    ///
    /// Environment variable: `ALPHABET`
    #[arg(long, env = "ALPHABET", default_value_t = String::from_utf8_lossy(DEFAULT_ALPHABET).into_owned())]
    pub alphabet: String,

    /// Transform applied to each key.
    ///
    /// Environment variable: `DIGEST`
    #[arg(long, env = "DIGEST", value_enum, default_value_t = DigestKind::Sha256)]
    pub digest: DigestKind,

    /// Directory receiving one `<length>.csv` timing table per key length.
    ///
    /// Environment variable: `OUTPUT_DIR`
    #[arg(long, env = "OUTPUT_DIR", default_value = "data")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub min_length: usize,
    pub max_length: usize,
    pub max_workers: usize,
    pub alphabet: Alphabet,
    pub digest: DigestKind,
    pub output_dir: PathBuf,
}

impl TryFrom<CliArgs> for RunConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.min_length == 0 {
            bail!("MIN_LENGTH must be greater than 0");
        }

        if args.min_length > args.max_length {
            bail!(
                "MIN_LENGTH ({}) must not exceed MAX_LENGTH ({})",
                args.min_length,
                args.max_length
            );
        }

        let max_workers = args.max_workers.unwrap_or_else(num_cpus::get);
        if max_workers == 0 {
            bail!("MAX_WORKERS must be greater than 0");
        }

        let alphabet = Alphabet::new(&args.alphabet).context("invalid ALPHABET")?;

        // The largest keyspace must be countable; smaller ones then are too.
        total(args.max_length, &alphabet).with_context(|| {
            format!(
                "MAX_LENGTH ({}) is too large for an alphabet of {} symbols",
                args.max_length,
                alphabet.len()
            )
        })?;

        Ok(Self {
            min_length: args.min_length,
            max_length: args.max_length,
            max_workers,
            alphabet,
            digest: args.digest,
            output_dir: args.output_dir,
        })
    }
}
