//! CLI options of a [`Runner`].
//!
//! [`Runner`]: super::Runner

/// CLI options of a [`Runner`].
///
/// [`Runner`]: super::Runner
#[derive(Clone, Debug, Default, clap::Args)]
#[group(skip)]
pub struct Cli {
    /// Number of scenarios to run concurrently. If not specified, uses the
    /// value configured in tests runner, or 64 by default.
    #[arg(long, short, value_name = "int", global = true)]
    pub concurrency: Option<usize>,

    /// ID of a feature to run, all the loaded features run if none is
    /// specified. May be repeated.
    #[arg(long, short, value_name = "id", global = true)]
    pub select: Vec<String>,
}
