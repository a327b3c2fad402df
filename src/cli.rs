// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for composing CLI options.
//!
//! [`Opts`] composes the strongly typed CLI options of the [`Runner`] and of
//! the [`Basic`] [`Writer`], and may be extended with custom ones. If no
//! custom options are needed, the [`cli::Empty`] stub is used.
//!
//! [`cli::Empty`]: self::Empty
//! [`Basic`]: crate::writer::Basic
//! [`Runner`]: crate::Runner
//! [`Writer`]: crate::Writer

pub use clap::{Args, Parser};

use crate::{runner, writer};

/// Root CLI (command line interface) of a run.
///
/// # Example
///
/// ```rust
/// use storyline::cli::{self, Parser as _};
///
/// #[derive(clap::Args)] // also re-exported as `cli::Args`
/// struct CustomOpts {
///     /// Greeting to print before the run.
///     #[arg(long)]
///     greeting: Option<String>,
/// }
///
/// let opts = cli::Opts::<CustomOpts>::try_parse_from([
///     "runner", "--concurrency", "4", "--color", "never", "--greeting", "hi",
/// ])
/// .unwrap();
/// assert_eq!(opts.runner.concurrency, Some(4));
/// assert_eq!(opts.custom.greeting.as_deref(), Some("hi"));
/// ```
#[derive(clap::Parser, Clone, Debug, Default)]
#[command(
    name = "storyline",
    about = "Run the stories, roll up the features.",
    long_about = "Run the stories, roll up the features."
)]
pub struct Opts<Custom = Empty>
where
    Custom: Args,
{
    /// Path of the folder containing the `features` folder.
    #[arg(long, value_name = "path", default_value = ".", global = true)]
    pub root: String,

    /// [`Runner`] CLI options.
    ///
    /// [`Runner`]: crate::Runner
    #[command(flatten)]
    pub runner: runner::Cli,

    /// [`Basic`] [`Writer`] CLI options.
    ///
    /// [`Basic`]: crate::writer::Basic
    /// [`Writer`]: crate::Writer
    #[command(flatten)]
    pub writer: writer::Cli,

    /// Additional custom CLI options.
    #[command(flatten)]
    pub custom: Custom,
}

impl<Custom: Args> Opts<Custom> {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the trait
    /// being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as clap::Parser>::parse()
    }
}

/// Empty CLI options.
#[derive(Args, Clone, Copy, Debug, Default)]
#[group(skip)]
pub struct Empty;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::Coloring;

    #[test]
    fn parses_defaults() {
        let opts = Opts::<Empty>::try_parse_from(["storyline"]).unwrap();
        assert_eq!(opts.root, ".");
        assert_eq!(opts.runner.concurrency, None);
        assert!(opts.runner.select.is_empty());
        assert_eq!(opts.writer.color, Coloring::Auto);
        assert!(!opts.writer.realtime_steps);
    }

    #[test]
    fn parses_all_options() {
        let opts = Opts::<Empty>::try_parse_from([
            "storyline",
            "--root",
            "specs",
            "-c",
            "8",
            "--select",
            "login",
            "-s",
            "checkout",
            "--color",
            "always",
            "--realtime-steps",
        ])
        .unwrap();
        assert_eq!(opts.root, "specs");
        assert_eq!(opts.runner.concurrency, Some(8));
        assert_eq!(opts.runner.select, ["login", "checkout"]);
        assert_eq!(opts.writer.color, Coloring::Always);
        assert!(opts.writer.realtime_steps);
    }

    #[test]
    fn rejects_unknown_coloring() {
        assert!(Opts::<Empty>::try_parse_from(["storyline", "--color", "rainbow"]).is_err());
    }
}
