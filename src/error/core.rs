// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Top-level [`Error`] of the crate.

use std::io;

use derive_more::{Display, Error, From};

use super::ConfigError;

/// Top-level error of running a tree.
///
/// Failures of user-authored [`Step`]s are never represented here: they end
/// up as a [`Status`] of the [`Step`] instead.
///
/// [`Status`]: crate::Status
/// [`Step`]: crate::Step
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Malformed tree or misbehaving [`Loader`].
    ///
    /// [`Loader`]: crate::Loader
    #[display("Configuration error: {_0}")]
    Config(ConfigError),

    /// OS refused to spawn a [`Scenario`] execution thread.
    ///
    /// [`Scenario`]: crate::Scenario
    #[display("Failed to spawn scenario execution: {_0}")]
    Spawn(io::Error),

    /// [`Writer`] failed to output an [`Event`].
    ///
    /// [`Event`]: crate::Event
    /// [`Writer`]: crate::Writer
    #[display("Failed to write output: {_0}")]
    #[from(skip)]
    Write(io::Error),

    /// [`Scenario`] execution threads ended without reporting all the
    /// results.
    ///
    /// [`Scenario`]: crate::Scenario
    #[display("Run interrupted before all the scenarios resolved")]
    #[from(skip)]
    Interrupted,
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the [`ConfigError`] behind this [`Error`], if any.
    #[must_use]
    pub const fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Self::Config(e) => Some(e),
            Self::Spawn(_) | Self::Write(_) | Self::Interrupted => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::tree::ComponentKind;

    #[test]
    fn wraps_config_errors_as_source() {
        let err = Error::from(ConfigError::duplicate_id(ComponentKind::Story, "s"));

        assert_eq!(err.to_string(), "Configuration error: Duplicate story id 's'");
        assert!(err.as_config().is_some());
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("Duplicate story id 's'"));
        assert!(Error::Interrupted.source().is_none());
    }
}
