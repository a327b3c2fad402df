// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error handling types.
//!
//! - [`config`] - malformed trees and [`Loader`] failures, fatal to a run.
//! - [`core`] - top-level [`Error`] returned by [`Runner`]s.
//!
//! Failures of user-authored [`Step`]s are not errors of this module: they
//! are captured as [`step::Failure`]s and reported through a [`Status`].
//!
//! [`Loader`]: crate::Loader
//! [`Runner`]: crate::Runner
//! [`Status`]: crate::Status
//! [`Step`]: crate::Step
//! [`step::Failure`]: crate::tree::step::Failure

pub mod config;
pub mod core;

pub use self::{
    config::{ConfigError, ConfigResult},
    core::{Error, Result},
};

#[cfg(test)]
mod tests {
    use std::{error::Error as _, io};

    use super::*;
    use crate::tree::ComponentKind;

    #[test]
    fn converts_into_top_level_error() {
        let err: Error = ConfigError::duplicate_id(ComponentKind::Feature, "f").into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.as_config().is_some());
        assert!(err.to_string().starts_with("Configuration error: Duplicate"));

        let err: Error = io::Error::new(io::ErrorKind::Other, "no threads").into();
        assert!(matches!(err, Error::Spawn(_)));
        assert!(err.as_config().is_none());
    }

    #[test]
    fn keeps_source_chain() {
        let err: Error = io::Error::new(io::ErrorKind::Other, "root cause").into();
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("root cause"));
    }
}
