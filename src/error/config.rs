// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration and validation error types.
//!
//! These errors describe a malformed tree or a misbehaving [`Loader`]. They
//! are fatal: they are returned to the immediate caller before any
//! [`Step`] is executed, and are never converted into a [`Status`].
//!
//! [`Loader`]: crate::Loader
//! [`Status`]: crate::Status
//! [`Step`]: crate::Step

use derive_more::{Display, Error};

use crate::tree::ComponentKind;

/// Configuration and validation errors.
#[derive(Debug, Display, Error)]
pub enum ConfigError {
    /// [`Loader`] found no components under a root path.
    ///
    /// [`Loader`]: crate::Loader
    #[display(
        "E0000: No {} were found under path '{root}'.\n\
         Browse to a different folder, or use another root path",
        kind.plural()
    )]
    NoComponentFound {
        /// Kind of the looked up components.
        kind: ComponentKind,

        /// Root path the components were looked up under.
        root: String,
    },

    /// Some of the selected ids don't match any loaded component.
    #[display(
        "E0001: The following selected {kind} ids couldn't be found: {}",
        offenders.join(", ")
    )]
    NoComponentMatch {
        /// Kind of the selected components.
        kind: ComponentKind,

        /// Selected ids without a match.
        offenders: Vec<String>,
    },

    /// [`Loader`] produced a component of a wrong kind.
    ///
    /// [`Loader`]: crate::Loader
    #[display("Expected a {expected} definition at '{path}', found a {found}")]
    UnexpectedComponent {
        /// Expected kind.
        expected: ComponentKind,

        /// Actually produced kind.
        found: ComponentKind,

        /// Path of the definition.
        path: String,
    },

    /// Definition lacks a required field.
    #[display("The {kind} definition at '{path}' has no {field}")]
    MissingField {
        /// Kind of the definition.
        kind: ComponentKind,

        /// Path of the definition.
        path: String,

        /// Name of the missing field.
        field: &'static str,
    },

    /// Two components of the same scope share an id.
    #[display("Duplicate {kind} id '{id}'")]
    DuplicateId {
        /// Kind of the clashing components.
        kind: ComponentKind,

        /// Clashing id.
        id: String,
    },

    /// Back-references of a component don't point to its actual parent.
    #[display("The {kind} '{id}' refers to '{referenced}', but belongs to '{parent}'")]
    Misplaced {
        /// Kind of the misplaced component.
        kind: ComponentKind,

        /// Id of the misplaced component.
        id: String,

        /// Parent the component refers to.
        referenced: String,

        /// Parent the component actually belongs to.
        parent: String,
    },

    /// Unknown [`Status`] tag.
    ///
    /// [`Status`]: crate::Status
    #[display("'{tag}' is not a valid status")]
    InvalidStatus {
        /// The invalid tag.
        tag: String,
    },

    /// Unknown [`LoadMode`].
    ///
    /// [`LoadMode`]: crate::loader::LoadMode
    #[display(
        "Mode '{mode}' is not supported. Use one of the following: none, \
         stories, stories_with_scenarios, scenario_contexts, all"
    )]
    InvalidLoadMode {
        /// The invalid mode.
        mode: String,
    },

    /// Path pattern can't be compiled.
    #[display("Invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The invalid pattern.
        pattern: String,

        /// Compilation error.
        source: regex::Error,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Creates a new [`ConfigError::NoComponentFound`].
    #[must_use]
    pub fn no_component_found(kind: ComponentKind, root: impl Into<String>) -> Self {
        Self::NoComponentFound { kind, root: root.into() }
    }

    /// Creates a new [`ConfigError::NoComponentMatch`].
    #[must_use]
    pub fn no_component_match<I, S>(kind: ComponentKind, offenders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NoComponentMatch {
            kind,
            offenders: offenders.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a new [`ConfigError::DuplicateId`].
    #[must_use]
    pub fn duplicate_id(kind: ComponentKind, id: impl ToString) -> Self {
        Self::DuplicateId { kind, id: id.to_string() }
    }

    /// Creates a new [`ConfigError::InvalidStatus`].
    #[must_use]
    pub fn invalid_status(tag: impl Into<String>) -> Self {
        Self::InvalidStatus { tag: tag.into() }
    }

    /// Creates a new [`ConfigError::InvalidLoadMode`].
    #[must_use]
    pub fn invalid_load_mode(mode: impl Into<String>) -> Self {
        Self::InvalidLoadMode { mode: mode.into() }
    }
}
