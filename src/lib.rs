// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Behavior-driven narration and execution engine.
//!
//! [`Feature`]s contain [`Story`]s, which contain [`Scenario`]s made of
//! ordered [`Step`]s. A [`Runner`] executes the [`Scenario`]s concurrently,
//! one thread each, and rolls their outcomes up into their parents through
//! the [`Status`] lattice, while a [`Writer`] renders the resolved tree.
//!
//! ```rust
//! use storyline::{Feature, Narrative, Runner, Scenario, ScenarioContext, Status, Story};
//!
//! let story = Story::builder("Log in")
//!     .id("login")
//!     .narrative(Narrative::new("use the shop", "customer", "to log in"))
//!     .scenario(ScenarioContext::of(
//!         Scenario::builder("valid password")
//!             .given("a registered customer", || ())
//!             .when("they enter the right password", || true)
//!             .then("they are logged in", || Ok::<_, String>(true))
//!             .build(),
//!     ))
//!     .build();
//! let feature = Feature::builder("Accounts").id("accounts").story(story).build();
//!
//! let feature = Runner::new().run_feature_sync(feature).unwrap();
//! assert_eq!(feature.status(), Status::Passed);
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(missing_debug_implementations, missing_docs, unused_import_braces)]

pub mod cli;
pub mod error;
pub mod event;
pub mod loader;
mod panic_trap;
pub mod pipeline;
pub mod runner;
pub mod status;
pub mod tree;
pub mod writer;

#[doc(inline)]
pub use self::{
    error::{ConfigError, Error, Result},
    event::Event,
    loader::{Component, LoadMode, Loader, Registry},
    pipeline::{Halt, Pipeline, Query},
    runner::{run_scenario, Rollup, Runner, Tree},
    status::{aggregate, compare, strongest, Status},
    tree::{
        Feature, FeatureId, Lineage, Narrative, Scenario, ScenarioContext, ScenarioId, Step,
        Story, StoryId,
    },
    writer::{Ext as WriterExt, Writer},
};
