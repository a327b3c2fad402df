// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for outputting [`Event`]s.

pub mod basic;
pub mod out;
pub mod stats;
pub mod summarized;

use std::io;

use sealed::sealed;

use crate::Event;

#[doc(inline)]
pub use self::{
    basic::{Basic, Cli, Coloring},
    out::{Styles, WritableString, WriteStrExt},
    stats::{Counts, Stats},
    summarized::Summarized,
};

/// Writer of [`Event`]s to some output.
///
/// Called by a single coordinator only, in the order [`Event`]s happen.
pub trait Writer {
    /// Handles the given [`Event`].
    ///
    /// # Errors
    ///
    /// If the output fails.
    fn handle_event(&mut self, event: &Event) -> io::Result<()>;
}

impl<W: Writer + ?Sized> Writer for &mut W {
    fn handle_event(&mut self, event: &Event) -> io::Result<()> {
        (**self).handle_event(event)
    }
}

/// Collects all the [`Event`]s.
impl Writer for Vec<Event> {
    fn handle_event(&mut self, event: &Event) -> io::Result<()> {
        self.push(event.clone());
        Ok(())
    }
}

/// [`Writer`] ignoring all the [`Event`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Writer for Discard {
    fn handle_event(&mut self, _: &Event) -> io::Result<()> {
        Ok(())
    }
}

/// [`Writer`] that also can output arbitrary text additionally to the
/// [`Event`]s.
pub trait Outputted: Writer {
    /// Returns the [`Styles`] the text should be rendered with.
    fn styles(&self) -> &Styles;

    /// Writes the given `text` followed by a newline.
    ///
    /// # Errors
    ///
    /// If the output fails.
    fn write_text(&mut self, text: &str) -> io::Result<()>;
}

/// Extension of [`Writer`] allowing its summarization.
#[sealed]
pub trait Ext: Writer + Sized {
    /// Wraps this [`Writer`] to print a summary at the end of an output.
    ///
    /// See [`Summarized`] for more information.
    #[must_use]
    fn summarized(self) -> Summarized<Self>;
}

#[sealed]
impl<T: Writer + Sized> Ext for T {
    fn summarized(self) -> Summarized<Self> {
        Summarized::new(self)
    }
}
