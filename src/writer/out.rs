// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for writing output.

use std::{borrow::Cow, io, str};

use console::Style;
use derive_more::with_trait::{Deref, DerefMut, Display, From, Into};

use super::Coloring;
use crate::{tree::ColorTag, Status};

/// [`Style`]s for terminal output.
#[derive(Clone, Debug)]
pub struct Styles {
    /// [`Style`] for rendering passed nodes.
    pub ok: Style,

    /// [`Style`] for rendering cancelled [`Step`]s.
    ///
    /// [`Step`]: crate::Step
    pub cancelled: Style,

    /// [`Style`] for rendering errors and failed nodes.
    pub err: Style,

    /// [`Style`] for rendering not yet executed nodes.
    pub undetermined: Style,

    /// [`Style`] for rendering [`Scenario`] names.
    ///
    /// [`Scenario`]: crate::Scenario
    pub header: Style,

    /// [`Style`] for rendering __bold__.
    pub bold: Style,

    /// [`Style`]s of [`ColorTag`]s, indexed by [`ColorTag::index()`].
    pub palette: [Style; ColorTag::COUNT as usize],

    /// Indicates whether the terminal was detected.
    pub is_present: bool,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            ok: Style::new().green(),
            cancelled: Style::new().bright().black(),
            err: Style::new().red(),
            undetermined: Style::new().bright().yellow(),
            header: Style::new().blue(),
            bold: Style::new().bold(),
            palette: [
                Style::new().cyan(),
                Style::new().magenta(),
                Style::new().yellow(),
                Style::new().blue(),
                Style::new().green(),
                Style::new().white(),
            ],
            is_present: console::Term::stdout().features().is_attended()
                && console::colors_enabled(),
        }
    }
}

impl Styles {
    /// Creates new [`Styles`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies the given [`Coloring`] policy to these [`Styles`].
    pub fn apply_coloring(&mut self, color: Coloring) {
        match color {
            Coloring::Auto => {}
            Coloring::Always => self.is_present = true,
            Coloring::Never => self.is_present = false,
        }
    }

    /// If terminal is present colors `input` with the given [`Style`] or
    /// leaves "as is" otherwise.
    fn paint<'a>(&self, style: &Style, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        if self.is_present {
            style.apply_to(input.into()).force_styling(true).to_string().into()
        } else {
            input.into()
        }
    }

    /// Colors `input` with [`Styles::ok`] color.
    #[must_use]
    pub fn ok<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.ok, input)
    }

    /// Colors `input` with [`Styles::cancelled`] color.
    #[must_use]
    pub fn cancelled<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.cancelled, input)
    }

    /// Colors `input` with [`Styles::err`] color.
    #[must_use]
    pub fn err<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.err, input)
    }

    /// Colors `input` with [`Styles::undetermined`] color.
    #[must_use]
    pub fn undetermined<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.undetermined, input)
    }

    /// Colors `input` with [`Styles::header`] color.
    #[must_use]
    pub fn header<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.header, input)
    }

    /// Makes `input` __bold__.
    #[must_use]
    pub fn bold<'a>(&self, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.bold, input)
    }

    /// Colors `input` with the [`Style`] of the given [`ColorTag`].
    #[must_use]
    pub fn tagged<'a>(&self, tag: ColorTag, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        self.paint(&self.palette[usize::from(tag.index())], input)
    }

    /// Colors `input` according to the given [`Status`].
    #[must_use]
    pub fn status<'a>(&self, status: Status, input: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
        match status {
            Status::None => self.undetermined(input),
            Status::Passed => self.ok(input),
            Status::Cancelled => self.cancelled(input),
            Status::FailedNoChildren | Status::Failed | Status::Error => self.err(input),
        }
    }
}

/// [`io::Write`] extension for easier manipulation with strings and special
/// sequences.
pub trait WriteStrExt: io::Write {
    /// Writes the given `string` into this writer.
    ///
    /// # Errors
    ///
    /// If this writer fails to write the given `string`.
    fn write_str(&mut self, string: impl AsRef<str>) -> io::Result<()> {
        self.write_all(string.as_ref().as_bytes())
    }

    /// Writes the given `string` into this writer followed by a newline.
    ///
    /// # Errors
    ///
    /// If this writer fails to write the given `string`.
    fn write_line(&mut self, string: impl AsRef<str>) -> io::Result<()> {
        self.write_str(string.as_ref()).and_then(|()| self.write_str("\n"))
    }

    /// Writes a special sequence into this writer clearing the last line.
    ///
    /// # Errors
    ///
    /// If this writer fails to write a special sequence.
    fn clear_line(&mut self) -> io::Result<()> {
        self.write_str("\r\x1b[2K")
    }
}

impl<T: io::Write + ?Sized> WriteStrExt for T {}

/// [`String`] wrapper implementing [`io::Write`].
#[derive(
    Clone,
    Debug,
    Default,
    Deref,
    DerefMut,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
pub struct WritableString(pub String);

impl io::Write for WritableString {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.push_str(
            str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        );
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Indents every line of `text` with `depth` tabs.
pub(crate) fn indent(text: &str, depth: usize) -> String {
    let prefix = "\t".repeat(depth);
    text.lines().map(|line| format!("{prefix}{line}")).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_coloring_leaves_text_as_is() {
        let mut styles = Styles::new();
        styles.apply_coloring(Coloring::Never);

        assert_eq!(styles.status(Status::Failed, "boom"), "boom");
        assert_eq!(styles.tagged(ColorTag::new(3), "sc1"), "sc1");
    }

    #[test]
    fn always_coloring_paints() {
        let mut styles = Styles::new();
        styles.apply_coloring(Coloring::Always);

        let painted = styles.ok("fine");
        assert_ne!(painted, "fine");
        assert_eq!(console::strip_ansi_codes(&painted), "fine");
    }

    #[test]
    fn indents_every_line() {
        assert_eq!(indent("a\nb", 2), "\t\ta\n\t\tb");
        assert_eq!(indent("a", 0), "a");
    }

    #[test]
    fn writable_string_collects_lines() {
        let mut out = WritableString::default();
        out.write_line("one").unwrap();
        out.write_str("two").unwrap();
        assert_eq!(out.0, "one\ntwo");
    }
}
