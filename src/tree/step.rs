// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Step`] definitions and their execution.

use std::{fmt, sync::Arc};

use derive_more::with_trait::Display;

use crate::{panic_trap, Status};

/// Result of invoking a [`Step`] action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// Action succeeded.
    Passed,

    /// Action reported a failed assertion.
    Failed,

    /// Action raised an error with the given message.
    Error(String),
}

/// Conversion of a [`Step`] action return value into a [`Verdict`].
///
/// - `()` and `true` pass;
/// - `false` fails;
/// - [`Err`] is an error, [`Ok`] is converted further.
pub trait IntoVerdict {
    /// Converts this value into a [`Verdict`].
    fn into_verdict(self) -> Verdict;
}

impl IntoVerdict for Verdict {
    fn into_verdict(self) -> Verdict {
        self
    }
}

impl IntoVerdict for () {
    fn into_verdict(self) -> Verdict {
        Verdict::Passed
    }
}

impl IntoVerdict for bool {
    fn into_verdict(self) -> Verdict {
        if self {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }
}

impl<T: IntoVerdict, E: fmt::Display> IntoVerdict for Result<T, E> {
    fn into_verdict(self) -> Verdict {
        self.map_or_else(|e| Verdict::Error(e.to_string()), IntoVerdict::into_verdict)
    }
}

/// Type-erased [`Step`] action.
pub type Action = Arc<dyn Fn() -> Verdict + Send + Sync>;

/// Error raised by a [`Step`] action, or by a hook around a [`Scenario`].
///
/// [`Scenario`]: crate::Scenario
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display("{message}")]
pub struct Failure {
    /// Message of the error.
    pub message: String,

    /// `file:line:column` the error was raised at, if known.
    pub location: Option<String>,
}

impl From<panic_trap::PanicDetails> for Failure {
    fn from(details: panic_trap::PanicDetails) -> Self {
        Self { message: details.payload, location: details.location }
    }
}

/// Leaf unit of work of a [`Scenario`].
///
/// [`Step`] is immutable: [`Step::run()`] returns a new [`Step`] carrying
/// the outcome.
///
/// [`Scenario`]: crate::Scenario
#[derive(Clone)]
pub struct Step {
    /// Text describing what this [`Step`] does.
    description: String,

    /// Outcome of this [`Step`].
    status: Status,

    /// Error raised by the last run, if any.
    failure: Option<Failure>,

    /// User-authored action.
    action: Action,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("description", &self.description)
            .field("status", &self.status)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl Step {
    /// Creates a new not yet executed [`Step`].
    pub fn new<F, R>(description: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoVerdict,
    {
        Self {
            description: description.into(),
            status: Status::None,
            failure: None,
            action: Arc::new(move || action().into_verdict()),
        }
    }

    /// Creates an already errored [`Step`] without any action.
    pub(crate) fn errored(description: impl Into<String>, failure: Failure) -> Self {
        Self {
            description: description.into(),
            status: Status::Error,
            failure: Some(failure),
            action: Arc::new(|| Verdict::Passed),
        }
    }

    /// Returns this [`Step`] with the given [`Status`].
    #[must_use]
    pub fn with_status(&self, status: Status) -> Self {
        Self { status, failure: None, ..self.clone() }
    }

    /// Returns the description this [`Step`] was created with.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the text of this [`Step`].
    ///
    /// For an errored [`Step`] it contains the error message and location.
    #[must_use]
    pub fn text(&self) -> String {
        match (&self.failure, self.status) {
            (Some(failure), Status::Error) => {
                let mut text = format!("{}: ERROR\n{}", self.description, failure.message);
                if let Some(loc) = &failure.location {
                    text.push('\n');
                    text.push_str(loc);
                }
                text
            }
            _ => self.description.clone(),
        }
    }

    /// Returns the [`Status`] of this [`Step`].
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns the error raised by the last run of this [`Step`], if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Executes the action of this [`Step`].
    ///
    /// A [`Status::Cancelled`] [`Step`] is returned as is. A panic of the
    /// action is caught and turned into [`Status::Error`].
    #[must_use]
    pub fn run(&self) -> Self {
        if self.status == Status::Cancelled {
            return self.clone();
        }

        let (status, failure) = match panic_trap::trap(|| (self.action)()) {
            Ok(Verdict::Passed) => (Status::Passed, None),
            Ok(Verdict::Failed) => (Status::Failed, None),
            Ok(Verdict::Error(message)) => {
                (Status::Error, Some(Failure { message, location: None }))
            }
            Err(panic) => (Status::Error, Some(panic.into())),
        };
        Self { status, failure, ..self.clone() }
    }

    /// Returns this [`Step`] cancelled, without executing its action.
    #[must_use]
    pub fn cancel(&self) -> Self {
        self.with_status(Status::Cancelled)
    }
}

/// Keywords prefixing [`Step`] descriptions.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Keyword {
    /// Assumption.
    Given,

    /// Continuation of the previous [`Keyword`].
    And,

    /// Action.
    When,

    /// Expected outcome.
    Then,

    /// Negative continuation of the previous [`Keyword`].
    But,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn verdict_conversions() {
        assert_eq!(().into_verdict(), Verdict::Passed);
        assert_eq!(true.into_verdict(), Verdict::Passed);
        assert_eq!(false.into_verdict(), Verdict::Failed);
        assert_eq!(Ok::<_, String>(false).into_verdict(), Verdict::Failed);
        assert_eq!(
            Err::<(), _>("nope").into_verdict(),
            Verdict::Error("nope".into()),
        );
    }

    #[test]
    fn run_produces_new_step() {
        let step = Step::new("Given ok", || true);
        let ran = step.run();
        assert_eq!(step.status(), Status::None);
        assert_eq!(ran.status(), Status::Passed);
        assert_eq!(ran.text(), "Given ok");

        assert_eq!(Step::new("Then no", || false).run().status(), Status::Failed);
    }

    #[test]
    fn panic_becomes_error_with_location() {
        let ran = Step::new("When it explodes", || -> bool { panic!("kaboom") }).run();
        assert_eq!(ran.status(), Status::Error);

        let text = ran.text();
        assert!(text.starts_with("When it explodes: ERROR\nkaboom\n"), "{text}");
        assert!(text.contains("step.rs"), "{text}");
        assert_eq!(ran.description(), "When it explodes");
    }

    #[test]
    fn returned_error_becomes_error() {
        let ran = Step::new("Then it reports", || Err::<(), _>("broken pipe")).run();
        assert_eq!(ran.status(), Status::Error);
        assert_eq!(ran.text(), "Then it reports: ERROR\nbroken pipe");
    }

    #[test]
    fn cancelled_step_is_not_executed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let step = Step::new("Given counted", {
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        let cancelled = step.cancel().run();
        assert_eq!(cancelled.status(), Status::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        _ = step.run();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rerun_does_not_accumulate_errors() {
        let step = Step::new("Given flaky", || -> bool { panic!("once") });
        let twice = step.run().run();
        assert_eq!(twice.text().matches("ERROR").count(), 1);
    }
}
