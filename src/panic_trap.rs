//! Catching of panics raised by user-authored code.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe},
    sync::Once,
};

thread_local! {
    /// Indicates whether a panic on this thread is being trapped.
    static TRAPPING: Cell<bool> = const { Cell::new(false) };

    /// Location of the last trapped panic on this thread.
    static LAST_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Details of a trapped panic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PanicDetails {
    /// Readable panic payload.
    pub(crate) payload: String,

    /// `file:line:column` the panic was raised at, if known.
    pub(crate) location: Option<String>,
}

/// Runs the given closure, converting its panic into [`PanicDetails`].
///
/// Trapped panics are not reported by the previously installed panic hook,
/// so they don't pollute the output. Panics on threads not running inside
/// [`trap()`] are reported as usual.
pub(crate) fn trap<T>(f: impl FnOnce() -> T) -> Result<T, PanicDetails> {
    install_hook();

    let was_trapping = TRAPPING.with(|t| t.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    TRAPPING.with(|t| t.set(was_trapping));

    result.map_err(|payload| PanicDetails {
        payload: coerce_payload(payload.as_ref()),
        location: LAST_LOCATION.with(|l| l.borrow_mut().take()),
    })
}

/// Installs the process-wide hook recording locations of trapped panics.
fn install_hook() {
    static HOOK: Once = Once::new();

    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if TRAPPING.with(Cell::get) {
                let location = info.location().map(|loc| {
                    format!("{}:{}:{}", loc.file(), loc.line(), loc.column())
                });
                LAST_LOCATION.with(|l| *l.borrow_mut() = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Extracts a readable message out of a panic payload.
fn coerce_payload(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "Opaque panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_value_through() {
        assert_eq!(trap(|| 42), Ok(42));
    }

    #[test]
    fn captures_message_and_location() {
        let details = trap(|| panic!("boom {}", 1)).unwrap_err();
        assert_eq!(details.payload, "boom 1");
        let location = details.location.expect("location is captured");
        assert!(location.contains("panic_trap.rs"), "{location}");
    }

    #[test]
    fn reads_static_str_payload() {
        let details = trap(|| panic!("static")).unwrap_err();
        assert_eq!(details.payload, "static");
    }

    #[test]
    fn nested_traps_restore_state() {
        let outer = trap(|| {
            let inner = trap(|| panic!("inner"));
            assert!(inner.is_err());
            panic!("outer");
        });
        assert_eq!(outer.unwrap_err().payload, "outer");
    }
}
