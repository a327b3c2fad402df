//! Identifiers of [`tree`] nodes.
//!
//! [`tree`]: crate::tree

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use derive_more::with_trait::{AsRef, Deref, Display};

/// Generates a new unique 8 hex digits identifier.
fn generate() -> String {
    /// Counter shared by all identifier kinds.
    static NEXT: AtomicU64 = AtomicU64::new(1);

    // Multiplication by an odd constant is a bijection over the lower 32
    // bits, so the identifiers stay unique for the first 2^32 ones.
    let mixed = NEXT
        .fetch_add(1, Ordering::Relaxed)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15);
    format!("{:08x}", mixed & 0xFFFF_FFFF)
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(AsRef, Clone, Debug, Deref, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[as_ref(forward)]
        #[deref(forward)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Creates a new identifier out of the given value.
            #[must_use]
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(Arc::from(id.as_ref()))
            }

            /// Generates a new unique identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Arc::from(generate()))
            }

            /// Returns this identifier as a [`str`].
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(Arc::from(id))
            }
        }
    };
}

define_id! {
    /// Identifier of a [`Feature`], unique among all [`Feature`]s.
    ///
    /// [`Feature`]: crate::Feature
    FeatureId
}

define_id! {
    /// Identifier of a [`Story`], unique inside its [`Feature`].
    ///
    /// [`Feature`]: crate::Feature
    /// [`Story`]: crate::Story
    StoryId
}

define_id! {
    /// Identifier of a [`ScenarioContext`] and the [`Scenario`] it produces,
    /// unique inside its parent.
    ///
    /// [`Scenario`]: crate::Scenario
    /// [`ScenarioContext`]: crate::ScenarioContext
    ScenarioId
}
