//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings so profiles stay hand-editable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance from a string.
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_newtype!(
    /// Mod identifier: `<category>/<name>`, or a bare `name` for the core category.
    ModId
);

string_newtype!(
    /// Blake3 digest of an emitted build artifact.
    ArtifactDigest
);

string_newtype!(
    /// Blake3 hash of a profile's editable fields.
    ContentHash
);

/// Category assigned to identifiers without a `<category>/` prefix.
pub const CORE_CATEGORY: &str = "core";

/// The privileged operating-system category.
pub const OS_CATEGORY: &str = "os";

impl ModId {
    /// Category encoded in the identifier path, `core` for bare names.
    pub fn category(&self) -> &str {
        self.0
            .rsplit_once('/')
            .map_or(CORE_CATEGORY, |(category, _)| category)
    }

    /// Last path segment of the identifier.
    pub fn name(&self) -> &str {
        self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, name)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_id_display_and_as_ref() {
        let id = ModId::new("tools/mise");
        assert_eq!(id.to_string(), "tools/mise");
        assert_eq!(id.as_str(), "tools/mise");
        assert_eq!(AsRef::<str>::as_ref(&id), "tools/mise");
    }

    #[test]
    fn mod_id_serde_roundtrip() {
        let id = ModId::new("os/ubuntu");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"os/ubuntu\"");
        let back: ModId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn category_and_name_split_on_last_slash() {
        let id = ModId::from("shell/zsh-fedora");
        assert_eq!(id.category(), "shell");
        assert_eq!(id.name(), "zsh-fedora");
    }

    #[test]
    fn bare_id_is_core_category() {
        let id = ModId::from("git");
        assert_eq!(id.category(), CORE_CATEGORY);
        assert_eq!(id.name(), "git");
    }

    #[test]
    fn digest_into_inner() {
        let h = ArtifactDigest::new("hash_value".to_owned());
        assert_eq!(h.into_inner(), "hash_value");
    }

    #[test]
    fn content_hash_equality() {
        let a = ContentHash::new("same");
        let b = ContentHash::new("same");
        let c = ContentHash::new("diff");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
