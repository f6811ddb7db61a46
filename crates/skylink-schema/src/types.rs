//! Newtype wrappers for string identifiers, providing compile-time type safety.
//!
//! All newtypes serialize/deserialize as plain strings so host envelopes stay flat.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
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

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
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
    /// Provider resource type identifier, e.g. `aws/lambda/function`.
    ResourceType
);

string_newtype!(
    /// Name of a resource instance within a blueprint. Link data is keyed by it.
    ResourceName
);

string_newtype!(
    /// Identifier of a link type: `<resourceTypeA>::<resourceTypeB>`.
    LinkTypeId
);

impl LinkTypeId {
    /// Build the identifier for the ordered pair of resource types.
    pub fn for_pair(a: &ResourceType, b: &ResourceType) -> Self {
        Self(format!("{a}::{b}"))
    }

    /// Split the identifier back into its two resource types.
    pub fn split(&self) -> Option<(ResourceType, ResourceType)> {
        let (a, b) = self.0.split_once("::")?;
        if a.is_empty() || b.is_empty() {
            return None;
        }
        Some((ResourceType::new(a), ResourceType::new(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_name_display_and_as_ref() {
        let name = ResourceName::new("ordersFunction");
        assert_eq!(name.to_string(), "ordersFunction");
        assert_eq!(name.as_str(), "ordersFunction");
        assert_eq!(AsRef::<str>::as_ref(&name), "ordersFunction");
    }

    #[test]
    fn resource_type_serde_is_transparent() {
        let ty = ResourceType::new("aws/iam/role");
        let json = serde_json::to_string(&ty).unwrap();
        assert_eq!(json, "\"aws/iam/role\"");
        let back: ResourceType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ty);
    }

    #[test]
    fn link_type_id_for_pair_and_split() {
        let a = ResourceType::new("aws/lambda/function");
        let b = ResourceType::new("aws/lambda/codeSigningConfig");
        let id = LinkTypeId::for_pair(&a, &b);
        assert_eq!(id, "aws/lambda/function::aws/lambda/codeSigningConfig");
        assert_eq!(id.split(), Some((a, b)));
    }

    #[test]
    fn link_type_id_split_rejects_malformed() {
        assert!(LinkTypeId::new("aws/lambda/function").split().is_none());
        assert!(LinkTypeId::new("::aws/iam/role").split().is_none());
    }
}
