//! Expandable string enumerations
//!
//! The backend owns these value sets and adds members over time, so a closed
//! Rust `enum` would fail to round-trip values it has never seen. Each type
//! is a newtype over `String` with associated constants for the known members
//! and case-insensitive equality.

/// Declare an expandable string type with a set of known values.
///
/// ```ignore
/// expandable_string! {
///     /// Allocation method of an IP address
///     pub struct IpAllocationMethod {
///         STATIC = "Static",
///         DYNAMIC = "Dynamic",
///     }
/// }
/// ```
#[macro_export]
macro_rules! expandable_string {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$cmeta:meta])* $konst:ident = $value:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(::std::borrow::Cow<'static, str>);

        impl $name {
            $(
                $(#[$cmeta])*
                pub const $konst: $name = $name(::std::borrow::Cow::Borrowed($value));
            )*

            /// Every value known to this version of the crate
            pub const KNOWN: &'static [$name] = &[$($name::$konst),*];

            /// Wrap an arbitrary value; known members are not required
            pub fn from_name(name: impl Into<String>) -> Self {
                let name = name.into();
                Self::KNOWN
                    .iter()
                    .find(|known| known.0.eq_ignore_ascii_case(&name))
                    .cloned()
                    .unwrap_or_else(|| $name(::std::borrow::Cow::Owned(name)))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the value is one of the known constants
            pub fn is_known(&self) -> bool {
                Self::KNOWN.iter().any(|known| known == self)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.eq_ignore_ascii_case(&other.0)
            }
        }

        impl ::std::hash::Hash for $name {
            fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                self.0.to_ascii_lowercase().hash(state);
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::std::convert::Infallible;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                Ok(Self::from_name(s))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from_name(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::from_name(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

expandable_string! {
    /// Provisioning state reported by the backend
    pub struct ProvisioningState {
        SUCCEEDED = "Succeeded",
        UPDATING = "Updating",
        DELETING = "Deleting",
        FAILED = "Failed",
        CREATING = "Creating",
        CANCELED = "Canceled",
    }
}

impl ProvisioningState {
    /// No further backend work is pending
    pub fn is_terminal(&self) -> bool {
        *self == Self::SUCCEEDED || *self == Self::FAILED || *self == Self::CANCELED
    }
}

expandable_string! {
    /// Allocation method of an IP address
    pub struct IpAllocationMethod {
        STATIC = "Static",
        DYNAMIC = "Dynamic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_values_compare_case_insensitively() {
        assert_eq!(ProvisioningState::from_name("succeeded"), ProvisioningState::SUCCEEDED);
        assert_eq!(ProvisioningState::from("SUCCEEDED").as_str(), "Succeeded");
    }

    #[test]
    fn test_unknown_values_round_trip() {
        let state: ProvisioningState = serde_json::from_str("\"Migrating\"").unwrap();
        assert!(!state.is_known());
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"Migrating\"");
    }

    #[test]
    fn test_hash_agrees_with_eq() {
        let mut set = HashSet::new();
        set.insert(IpAllocationMethod::STATIC);
        assert!(set.contains(&IpAllocationMethod::from_name("sTaTiC")));
    }

    #[test]
    fn test_terminal_states() {
        assert!(ProvisioningState::SUCCEEDED.is_terminal());
        assert!(!ProvisioningState::UPDATING.is_terminal());
    }
}
