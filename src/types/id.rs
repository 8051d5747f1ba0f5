//! TypeID-backed identifier generator.

use std::fmt;

/// Error returned when a string is not a valid identifier of the expected kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidId {
    /// TypeID parsing failed
    Parse(String),
    /// Wrong prefix
    WrongPrefix {
        /// The expected prefix
        expected: &'static str,
        /// The actual prefix found
        actual: String,
    },
}

impl fmt::Display for InvalidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "invalid identifier: {e}"),
            Self::WrongPrefix { expected, actual } => {
                write!(f, "expected prefix '{expected}', got '{actual}'")
            }
        }
    }
}

impl std::error::Error for InvalidId {}

/// Declares a TypeID newtype with the given prefix.
///
/// The generated type is `Clone + Eq + Hash`, displays as its TypeID string,
/// parses with prefix validation and (de)serializes as a plain string.
macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(::mti::prelude::MagicTypeId);

        impl $name {
            /// The TypeID prefix for this identifier.
            pub const PREFIX: &'static str = $prefix;

            /// Creates a fresh identifier (UUIDv7, time-sortable).
            #[must_use]
            pub fn new() -> Self {
                use ::mti::prelude::*;
                Self(Self::PREFIX.create_type_id::<V7>())
            }

            /// Parses an identifier, validating the prefix.
            ///
            /// # Errors
            ///
            /// Returns `InvalidId::Parse` for malformed input and
            /// `InvalidId::WrongPrefix` when the prefix does not match.
            pub fn parse(s: &str) -> Result<Self, $crate::types::InvalidId> {
                use ::mti::prelude::*;
                use ::std::str::FromStr;

                let id = MagicTypeId::from_str(s)
                    .map_err(|e| $crate::types::InvalidId::Parse(e.to_string()))?;

                let prefix = id.prefix().as_str();
                if prefix != Self::PREFIX {
                    return Err($crate::types::InvalidId::WrongPrefix {
                        expected: Self::PREFIX,
                        actual: prefix.to_string(),
                    });
                }

                Ok(Self(id))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::types::InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                self.0.to_string().serialize(serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use prefixed_id;
