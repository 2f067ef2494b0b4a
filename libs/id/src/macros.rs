//! Macros for defining typed ID types.

/// Macro to define a typed, UUID-backed ID.
///
/// This generates a newtype wrapper around `Uuid` with:
/// - A `KIND` constant used in error messages
/// - `new()` to generate a fresh (v7) ID
/// - `parse()` to parse from string, rejecting empty and nil input
/// - `Display` and `FromStr` implementations
/// - `Serialize` and `Deserialize` implementations (as strings)
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_id!(ClassId, "class");
///
/// let class_id = ClassId::new();
/// let parsed: ClassId = "0190b6a4-6f5e-7c3a-9d1e-2f4b5c6d7e8f".parse()?;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $kind:literal) => {
        /// A typed ID for this resource type.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name($crate::Uuid);

        impl $name {
            /// Human-readable resource kind.
            pub const KIND: &'static str = $kind;

            /// Creates a new time-ordered ID.
            #[must_use]
            pub fn new() -> Self {
                Self($crate::Uuid::now_v7())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: $crate::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> $crate::Uuid {
                self.0
            }

            /// Parses an ID from its hyphenated (or simple) UUID form.
            pub fn parse(s: &str) -> Result<Self, $crate::IdError> {
                let s = s.trim();
                if s.is_empty() {
                    return Err($crate::IdError::Empty);
                }

                let uuid = $crate::Uuid::parse_str(s)
                    .map_err(|e| $crate::IdError::InvalidUuid(e.to_string()))?;

                if uuid.is_nil() {
                    return Err($crate::IdError::Nil { kind: Self::KIND });
                }

                Ok(Self(uuid))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$crate::Uuid> for $name {
            fn from(uuid: $crate::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for $crate::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }

        impl AsRef<$crate::Uuid> for $name {
            fn as_ref(&self) -> &$crate::Uuid {
                &self.0
            }
        }
    };
}
