use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest id a store with signed 64-bit keys can hold.
pub const MAX_ID: u64 = i64::MAX.unsigned_abs();

/// Error type for parsing an ID from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = u64::deserialize(deserializer)?;
                if raw > MAX_ID {
                    return Err(de::Error::custom(format_args!(
                        concat!(stringify!($name), " {} is out of range"),
                        raw
                    )));
                }
                Ok(Self(raw))
            }
        }

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value
            #[must_use]
            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|raw| *raw <= MAX_ID)
                    .map(Self::new)
                    .ok_or(ParseIdError {
                        kind: stringify!($name),
                    })
            }
        }
    };
}

define_id!(
    /// Identifier of a learner. Users live outside this service; the id is opaque.
    UserId
);
define_id!(
    /// Unique identifier for a Course
    CourseId
);
define_id!(
    /// Unique identifier for a Lesson
    LessonId
);
define_id!(
    /// Unique identifier for a Category
    CategoryId
);
define_id!(
    /// Unique identifier for a Webinar
    WebinarId
);

// ─── Tests ─────────────────────────────────────────────────────────────────────
