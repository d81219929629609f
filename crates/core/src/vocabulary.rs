//! Fixed vocabularies for enumerated columns.
//!
//! Every enumerated value the portal stores (`event_types`, `audience_types`,
//! statuses, roles) is a Rust enum whose wire name matches the database CHECK
//! constraint in the migrations. Unknown strings are rejected with
//! [`CoreError::Validation`] before anything reaches the store.

use crate::error::CoreError;

macro_rules! define_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [$name] = &[ $( $name::$variant ),+ ];

            /// The stored / wire representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $wire => Ok($name::$variant), )+
                    other => Err($crate::error::CoreError::Validation(format!(
                        "Invalid {} '{other}'. Must be one of: {}",
                        $label,
                        $name::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::error::CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }
    };
}

pub(crate) use define_vocabulary;

define_vocabulary! {
    /// Format of an event.
    EventType ("event type") {
        Panel => "panel",
        Mixer => "mixer",
        Masterclass => "masterclass",
        Launch => "launch",
        Workshop => "workshop",
        Networking => "networking",
        Keynote => "keynote",
    }
}

define_vocabulary! {
    /// Intended audience segment of an event.
    AudienceType ("audience type") {
        Founders => "founders",
        Investors => "investors",
        Students => "students",
        Developers => "developers",
        Designers => "designers",
        Marketers => "marketers",
        General => "general",
    }
}

/// Parse a list of stored names into a vocabulary, failing on the first unknown value.
pub fn parse_all<T>(values: &[String]) -> Result<Vec<T>, CoreError>
where
    T: std::str::FromStr<Err = CoreError>,
{
    values.iter().map(|v| v.parse()).collect()
}

/// Render values to their stored names, dropping duplicates but keeping first-seen order.
pub fn to_names<T>(values: &[T]) -> Vec<String>
where
    T: Copy + PartialEq + std::fmt::Display,
{
    let mut seen: Vec<T> = Vec::with_capacity(values.len());
    for v in values {
        if !seen.contains(v) {
            seen.push(*v);
        }
    }
    seen.iter().map(|v| v.to_string()).collect()
}
