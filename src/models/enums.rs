use serde::{Deserialize, Serialize};

use crate::pipeline::diagnosis_time::DiagnosisTimeError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Unknown strings are turned into an error by `$err`.
macro_rules! str_enum {
    ($name:ident, $err:expr, { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DiagnosisTimeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(($err)(s.to_string())),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// How the diagnosis time is chosen among candidates.
str_enum!(ExtractionMethod, DiagnosisTimeError::InvalidMethod, {
    Parsing => "parsing",
    CharDist => "char_dist",
});

// TIMEX3 type tag of a temporal expression.
str_enum!(
    TemporalType,
    |s: String| DiagnosisTimeError::Tagger(format!("unknown temporal type '{s}'")),
    {
        Date => "DATE",
        Time => "TIME",
        Duration => "DURATION",
        Set => "SET",
    }
);

impl Default for ExtractionMethod {
    fn default() -> Self {
        Self::Parsing
    }
}
