//! Identifiers for persisted entities
//!
//! Identities are short random hex tokens with a type prefix, e.g.
//! `run_3fa9c20d11e0b7a4`. Collisions are not checked.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Number of random bytes in an identity token
const TOKEN_BYTES: usize = 8;

fn random_token(prefix: &str) -> Result<String, EngineError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::fill(&mut bytes).map_err(|e| EngineError::Entropy(e.to_string()))?;
    Ok(format!("{prefix}_{}", hex::encode(bytes)))
}

macro_rules! token_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh random identity.
            pub fn generate() -> Result<Self, EngineError> {
                random_token(Self::PREFIX).map(Self)
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

token_id!(
    /// Identity of a single simulation run
    RunId,
    "run"
);

token_id!(
    /// Identity of a saved experiment
    ExperimentId,
    "exp"
);
