use std::{fmt, ops::Deref, str::FromStr};

use serde::Deserialize;

/// Wrapper for secrets (tokens, keys) that must never show up in logs.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Hidden<T>(pub T);

impl<T> fmt::Debug for Hidden<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HIDDEN")
    }
}

impl<T: FromStr> FromStr for Hidden<T> {
    type Err = T::Err;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl<T> Deref for Hidden<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Hidden;

    #[test]
    fn debug_output_hides_the_secret() {
        let token: Hidden<String> = serde_json::from_str("\"glpat-secret\"").unwrap();

        assert_eq!(format!("{token:?}"), "HIDDEN");
        assert_eq!(token.as_str(), "glpat-secret");
    }
}
