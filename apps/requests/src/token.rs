use crate::error::FeedError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

// Textual principal: lowercase base32 groups of five separated by dashes,
// the last group possibly shorter.
static PRINCIPAL_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z2-7]{5}-)*[a-z2-7]{1,5}$").expect("principal pattern is valid")
});

/// Canister id of the DAO token the feed is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenId(String);

impl TokenId {
    pub fn parse(text: &str) -> Result<Self, FeedError> {
        let text = text.trim();
        if text.is_empty() || text.len() > 63 || !PRINCIPAL_TEXT.is_match(text) {
            return Err(FeedError::InvalidTokenId(text.to_string()));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TokenId {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenId::parse(s)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
