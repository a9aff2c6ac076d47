use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a group member, as handed out by the user directory.
///
/// The engine never resolves a member id to a display name; that is left to
/// whoever consumes the balances. Ids compare, hash and order as their
/// underlying string, so a `HashMap<MemberId, _>` can be queried with a
/// plain `&str`.
///
/// # Examples
///
/// ```
/// use group_ledger::core::member::MemberId;
/// use std::collections::HashMap;
///
/// let mut owed: HashMap<MemberId, u32> = HashMap::new();
/// owed.insert(MemberId::new("alice"), 20);
/// assert_eq!(owed.get("alice"), Some(&20));
///
/// let bob: MemberId = " bob ".parse().unwrap();
/// assert_eq!(bob.as_str(), "bob");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("member id must not be blank")]
pub struct BlankMemberId;

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse user input: surrounding whitespace is dropped and a blank id is
    /// rejected.
    pub fn parse(id: &str) -> Result<Self, BlankMemberId> {
        let id = id.trim();
        if id.is_empty() {
            return Err(BlankMemberId);
        }
        Ok(Self::new(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MemberId {
    type Err = BlankMemberId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for MemberId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MemberId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
