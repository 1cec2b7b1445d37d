//! Mailbox identities and opaque folder/item references.
//!
//! # Responsibility
//! - Carry the mailbox principal through one logical call chain.
//! - Identify folders and items exactly as the server hands them out.
//!
//! # Invariants
//! - A `Principal` is never blank and carries no surrounding whitespace.
//! - References are immutable once constructed.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mailbox identity (UPN or SMTP address) used to stamp outgoing calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    pub fn new(value: impl Into<String>) -> Result<Self, PrincipalError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(PrincipalError::Blank);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Mailbox identities compare case-insensitively on the server.
    pub fn same_mailbox(&self, other: &Principal) -> bool {
        self.0.eq_ignore_ascii_case(other.0.as_str())
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalError {
    Blank,
}

impl Display for PrincipalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "principal cannot be blank"),
        }
    }
}

impl Error for PrincipalError {}

/// Well-known folders addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistinguishedFolder {
    Calendar,
    Tasks,
    Inbox,
    Contacts,
    DeletedItems,
}

impl DistinguishedFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Tasks => "tasks",
            Self::Inbox => "inbox",
            Self::Contacts => "contacts",
            Self::DeletedItems => "deleteditems",
        }
    }
}

/// Mailbox folder reference: either distinguished or a concrete server id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderRef {
    Distinguished(DistinguishedFolder),
    Id {
        id: String,
        change_key: Option<String>,
    },
}

impl FolderRef {
    pub fn primary_calendar() -> Self {
        Self::Distinguished(DistinguishedFolder::Calendar)
    }

    pub fn id(id: impl Into<String>) -> Self {
        Self::Id {
            id: id.into(),
            change_key: None,
        }
    }

    /// Concrete server id, when this is not a distinguished reference.
    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::Distinguished(_) => None,
            Self::Id { id, .. } => Some(id.as_str()),
        }
    }
}

impl Display for FolderRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Distinguished(name) => write!(f, "distinguished:{}", name.as_str()),
            Self::Id { id, .. } => f.write_str(id),
        }
    }
}

/// Calendar, task or message item reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: String,
    pub change_key: Option<String>,
}

impl ItemRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            change_key: None,
        }
    }

    pub fn with_change_key(id: impl Into<String>, change_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            change_key: Some(change_key.into()),
        }
    }
}

impl Display for ItemRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id.as_str())
    }
}
