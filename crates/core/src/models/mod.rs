//! Shared domain models.

use serde::{Deserialize, Serialize};

/// A single contact card held in the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Opaque identifier, unique within the store and immutable once assigned.
    pub id: String,
    /// Display name (at least two characters at creation time).
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number (at least ten characters at creation time).
    pub phone: String,
    /// Profile picture: either an uploaded `data:` URI or the placeholder URL.
    pub profile_picture: String,
}

impl Contact {
    /// Up to two uppercase initials derived from the name, for card badges.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Whether the contact carries an uploaded picture rather than a URL.
    pub fn has_uploaded_picture(&self) -> bool {
        self.profile_picture.starts_with("data:")
    }
}

/// A contact as submitted by the creation form, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDraft {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Resolved picture value; the form substitutes the placeholder URL
    /// when nothing was uploaded.
    pub profile_picture: String,
}

impl ContactDraft {
    /// Promote the draft to a full contact under the given id.
    pub fn into_contact(self, id: String) -> Contact {
        Contact {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            profile_picture: self.profile_picture,
        }
    }
}
