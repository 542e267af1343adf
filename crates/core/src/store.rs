//! In-memory contact store owned by the application root.

use tracing::{debug, info};

use crate::models::{Contact, ContactDraft};

/// Source of fresh contact identifiers.
///
/// Injected into [`ContactStore`] so uniqueness is a property of the
/// generator rather than a probabilistic accident of id formatting.
pub trait IdGenerator: Send {
    /// Return an identifier never produced by this generator before.
    fn next_id(&mut self) -> String;
}

/// Monotonic counter generator: `contact-1`, `contact-2`, …
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    counter: u64,
}

impl SequentialIds {
    /// Generator starting at `contact-1`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("contact-{}", self.counter)
    }
}

/// Ordered, in-memory collection of contacts with session lifetime.
///
/// All mutations run synchronously inside the caller's event handler; the
/// store itself never spawns work or touches the filesystem.
pub struct ContactStore {
    contacts: Vec<Contact>,
    ids: Box<dyn IdGenerator>,
}

impl ContactStore {
    /// Build a store around the provided id generator.
    pub fn new(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            contacts: Vec::new(),
            ids,
        }
    }

    /// Store with the default monotonic id scheme.
    pub fn with_sequential_ids() -> Self {
        Self::new(Box::new(SequentialIds::new()))
    }

    /// Assign a fresh id to the draft and append it to the collection.
    ///
    /// Never fails and performs no duplicate detection; insertion order is
    /// the collection order.
    pub fn add(&mut self, draft: ContactDraft) -> &Contact {
        let id = self.ids.next_id();
        let contact = draft.into_contact(id);
        info!(id = %contact.id, name = %contact.name, "contact added");
        self.contacts.push(contact);
        self.contacts
            .last()
            .expect("push left the collection non-empty")
    }

    /// Replace the stored contact whose id matches `updated`.
    ///
    /// Returns `false` and leaves the collection untouched when no id
    /// matches; ids originate from this store, so a miss is unexpected and
    /// only logged.
    pub fn update(&mut self, updated: Contact) -> bool {
        match self.contacts.iter_mut().find(|c| c.id == updated.id) {
            Some(slot) => {
                debug!(id = %updated.id, "contact updated");
                *slot = updated;
                true
            }
            None => {
                debug!(id = %updated.id, "update for unknown contact id ignored");
                false
            }
        }
    }

    /// Remove the contact with the given id, if present.
    ///
    /// Idempotent: a second call with the same id is a no-op returning
    /// `false`.
    pub fn delete(&mut self, id: &str) -> bool {
        match self.contacts.iter().position(|c| c.id == id) {
            Some(index) => {
                let removed = self.contacts.remove(index);
                info!(id = %removed.id, name = %removed.name, "contact deleted");
                true
            }
            None => {
                debug!(id, "delete for unknown contact id ignored");
                false
            }
        }
    }

    /// All contacts in insertion order.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Look up one contact by id.
    pub fn get(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    /// Number of stored contacts.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether the store holds no contacts.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

impl Default for ContactStore {
    fn default() -> Self {
        Self::with_sequential_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::PLACEHOLDER_PICTURE_URL;

    fn draft(name: &str, email: &str, phone: &str) -> ContactDraft {
        ContactDraft {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            profile_picture: PLACEHOLDER_PICTURE_URL.to_string(),
        }
    }

    #[test]
    fn add_appends_in_order_with_unique_ids() {
        let mut store = ContactStore::with_sequential_ids();
        let first = store.add(draft("Jane Doe", "jane@x.com", "1234567890")).id.clone();
        let second = store
            .add(draft("John Roe", "john@x.com", "0987654321"))
            .id
            .clone();

        assert_eq!(store.len(), 2);
        assert_ne!(first, second);
        assert_eq!(store.contacts()[0].name, "Jane Doe");
        assert_eq!(store.contacts()[1].name, "John Roe");
        assert_eq!(store.contacts()[0].profile_picture, PLACEHOLDER_PICTURE_URL);
    }

    #[test]
    fn update_replaces_only_the_matching_entry() {
        let mut store = ContactStore::with_sequential_ids();
        store.add(draft("Jane Doe", "jane@x.com", "1234567890"));
        let target = store.add(draft("John Roe", "john@x.com", "0987654321")).clone();

        let mut changed = target.clone();
        changed.phone = "9999999999".to_string();
        assert!(store.update(changed));

        assert_eq!(store.len(), 2);
        assert_eq!(store.contacts()[0].name, "Jane Doe");
        assert_eq!(store.contacts()[0].phone, "1234567890");
        let reread = store.get(&target.id).expect("updated contact present");
        assert_eq!(reread.id, target.id);
        assert_eq!(reread.phone, "9999999999");
    }

    #[test]
    fn update_with_unknown_id_leaves_collection_unchanged() {
        let mut store = ContactStore::with_sequential_ids();
        store.add(draft("Jane Doe", "jane@x.com", "1234567890"));
        let before: Vec<Contact> = store.contacts().to_vec();

        let ghost = Contact {
            id: "contact-404".to_string(),
            name: "Ghost".to_string(),
            email: "ghost@x.com".to_string(),
            phone: "0000000000".to_string(),
            profile_picture: PLACEHOLDER_PICTURE_URL.to_string(),
        };
        assert!(!store.update(ghost));
        assert_eq!(store.contacts(), before.as_slice());
    }

    #[test]
    fn delete_removes_exactly_one_and_is_idempotent() {
        let mut store = ContactStore::with_sequential_ids();
        let id = store.add(draft("Jane Doe", "jane@x.com", "1234567890")).id.clone();
        store.add(draft("John Roe", "john@x.com", "0987654321"));

        assert!(store.delete(&id));
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).is_none());

        assert!(!store.delete(&id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_edit_delete_round_trip() {
        let mut store = ContactStore::with_sequential_ids();
        assert!(store.is_empty());

        let id = store.add(draft("Jane Doe", "jane@x.com", "1234567890")).id.clone();
        assert_eq!(store.len(), 1);

        let mut edited = store.get(&id).expect("just added").clone();
        edited.phone = "9999999999".to_string();
        assert!(store.update(edited));
        let card = store.get(&id).expect("still present");
        assert_eq!(card.phone, "9999999999");
        assert_eq!(card.id, id);

        assert!(store.delete(&id));
        assert!(store.is_empty());
    }
}
