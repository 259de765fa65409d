use super::common::*;
use fieldwise::{FieldIdentifier, MessageStore};

fn ids(person: &Person) -> (FieldIdentifier, FieldIdentifier) {
    (
        FieldIdentifier::new(person, "first_name"),
        FieldIdentifier::new(person, "age"),
    )
}

/// Appending to the same field extends one entry instead of creating two.
#[test]
fn add_never_duplicates_entries() {
    let person = valid_person();
    let (first_name, _) = ids(&person);

    let mut store = MessageStore::new();
    store.add(first_name.clone(), "one");
    store.add(first_name.clone(), "two");

    assert_eq!(store.len(), 1);
    assert_eq!(store.messages(&first_name), ["one", "two"]);
}

/// Clearing one field leaves the other fields' messages untouched.
#[test]
fn clear_is_per_field() {
    let person = valid_person();
    let (first_name, age) = ids(&person);

    let mut store = MessageStore::new();
    store.add(first_name.clone(), "a");
    store.add(age.clone(), "b");
    store.clear(&first_name);

    assert!(store.messages(&first_name).is_empty());
    assert_eq!(store.messages(&age), ["b"]);
}

#[test]
fn clear_all_empties_everything() {
    let person = valid_person();
    let (first_name, age) = ids(&person);

    let mut store = MessageStore::new();
    store.add(first_name, "a");
    store.add(age, "b");
    store.clear_all();

    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
}

/// Iteration preserves first-insertion order across fields.
#[test]
fn iteration_is_in_insertion_order() {
    let person = valid_person();
    let (first_name, age) = ids(&person);

    let mut store = MessageStore::new();
    store.add(age.clone(), "b1");
    store.add(first_name, "a1");
    store.add(age, "b2");

    let all: Vec<&str> = store.all_messages().collect();
    assert_eq!(all, ["b1", "b2", "a1"]);
}

/// Bulk append with no messages is a no-op and creates no entry.
#[test]
fn add_all_with_no_messages_is_a_noop() {
    let person = valid_person();
    let (first_name, _) = ids(&person);

    let mut store = MessageStore::new();
    store.add_all(first_name, Vec::new());

    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
}

/// Identity is structural: same owner and name match, different names do not.
#[test]
fn field_identity_is_owner_plus_name() {
    let person = valid_person();
    let other = valid_person();

    assert_eq!(
        FieldIdentifier::new(&person, "age"),
        FieldIdentifier::new(&person, "age")
    );
    assert_ne!(
        FieldIdentifier::new(&person, "age"),
        FieldIdentifier::new(&person, "first_name")
    );
    assert_ne!(
        FieldIdentifier::new(&person, "age"),
        FieldIdentifier::new(&other, "age")
    );
}
