mod common;

use std::cell::Cell;

use pangaea_datasets::domain::{ContentKind, Doi};
use pangaea_datasets::error::PangaeaError;
use pangaea_datasets::store::{AssumeYes, Confirm};

use common::temp_store;

struct Answer {
    value: bool,
    asked: Cell<usize>,
}

impl Confirm for Answer {
    fn confirm(&self, _prompt: &str) -> Result<bool, PangaeaError> {
        self.asked.set(self.asked.get() + 1);
        Ok(self.value)
    }
}

fn doi(value: &str) -> Doi {
    value.parse().unwrap()
}

#[test]
fn contains_matches_exact_stem() {
    let (_dir, store) = temp_store();
    store
        .write(&doi("10.1594/PANGAEA.123"), ContentKind::TabularText, b"A\n1\n")
        .unwrap();

    assert!(store.contains(&doi("10.1594/PANGAEA.123")).unwrap());
    assert!(!store.contains(&doi("10.1594/PANGAEA.12")).unwrap());
    assert!(!store.contains(&doi("10.1594/PANGAEA.1234")).unwrap());
}

#[test]
fn missing_directory_is_empty() {
    let (_dir, store) = temp_store();
    assert!(store.list().unwrap().is_empty());
    assert!(!store.contains(&doi("10.1594/PANGAEA.1")).unwrap());
}

#[test]
fn list_reports_size_and_mtime() {
    let (_dir, store) = temp_store();
    store
        .write(&doi("10.1594/PANGAEA.1"), ContentKind::Archive, b"PK\x03\x04")
        .unwrap();

    let files = store.list().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].size, 4);
    assert!(files[0].modified.is_some());
}

#[test]
fn clear_by_doi_leaves_others() {
    let (_dir, store) = temp_store();
    for id in ["a", "b", "c"] {
        store
            .write(
                &doi(&format!("10.1594/PANGAEA.{id}")),
                ContentKind::TabularText,
                b"x\n",
            )
            .unwrap();
    }
    let answer = Answer {
        value: false,
        asked: Cell::new(0),
    };

    let result = store
        .clear(
            Some(&[doi("10.1594/PANGAEA.a"), doi("10.1594/PANGAEA.b")]),
            &answer,
        )
        .unwrap();

    assert_eq!(result.removed.len(), 2);
    assert_eq!(answer.asked.get(), 0);
    let files = store.list().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("10_1594_PANGAEA_c.txt"));
}

#[test]
fn clear_all_respects_confirmation() {
    let (_dir, store) = temp_store();
    store
        .write(&doi("10.1594/PANGAEA.1"), ContentKind::Image, b"png")
        .unwrap();
    let refuse = Answer {
        value: false,
        asked: Cell::new(0),
    };

    let cancelled = store.clear(None, &refuse).unwrap();
    assert!(cancelled.cancelled);
    assert_eq!(refuse.asked.get(), 1);
    assert_eq!(store.list().unwrap().len(), 1);

    let cleared = store.clear(None, &AssumeYes).unwrap();
    assert!(!cleared.cancelled);
    assert_eq!(cleared.removed.len(), 1);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn unknown_kind_is_not_written() {
    let (_dir, store) = temp_store();
    let err = store
        .write(&doi("10.1594/PANGAEA.1"), ContentKind::Unknown, b"?")
        .unwrap_err();
    assert!(matches!(err, PangaeaError::Filesystem(_)));
}

#[test]
fn clear_tolerates_repeated_doi() {
    let (_dir, store) = temp_store();
    let target = doi("10.1594/PANGAEA.5");
    store
        .write(&target, ContentKind::TabularText, b"A\n1\n")
        .unwrap();

    let result = store
        .clear(Some(&[target.clone(), target]), &AssumeYes)
        .unwrap();

    assert_eq!(result.removed.len(), 1);
    assert!(store.list().unwrap().is_empty());
}
