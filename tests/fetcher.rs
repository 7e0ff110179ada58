mod common;

use assert_matches::assert_matches;

use pangaea_datasets::domain::{ContentKind, Doi};
use pangaea_datasets::error::PangaeaError;
use pangaea_datasets::fetcher::{FetchOutcome, Fetcher};
use pangaea_datasets::http::RequestOptions;

use common::{BASE_URL, LOGIN_PAGE, MockClient, PNG, TSV, temp_store, zip_bytes};

fn doi(value: &str) -> Doi {
    value.parse().unwrap()
}

#[test]
fn second_download_is_a_noop() {
    let (_dir, store) = temp_store();
    let client =
        MockClient::default().file("10.1594/PANGAEA.1", "text/tab-separated-values", TSV.as_bytes());
    let fetcher = Fetcher::new(&client, &store, BASE_URL);
    let target = doi("10.1594/PANGAEA.1");

    let first = fetcher
        .ensure_downloaded(&target, false, &RequestOptions::default())
        .unwrap();
    assert_matches!(
        first,
        FetchOutcome::Downloaded {
            kind: ContentKind::TabularText,
            ..
        }
    );
    let second = fetcher
        .ensure_downloaded(&target, false, &RequestOptions::default())
        .unwrap();
    assert_eq!(second, FetchOutcome::Cached);

    assert_eq!(client.calls().len(), 1);
    let files = store.list().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("10_1594_PANGAEA_1.txt"));
}

#[test]
fn overwrite_downloads_again() {
    let (_dir, store) = temp_store();
    let client =
        MockClient::default().file("10.1594/PANGAEA.1", "text/tab-separated-values", TSV.as_bytes());
    let fetcher = Fetcher::new(&client, &store, BASE_URL);
    let target = doi("10.1594/PANGAEA.1");

    fetcher
        .ensure_downloaded(&target, false, &RequestOptions::default())
        .unwrap();
    let again = fetcher
        .ensure_downloaded(&target, true, &RequestOptions::default())
        .unwrap();

    assert_matches!(again, FetchOutcome::Downloaded { .. });
    assert_eq!(client.calls().len(), 2);
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn login_gate_writes_nothing() {
    let (_dir, store) = temp_store();
    let client = MockClient::default().file(
        "10.1594/PANGAEA.2",
        "text/html; charset=UTF-8",
        LOGIN_PAGE.as_bytes(),
    );
    let fetcher = Fetcher::new(&client, &store, BASE_URL);

    let outcome = fetcher
        .ensure_downloaded(&doi("10.1594/PANGAEA.2"), false, &RequestOptions::default())
        .unwrap();

    assert_eq!(outcome, FetchOutcome::LoginRequired);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn unsupported_media_is_named_outcome() {
    let (_dir, store) = temp_store();
    let client = MockClient::default().file("10.1594/PANGAEA.3", "application/pdf", b"%PDF-1.4");
    let fetcher = Fetcher::new(&client, &store, BASE_URL);

    let outcome = fetcher
        .ensure_downloaded(&doi("10.1594/PANGAEA.3"), false, &RequestOptions::default())
        .unwrap();

    assert_eq!(
        outcome,
        FetchOutcome::UnsupportedMedia {
            media_type: "application/pdf".to_string()
        }
    );
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn archive_and_image_are_written_raw() {
    let (_dir, store) = temp_store();
    let archive = zip_bytes(&[("a.tab", b"A\n1\n".as_slice())]);
    let client = MockClient::default()
        .file("10.1594/PANGAEA.4", "application/zip", &archive)
        .file("10.1594/PANGAEA.5", "image/png", PNG);
    let fetcher = Fetcher::new(&client, &store, BASE_URL);

    let zip = fetcher
        .ensure_downloaded(&doi("10.1594/PANGAEA.4"), false, &RequestOptions::default())
        .unwrap();
    let png = fetcher
        .ensure_downloaded(&doi("10.1594/PANGAEA.5"), false, &RequestOptions::default())
        .unwrap();

    let FetchOutcome::Downloaded { path, .. } = zip else {
        panic!("expected zip download, got {zip:?}");
    };
    assert_eq!(std::fs::read(path.as_std_path()).unwrap(), archive);
    let FetchOutcome::Downloaded { path, kind } = png else {
        panic!("expected png download, got {png:?}");
    };
    assert_eq!(kind, ContentKind::Image);
    assert!(path.as_str().ends_with("10_1594_PANGAEA_5.png"));
    assert_eq!(std::fs::read(path.as_std_path()).unwrap(), PNG);
}

#[test]
fn non_png_body_is_rejected() {
    let (_dir, store) = temp_store();
    let client = MockClient::default().file("10.1594/PANGAEA.6", "image/png", b"GIF89a");
    let fetcher = Fetcher::new(&client, &store, BASE_URL);

    let err = fetcher
        .ensure_downloaded(&doi("10.1594/PANGAEA.6"), false, &RequestOptions::default())
        .unwrap_err();
    assert_matches!(err, PangaeaError::InvalidImage(_));
}

#[test]
fn failed_download_is_status_error() {
    let (_dir, store) = temp_store();
    let client = MockClient::default().with(
        &format!("{BASE_URL}10.1594/PANGAEA.7?format=textfile"),
        500,
        "text/plain",
        b"boom",
    );
    let fetcher = Fetcher::new(&client, &store, BASE_URL);

    let err = fetcher
        .ensure_downloaded(&doi("10.1594/PANGAEA.7"), false, &RequestOptions::default())
        .unwrap_err();
    assert_matches!(err, PangaeaError::HttpStatus { status: 500, .. });
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn overwrite_failure_keeps_cached_file() {
    let (_dir, store) = temp_store();
    let target = doi("10.1594/PANGAEA.1");
    let cached = store
        .write(&target, ContentKind::TabularText, TSV.as_bytes())
        .unwrap();
    let client = MockClient::default();
    let fetcher = Fetcher::new(&client, &store, BASE_URL);

    let err = fetcher
        .ensure_downloaded(&target, true, &RequestOptions::default())
        .unwrap_err();

    assert_matches!(err, PangaeaError::HttpStatus { status: 404, .. });
    let files = store.list().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, cached.as_str());
    assert_eq!(std::fs::read_to_string(&cached).unwrap(), TSV);
}

#[test]
fn overwrite_with_new_kind_replaces_old_entry() {
    let (_dir, store) = temp_store();
    let target = doi("10.1594/PANGAEA.1");
    store
        .write(&target, ContentKind::TabularText, TSV.as_bytes())
        .unwrap();
    let archive = zip_bytes(&[("a.tab", b"A\n1\n".as_slice())]);
    let client = MockClient::default().file("10.1594/PANGAEA.1", "application/zip", &archive);
    let fetcher = Fetcher::new(&client, &store, BASE_URL);

    let outcome = fetcher
        .ensure_downloaded(&target, true, &RequestOptions::default())
        .unwrap();

    assert_matches!(
        outcome,
        FetchOutcome::Downloaded {
            kind: ContentKind::Archive,
            ..
        }
    );
    let files = store.list().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].path.ends_with("10_1594_PANGAEA_1.zip"));
}
