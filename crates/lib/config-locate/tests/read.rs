//! Tests for locating and reading configuration files.

use std::path::PathBuf;

use config_locate::{LoadError, ReadError, load, read};

#[tokio::test]
async fn reads_first_existing_file() {
    let paths = ["tests/fixtures/config1.txt", "tests/fixtures/config2.txt"];

    let located = read(&paths).await.unwrap();

    assert_eq!(located.payload, "config1 content");
    assert_eq!(located.path, PathBuf::from("tests/fixtures/config1.txt"));
}

#[tokio::test]
async fn skips_missing_files() {
    let paths = ["tests/fixtures/nonexistent.txt", "tests/fixtures/config2.txt"];

    let located = read(&paths).await.unwrap();

    assert_eq!(located.payload, "config2 content");
    assert_eq!(located.path, PathBuf::from("tests/fixtures/config2.txt"));
}

#[tokio::test]
async fn reports_every_tried_path() {
    let paths = [
        "tests/fixtures/nonexistent1.txt",
        "tests/fixtures/nonexistent2.txt",
    ];

    let err = read(&paths).await.unwrap_err();

    let ReadError::NotFound { paths: tried } = err else {
        panic!("expected NotFound, got {err:?}");
    };
    assert_eq!(
        tried,
        [
            PathBuf::from("tests/fixtures/nonexistent1.txt"),
            PathBuf::from("tests/fixtures/nonexistent2.txt"),
        ]
    );
}

#[tokio::test]
async fn load_parses_contents() {
    let paths = ["tests/fixtures/config2.txt"];

    let located = load(&paths, |contents| Ok::<_, std::convert::Infallible>(contents.len()))
        .await
        .unwrap();

    assert_eq!(located.payload, "config2 content".len());
}

#[tokio::test]
async fn load_attributes_parse_errors_to_the_file() {
    let paths = ["tests/fixtures/config1.txt"];

    let err = load(&paths, |contents| contents.parse::<u32>())
        .await
        .unwrap_err();

    let LoadError::Parse { path, .. } = err else {
        panic!("expected Parse, got {err:?}");
    };
    assert_eq!(path, PathBuf::from("tests/fixtures/config1.txt"));
}
