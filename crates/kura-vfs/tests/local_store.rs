//! Store operations against a host directory.

use std::collections::BTreeSet;

use kura_vfs::{ErrorKind, ListOptions, LocalBackend, LocalStoreConfig, Store, StoreConfig};
use tempfile::TempDir;

fn local_store() -> (Store, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = Store::new(LocalBackend::new(dir.path()));
    (store, dir)
}

#[tokio::test]
async fn test_files_land_on_disk() {
    let (store, dir) = local_store();
    assert!(store.file().create_with_data("/notes/today.txt", true, "hello").await);

    let on_disk = std::fs::read_to_string(dir.path().join("notes/today.txt")).unwrap();
    assert_eq!(on_disk, "hello");

    assert!(store.file().append("/notes/today.txt", " world").await);
    assert_eq!(
        store.file().read_text("/notes/today.txt").await.as_deref(),
        Some("hello world")
    );
}

#[tokio::test]
async fn test_listing_after_sorting() {
    let (store, dir) = local_store();
    std::fs::write(dir.path().join("a.txt"), "a").unwrap();
    std::fs::write(dir.path().join("b.txt"), "bb").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("nested/c.txt"), "ccc").unwrap();

    // Host enumeration order is unspecified, so compare as sets.
    let flat = store.dir().list("/", ListOptions::flat()).await.unwrap();
    let paths: BTreeSet<_> = flat.iter().map(|i| i.full_path.as_str()).collect();
    assert_eq!(
        paths,
        BTreeSet::from(["/a.txt", "/b.txt", "/nested", "/nested/c.txt"])
    );

    // Descendants always come before the directory entry that holds them.
    let position = |p: &str| flat.iter().position(|i| i.full_path == p).unwrap();
    assert!(position("/nested/c.txt") < position("/nested"));

    let tree = store.dir().list("/", ListOptions::tree()).await.unwrap();
    let nested = tree.iter().find(|i| i.name == "nested").unwrap();
    let children = nested.children.as_deref().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].size, Some(3));
}

#[tokio::test]
async fn test_dir_move_on_disk() {
    let (store, dir) = local_store();
    store.file().create_with_data("/a/test/file.txt", true, "deep").await;
    store.file().create("/a/test.txt", true).await;
    store.dir().create("/a/empty_dir", false).await;

    assert!(store.dir().mv("/a", "/b/nested").await);
    assert!(!dir.path().join("a").exists());
    assert!(dir.path().join("b/nested/empty_dir").is_dir());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("b/nested/test/file.txt")).unwrap(),
        "deep"
    );
}

#[tokio::test]
async fn test_stat_sniffs_content() {
    let (store, _dir) = local_store();
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    store.file().create_with_data("/img.bin", false, png).await;

    let stat = store.file().stat("/img.bin").await.unwrap();
    assert_eq!(stat.mime.as_deref(), Some("image/png"));
    assert_eq!(stat.directory_path, "/");

    let store = store.with_config(StoreConfig {
        sniff_mime: false,
        ..StoreConfig::default()
    });
    assert_eq!(store.file().stat("/img.bin").await.unwrap().mime, None);
}

#[tokio::test]
async fn test_read_only_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("existing.txt"), "keep").unwrap();
    let config = LocalStoreConfig::from_ron(&format!(
        "(root: {:?}, read_only: true)",
        dir.path().display().to_string()
    ))
    .unwrap();
    let store = config.open();

    assert_eq!(
        store.file().read_text("/existing.txt").await.as_deref(),
        Some("keep")
    );
    let err = store
        .file()
        .try_write("/existing.txt", b"changed", false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(!store.dir().create("/new", false).await);
    assert!(!store.file().delete("/existing.txt").await);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("existing.txt")).unwrap(),
        "keep"
    );
}

#[tokio::test]
async fn test_names_cannot_escape_root() {
    let (store, dir) = local_store();
    assert!(!store.file().create(["..", "escape.txt"], false).await);
    assert!(!store.file().create(["sub/../../x"], true).await);
    assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
}
