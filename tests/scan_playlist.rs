use std::collections::HashSet;
use std::fs;

use tempfile::tempdir;
use zoom_screensaver::error::Error;
use zoom_screensaver::playlist::Playlist;
use zoom_screensaver::scan::scan_images;

#[test]
fn scan_and_playlist_cooperate() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();

    fs::write(root.join("x.jpg"), b"x").unwrap();
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("sub").join("y.png"), b"x").unwrap();

    let photos = scan_images(root).unwrap();
    assert_eq!(photos.len(), 2);

    let mut playlist = Playlist::shuffled(photos.clone(), Some(1)).unwrap();
    let expected: HashSet<_> = photos.into_iter().collect();
    let first = playlist.current().clone();
    let mut seen = HashSet::new();
    seen.insert(first.clone());
    seen.insert(playlist.advance().clone());
    assert_eq!(seen, expected);
    // wraps back around
    assert_eq!(*playlist.advance(), first);
}

#[test]
fn shuffle_is_deterministic_with_seed() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    for name in ["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"] {
        fs::write(root.join(name), b"x").unwrap();
    }
    let photos = scan_images(root).unwrap();
    let p1 = Playlist::shuffled(photos.clone(), Some(99)).unwrap();
    let p2 = Playlist::shuffled(photos, Some(99)).unwrap();
    assert_eq!(p1.as_slice(), p2.as_slice());
}

#[test]
fn remove_keeps_cursor_on_the_displayed_item() {
    let items: Vec<_> = ["a.jpg", "b.jpg", "c.jpg", "d.jpg"]
        .iter()
        .map(std::path::PathBuf::from)
        .collect();
    let mut playlist = Playlist::shuffled(items, Some(5)).unwrap();
    playlist.advance();

    let shown = playlist.current().clone();
    let next = playlist.peek_next().clone();
    assert!(playlist.remove(&next));
    assert_eq!(playlist.len(), 3);
    assert_eq!(*playlist.current(), shown);
    assert!(!playlist.as_slice().contains(&next));

    // unknown paths are a no-op
    assert!(!playlist.remove(std::path::Path::new("z.jpg")));
    assert_eq!(playlist.len(), 3);
}

#[test]
fn remove_of_displayed_item_moves_to_its_successor() {
    let items: Vec<_> = ["a.jpg", "b.jpg", "c.jpg"]
        .iter()
        .map(std::path::PathBuf::from)
        .collect();
    let mut playlist = Playlist::shuffled(items, Some(5)).unwrap();
    playlist.advance();
    playlist.advance(); // park on the last slot so removal has to wrap

    let shown = playlist.current().clone();
    let next = playlist.peek_next().clone();
    assert!(playlist.remove(&shown));
    assert_eq!(*playlist.current(), next);

    // draining the playlist entirely is allowed
    let shown = playlist.current().clone();
    assert!(playlist.remove(&shown));
    let shown = playlist.current().clone();
    assert!(playlist.remove(&shown));
    assert!(playlist.is_empty());
}

#[test]
fn scan_skips_non_images_and_hidden_dirs() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    fs::write(root.join("photo.jpeg"), b"x").unwrap();
    fs::write(root.join("notes.txt"), b"x").unwrap();
    fs::create_dir_all(root.join(".cache")).unwrap();
    fs::write(root.join(".cache").join("thumb.jpg"), b"x").unwrap();

    let photos = scan_images(root).unwrap();
    assert_eq!(photos, vec![root.join("photo.jpeg")]);
}

#[test]
fn scan_rejects_missing_directory() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("nope");
    assert!(matches!(scan_images(&missing), Err(Error::BadDir(_))));
}

#[test]
fn empty_scan_cannot_build_a_playlist() {
    let tmp = tempdir().unwrap();
    let photos = scan_images(tmp.path()).unwrap();
    assert!(photos.is_empty());
    assert!(matches!(
        Playlist::shuffled(photos, None),
        Err(Error::EmptyScan)
    ));
}
