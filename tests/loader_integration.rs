use std::path::PathBuf;
use std::time::Duration;

use crossbeam_channel::unbounded;
use image::{Rgba, RgbaImage};
use tempfile::tempdir;
use zoom_screensaver::playlist::Playlist;
use zoom_screensaver::render::loader::{LoaderMsg, LoaderReply, spawn_loader};

fn write_fixture_png(path: &std::path::Path, w: u32, h: u32) {
    let img = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
    img.save(path).unwrap();
}

#[test]
fn decodes_images_off_thread() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("fixture.png");
    write_fixture_png(&path, 4, 2);

    let (tx_req, rx_req) = unbounded::<LoaderMsg>();
    let (tx_res, rx_res) = unbounded::<LoaderReply>();
    spawn_loader(rx_req, tx_res);

    tx_req.send(LoaderMsg::Decode(path.clone())).unwrap();
    match rx_res.recv_timeout(Duration::from_secs(10)).unwrap() {
        LoaderReply::Ready(prepared) => {
            assert_eq!(prepared.path, path);
            assert_eq!(prepared.size, (4, 2));
            assert_eq!(prepared.pixels.len(), 4 * 2 * 4);
        }
        LoaderReply::Failed(path) => panic!("decode failed for {}", path.display()),
    }

    tx_req.send(LoaderMsg::Quit).unwrap();
}

#[test]
fn broken_files_report_failure() {
    let tmp = tempdir().unwrap();
    let broken = tmp.path().join("broken.png");
    std::fs::write(&broken, b"not a png").unwrap();
    let good = tmp.path().join("good.png");
    write_fixture_png(&good, 2, 2);

    let (tx_req, rx_req) = unbounded::<LoaderMsg>();
    let (tx_res, rx_res) = unbounded::<LoaderReply>();
    spawn_loader(rx_req, tx_res);

    tx_req.send(LoaderMsg::Decode(broken.clone())).unwrap();
    tx_req.send(LoaderMsg::Decode(good.clone())).unwrap();

    match rx_res.recv_timeout(Duration::from_secs(10)).unwrap() {
        LoaderReply::Failed(path) => assert_eq!(path, broken),
        LoaderReply::Ready(p) => panic!("unexpected decode of {}", p.path.display()),
    }
    match rx_res.recv_timeout(Duration::from_secs(10)).unwrap() {
        LoaderReply::Ready(prepared) => assert_eq!(prepared.path, good),
        LoaderReply::Failed(path) => panic!("decode failed for {}", path.display()),
    }

    tx_req.send(LoaderMsg::Quit).unwrap();
}

// Drives the viewer's prefetch-and-swap protocol against a rotation that
// contains a corrupt file: the failure reply must knock the file out of the
// playlist and the slideshow must keep cycling through the good images.
#[test]
fn rotation_skips_broken_files() {
    let tmp = tempdir().unwrap();
    let good1 = tmp.path().join("good1.png");
    let good2 = tmp.path().join("good2.png");
    let broken = tmp.path().join("broken.png");
    write_fixture_png(&good1, 2, 2);
    write_fixture_png(&good2, 2, 2);
    std::fs::write(&broken, b"not a png").unwrap();

    let mut playlist =
        Playlist::shuffled(vec![good1, good2, broken.clone()], Some(11)).unwrap();

    let (tx_req, rx_req) = unbounded::<LoaderMsg>();
    let (tx_res, rx_res) = unbounded::<LoaderReply>();
    spawn_loader(rx_req, tx_res);

    tx_req
        .send(LoaderMsg::Decode(playlist.current().clone()))
        .unwrap();
    tx_req
        .send(LoaderMsg::Decode(playlist.peek_next().clone()))
        .unwrap();

    let mut shown: Vec<PathBuf> = Vec::new();
    let mut on_screen: Option<PathBuf> = None;
    while shown.len() < 4 {
        match rx_res.recv_timeout(Duration::from_secs(10)).unwrap() {
            LoaderReply::Ready(img) => {
                if on_screen.is_none() {
                    // first decode goes straight on screen
                    on_screen = Some(img.path.clone());
                } else {
                    // prefetched next arrived: swap and prefetch the following
                    playlist.advance();
                    on_screen = Some(img.path.clone());
                    tx_req
                        .send(LoaderMsg::Decode(playlist.peek_next().clone()))
                        .unwrap();
                }
                shown.push(img.path);
            }
            LoaderReply::Failed(path) => {
                let was_next = path == *playlist.peek_next();
                assert!(playlist.remove(&path));
                assert!(!playlist.is_empty());
                if on_screen.is_none() {
                    tx_req
                        .send(LoaderMsg::Decode(playlist.current().clone()))
                        .unwrap();
                } else if was_next {
                    tx_req
                        .send(LoaderMsg::Decode(playlist.peek_next().clone()))
                        .unwrap();
                }
            }
        }
    }

    assert!(!shown.contains(&broken));
    assert!(!playlist.as_slice().contains(&broken));
    assert_eq!(playlist.len(), 2);

    tx_req.send(LoaderMsg::Quit).unwrap();
}
