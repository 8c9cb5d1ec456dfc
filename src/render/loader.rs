//! Request-driven background image loader.
//!
//! Receives decode jobs, decodes off-thread, applies EXIF orientation so the
//! extent the animation engine sees matches what is drawn, and returns RGBA8
//! frames without blocking the render loop.

use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, warn};

/// Longest texture side we will upload; larger decodes are downscaled.
pub const MAX_TEXTURE_DIM: u32 = 4096;

/// Message sent to the background loader thread.
pub enum LoaderMsg {
    /// Decode this path.
    Decode(PathBuf),
    /// Stop the loader.
    Quit,
}

/// Reply from the loader thread for one decode request.
pub enum LoaderReply {
    /// Decode succeeded.
    Ready(PreparedImage),
    /// The file could not be decoded; the viewer drops it from rotation.
    Failed(PathBuf),
}

/// A decoded, orientation-corrected image ready for GPU upload.
pub struct PreparedImage {
    pub path: PathBuf,
    /// Dimensions after orientation and any downscale (width, height).
    pub size: (u32, u32),
    /// RGBA8 pixel buffer.
    pub pixels: Vec<u8>,
}

/// Spawn the request-driven loader thread.
pub fn spawn_loader(rx: Receiver<LoaderMsg>, tx: Sender<LoaderReply>) {
    thread::spawn(move || {
        while let Ok(msg) = rx.recv() {
            match msg {
                LoaderMsg::Quit => break,
                LoaderMsg::Decode(path) => {
                    let reply = match decode(&path) {
                        Ok(prepared) => {
                            debug!(path = %path.display(), w = prepared.size.0, h = prepared.size.1, "decoded");
                            LoaderReply::Ready(prepared)
                        }
                        Err(err) => {
                            warn!(path = %path.display(), %err, "failed to decode image");
                            LoaderReply::Failed(path)
                        }
                    };
                    if tx.send(reply).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn decode(path: &Path) -> anyhow::Result<PreparedImage> {
    let img = image::open(path)?;
    let img = apply_orientation(img, read_exif_orientation(path).unwrap_or(1));
    let img = if img.width().max(img.height()) > MAX_TEXTURE_DIM {
        img.resize(MAX_TEXTURE_DIM, MAX_TEXTURE_DIM, FilterType::Triangle)
    } else {
        img
    };
    let (w, h) = (img.width(), img.height());
    Ok(PreparedImage {
        path: path.to_path_buf(),
        size: (w, h),
        pixels: img.to_rgba8().into_vec(),
    })
}

fn read_exif_orientation(path: &Path) -> Option<u16> {
    let f = fs::File::open(path).ok()?;
    let mut buf = BufReader::new(f);
    let reader = exif::Reader::new().read_from_container(&mut buf).ok()?;
    use exif::{In, Tag, Value};
    let field = reader.get_field(Tag::Orientation, In::PRIMARY)?;
    match &field.value {
        Value::Short(arr) if !arr.is_empty() => Some(arr[0]),
        Value::Long(arr) if !arr.is_empty() => Some(arr[0] as u16),
        _ => Some(1),
    }
}

fn apply_orientation(img: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}
