#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use img_fit::encode_jpeg;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Deterministic high-entropy pixels, so encoded size tracks quality.
pub fn noise_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let h = (x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663)).wrapping_mul(2_654_435_761);
        Rgb([(h >> 24) as u8, (h >> 16) as u8, (h >> 8) as u8])
    })
}

pub fn write_jpeg_fixture(path: &Path, width: u32, height: u32, quality: u8) {
    let img = DynamicImage::ImageRgb8(noise_image(width, height));
    let mut file = File::create(path).unwrap();
    encode_jpeg(&img, quality, &mut file).unwrap();
}

pub fn write_png_fixture(path: &Path, width: u32, height: u32) {
    noise_image(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

pub fn write_corrupt_fixture(path: &Path) {
    File::create(path)
        .unwrap()
        .write_all(b"fake jpg data")
        .unwrap();
}

/// A source folder holding two good images, one corrupt one and a text file.
pub fn create_mixed_source_folder(temp_dir: &Path) -> Vec<PathBuf> {
    let good_jpg = temp_dir.join("small.jpg");
    let good_png = temp_dir.join("graphic.png");
    let corrupt = temp_dir.join("broken.jpg");
    let notes = temp_dir.join("notes.txt");

    write_jpeg_fixture(&good_jpg, 64, 48, 90);
    write_png_fixture(&good_png, 80, 60);
    write_corrupt_fixture(&corrupt);
    File::create(&notes)
        .unwrap()
        .write_all(b"not an image")
        .unwrap();

    vec![good_jpg, good_png, corrupt, notes]
}

pub fn create_nested_directory_structure(temp_dir: &Path) -> PathBuf {
    let subdir = temp_dir.join("subdir");
    std::fs::create_dir(&subdir).unwrap();
    write_png_fixture(&subdir.join("nested.png"), 8, 8);
    subdir
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}
