use hdrv_io::exr::ExrWriter;
use hdrv_io::hdr::HdrWriter;
use hdrv_io::pfm::PfmWriter;
use hdrv_io::{FormatWriter, Image, IoError, Layer, PixelFormat, load, load_from_memory, store};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

fn byte_image() -> Image {
    Image::single(2, 2, 3, PixelFormat::Byte, vec![10; 12]).unwrap()
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.exr");
    let err = load(&path).unwrap_err();
    assert!(matches!(err, IoError::NotFound(_)));
    assert_eq!(
        err.to_string(),
        format!("File {} does not exist.", path.display())
    );
}

#[test]
fn ldr_sources_normalize_channels() {
    let dir = tempfile::tempdir().unwrap();

    let rgb = dir.path().join("rgb.png");
    DynamicImage::ImageRgb8(RgbImage::new(4, 3))
        .save_with_format(&rgb, ImageFormat::Png)
        .unwrap();
    let image = load(&rgb).unwrap();
    assert_eq!(image.channels(0), 3);
    assert_eq!(image.data(0).len(), 4 * 3 * 3);

    let rgba = dir.path().join("rgba.png");
    DynamicImage::ImageRgba8(RgbaImage::new(4, 3))
        .save_with_format(&rgba, ImageFormat::Png)
        .unwrap();
    let image = load(&rgba).unwrap();
    assert_eq!(image.channels(0), 4);
    assert_eq!(image.data(0).len(), 4 * 3 * 4);
    assert_eq!(image.size_in_bytes(0), image.data(0).len());
}

#[test]
fn magic_bytes_win_over_extension() {
    let dir = tempfile::tempdir().unwrap();
    let image = Image::new(1, 1, vec![Layer::single_floats(1, &[0.5]).unwrap()]).unwrap();
    let pfm = dir.path().join("real.pfm");
    store(&pfm, &image, 0).unwrap();

    let disguised = dir.path().join("disguised.png");
    std::fs::copy(&pfm, &disguised).unwrap();
    assert_eq!(load(&disguised).unwrap(), image);
}

#[test]
fn unsupported_radiance_variant_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("xyz.hdr");
    std::fs::write(
        &path,
        b"#?RADIANCE\nFORMAT=32-bit_rle_xyze\n\n-Y 1 +X 1\n\x80\x80\x80\x81",
    )
    .unwrap();
    let err = load(&path).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Radiance PIC loader: format '32-bit_rle_xyze' not supported"
    );

    let path = dir.path().join("flipped.hdr");
    std::fs::write(&path, b"#?RADIANCE\n\n+Y 1 +X 1\n\x80\x80\x80\x81").unwrap();
    let err = load(&path).unwrap_err();
    assert!(err.to_string().contains("'+Y +X'"));
}

#[test]
fn byte_layer_store_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let image = byte_image();
    for name in ["out.pfm", "out.hdr", "out.exr"] {
        let path = dir.path().join(name);
        let err = store(&path, &image, 0).unwrap_err();
        assert!(
            err.to_string().ends_with("Cannot store LDR image as HDR image."),
            "{}: {}",
            name,
            err
        );
        assert!(!path.exists(), "{} was created", name);
    }
}

#[test]
fn failed_store_keeps_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keep.hdr");
    std::fs::write(&path, b"previous").unwrap();
    assert!(store(&path, &byte_image(), 0).is_err());
    assert_eq!(std::fs::read(&path).unwrap(), b"previous");
}

#[test]
fn layer_out_of_range_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    assert!(store(&path, &byte_image(), 1).is_err());
    assert!(!path.exists());
}

#[test]
fn unknown_store_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.xyz");
    assert!(matches!(
        store(&path, &byte_image(), 0),
        Err(IoError::UnsupportedFormat(ext)) if ext == "xyz"
    ));
}

#[test]
fn memory_dispatch() {
    let layer = Layer::single_floats(3, &[1.0, 0.5, 0.25]).unwrap();
    let image = Image::new(1, 1, vec![layer]).unwrap();

    let bytes = HdrWriter::new().write_to_memory(&image, 0).unwrap();
    assert_eq!(load_from_memory(&bytes).unwrap(), image);

    let bytes = PfmWriter::new().write_to_memory(&image, 0).unwrap();
    assert_eq!(load_from_memory(&bytes).unwrap(), image);

    let bytes = ExrWriter::new().write_to_memory(&image, 0).unwrap();
    let loaded = load_from_memory(&bytes).unwrap();
    assert_eq!(loaded.texel(0, 0, 0), [1.0, 0.5, 0.25, 1.0]);
}

#[test]
fn unrecognized_memory_is_an_error() {
    assert!(load_from_memory(b"not an image").is_err());
}

#[test]
fn ppm_extension_stores_float_map() {
    let dir = tempfile::tempdir().unwrap();
    let layer = Layer::single_floats(3, &[0.1, 0.2, 0.3]).unwrap();
    let image = Image::new(1, 1, vec![layer]).unwrap();

    let path = dir.path().join("float.ppm");
    store(&path, &image, 0).unwrap();
    assert!(std::fs::read(&path).unwrap().starts_with(b"PF\n"));
    assert_eq!(load(&path).unwrap(), image);
}

#[test]
fn binary_ppm_still_loads_as_8_bit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixels.ppm");
    std::fs::write(&path, b"P6\n2 1\n255\n\x01\x02\x03\x04\x05\x06").unwrap();

    let image = load(&path).unwrap();
    assert_eq!(image.format(0), PixelFormat::Byte);
    assert_eq!(image.texel(1, 0, 0), [4.0, 5.0, 6.0, 0.0]);
}
