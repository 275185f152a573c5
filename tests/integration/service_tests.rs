//! End-to-end service tests over scan directories on disk.
//!
//! Tests verify:
//! - Metadata queries report dimensions, spacing, origin, range and slice sizes
//! - Slices decode as grayscale JPEGs of the expected size
//! - Windowing saturates below and above the window
//! - Index, axis and scan-id errors are reported as validation / not-found

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;

use ct_slicer::{
    CtService, ErrorResponse, LocalScanStore, ScanLoader, SliceAxis, SliceRequest, VolumeCache,
    VolumeError,
};

use super::test_utils::{
    create_scan, i16_le_bytes, is_valid_jpeg, ramp_i16, write_zip, MetaImageSpec,
};

type Service = CtService<ScanLoader<LocalScanStore>>;

fn service(root: &Path) -> Service {
    CtService::new(VolumeCache::new(ScanLoader::new(LocalScanStore::new(root))))
}

fn decode_gray(data: &[u8]) -> image::GrayImage {
    ImageReader::with_format(Cursor::new(data), image::ImageFormat::Jpeg)
        .decode()
        .unwrap()
        .to_luma8()
}

/// Two axial planes: z = 0 all -1000 HU, z = 1 all +1000 HU.
fn write_two_plane_scan(root: &Path, scan_id: &str) {
    let dir = create_scan(root, scan_id);
    let dims = [16, 8, 2];
    let values: Vec<i16> = (0..16 * 8 * 2)
        .map(|i| if i < 16 * 8 { -1000 } else { 1000 })
        .collect();
    MetaImageSpec::new(dims).write(&dir, "ct_original_phantom", &i16_le_bytes(&values));
}

#[tokio::test]
async fn test_volume_info_from_metaimage_scan() {
    let root = tempfile::tempdir().unwrap();
    let dir = create_scan(root.path(), "scan-001");
    let dims = [12, 10, 6];
    let spec = MetaImageSpec::new(dims).compressed();
    spec.write(&dir, "ct_original_chest", &i16_le_bytes(&ramp_i16(dims)));

    let info = service(root.path()).volume_info("scan-001").await.unwrap();

    assert_eq!(info.scan_id, "scan-001");
    assert_eq!(info.dimensions, dims);
    assert_eq!(info.spacing, spec.spacing);
    assert_eq!(info.origin, spec.origin);
    assert_eq!((info.min_value, info.max_value), (0.0, 11.0 + 90.0 + 500.0));
    assert_eq!(info.slice_sizes.axial, [12, 10]);
    assert_eq!(info.slice_sizes.sagittal, [10, 6]);
    assert_eq!(info.slice_sizes.coronal, [12, 6]);
}

#[tokio::test]
async fn test_slice_dimensions_per_axis() {
    let root = tempfile::tempdir().unwrap();
    let dir = create_scan(root.path(), "scan-001");
    let dims = [12, 10, 6];
    MetaImageSpec::new(dims).write(&dir, "ct_original_chest", &i16_le_bytes(&ramp_i16(dims)));

    let service = service(root.path());
    for (axis, expected) in [
        (SliceAxis::Axial, (12, 10)),
        (SliceAxis::Sagittal, (10, 6)),
        (SliceAxis::Coronal, (12, 6)),
    ] {
        let response = service
            .render_slice(&SliceRequest::new("scan-001", axis, 0))
            .await
            .unwrap();

        assert!(is_valid_jpeg(&response.data));
        assert_eq!((response.width, response.height), expected);
        assert_eq!(decode_gray(&response.data).dimensions(), expected);
    }

    assert_eq!(service.cache().loader().store().root(), root.path());
    assert_eq!(service.cache().cached_count().await, 1);
}

#[tokio::test]
async fn test_window_saturation() {
    let root = tempfile::tempdir().unwrap();
    write_two_plane_scan(root.path(), "phantom");
    let service = service(root.path());

    let dark = service
        .render_slice(&SliceRequest::new("phantom", SliceAxis::Axial, 0))
        .await
        .unwrap();
    let bright = service
        .render_slice(&SliceRequest::new("phantom", SliceAxis::Axial, 1))
        .await
        .unwrap();

    assert!(decode_gray(&dark.data).pixels().all(|p| p.0[0] <= 3));
    assert!(decode_gray(&bright.data).pixels().all(|p| p.0[0] >= 252));
}

#[tokio::test]
async fn test_wide_window_maps_to_midrange() {
    let root = tempfile::tempdir().unwrap();
    write_two_plane_scan(root.path(), "phantom");
    let service = service(root.path());

    // lo = -2000, hi = 2000: -1000 HU sits a quarter of the way up
    let request = SliceRequest::from_params("phantom", "axial", 0, Some(0.0), Some(4000.0)).unwrap();
    let response = service.render_slice(&request).await.unwrap();

    assert!(decode_gray(&response.data)
        .pixels()
        .all(|p| (61..=67).contains(&p.0[0])));
}

#[tokio::test]
async fn test_zero_width_window_is_binary() {
    let root = tempfile::tempdir().unwrap();
    write_two_plane_scan(root.path(), "phantom");
    let service = service(root.path());

    let request = SliceRequest::from_params("phantom", "coronal", 3, Some(0.0), Some(0.0)).unwrap();
    let response = service.render_slice(&request).await.unwrap();
    let image = decode_gray(&response.data);

    // Coronal rows follow z: row 0 is below the threshold, row 1 above
    assert_eq!(image.dimensions(), (16, 2));
    assert!(image.get_pixel(8, 0).0[0] < 64);
    assert!(image.get_pixel(8, 1).0[0] > 191);
}

#[tokio::test]
async fn test_axial_index_at_extent_rejected() {
    let root = tempfile::tempdir().unwrap();
    write_two_plane_scan(root.path(), "phantom");

    let err = service(root.path())
        .render_slice(&SliceRequest::new("phantom", SliceAxis::Axial, 2))
        .await
        .unwrap_err();

    assert!(matches!(err, VolumeError::Validation { .. }));
    assert!(err.to_string().contains("[0, 1]"));
}

#[test]
fn test_unknown_axis_rejected() {
    let err = SliceRequest::from_params("phantom", "transverse", 0, None, None).unwrap_err();
    let body = ErrorResponse::from(&err);

    assert_eq!(body.error, "validation_error");
    assert_eq!(
        body.message,
        "Unknown axis 'transverse'. Use axial, sagittal, or coronal."
    );
}

#[tokio::test]
async fn test_missing_scan_and_missing_file() {
    let root = tempfile::tempdir().unwrap();
    let dir = create_scan(root.path(), "empty-scan");
    std::fs::write(dir.join("metadata.json"), b"{}").unwrap();
    let service = service(root.path());

    let err = service.volume_info("no-such-scan").await.unwrap_err();
    assert_eq!(err.to_string(), "Scan not found");

    let err = service.volume_info("empty-scan").await.unwrap_err();
    assert_eq!(err.to_string(), "CT file not found");
    assert_eq!(ErrorResponse::from(&err).error, "not_found");
}

#[tokio::test]
async fn test_scan_id_traversal_rejected() {
    let root = tempfile::tempdir().unwrap();
    let err = service(root.path())
        .volume_info("../outside")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "validation_error");
}

#[tokio::test]
async fn test_zip_scan_end_to_end() {
    let root = tempfile::tempdir().unwrap();
    let dir = create_scan(root.path(), "zipped");
    let dims = [8, 6, 4];
    let entries = MetaImageSpec::new(dims).zip_entries(
        "dicom_export/",
        "volume",
        &i16_le_bytes(&ramp_i16(dims)),
    );
    write_zip(&dir.join("ct_original_upload.zip"), &entries);

    let service = service(root.path());
    let info = service.volume_info("zipped").await.unwrap();
    assert_eq!(info.dimensions, dims);

    let response = service
        .render_slice(&SliceRequest::new("zipped", SliceAxis::Sagittal, 7))
        .await
        .unwrap();
    assert_eq!((response.width, response.height), (6, 4));
    assert_eq!(response.content_type, "image/jpeg");
    assert_eq!(response.cache_control, "public, max-age=3600");
}

#[tokio::test]
async fn test_corrupt_payload_reported_as_validation() {
    let root = tempfile::tempdir().unwrap();
    let dir = create_scan(root.path(), "corrupt");
    let dims = [4, 4, 4];
    MetaImageSpec::new(dims).write(&dir, "ct_original_scan", &[0u8; 100]);

    let err = service(root.path())
        .volume_info("corrupt")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "validation_error");
    assert!(err.to_string().contains("data too small"));
}
