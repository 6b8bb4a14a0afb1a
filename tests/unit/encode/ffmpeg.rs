use super::*;
use crate::foundation::core::Fps;

fn cfg(width: u32, height: u32, fps: Fps) -> SinkConfig {
    SinkConfig { width, height, fps }
}

#[test]
fn mp4_config_validation_catches_bad_values() {
    assert!(validate_mp4_config(&cfg(0, 10, Fps::default())).is_err());
    assert!(validate_mp4_config(&cfg(11, 10, Fps::default())).is_err());
    assert!(validate_mp4_config(&cfg(10, 10, Fps::new(30000, 1001).unwrap())).is_err());
    assert_eq!(
        validate_mp4_config(&cfg(10, 10, Fps::integer(24).unwrap())).unwrap(),
        24
    );
}

#[test]
fn begin_rejects_odd_sizes_before_spawning() {
    let tmp = tempfile::tempdir().unwrap();
    let mut sink = FfmpegSink::new(tmp.path().join("out.mp4"), [0, 0, 0, 255]);
    let err = sink.begin(cfg(3, 2, Fps::default())).unwrap_err();
    assert!(matches!(err, ShadeError::Validation(_)), "{err}");
}

#[test]
fn no_overwrite_refuses_existing_output() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("exists.mp4");
    std::fs::write(&out, b"x").unwrap();
    let mut sink = FfmpegSink::new(&out, [0, 0, 0, 255]).no_overwrite();
    let err = sink.begin(cfg(2, 2, Fps::default())).unwrap_err();
    assert!(err.to_string().contains("already exists"), "{err}");
}

#[test]
fn flatten_straight_over_black_produces_expected_rgb() {
    let src = vec![255u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_keeps_opaque_pixels_and_shows_background_through_clear_ones() {
    let src = vec![9u8, 8, 7, 255, 50, 60, 70, 0];
    let mut dst = vec![0u8; 8];
    flatten_to_opaque_rgba8(&mut dst, &src, [20, 40, 60, 255]).unwrap();
    assert_eq!(dst, vec![9, 8, 7, 255, 20, 40, 60, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_to_opaque_rgba8(&mut dst, &[0u8; 4], [0, 0, 0, 255]).is_err());
}
