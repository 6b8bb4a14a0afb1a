use super::*;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::{Canvas, Fps};

fn solid(w: u32, h: u32, px: Pixel) -> FrameRGBA {
    let data = px.repeat((w * h) as usize);
    FrameRGBA::from_rgba(w, h, data).unwrap()
}

#[test]
fn over_pixel_handles_opaque_and_transparent_sources() {
    let dst = [10, 20, 30, 200];
    assert_eq!(over_pixel(dst, [1, 2, 3, 255]), [1, 2, 3, 255]);
    assert_eq!(over_pixel(dst, [1, 2, 3, 0]), dst);
}

#[test]
fn half_transparent_red_over_opaque_blue() {
    assert_eq!(over_pixel([0, 0, 255, 255], [255, 0, 0, 128]), [128, 0, 127, 255]);
}

#[test]
fn opaque_backdrop_always_yields_opaque_output() {
    for a in 0..=255u8 {
        let out = over_pixel([40, 80, 120, 255], [200, 100, 50, a]);
        assert_eq!(out[3], 255, "alpha {a}");
    }
}

#[test]
fn over_transparent_backdrop_keeps_source_color() {
    let out = over_pixel([0, 0, 0, 0], [90, 180, 45, 77]);
    assert_eq!(out, [90, 180, 45, 77]);
}

#[test]
fn alpha_over_requires_matching_sizes() {
    let bd = solid(2, 2, [0, 0, 0, 255]);
    let src = solid(3, 2, [255, 255, 255, 255]);
    assert!(alpha_over(&bd, &src).is_err());

    let src = solid(2, 2, [255, 255, 255, 0]);
    assert_eq!(alpha_over(&bd, &src).unwrap(), bd);
}

#[test]
fn backdrop_sink_composites_before_forwarding() {
    let bd = solid(2, 1, [0, 0, 255, 255]);
    let mut inner = InMemorySink::new();
    {
        let mut sink = BackdropSink::new(bd, &mut inner);
        sink.begin(SinkConfig {
            width: 2,
            height: 1,
            fps: Fps::default(),
        })
        .unwrap();
        sink.push_frame(FrameIndex(0), &solid(2, 1, [255, 0, 0, 128]))
            .unwrap();
        sink.push_frame(FrameIndex(1), &solid(2, 1, [255, 0, 0, 0]))
            .unwrap();
        sink.end().unwrap();
    }
    assert_eq!(inner.frames.len(), 2);
    assert_eq!(inner.frames[0].1.pixel(1, 0), Some([128, 0, 127, 255]));
    assert_eq!(inner.frames[1].1.pixel(0, 0), Some([0, 0, 255, 255]));
}

#[test]
fn backdrop_sink_rejects_mismatched_render_size() {
    let mut sink = BackdropSink::new(solid(4, 4, [0, 0, 0, 255]), InMemorySink::new());
    let err = sink
        .begin(SinkConfig {
            width: 2,
            height: 2,
            fps: Fps::default(),
        })
        .unwrap_err();
    assert!(matches!(err, ShadeError::Validation(_)));
}

#[test]
fn backdrop_round_trips_through_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bd.png");
    let frame = FrameRGBA::from_rgba(2, 2, vec![
        1, 2, 3, 255, 4, 5, 6, 128, 7, 8, 9, 0, 10, 11, 12, 255,
    ])
    .unwrap();
    crate::encode::png::write_png(&path, &frame).unwrap();

    let loaded = load_backdrop(&path).unwrap();
    assert_eq!(loaded.canvas(), Canvas::new(2, 2).unwrap());
    assert_eq!(loaded, frame);
}
