use super::*;
use crate::foundation::core::Fps;

fn gradient(w: u32, h: u32, seed: u8) -> FrameRGBA {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            data.extend_from_slice(&[x as u8, y as u8, seed, 200]);
        }
    }
    FrameRGBA::from_rgba(w, h, data).unwrap()
}

#[test]
fn frame_paths_are_zero_padded_to_three_digits() {
    let sink = PngSequenceSink::new("out");
    assert_eq!(
        sink.frame_path(FrameIndex(7)),
        Path::new("out").join("frame_007.png")
    );
    assert_eq!(
        sink.frame_path(FrameIndex(1234)),
        Path::new("out").join("frame_1234.png")
    );
}

#[test]
fn writes_decodable_pngs_into_a_new_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("nested").join("seq");
    let mut sink = PngSequenceSink::new(&dir);
    sink.begin(SinkConfig {
        width: 5,
        height: 3,
        fps: Fps::default(),
    })
    .unwrap();
    for i in 0..3u8 {
        sink.push_frame(FrameIndex(u64::from(i)), &gradient(5, 3, i))
            .unwrap();
    }
    sink.end().unwrap();

    assert_eq!(sink.written().len(), 3);
    let decoded = image::open(dir.join("frame_002.png")).unwrap().into_rgba8();
    assert_eq!(decoded.dimensions(), (5, 3));
    assert_eq!(decoded.get_pixel(4, 1).0, [4, 1, 2, 200]);
}

#[test]
fn png_sink_enforces_frame_order() {
    let tmp = tempfile::tempdir().unwrap();
    let mut sink = PngSequenceSink::new(tmp.path());
    sink.begin(SinkConfig {
        width: 2,
        height: 2,
        fps: Fps::default(),
    })
    .unwrap();
    sink.push_frame(FrameIndex(1), &gradient(2, 2, 0)).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &gradient(2, 2, 0)).is_err());
    assert!(!tmp.path().join("frame_000.png").exists());
}
