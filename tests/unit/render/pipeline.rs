use super::*;
use crate::encode::sink::InMemorySink;

fn fixture() -> ChannelProgram {
    ChannelProgram::compile(
        "(x*y+frame)%255",
        "(y*y+frame)%255",
        "(x*x/(frame+1))%255",
        "255",
    )
    .unwrap()
}

fn canvas(w: u32, h: u32) -> Canvas {
    Canvas::new(w, h).unwrap()
}

#[test]
fn render_frame_produces_row_major_rgba() {
    let f = render_frame(&fixture(), canvas(4, 4), FrameIndex(0)).unwrap();
    assert_eq!(f.data.len(), 4 * 4 * 4);
    assert_eq!(f.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(f.pixel(2, 3), Some([6, 9, 4, 255]));
    assert_eq!(f.pixel(4, 0), None);
}

#[test]
fn row_parallel_frame_is_byte_identical() {
    let p = fixture();
    let c = canvas(37, 23);
    for frame in [0, 1, 9] {
        let seq = render_frame(&p, c, FrameIndex(frame)).unwrap();
        let par = render_frame_parallel(&p, c, FrameIndex(frame)).unwrap();
        assert_eq!(seq, par, "frame {frame}");
    }
}

#[test]
fn parallel_range_matches_sequential_range() {
    let p = fixture();
    let c = canvas(16, 9);
    let range = FrameRange::first(7);

    let (seq, seq_stats) = render_frames_with_stats(
        &p,
        c,
        range,
        &RenderThreading {
            parallel: false,
            ..Default::default()
        },
    )
    .unwrap();
    let (par, par_stats) = render_frames_with_stats(
        &p,
        c,
        range,
        &RenderThreading {
            parallel: true,
            chunk_size: 3,
            threads: Some(2),
            static_frame_elision: true,
        },
    )
    .unwrap();

    assert_eq!(seq.len(), 7);
    assert_eq!(seq, par);
    assert_eq!(seq_stats, par_stats);
    assert_eq!(
        seq_stats,
        RenderStats {
            frames_total: 7,
            frames_rendered: 7,
            frames_elided: 0,
        }
    );
}

#[test]
fn frame_invariant_programs_render_once() {
    let p = ChannelProgram::compile("x", "y", "x ^ y", "255").unwrap();
    let c = canvas(8, 8);
    let (frames, stats) =
        render_frames_with_stats(&p, c, FrameRange::first(5), &RenderThreading::default())
            .unwrap();
    assert_eq!(
        stats,
        RenderStats {
            frames_total: 5,
            frames_rendered: 1,
            frames_elided: 4,
        }
    );
    let expected = render_frame(&p, c, FrameIndex(3)).unwrap();
    assert!(frames.iter().all(|f| *f == expected));
}

#[test]
fn elision_can_be_disabled() {
    let p = ChannelProgram::compile("x", "y", "0", "255").unwrap();
    let (_, stats) = render_frames_with_stats(
        &p,
        canvas(2, 2),
        FrameRange::first(3),
        &RenderThreading {
            static_frame_elision: false,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(stats.frames_rendered, 3);
    assert_eq!(stats.frames_elided, 0);
}

#[test]
fn sink_receives_begin_ordered_frames_and_end() {
    let p = fixture();
    let mut sink = InMemorySink::new();
    let range = FrameRange::new(FrameIndex(2), FrameIndex(6)).unwrap();
    render_range_to_sink(
        &p,
        canvas(4, 4),
        Fps::integer(24).unwrap(),
        range,
        &RenderThreading {
            parallel: true,
            chunk_size: 2,
            threads: Some(3),
            static_frame_elision: false,
        },
        &mut sink,
    )
    .unwrap();

    let cfg = sink.config().unwrap();
    assert_eq!((cfg.width, cfg.height, cfg.fps.num), (4, 4, 24));
    assert!(sink.is_ended());
    let idx: Vec<u64> = sink.frames.iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, vec![2, 3, 4, 5]);
    assert_eq!(sink.frames[0].1.pixel(2, 3), Some([8, 11, 1, 255]));
}

struct FailAt {
    fail_at: u64,
    seen: Vec<u64>,
    ended: bool,
}

impl FrameSink for FailAt {
    fn begin(&mut self, _cfg: SinkConfig) -> ShadeResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> ShadeResult<()> {
        if idx.0 == self.fail_at {
            return Err(ShadeError::evaluation("disk full"));
        }
        self.seen.push(idx.0);
        Ok(())
    }

    fn end(&mut self) -> ShadeResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[test]
fn sink_failure_stops_the_range_without_end() {
    let mut sink = FailAt {
        fail_at: 2,
        seen: Vec::new(),
        ended: false,
    };
    let err = render_range_to_sink(
        &fixture(),
        canvas(2, 2),
        Fps::default(),
        FrameRange::first(5),
        &RenderThreading::default(),
        &mut sink,
    )
    .unwrap_err();
    assert!(err.to_string().contains("disk full"), "{err}");
    assert_eq!(sink.seen, vec![0, 1]);
    assert!(!sink.ended);
}

#[test]
fn invalid_requests_are_rejected() {
    let p = fixture();
    assert!(render_frames(&p, canvas(2, 2), FrameRange::first(0)).is_err());
    assert!(
        render_frame(
            &p,
            Canvas {
                width: 0,
                height: 4
            },
            FrameIndex(0)
        )
        .is_err()
    );
    let err = render_frames_with_stats(
        &p,
        canvas(2, 2),
        FrameRange::first(2),
        &RenderThreading {
            parallel: true,
            threads: Some(0),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, ShadeError::Validation(_)), "{err}");
}

#[test]
fn zero_chunk_size_is_treated_as_one() {
    assert_eq!(normalized_chunk_size(0), 1);
    assert_eq!(normalized_chunk_size(16), 16);
}
