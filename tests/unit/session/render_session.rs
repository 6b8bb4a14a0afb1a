use super::*;
use crate::encode::sink::InMemorySink;

fn fixture_sources() -> ChannelSources {
    ChannelSources::new(
        "(x*y+frame)%255",
        "(y*y+frame)%255",
        "(x*x/(frame+1))%255",
        "255",
    )
}

fn fixture_job(frames: u64) -> ShaderJob {
    ShaderJob::new(4, 4, frames, fixture_sources())
}

#[test]
fn compiled_session_renders_single_frames() {
    let session = compile_session(&fixture_job(3), RenderThreading::default()).unwrap();
    assert_eq!(session.state(), &SessionState::Compiled);
    let f = session.render_frame(FrameIndex(0)).unwrap();
    assert_eq!(f.pixel(2, 3), Some([6, 9, 4, 255]));
    assert!(session.render_frame(FrameIndex(3)).is_err());
}

#[test]
fn render_range_streams_in_order_and_finishes() {
    let mut session = compile_session(&fixture_job(8), RenderThreading::default()).unwrap();
    let mut sink = InMemorySink::new();
    let stats = session.render_all(&mut sink).unwrap();

    assert_eq!(session.state(), &SessionState::Done);
    assert_eq!(
        stats,
        RenderStats {
            frames_total: 8,
            frames_rendered: 8,
            frames_elided: 0,
        }
    );
    for (i, (idx, _)) in sink.frames.iter().enumerate() {
        assert_eq!(idx.0, i as u64);
    }
    assert_ne!(sink.frames[0].1.data, sink.frames[1].1.data);
}

#[test]
fn parallel_session_matches_sequential_session() {
    let job = fixture_job(6);
    let mut seq = compile_session(&job, RenderThreading::default()).unwrap();
    let mut par = compile_session(
        &job,
        RenderThreading {
            parallel: true,
            chunk_size: 4,
            threads: Some(2),
            static_frame_elision: true,
        },
    )
    .unwrap();

    let mut a = InMemorySink::new();
    let mut b = InMemorySink::new();
    seq.render_all(&mut a).unwrap();
    par.render_all(&mut b).unwrap();
    assert_eq!(a.frames, b.frames);
    assert_eq!(
        seq.render_frame(FrameIndex(5)).unwrap(),
        par.render_frame(FrameIndex(5)).unwrap()
    );
}

#[test]
fn compile_failure_is_terminal() {
    let mut session = RenderSession::uncompiled(
        ChannelSources::new("x", "y", "z", "255"),
        Canvas::new(2, 2).unwrap(),
        1,
        RenderSessionOpts::default(),
    )
    .unwrap();
    assert_eq!(session.state(), &SessionState::Uncompiled);
    assert!(session.render_frame(FrameIndex(0)).is_err());

    let err = session.compile().unwrap_err();
    assert!(matches!(err, ShadeError::UndefinedVariable { .. }), "{err}");
    assert!(matches!(session.state(), SessionState::Failed(msg) if msg.contains("`z`")));
    assert!(session.compile().is_err());
    assert!(session.render_frame(FrameIndex(0)).is_err());
    assert!(session.program().is_none());
}

#[test]
fn compile_session_surfaces_formula_and_job_errors() {
    let mut job = fixture_job(1);
    job.channels.g = "y +".to_owned();
    let err = compile_session(&job, RenderThreading::default()).unwrap_err();
    assert!(err.is_formula_error(), "{err}");

    let job = fixture_job(0);
    let err = compile_session(&job, RenderThreading::default()).unwrap_err();
    assert!(matches!(err, ShadeError::Validation(_)), "{err}");
}

#[test]
fn range_outside_the_sequence_is_rejected() {
    let mut session = compile_session(&fixture_job(2), RenderThreading::default()).unwrap();
    let mut sink = InMemorySink::new();
    assert!(session.render_range(FrameRange::first(3), &mut sink).is_err());
    assert!(session.render_range(FrameRange::first(0), &mut sink).is_err());
    assert_eq!(session.state(), &SessionState::Compiled);
}

struct FailAt(u64);

impl FrameSink for FailAt {
    fn begin(&mut self, _cfg: SinkConfig) -> ShadeResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> ShadeResult<()> {
        if idx.0 == self.0 {
            return Err(ShadeError::evaluation("sink closed"));
        }
        Ok(())
    }

    fn end(&mut self) -> ShadeResult<()> {
        Ok(())
    }
}

#[test]
fn failed_range_leaves_session_reusable() {
    let mut session = compile_session(&fixture_job(4), RenderThreading::default()).unwrap();
    assert!(session.render_all(&mut FailAt(2)).is_err());
    assert_eq!(session.state(), &SessionState::Compiled);

    let mut sink = InMemorySink::new();
    session.render_all(&mut sink).unwrap();
    assert_eq!(sink.frames.len(), 4);
}

#[test]
fn progress_tracks_the_next_frame() {
    let mut state = SessionState::Compiled;
    let mut inner = InMemorySink::new();
    let mut p = Progress {
        inner: &mut inner,
        state: &mut state,
    };
    p.begin(SinkConfig {
        width: 4,
        height: 4,
        fps: Fps::default(),
    })
    .unwrap();
    let frame = FrameRGBA::blank(Canvas::new(4, 4).unwrap());
    p.push_frame(FrameIndex(0), &frame).unwrap();
    p.push_frame(FrameIndex(1), &frame).unwrap();
    assert_eq!(state, SessionState::Rendering(FrameIndex(2)));
}
