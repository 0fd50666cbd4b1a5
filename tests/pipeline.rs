use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use quietcut::producer::{
    DurationProbe, SceneDetector, SilenceDetector, SpeechDetector, SpeechSegment,
};
use quietcut::{
    AnalysisOpts, AnalysisResult, Analyzer, Error, Producers, Result, SilenceRegion, Stage,
};

struct FakeDuration(std::result::Result<f64, String>);

#[async_trait]
impl DurationProbe for FakeDuration {
    async fn probe_duration(&self, _video: &Path) -> Result<f64> {
        self.0.clone().map_err(Error::Message)
    }
}

struct FakeSpeech(std::result::Result<Vec<SpeechSegment>, String>);

#[async_trait]
impl SpeechDetector for FakeSpeech {
    async fn detect_speech(&self, _video: &Path) -> Result<Vec<SpeechSegment>> {
        self.0.clone().map_err(Error::Message)
    }
}

struct FakeSilence {
    result: std::result::Result<Vec<(f64, f64)>, String>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SilenceDetector for FakeSilence {
    async fn detect_silence(&self, _video: &Path) -> Result<Vec<SilenceRegion>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let pairs = self.result.clone().map_err(Error::Message)?;
        pairs
            .into_iter()
            .map(|(start, end)| SilenceRegion::new(start, end))
            .collect()
    }
}

struct FakeScene(std::result::Result<Vec<f64>, String>);

#[async_trait]
impl SceneDetector for FakeScene {
    async fn detect_scene_cuts(&self, _video: &Path) -> Result<Vec<f64>> {
        self.0.clone().map_err(Error::Message)
    }
}

/// Never finishes within any test budget.
struct Stalled;

#[async_trait]
impl SpeechDetector for Stalled {
    async fn detect_speech(&self, _video: &Path) -> Result<Vec<SpeechSegment>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

#[async_trait]
impl SilenceDetector for Stalled {
    async fn detect_silence(&self, _video: &Path) -> Result<Vec<SilenceRegion>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

fn speech(start: f64, end: f64, text: &str) -> SpeechSegment {
    SpeechSegment {
        start_sec: start,
        end_sec: end,
        text: text.to_owned(),
        confidence: 0.8,
    }
}

struct Setup {
    producers: Producers,
    silence_calls: Arc<AtomicUsize>,
    opts: AnalysisOpts,
}

impl Setup {
    fn new(duration_sec: f64) -> Self {
        let silence_calls = Arc::new(AtomicUsize::new(0));
        let producers = Producers {
            duration: Box::new(FakeDuration(Ok(duration_sec))),
            speech: Box::new(FakeSpeech(Ok(Vec::new()))),
            silence: Box::new(FakeSilence {
                result: Ok(Vec::new()),
                calls: Arc::clone(&silence_calls),
            }),
            scene: Box::new(FakeScene(Ok(Vec::new()))),
        };

        let mut opts = AnalysisOpts::new("work", "models").with_stage_timeout(None);
        opts.speech_timeout = None;

        Self {
            producers,
            silence_calls,
            opts,
        }
    }

    fn speech(mut self, result: std::result::Result<Vec<SpeechSegment>, String>) -> Self {
        self.producers.speech = Box::new(FakeSpeech(result));
        self
    }

    fn silence(mut self, result: std::result::Result<Vec<(f64, f64)>, String>) -> Self {
        self.producers.silence = Box::new(FakeSilence {
            result,
            calls: Arc::clone(&self.silence_calls),
        });
        self
    }

    fn scene(mut self, result: std::result::Result<Vec<f64>, String>) -> Self {
        self.producers.scene = Box::new(FakeScene(result));
        self
    }

    async fn run(self) -> Result<AnalysisResult> {
        Analyzer::with_producers(self.producers, &self.opts)
            .analyze(Path::new("input.mp4"))
            .await
    }
}

fn bounds(result: &AnalysisResult) -> Vec<(f64, f64, f64)> {
    result
        .low_info_regions
        .iter()
        .map(|r| (r.interval.start_sec(), r.interval.end_sec(), r.score))
        .collect()
}

#[tokio::test]
async fn touching_quiet_scenes_coalesce_into_one_region() -> anyhow::Result<()> {
    let result = Setup::new(10.0).scene(Ok(vec![3.0, 7.0])).run().await?;

    assert_eq!(bounds(&result), vec![(0.0, 10.0, 1.0)]);
    assert_eq!(result.scene_cuts_sec, vec![0.0, 3.0, 7.0, 10.0]);
    assert!(result.warnings.is_empty());
    Ok(())
}

#[tokio::test]
async fn silence_inside_speech_survives_when_its_scene_is_dropped() -> anyhow::Result<()> {
    let result = Setup::new(5.0)
        .speech(Ok(vec![speech(1.5, 3.5, "hello there")]))
        .silence(Ok(vec![(2.0, 3.0)]))
        .run()
        .await?;

    assert_eq!(bounds(&result), vec![(2.0, 3.0, 0.675)]);
    assert_eq!(result.speech_regions.len(), 1);
    assert_eq!(result.speech_regions[0].text, "hello there");
    Ok(())
}

#[tokio::test]
async fn silence_failure_is_recorded_and_replaced_with_nothing() -> anyhow::Result<()> {
    let result = Setup::new(10.0)
        .silence(Err("ffmpeg exited with status 1".to_owned()))
        .scene(Ok(vec![3.0, 7.0]))
        .run()
        .await?;

    assert!(result.silence_regions.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].stage, Stage::Silence);
    assert_eq!(result.warnings[0].cause, "ffmpeg exited with status 1");

    let json = serde_json::to_value(&result)?;
    assert_eq!(json["warnings"][0]["stage"], "silence");
    Ok(())
}

#[tokio::test]
async fn scene_failure_falls_back_to_whole_video() -> anyhow::Result<()> {
    let result = Setup::new(12.3456)
        .scene(Err("no video stream".to_owned()))
        .run()
        .await?;

    assert_eq!(result.scene_cuts_sec, vec![0.0, 12.346]);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].stage, Stage::Scene);
    assert_eq!(bounds(&result), vec![(0.0, 12.346, 1.0)]);
    Ok(())
}

#[tokio::test]
async fn empty_scene_result_falls_back_without_warning() -> anyhow::Result<()> {
    let result = Setup::new(10.0).run().await?;

    assert_eq!(result.scene_cuts_sec, vec![0.0, 10.0]);
    assert!(result.warnings.is_empty());
    Ok(())
}

#[tokio::test]
async fn scene_cuts_always_span_the_whole_video() -> anyhow::Result<()> {
    let result = Setup::new(9.9996)
        .scene(Ok(vec![12.0, 4.0, 0.0, 4.0004]))
        .run()
        .await?;

    assert_eq!(result.scene_cuts_sec, vec![0.0, 4.0, 10.0]);
    assert!(result.warnings.is_empty());
    Ok(())
}

#[tokio::test]
async fn speech_failure_is_fatal() {
    let err = Setup::new(10.0)
        .speech(Err("model missing".to_owned()))
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Speech));
    assert_eq!(err.to_string(), "Speech analysis failed: model missing");
}

#[tokio::test]
async fn speech_failure_does_not_wait_for_other_stages() {
    let mut setup = Setup::new(10.0).speech(Err("boom".to_owned()));
    setup.producers.silence = Box::new(Stalled);

    let outcome = tokio::time::timeout(Duration::from_secs(2), setup.run()).await;
    let err = match outcome {
        Ok(Err(err)) => err,
        Ok(Ok(_)) => panic!("speech failure must abort the run"),
        Err(_) => panic!("speech failure waited for the silence stage"),
    };
    assert_eq!(err.to_string(), "Speech analysis failed: boom");
}

#[tokio::test]
async fn duration_failure_is_fatal() {
    let mut setup = Setup::new(10.0);
    setup.producers.duration = Box::new(FakeDuration(Err("ffprobe not found".to_owned())));

    let err = setup.run().await.unwrap_err();
    assert!(matches!(
        err,
        Error::StageFailed {
            stage: Stage::Duration,
            ..
        }
    ));
}

#[tokio::test]
async fn zero_duration_is_rejected() {
    let err = Setup::new(0.0).run().await.unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Duration));
    assert!(err.to_string().contains("non-positive duration"));
}

#[tokio::test]
async fn slow_silence_times_out_into_a_warning() -> anyhow::Result<()> {
    let mut setup = Setup::new(10.0);
    setup.producers.silence = Box::new(Stalled);
    setup.opts.silence_timeout = Some(Duration::from_millis(50));

    let result = setup.run().await?;
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].stage, Stage::Silence);
    assert_eq!(result.warnings[0].cause, "timed out after 50ms");
    Ok(())
}

#[tokio::test]
async fn slow_speech_times_out_fatally() {
    let mut setup = Setup::new(10.0);
    setup.producers.speech = Box::new(Stalled);
    setup.opts.speech_timeout = Some(Duration::from_millis(50));

    let err = setup.run().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Timeout {
            stage: Stage::Speech,
            ..
        }
    ));
}

#[tokio::test]
async fn sequential_mode_stops_after_speech_failure() {
    let mut setup = Setup::new(10.0).speech(Err("decoder crashed".to_owned()));
    setup.opts.sequential = true;
    let calls = Arc::clone(&setup.silence_calls);

    let err = setup.run().await.unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Speech));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sequential_and_concurrent_runs_agree() -> anyhow::Result<()> {
    let build = |sequential: bool| {
        let mut setup = Setup::new(20.0)
            .speech(Ok(vec![speech(8.0, 9.0, "b"), speech(1.0, 4.0, "a")]))
            .silence(Ok(vec![(4.5, 6.0), (15.0, 15.2)]))
            .scene(Ok(vec![5.0, 12.0, 12.0]));
        setup.opts.sequential = sequential;
        setup
    };

    let sequential = build(true).run().await?;
    let concurrent = build(false).run().await?;
    assert_eq!(sequential, concurrent);

    let texts: Vec<&str> = concurrent
        .speech_regions
        .iter()
        .map(|r| r.text.as_str())
        .collect();
    assert_eq!(texts, vec!["a", "b"]);
    assert_eq!(concurrent.scene_cuts_sec, vec![0.0, 5.0, 12.0, 20.0]);
    Ok(())
}

#[tokio::test]
async fn degenerate_speech_segments_are_dropped_silently() -> anyhow::Result<()> {
    let result = Setup::new(10.0)
        .speech(Ok(vec![speech(3.0, 3.0, "blip"), speech(6.0, 5.0, "backwards")]))
        .run()
        .await?;

    assert!(result.speech_regions.is_empty());
    assert!(result.warnings.is_empty());
    Ok(())
}
