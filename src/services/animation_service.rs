use indicatif::{ProgressBar, ProgressStyle};
use std::ops::Range;
use tracing::{debug, info, warn};

use crate::api::yahoo::YahooClient;
use crate::models::{ChartRequest, FrameSpec, OverlayLayout, PriceSeries, RenderedVideo, FRAME_RATE};
use crate::services::chart_service::{self, FrameRenderer, PlottersRenderer};
use crate::services::price_service;
use crate::services::video_service::{self, FfmpegEncoder, VideoEncoder};
use crate::utils::config::Config;
use crate::utils::errors::GeneratorError;

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

fn write_frames<R, E>(
    renderer: &R,
    series: &PriceSeries,
    frames: Range<usize>,
    overlays: &OverlayLayout,
    encoder: &mut E,
    progress: &ProgressBar,
) -> Result<usize, GeneratorError>
where
    R: FrameRenderer,
    E: VideoEncoder,
{
    let (width, height) = renderer.dimensions();
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    let points = series.points();

    let mut written = 0;
    for index in frames {
        let visible = points.get(..=index).ok_or_else(|| {
            GeneratorError::Render(format!("Frame {} is past the end of the series", index))
        })?;
        let frame = FrameSpec {
            index,
            visible,
            overlays,
        };
        renderer.render(&frame, &mut buffer)?;
        encoder.write_frame(&buffer)?;
        written += 1;
        progress.inc(1);
    }
    encoder.finish()?;
    Ok(written)
}

/// Render `frames` of `series` and feed them to `encoder`.
///
/// Frame `i` shows points `0..=i`. Any failure aborts the encoder so no
/// truncated video is left behind. Returns the number of frames written.
pub fn render_video<R, E>(
    renderer: &R,
    series: &PriceSeries,
    frames: Range<usize>,
    overlays: &OverlayLayout,
    encoder: &mut E,
    progress: &ProgressBar,
) -> Result<usize, GeneratorError>
where
    R: FrameRenderer,
    E: VideoEncoder,
{
    let result = write_frames(renderer, series, frames, overlays, encoder, progress);
    if let Err(e) = &result {
        warn!("Aborting export: {}", e);
        encoder.abort();
    }
    result
}

/// Run the whole pipeline for one request: fetch, render, encode.
pub async fn generate(request: ChartRequest, config: &Config) -> Result<RenderedVideo, GeneratorError> {
    let client = YahooClient::with_base_url(config.provider_url.clone(), config.timeout)
        .map_err(|e| GeneratorError::DataUnavailable(e.to_string()))?;

    let series = price_service::fetch_series(&client, &request).await?;
    let sampled = series.sampled(request.skip_days);
    debug!(
        "Sampled {} of {} points (skip_days = {})",
        sampled.len(),
        series.len(),
        request.skip_days
    );

    let layout = chart_service::build_layout(&request, &sampled)?;
    let path = video_service::output_path(&request);
    video_service::check_overwrite(&path, request.force)?;

    let first_date = sampled.points()[0].date;
    let renderer = PlottersRenderer::new(layout, first_date);
    let frames = chart_service::frame_range(sampled.len(), request.cut_initial_frames);
    let frame_total = frames.len();
    let (width, height) = renderer.dimensions();

    info!(
        "🎨 Rendering {} frames ({}x{}) to {}",
        frame_total,
        width,
        height,
        path.display()
    );

    let mut encoder = FfmpegEncoder::spawn(&config.ffmpeg_path, &path, width, height, FRAME_RATE)?;
    let progress = progress_bar(frame_total);
    let written = render_video(
        &renderer,
        &sampled,
        frames,
        &renderer.layout().overlays,
        &mut encoder,
        &progress,
    );
    progress.finish_and_clear();
    let frame_count = written?;

    Ok(RenderedVideo {
        path,
        frame_count,
        fps: FRAME_RATE,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetClass, PricePoint};
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Records what each frame was asked to show
    struct RecordingRenderer {
        size: (u32, u32),
        seen: RefCell<Vec<(usize, usize, *const OverlayLayout)>>,
        fail_at: Option<usize>,
    }

    impl RecordingRenderer {
        fn new() -> Self {
            Self {
                size: (4, 2),
                seen: RefCell::new(Vec::new()),
                fail_at: None,
            }
        }
    }

    impl FrameRenderer for RecordingRenderer {
        fn dimensions(&self) -> (u32, u32) {
            self.size
        }

        fn render(&self, frame: &FrameSpec<'_>, buffer: &mut [u8]) -> Result<(), GeneratorError> {
            if self.fail_at == Some(frame.index) {
                return Err(GeneratorError::Render("boom".to_string()));
            }
            buffer.fill(frame.visible.len() as u8);
            self.seen.borrow_mut().push((
                frame.index,
                frame.visible.len(),
                frame.overlays as *const OverlayLayout,
            ));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryEncoder {
        frames: Vec<Vec<u8>>,
        finished: bool,
        aborted: bool,
        fail_after: Option<usize>,
    }

    impl VideoEncoder for MemoryEncoder {
        fn write_frame(&mut self, rgb: &[u8]) -> Result<(), GeneratorError> {
            if self.fail_after == Some(self.frames.len()) {
                return Err(GeneratorError::Export("broken pipe".to_string()));
            }
            self.frames.push(rgb.to_vec());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), GeneratorError> {
            self.finished = true;
            Ok(())
        }

        fn abort(&mut self) {
            self.aborted = true;
            self.frames.clear();
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(len: usize) -> PriceSeries {
        PriceSeries::from_points(
            (0..len)
                .map(|i| PricePoint {
                    date: day(2023, 1, 1) + chrono::Duration::days(i as i64),
                    close: 100.0 + i as f64,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_one_frame_per_sampled_point() {
        let data = series(40).sampled(1);
        let renderer = RecordingRenderer::new();
        let mut encoder = MemoryEncoder::default();
        let overlays = OverlayLayout::default();

        let written = render_video(
            &renderer,
            &data,
            chart_service::frame_range(data.len(), false),
            &overlays,
            &mut encoder,
            &ProgressBar::hidden(),
        )
        .unwrap();

        assert_eq!(written, 20);
        assert_eq!(encoder.frames.len(), 20);
        assert!(encoder.finished);
        let visible: Vec<usize> = renderer.seen.borrow().iter().map(|s| s.1).collect();
        assert_eq!(visible, (1..=20).collect::<Vec<_>>());
        assert_eq!(encoder.frames[19], vec![20u8; 4 * 2 * 3]);
    }

    #[test]
    fn test_cut_initial_frames_keeps_prefix_from_start() {
        let data = series(30);
        let renderer = RecordingRenderer::new();
        let mut encoder = MemoryEncoder::default();

        let written = render_video(
            &renderer,
            &data,
            chart_service::frame_range(data.len(), true),
            &OverlayLayout::default(),
            &mut encoder,
            &ProgressBar::hidden(),
        )
        .unwrap();

        assert_eq!(written, 27);
        let seen = renderer.seen.borrow();
        assert_eq!(seen[0].0, 3);
        assert_eq!(seen[0].1, 4);
    }

    #[test]
    fn test_overlays_are_shared_by_every_frame() {
        let mut req = ChartRequest::with_defaults("AAPL", AssetClass::Stock, day(2023, 1, 1), day(2023, 3, 1));
        req.watermark_text = Some("DRAFT".to_string());
        let overlays = chart_service::build_overlays(&req);
        let data = series(12);
        let renderer = RecordingRenderer::new();
        let mut encoder = MemoryEncoder::default();

        render_video(
            &renderer,
            &data,
            0..data.len(),
            &overlays,
            &mut encoder,
            &ProgressBar::hidden(),
        )
        .unwrap();

        let expected = &overlays as *const OverlayLayout;
        assert!(renderer.seen.borrow().iter().all(|s| s.2 == expected));
        let mark = overlays.watermark.as_ref().unwrap();
        assert_eq!((mark.overlay.x, mark.overlay.y, mark.alpha), (0.5, 0.5, 0.5));
    }

    #[test]
    fn test_render_failure_aborts_encoder() {
        let data = series(10);
        let mut renderer = RecordingRenderer::new();
        renderer.fail_at = Some(4);
        let mut encoder = MemoryEncoder::default();

        let err = render_video(
            &renderer,
            &data,
            0..data.len(),
            &OverlayLayout::default(),
            &mut encoder,
            &ProgressBar::hidden(),
        )
        .unwrap_err();

        assert!(matches!(err, GeneratorError::Render(_)));
        assert!(encoder.aborted);
        assert!(!encoder.finished);
        assert!(encoder.frames.is_empty());
    }

    #[test]
    fn test_encoder_failure_is_export_error() {
        let data = series(10);
        let renderer = RecordingRenderer::new();
        let mut encoder = MemoryEncoder {
            fail_after: Some(2),
            ..Default::default()
        };

        let err = render_video(
            &renderer,
            &data,
            0..data.len(),
            &OverlayLayout::default(),
            &mut encoder,
            &ProgressBar::hidden(),
        )
        .unwrap_err();

        assert!(matches!(err, GeneratorError::Export(_)));
        assert!(encoder.aborted);
    }

    #[test]
    fn test_rendered_video_duration_at_thirty_fps() {
        let video = RenderedVideo {
            path: "clip.mp4".into(),
            frame_count: 250,
            fps: FRAME_RATE,
            width: 720,
            height: 1200,
        };
        assert!((video.duration_secs() - 250.0 / 30.0).abs() < 1e-9);
    }

    fn config_for(url: String) -> Config {
        Config {
            provider_url: url,
            ffmpeg_path: "/nonexistent/ffmpeg-binary".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_zero_length_range_produces_no_video() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = ChartRequest::with_defaults("AAPL", AssetClass::Stock, day(2024, 1, 1), day(2024, 1, 1));
        req.output_dir = dir.path().to_path_buf();

        let err = generate(req.clone(), &config_for("http://127.0.0.1:9".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, GeneratorError::DataUnavailable(_)));
        assert!(!video_service::output_path(&req).exists());
    }

    #[tokio::test]
    async fn test_single_point_series_is_render_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"chart": {"result": [{"meta": {"gmtoffset": 0}, "timestamp": [1672704000],
                    "indicators": {"quote": [{"close": [125.07]}]}}], "error": null}}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut req = ChartRequest::with_defaults("AAPL", AssetClass::Stock, day(2023, 1, 1), day(2023, 1, 10));
        req.output_dir = dir.path().to_path_buf();

        let err = generate(req.clone(), &config_for(server.url())).await.unwrap_err();
        assert!(matches!(err, GeneratorError::Render(_)));
        assert!(!video_service::output_path(&req).exists());
    }

    #[tokio::test]
    async fn test_existing_output_is_not_overwritten() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"chart": {"result": [{"meta": {"gmtoffset": 0}, "timestamp": [1672704000, 1672790400],
                    "indicators": {"quote": [{"close": [125.07, 126.36]}]}}], "error": null}}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut req = ChartRequest::with_defaults("AAPL", AssetClass::Stock, day(2023, 1, 1), day(2023, 1, 10));
        req.output_dir = dir.path().to_path_buf();
        let path = video_service::output_path(&req);
        std::fs::write(&path, b"keep me").unwrap();

        let err = generate(req, &config_for(server.url())).await.unwrap_err();
        assert!(matches!(err, GeneratorError::Export(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn test_missing_encoder_leaves_no_file() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v8/finance/chart/AAPL")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"chart": {"result": [{"meta": {"gmtoffset": 0}, "timestamp": [1672704000, 1672790400],
                    "indicators": {"quote": [{"close": [125.07, 126.36]}]}}], "error": null}}"#,
            )
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut req = ChartRequest::with_defaults("AAPL", AssetClass::Stock, day(2023, 1, 1), day(2023, 1, 10));
        req.output_dir = dir.path().to_path_buf();

        let err = generate(req.clone(), &config_for(server.url())).await.unwrap_err();
        assert!(matches!(err, GeneratorError::Export(_)));
        assert!(!video_service::output_path(&req).exists());
    }
}
