use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::smile_result::{FrameResult, SmileResult};
use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::analyze_frame_use_case::FrameAnalyzer;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot open video source {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("cannot open video output {path}: {reason}")]
    SinkUnavailable { path: PathBuf, reason: String },
    #[error("processing failed at frame {frame_index}: {reason}")]
    Processing { frame_index: usize, reason: String },
}

/// Streams a video through the frame analyzer.
///
/// Frames are read, analyzed and written strictly in source order on the
/// calling thread. The reader, writer and analyzer are reused across
/// calls, so one instance can serve many videos sequentially.
pub struct ProcessVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    analyzer: FrameAnalyzer,
}

impl ProcessVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        analyzer: FrameAnalyzer,
    ) -> Self {
        Self {
            reader,
            writer,
            analyzer,
        }
    }

    /// Processes every frame of `input`.
    pub fn process_all(
        &mut self,
        input: &Path,
        output: Option<&Path>,
    ) -> Result<Vec<FrameResult>, PipelineError> {
        self.process(input, output, |_, _, _, _| true)
    }

    /// Processes `input`, writing annotated frames to `output` when given.
    ///
    /// `on_frame` runs after each frame has been recorded and written, with
    /// `(frame_index, total_frames, annotated_frame, results)`. Returning
    /// `false` stops processing; no further frames are read.
    pub fn process<F>(
        &mut self,
        input: &Path,
        output: Option<&Path>,
        mut on_frame: F,
    ) -> Result<Vec<FrameResult>, PipelineError>
    where
        F: FnMut(usize, usize, &Frame, &[SmileResult]) -> bool,
    {
        let metadata = self
            .reader
            .open(input)
            .map_err(|e| PipelineError::SourceUnavailable {
                path: input.to_path_buf(),
                reason: e.to_string(),
            })?;
        log::info!(
            "Processing {} ({}x{} @ {:.2} fps, {} frames)",
            input.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames
        );

        if let Some(path) = output {
            if let Err(e) = self.writer.open(path, &metadata) {
                self.reader.close();
                return Err(PipelineError::SinkUnavailable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }

        let mut results: Vec<FrameResult> = Vec::new();
        let mut failure: Option<PipelineError> = None;

        for (frame_index, frame) in self.reader.frames().enumerate() {
            let processing = |reason: String| PipelineError::Processing {
                frame_index,
                reason,
            };

            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    failure = Some(processing(format!("decode: {e}")));
                    break;
                }
            };
            let (annotated, faces) = match self.analyzer.analyze(&frame) {
                Ok(analyzed) => analyzed,
                Err(e) => {
                    failure = Some(processing(format!("analysis: {e}")));
                    break;
                }
            };

            if output.is_some() {
                if let Err(e) = self.writer.write(&annotated) {
                    failure = Some(processing(format!("write: {e}")));
                    break;
                }
            }

            let keep_going = on_frame(frame_index, metadata.total_frames, &annotated, &faces);
            results.push(FrameResult {
                frame_index,
                results: faces,
            });
            if !keep_going {
                log::info!("Stopped by caller after frame {frame_index}");
                break;
            }
        }

        self.reader.close();
        if output.is_some() {
            if let Err(e) = self.writer.close() {
                if failure.is_none() {
                    failure = Some(PipelineError::Processing {
                        frame_index: results.len(),
                        reason: format!("finalize output: {e}"),
                    });
                }
            }
        }

        match failure {
            Some(e) => {
                log::error!("{e}");
                Err(e)
            }
            None => {
                log::info!("Processed {} frame(s) from {}", results.len(), input.display());
                Ok(results)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::infrastructure::overlay_annotator::OverlayAnnotator;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::pipeline::analyze_frame_use_case::tests::{
        colour_frame, StubDetector, StubPredictor,
    };
    use crate::shared::face_region::FaceRegion;
    use crate::shared::video_metadata::VideoMetadata;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Frame>,
        fail_open: bool,
        pulled: Arc<AtomicUsize>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn with_frames(count: usize) -> Self {
            Self {
                frames: (0..count).map(colour_frame).collect(),
                fail_open: false,
                pulled: Arc::new(AtomicUsize::new(0)),
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("no such file".into());
            }
            Ok(VideoMetadata {
                width: 200,
                height: 200,
                fps: 30.0,
                total_frames: self.frames.len(),
                codec: "stub".to_string(),
                source_path: None,
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            let pulled = self.pulled.clone();
            Box::new(self.frames.drain(..).map(move |f| {
                pulled.fetch_add(1, Ordering::SeqCst);
                Ok(f)
            }))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct StubWriter {
        fail_open: bool,
        opened: Arc<Mutex<Option<VideoMetadata>>>,
        written: Arc<Mutex<Vec<Frame>>>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubWriter {
        fn new() -> Self {
            Self {
                fail_open: false,
                opened: Arc::new(Mutex::new(None)),
                written: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoWriter for StubWriter {
        fn open(
            &mut self,
            _path: &Path,
            metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("read-only file system".into());
            }
            *self.opened.lock().unwrap() = Some(metadata.clone());
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    fn one_face_analyzer() -> FrameAnalyzer {
        FrameAnalyzer::new(
            Box::new(StubDetector::new(vec![FaceRegion::new(20, 40, 120, 120)])),
            None,
            Box::new(StubPredictor::with_ratio_four()),
            Box::new(OverlayAnnotator::new().unwrap()),
        )
    }

    fn use_case(reader: StubReader, writer: StubWriter) -> ProcessVideoUseCase {
        ProcessVideoUseCase::new(Box::new(reader), Box::new(writer), one_face_analyzer())
    }

    // --- Tests ---

    #[test]
    fn test_ten_frames_one_face_each() {
        let mut uc = use_case(StubReader::with_frames(10), StubWriter::new());

        let results = uc.process_all(Path::new("in.mp4"), None).unwrap();

        assert_eq!(results.len(), 10);
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.frame_index, i);
            assert_eq!(r.results.len(), 1);
            assert_relative_eq!(r.results[0].smile_probability, 0.667, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_stop_at_one_of_three_records_two() {
        let reader = StubReader::with_frames(3);
        let pulled = reader.pulled.clone();
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let mut uc = use_case(reader, writer);

        let results = uc
            .process(Path::new("in.mp4"), Some(Path::new("out.mp4")), |i, _, _, _| i != 1)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].frame_index, 1);
        assert_eq!(written.lock().unwrap().len(), 2);
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stop_at_k_reads_no_further_frames() {
        for k in 0..5 {
            let reader = StubReader::with_frames(5);
            let pulled = reader.pulled.clone();
            let mut uc = use_case(reader, StubWriter::new());

            let results = uc
                .process(Path::new("in.mp4"), None, |i, _, _, _| i != k)
                .unwrap();

            assert_eq!(results.len(), k + 1);
            assert_eq!(pulled.load(Ordering::SeqCst), k + 1);
        }
    }

    #[test]
    fn test_callback_sees_annotated_frame_and_totals() {
        let mut seen: Vec<(usize, usize, usize)> = Vec::new();
        let mut uc = use_case(StubReader::with_frames(3), StubWriter::new());

        uc.process(Path::new("in.mp4"), None, |i, total, frame, faces| {
            assert_ne!(*frame, colour_frame(i));
            seen.push((i, total, faces.len()));
            true
        })
        .unwrap();

        assert_eq!(seen, vec![(0, 3, 1), (1, 3, 1), (2, 3, 1)]);
    }

    #[test]
    fn test_callback_faces_match_recorded_results() {
        let mut seen = Vec::new();
        let mut uc = use_case(StubReader::with_frames(3), StubWriter::new());

        let results = uc
            .process(Path::new("in.mp4"), None, |_, _, _, faces| {
                seen.push(faces.to_vec());
                true
            })
            .unwrap();

        let recorded: Vec<_> = results.into_iter().map(|r| r.results).collect();
        assert_eq!(seen, recorded);
    }

    #[test]
    fn test_frames_written_in_order_with_source_metadata() {
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let opened = writer.opened.clone();
        let closed = writer.closed.clone();
        let mut uc = use_case(StubReader::with_frames(4), writer);

        uc.process_all(Path::new("in.mp4"), Some(Path::new("out.mp4")))
            .unwrap();

        let indices: Vec<usize> = written.lock().unwrap().iter().map(|f| f.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        let meta = opened.lock().unwrap().clone().unwrap();
        assert_eq!((meta.width, meta.height), (200, 200));
        assert_relative_eq!(meta.fps, 30.0);
        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn test_no_output_never_touches_writer() {
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let opened = writer.opened.clone();
        let mut uc = use_case(StubReader::with_frames(2), writer);

        uc.process_all(Path::new("in.mp4"), None).unwrap();

        assert!(written.lock().unwrap().is_empty());
        assert!(opened.lock().unwrap().is_none());
    }

    #[test]
    fn test_reader_closed_after_run() {
        let reader = StubReader::with_frames(2);
        let closed = reader.closed.clone();
        let mut uc = use_case(reader, StubWriter::new());

        uc.process_all(Path::new("in.mp4"), None).unwrap();

        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn test_unopenable_source_is_source_unavailable() {
        let mut reader = StubReader::with_frames(2);
        reader.fail_open = true;
        let mut uc = use_case(reader, StubWriter::new());

        let err = uc.process_all(Path::new("missing.mp4"), None).unwrap_err();

        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
        assert!(err.to_string().contains("missing.mp4"));
    }

    #[test]
    fn test_unopenable_sink_is_sink_unavailable() {
        let reader = StubReader::with_frames(2);
        let reader_closed = reader.closed.clone();
        let mut writer = StubWriter::new();
        writer.fail_open = true;
        let mut uc = use_case(reader, writer);

        let err = uc
            .process_all(Path::new("in.mp4"), Some(Path::new("/ro/out.mp4")))
            .unwrap_err();

        assert!(matches!(err, PipelineError::SinkUnavailable { .. }));
        assert!(*reader_closed.lock().unwrap());
    }

    #[test]
    fn test_detector_failure_is_processing_error() {
        struct Broken;
        impl FaceDetector for Broken {
            fn detect(
                &mut self,
                _frame: &Frame,
            ) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
                Err("session crashed".into())
            }
        }

        let analyzer = FrameAnalyzer::new(
            Box::new(Broken),
            None,
            Box::new(StubPredictor::with_ratio_four()),
            Box::new(OverlayAnnotator::new().unwrap()),
        );
        let writer = StubWriter::new();
        let closed = writer.closed.clone();
        let mut uc = ProcessVideoUseCase::new(
            Box::new(StubReader::with_frames(3)),
            Box::new(writer),
            analyzer,
        );

        let err = uc
            .process_all(Path::new("in.mp4"), Some(Path::new("out.mp4")))
            .unwrap_err();

        assert!(matches!(err, PipelineError::Processing { frame_index: 0, .. }));
        assert!(err.to_string().contains("session crashed"));
        assert!(*closed.lock().unwrap());
    }

    #[test]
    fn test_empty_source_yields_no_records() {
        let mut uc = use_case(StubReader::with_frames(0), StubWriter::new());
        assert!(uc.process_all(Path::new("in.mp4"), None).unwrap().is_empty());
    }

    #[test]
    fn test_ffmpeg_round_trip_keeps_geometry() {
        use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
        use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");

        let meta = VideoMetadata {
            width: 200,
            height: 200,
            fps: 25.0,
            total_frames: 0,
            codec: String::new(),
            source_path: None,
        };
        let mut source = FfmpegWriter::new();
        source.open(&input, &meta).unwrap();
        for i in 0..4 {
            source.write(&colour_frame(i)).unwrap();
        }
        source.close().unwrap();

        let mut uc = ProcessVideoUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            one_face_analyzer(),
        );
        let results = uc.process_all(&input, Some(&output)).unwrap();
        assert_eq!(results.len(), 4);

        let mut check = FfmpegReader::new();
        let out_meta = check.open(&output).unwrap();
        assert_eq!((out_meta.width, out_meta.height), (200, 200));
        assert!((out_meta.fps - 25.0).abs() < 0.01);
        assert_eq!(check.frames().count(), 4);
    }
}
