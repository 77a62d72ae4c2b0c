use crate::detection::domain::smile_result::SmileSummary;
use crate::jobs::domain::job_runner::{JobRunner, JobTask};
use crate::pipeline::process_video_use_case::ProcessVideoUseCase;
use crate::shared::video_metadata::percent;

/// Runs a job through the video pipeline, writing the annotated output.
pub struct VideoJobRunner {
    use_case: ProcessVideoUseCase,
}

impl VideoJobRunner {
    pub fn new(use_case: ProcessVideoUseCase) -> Self {
        Self { use_case }
    }
}

impl JobRunner for VideoJobRunner {
    fn run(
        &mut self,
        task: &JobTask,
        progress: &mut dyn FnMut(u8),
    ) -> Result<SmileSummary, Box<dyn std::error::Error>> {
        let mut last_reported = None;
        let results = self.use_case.process(
            &task.input_path,
            Some(&task.output_path),
            |frame_index, total_frames, _, _| {
                let p = percent(frame_index + 1, total_frames);
                if last_reported != Some(p) {
                    last_reported = Some(p);
                    progress(p);
                }
                true
            },
        )?;

        let summary = SmileSummary::from_results(&results);
        log::info!(
            "Job {}: {} frame(s), {} face(s), mean smile {:.2}",
            task.id,
            summary.frames_processed,
            summary.faces_detected,
            summary.mean_smile_probability
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::infrastructure::overlay_annotator::OverlayAnnotator;
    use crate::pipeline::analyze_frame_use_case::tests::{
        colour_frame, StubDetector, StubPredictor,
    };
    use crate::pipeline::analyze_frame_use_case::FrameAnalyzer;
    use crate::shared::face_region::FaceRegion;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::video_writer::VideoWriter;
    use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
    use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;
    use approx::assert_relative_eq;
    use std::path::Path;

    fn write_source(path: &Path, frames: usize) {
        let meta = VideoMetadata {
            width: 200,
            height: 200,
            fps: 25.0,
            total_frames: frames,
            codec: String::new(),
            source_path: None,
        };
        let mut writer = FfmpegWriter::new();
        writer.open(path, &meta).unwrap();
        for i in 0..frames {
            writer.write(&colour_frame(i)).unwrap();
        }
        writer.close().unwrap();
    }

    fn runner() -> VideoJobRunner {
        let analyzer = FrameAnalyzer::new(
            Box::new(StubDetector::new(vec![FaceRegion::new(20, 40, 120, 120)])),
            None,
            Box::new(StubPredictor::with_ratio_four()),
            Box::new(OverlayAnnotator::new().unwrap()),
        );
        VideoJobRunner::new(ProcessVideoUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            analyzer,
        ))
    }

    #[test]
    fn test_run_writes_output_and_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let task = JobTask {
            id: "job-1".to_string(),
            input_path: dir.path().join("in.mp4"),
            output_path: dir.path().join("in_processed.mp4"),
        };
        write_source(&task.input_path, 4);

        let mut reported = Vec::new();
        let summary = runner()
            .run(&task, &mut |p| reported.push(p))
            .unwrap();

        assert!(task.output_path.exists());
        assert_eq!(reported, vec![25, 50, 75, 100]);
        assert_eq!(summary.frames_processed, 4);
        assert_eq!(summary.faces_detected, 4);
        assert_relative_eq!(summary.mean_smile_probability, 2.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_input_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let task = JobTask {
            id: "job-2".to_string(),
            input_path: dir.path().join("missing.mp4"),
            output_path: dir.path().join("out.mp4"),
        };

        let err = runner().run(&task, &mut |_| {}).unwrap_err();
        assert!(err.to_string().contains("missing.mp4"));
    }
}
