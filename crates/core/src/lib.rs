//! Face, landmark and smile analysis for video files.
//!
//! Layers follow a domain / infrastructure split: `domain` modules hold
//! the traits and pure logic, `infrastructure` modules bind them to
//! ONNX Runtime, ffmpeg and the file system.

pub mod shared {
    pub mod constants;
    pub mod face_region;
    pub mod frame;
    pub mod model_resolver;
    pub mod video_metadata;
}

pub mod detection {
    pub mod domain {
        pub mod face_detector;
        pub mod face_landmarks;
        pub mod landmark_predictor;
        pub mod smile_result;
        pub mod smile_scorer;
    }
    pub mod infrastructure;
}

pub mod annotation {
    pub mod domain {
        pub mod frame_annotator;
    }
    pub mod infrastructure {
        pub mod overlay_annotator;
    }
}

pub mod video {
    pub mod domain {
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure {
        pub mod ffmpeg_reader;
        pub mod ffmpeg_writer;
    }
}

pub mod pipeline {
    pub mod analyze_frame_use_case;
    pub mod process_video_use_case;
    pub mod infrastructure {
        pub mod analyzer_factory;
    }
}

pub mod jobs {
    pub mod domain {
        pub mod job;
        pub mod job_runner;
        pub mod job_store;
    }
    pub mod infrastructure {
        pub mod in_memory_job_store;
        pub mod video_job_runner;
        pub mod worker_pool;
    }
}
