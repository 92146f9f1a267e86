pub mod analyse_directory_use_case;
pub mod annotate_video_use_case;
pub mod cancellation;
pub mod chunker;
pub mod enroll_identities_use_case;
pub mod error;
pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod reassembler;
pub mod result_set;
pub mod run_report;
