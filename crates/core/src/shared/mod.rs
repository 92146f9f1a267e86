pub mod annotation;
pub mod constants;
pub mod frame;
pub mod identity;
pub mod media_files;
pub mod video_metadata;
