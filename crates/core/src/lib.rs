pub mod detection;
pub mod identity;
pub mod pipeline;
pub mod rendering;
pub mod shared;
pub mod video;
