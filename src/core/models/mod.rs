pub mod keyword;
pub mod video;
