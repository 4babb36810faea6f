pub mod contacts;
pub mod study_blocks;
