pub mod contact;
pub mod study_block;

pub use contact::UserContact;
pub use study_block::{NewStudyBlock, StudyBlock};
