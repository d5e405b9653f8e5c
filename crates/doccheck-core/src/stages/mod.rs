//! Checking stages
//!
//! - [`ParsingStage`]: read the file, build both trees, whitespace scan
//! - [`FrontMatterStage`]: validate the header, strip it from the working tree
//! - [`TitleStage`]: require an H1 with a description paragraph
//! - [`SectionsStage`]: required level-2 sections, their order and descriptions
//! - [`LineLengthStage`]: configured line length limit

pub mod front_matter;
pub mod line_length;
pub mod parsing;
pub mod sections;
pub mod title;

pub use front_matter::FrontMatterStage;
pub use line_length::LineLengthStage;
pub use parsing::ParsingStage;
pub use sections::SectionsStage;
pub use title::TitleStage;

/// Stage names, also used to declare dependencies
pub mod names {
    pub const PARSING: &str = "parsing";
    pub const FRONT_MATTER: &str = "front_matter";
    pub const TITLE: &str = "title";
    pub const SECTIONS: &str = "sections";
    pub const LINE_LENGTH: &str = "line_length";
}
