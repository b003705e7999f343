pub mod colors;
pub mod timeline;
