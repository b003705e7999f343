pub mod leave;
pub mod rooms;
pub mod timeline;
