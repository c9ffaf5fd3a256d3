//! Utility modules shared by the render core.

pub mod date;
pub mod html;
pub mod log;
pub mod slug;
pub mod value;
