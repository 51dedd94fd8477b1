//! Configuration sources, lowest precedence first: global file, application files,
//! environment.

pub mod app_file;
pub mod global_file;
