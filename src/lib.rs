//! # bmp_lsb 库
//!
//! 本库包含 BMP 最低有效位隐写工具的核心逻辑。

// 声明库包含的所有模块。

pub mod capacity;
pub mod cli;
pub mod constants;
pub mod engine;
pub mod error;
pub mod handler;
pub mod header;
pub mod steganography;

pub use engine::{decode, encode};
pub use error::{Status, StegError, status_message};
