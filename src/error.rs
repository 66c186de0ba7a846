//! # 错误类型模块
//!
//! 定义库内部使用的 `StegError`，以及面向调用方的离散结果码 `Status`。

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StegError>;

#[derive(Error, Debug)]
pub enum StegError {
    /// 无法打开或创建所需的文件。
    #[error("Unable to open or create file: {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 载体不是受支持的 24 位无压缩 BMP。
    #[error("Unsupported BMP format: {0}")]
    Format(String),

    /// 载体的像素数据不足以容纳所需的比特。
    #[error("Not enough capacity: need {required_bits} bits, have {available_bytes} bytes")]
    Capacity {
        required_bits: u64,
        available_bytes: u64,
    },

    /// 处理过程中的读写失败，包括数据流提前结束。
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl StegError {
    pub fn status(&self) -> Status {
        match self {
            StegError::Open { .. } => Status::OpenError,
            StegError::Format(_) => Status::FormatError,
            StegError::Capacity { .. } => Status::CapacityError,
            StegError::Io(_) => Status::IoError,
        }
    }
}

/// 一次编码或解码操作的最终结果码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    OpenError,
    FormatError,
    CapacityError,
    IoError,
}

impl Status {
    pub fn message(self) -> &'static str {
        status_message(self)
    }
}

impl<T> From<&Result<T>> for Status {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(status_message(*self))
    }
}

/// 将结果码映射为人类可读的描述。
pub fn status_message(status: Status) -> &'static str {
    match status {
        Status::Ok => "OK",
        Status::OpenError => "File open/create error",
        Status::FormatError => "Unsupported BMP format (need 24-bit, uncompressed)",
        Status::CapacityError => "Not enough capacity in image to hide this message",
        Status::IoError => "I/O error while processing",
    }
}
