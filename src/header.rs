//! # BMP 头部校验模块
//!
//! 只读取隐写所需的最少几个头部字段，并确认载体是 24 位、无压缩的 BMP。

use crate::constants::{
    BITS_PER_PIXEL_FIELD, BMP_SIGNATURE, COMPRESSION_FIELD, COMPRESSION_NONE, PIXEL_OFFSET_FIELD,
    SUPPORTED_BITS_PER_PIXEL,
};
use crate::error::{Result, StegError};
use log::debug;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

/// 从载体头部得到的只读信息，仅在一次操作内有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierInfo {
    pub pixel_data_offset: u32,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub total_file_size: u64,
}

impl CarrierInfo {
    /// 像素数据的字节数，每个字节可以携带 1 bit。
    pub fn available_bytes(&self) -> u64 {
        self.total_file_size.saturating_sub(u64::from(self.pixel_data_offset))
    }
}

fn read_at<R: Read + Seek, const N: usize>(reader: &mut R, offset: u64) -> io::Result<[u8; N]> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// 头部太短视为格式错误，其余 I/O 失败原样上报。
fn truncated(e: io::Error) -> StegError {
    if e.kind() == ErrorKind::UnexpectedEof {
        StegError::Format("file is too short to hold a BMP header".into())
    } else {
        StegError::Io(e)
    }
}

/// 解析并校验载体头部。
///
/// 读取位置会被移动，调用方在继续使用 `reader` 之前需要自行定位。
///
/// # Errors
///
/// * 签名不是 `BM`、位深不是 24、存在压缩，或像素偏移不在 `(0, 文件大小)` 内时返回 `StegError::Format`。
/// * 底层读取或定位失败时返回 `StegError::Io`。
pub fn read_carrier_info<R: Read + Seek>(reader: &mut R) -> Result<CarrierInfo> {
    let signature: [u8; 2] = read_at(reader, 0).map_err(truncated)?;
    if signature != BMP_SIGNATURE {
        return Err(StegError::Format("missing 'BM' signature".into()));
    }

    let pixel_data_offset =
        u32::from_le_bytes(read_at(reader, PIXEL_OFFSET_FIELD).map_err(truncated)?);
    let bits_per_pixel =
        u16::from_le_bytes(read_at(reader, BITS_PER_PIXEL_FIELD).map_err(truncated)?);
    let compression = u32::from_le_bytes(read_at(reader, COMPRESSION_FIELD).map_err(truncated)?);
    let total_file_size = reader.seek(SeekFrom::End(0))?;

    let info = CarrierInfo {
        pixel_data_offset,
        bits_per_pixel,
        compression,
        total_file_size,
    };

    if bits_per_pixel != SUPPORTED_BITS_PER_PIXEL {
        return Err(StegError::Format(format!(
            "{bits_per_pixel} bits per pixel, only {SUPPORTED_BITS_PER_PIXEL} is supported"
        )));
    }
    if compression != COMPRESSION_NONE {
        return Err(StegError::Format(format!(
            "compression method {compression}, only uncompressed images are supported"
        )));
    }
    if pixel_data_offset == 0 || u64::from(pixel_data_offset) >= total_file_size {
        return Err(StegError::Format(format!(
            "pixel data offset {pixel_data_offset} outside of file of {total_file_size} bytes"
        )));
    }

    debug!("validated carrier header: {info:?}");
    Ok(info)
}
