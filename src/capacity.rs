//! # 容量计算模块
//!
//! 每个像素数据字节只携带 1 bit，隐写帧为 4 字节长度加载荷本身。

use crate::constants::{BITS_PER_BYTE, LENGTH_FIELD_BYTES};
use crate::error::{Result, StegError};
use crate::header::CarrierInfo;

/// 隐藏长度为 `payload_len` 的载荷需要消耗的像素字节数。
pub fn required_bits(payload_len: u32) -> u64 {
    (LENGTH_FIELD_BYTES + u64::from(payload_len)) * BITS_PER_BYTE
}

/// 检查载体能否容纳 `payload_len` 字节的载荷。
///
/// 解码时同样用它来约束从载体中读出的、不可信的长度字段。
pub fn ensure_capacity(info: &CarrierInfo, payload_len: u32) -> Result<()> {
    let required_bits = required_bits(payload_len);
    let available_bytes = info.available_bytes();
    if available_bytes >= required_bits {
        Ok(())
    } else {
        Err(StegError::Capacity {
            required_bits,
            available_bytes,
        })
    }
}

/// 载体最多能隐藏的载荷字节数。
pub fn max_payload_len(info: &CarrierInfo) -> u32 {
    let bytes = (info.available_bytes() / BITS_PER_BYTE).saturating_sub(LENGTH_FIELD_BYTES);
    u32::try_from(bytes).unwrap_or(u32::MAX)
}
