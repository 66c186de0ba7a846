//! # LSB 隐写核心模块
//!
//! 底层是对单个像素字节最低位的写入与读取；其上按字节 (高位在前) 组织，
//! 再往上是 `[长度: u32 小端序][载荷]` 形式的隐写帧。

use crate::constants::{BITS_PER_BYTE, LENGTH_FIELD_BYTES};
use std::io::{self, Read, Write};

const BITS: usize = BITS_PER_BYTE as usize;
const CHUNK_SIZE: usize = 8 * 1024;

/// 把 `bit` 写入 `carrier` 的最低位，其余 7 位保持不变。
pub fn embed_bit(carrier: u8, bit: u8) -> u8 {
    (carrier & 0xFE) | (bit & 1)
}

/// 读取 `carrier` 的最低位。
pub fn extract_bit(carrier: u8) -> u8 {
    carrier & 1
}

/// 从 `carrier` 读取 8 个字节，把 `byte` 的各位从高到低写入它们的最低位，再写到 `out`。
///
/// 载体提前结束时返回 `ErrorKind::UnexpectedEof`。
pub fn embed_byte<R: Read, W: Write>(carrier: &mut R, out: &mut W, byte: u8) -> io::Result<()> {
    let mut pix = [0u8; BITS];
    carrier.read_exact(&mut pix)?;
    for (i, p) in pix.iter_mut().enumerate() {
        *p = embed_bit(*p, byte >> (BITS - 1 - i));
    }
    out.write_all(&pix)
}

/// 从 `carrier` 读取 8 个字节，按高位在前重新组装出一个字节。
pub fn extract_byte<R: Read>(carrier: &mut R) -> io::Result<u8> {
    let mut pix = [0u8; BITS];
    carrier.read_exact(&mut pix)?;
    Ok(pix.iter().fold(0u8, |acc, &p| (acc << 1) | extract_bit(p)))
}

/// 嵌入完整的隐写帧：先是 4 字节小端序长度，然后从 `payload` 读取恰好 `len` 个字节。
///
/// 共消耗 `8 * (4 + len)` 个载体字节。`payload` 不足 `len` 字节时返回 `UnexpectedEof`。
pub fn embed_frame<R, P, W>(
    carrier: &mut R,
    payload: &mut P,
    len: u32,
    out: &mut W,
) -> io::Result<()>
where
    R: Read,
    P: Read,
    W: Write,
{
    for byte in len.to_le_bytes() {
        embed_byte(carrier, out, byte)?;
    }

    let mut buf = [0u8; CHUNK_SIZE];
    let mut remaining = u64::from(len);
    while remaining > 0 {
        let n = remaining.min(CHUNK_SIZE as u64) as usize;
        payload.read_exact(&mut buf[..n])?;
        buf[..n]
            .iter()
            .try_for_each(|&byte| embed_byte(carrier, out, byte))?;
        remaining -= n as u64;
    }
    Ok(())
}

/// 读取隐写帧开头的长度字段。
///
/// 得到的值未经校验，调用方必须先确认载体容量足够再继续读取载荷。
pub fn extract_length<R: Read>(carrier: &mut R) -> io::Result<u32> {
    let mut len = [0u8; LENGTH_FIELD_BYTES as usize];
    for byte in len.iter_mut() {
        *byte = extract_byte(carrier)?;
    }
    Ok(u32::from_le_bytes(len))
}

/// 提取 `len` 个载荷字节，并在提取过程中逐块写入 `out`。
pub fn extract_payload<R: Read, W: Write>(
    carrier: &mut R,
    len: u32,
    out: &mut W,
) -> io::Result<()> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut remaining = u64::from(len);
    while remaining > 0 {
        let n = remaining.min(CHUNK_SIZE as u64) as usize;
        for byte in buf[..n].iter_mut() {
            *byte = extract_byte(carrier)?;
        }
        out.write_all(&buf[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}
