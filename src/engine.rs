//! # 编解码流程模块
//!
//! 把头部校验、容量检查和隐写帧的嵌入/提取串成完整的编码与解码操作。
//! 路径版本负责打开文件并保证输出的原子性；流版本不涉及文件系统，便于测试。

use crate::capacity::ensure_capacity;
use crate::error::{Result, StegError};
use crate::header::{CarrierInfo, read_carrier_info};
use crate::steganography::{embed_frame, extract_length, extract_payload};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

fn open_error(path: &Path, source: io::Error) -> StegError {
    StegError::Open {
        path: path.to_path_buf(),
        source,
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| open_error(path, source))
}

/// 在开始处理之前确认 `output` 可以作为普通文件写入。
fn check_output(output: &Path, overwrite: bool) -> Result<()> {
    let Ok(meta) = fs::metadata(output) else {
        return Ok(());
    };
    let refused = if !meta.is_file() {
        Some(io::Error::new(
            ErrorKind::IsADirectory,
            "output path is not a regular file",
        ))
    } else if !overwrite {
        Some(io::Error::from(ErrorKind::AlreadyExists))
    } else if meta.permissions().readonly() {
        Some(io::Error::from(ErrorKind::PermissionDenied))
    } else {
        None
    };
    refused.map_or(Ok(()), |source| Err(open_error(output, source)))
}

/// 在输出路径所在目录创建临时文件，成功后再整体替换到目标位置。
fn staging_file(output: &Path) -> Result<NamedTempFile> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    NamedTempFile::new_in(dir).map_err(|source| open_error(output, source))
}

/// 运行 `body` 把结果写入暂存文件，全部成功后才落地到 `output`。
/// 任何失败都会丢弃暂存文件，`output` 保持原状。
///
/// `overwrite` 为 `false` 时，即使目标在处理期间才出现也不会被替换。
fn write_atomically<T>(
    output: &Path,
    overwrite: bool,
    body: impl FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<T>,
) -> Result<T> {
    check_output(output, overwrite)?;
    let mut staged = staging_file(output)?;
    let value = {
        let mut writer = BufWriter::new(&mut staged);
        let value = body(&mut writer)?;
        writer.into_inner().map_err(|e| e.into_error())?;
        value
    };
    staged.as_file().sync_all()?;

    let persisted = if overwrite {
        staged.persist(output)
    } else {
        staged.persist_noclobber(output)
    };
    persisted.map_err(|e| match e.error.kind() {
        ErrorKind::AlreadyExists | ErrorKind::PermissionDenied | ErrorKind::IsADirectory => {
            open_error(output, e.error)
        }
        _ => StegError::Io(e.error),
    })?;
    Ok(value)
}

/// 把 `payload` 隐藏到 `carrier` 中，并将完整的隐写图像写入 `out`。
///
/// 输出与载体逐字节相同，只有前 `8 * (4 + payload_len)` 个像素字节的最低位被替换。
pub fn encode_stream<R, P, W>(
    carrier: &mut R,
    payload: &mut P,
    payload_len: u32,
    out: &mut W,
) -> Result<CarrierInfo>
where
    R: Read + Seek,
    P: Read,
    W: Write,
{
    let info = read_carrier_info(carrier)?;
    ensure_capacity(&info, payload_len)?;

    carrier.seek(SeekFrom::Start(0))?;
    let header_len = u64::from(info.pixel_data_offset);
    let copied = io::copy(&mut carrier.by_ref().take(header_len), out)?;
    if copied != header_len {
        return Err(io::Error::from(ErrorKind::UnexpectedEof).into());
    }

    embed_frame(carrier, payload, payload_len, out)?;
    if payload.read(&mut [0u8; 1])? != 0 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "payload is longer than its declared length",
        )
        .into());
    }
    let tail = io::copy(carrier, out)?;
    debug!("embedded {payload_len} bytes, copied {tail} trailing pixel bytes unchanged");
    Ok(info)
}

/// 从 `carrier` 中提取隐藏的载荷并写入 `out`，返回载荷长度。
///
/// 长度字段来自载体本身，在读取载荷之前会先按载体容量校验。
pub fn decode_stream<R, W>(carrier: &mut R, out: &mut W) -> Result<u32>
where
    R: Read + Seek,
    W: Write,
{
    let info = read_carrier_info(carrier)?;
    carrier.seek(SeekFrom::Start(u64::from(info.pixel_data_offset)))?;

    let payload_len = extract_length(carrier)?;
    debug!("decoded length field: {payload_len}");
    ensure_capacity(&info, payload_len)?;

    extract_payload(carrier, payload_len, out)?;
    Ok(payload_len)
}

/// 将 `payload_path` 的内容隐藏到 `carrier_path` 中，结果写入 `output_path`，已存在时覆盖。
pub fn encode(carrier_path: &Path, output_path: &Path, payload_path: &Path) -> Result<()> {
    encode_to(carrier_path, output_path, payload_path, true)
}

/// 同 [`encode`]，`overwrite` 为 `false` 时拒绝替换已存在的 `output_path`。
///
/// # Errors
///
/// * `StegError::Open` - 无法打开载体、载荷，或输出路径无法作为普通文件创建 (包括不允许覆盖时目标已存在)。
/// * `StegError::Format` - 载体不是 24 位无压缩 BMP。
/// * `StegError::Capacity` - 载体容量不足。
/// * `StegError::Io` - 载荷不是普通文件、超过 `u32::MAX` 字节、实际长度与元数据不符，或读写过程中失败。
///
/// 失败时不会创建或改动 `output_path`。
pub fn encode_to(
    carrier_path: &Path,
    output_path: &Path,
    payload_path: &Path,
    overwrite: bool,
) -> Result<()> {
    let mut carrier = BufReader::new(open(carrier_path)?);
    let payload = open(payload_path)?;

    let meta = payload.metadata()?;
    if !meta.is_file() {
        let e = io::Error::new(ErrorKind::InvalidInput, "payload is not a regular file");
        return Err(e.into());
    }
    let payload_len = u32::try_from(meta.len()).map_err(|_| {
        io::Error::new(
            ErrorKind::InvalidInput,
            "payload is larger than 4294967295 bytes",
        )
    })?;
    let mut payload = BufReader::new(payload);

    let info = write_atomically(output_path, overwrite, |out| {
        encode_stream(&mut carrier, &mut payload, payload_len, out)
    })?;

    info!(
        "hid {} bytes from {} in {} ({} pixel bytes available)",
        payload_len,
        payload_path.display(),
        output_path.display(),
        info.available_bytes()
    );
    Ok(())
}

/// 从 `carrier_path` 中提取隐藏的载荷，写入 `output_path`，已存在时覆盖。
pub fn decode(carrier_path: &Path, output_path: &Path) -> Result<()> {
    decode_to(carrier_path, output_path, true)
}

/// 同 [`decode`]，`overwrite` 为 `false` 时拒绝替换已存在的 `output_path`。
///
/// 失败时不会创建或改动 `output_path`。
pub fn decode_to(carrier_path: &Path, output_path: &Path, overwrite: bool) -> Result<()> {
    let mut carrier = BufReader::new(open(carrier_path)?);

    let payload_len = write_atomically(output_path, overwrite, |out| {
        decode_stream(&mut carrier, out)
    })?;

    info!(
        "recovered {} bytes from {} into {}",
        payload_len,
        carrier_path.display(),
        output_path.display()
    );
    Ok(())
}

/// 读取并校验载体头部，不做任何写入。
pub fn inspect(carrier_path: &Path) -> Result<CarrierInfo> {
    let mut carrier = BufReader::new(open(carrier_path)?);
    read_carrier_info(&mut carrier)
}
