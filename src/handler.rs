//! # 命令处理逻辑模块
//!
//! 包含处理 `hide`、`recover` 和 `inspect` 子命令的高级业务逻辑。
//! 本模块负责决定输出路径、防止误覆盖、调用编解码流程以及向用户报告结果。

use crate::capacity::max_payload_len;
use crate::cli::{HideArgs, InspectArgs, RecoverArgs};
use crate::constants::{DOCTORED_PREFIX, RECOVERED_PREFIX};
use crate::engine::{decode_to, encode_to, inspect};
use crate::error::StegError;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// 未指定输出路径时，隐写图像保存为输入图像同目录下的 `doctored_<文件名>`。
pub fn default_hide_dest(image: &Path) -> Result<PathBuf> {
    let name = image.file_name().with_context(|| {
        format!(
            "Image path has no file name: {}",
            image.to_string_lossy().red().bold()
        )
    })?;
    let mut file_name = DOCTORED_PREFIX.to_owned();
    file_name.push_str(&name.to_string_lossy());
    Ok(image.with_file_name(file_name))
}

/// 未指定输出路径时，恢复内容保存为输入图像同目录下的 `recovered_<主文件名>.txt`。
pub fn default_recover_dest(image: &Path) -> Result<PathBuf> {
    let stem = image.file_stem().with_context(|| {
        format!(
            "Image path has no file name: {}",
            image.to_string_lossy().red().bold()
        )
    })?;
    Ok(image.with_file_name(format!(
        "{RECOVERED_PREFIX}{}.txt",
        stem.to_string_lossy()
    )))
}

fn ensure_writable(dest: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !dest.exists(),
        "Output file already exists: {}\nUse --force to overwrite it.",
        dest.to_string_lossy().red().bold()
    );
    Ok(())
}

/// 把库错误转换为带结果码描述的 `anyhow` 错误。
fn report(err: StegError, image: &Path) -> anyhow::Error {
    let status = err.status();
    anyhow::Error::new(err).context(format!(
        "{} ({})",
        status.message().red().bold(),
        image.to_string_lossy()
    ))
}

/// 处理 'Hide' 命令的执行逻辑。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输出文件已存在且未指定 `--force`。
/// * 无法打开图像或载荷文件。
/// * 图像不是 24 位无压缩 BMP。
/// * 图像没有足够的空间来隐藏载荷。
/// * 读写过程中失败。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = match args.dest {
        Some(dest) => dest,
        None => default_hide_dest(&args.image)?,
    };
    ensure_writable(&dest, args.force)?;

    encode_to(&args.image, &dest, &args.text, args.force).map_err(|e| report(e, &args.image))?;

    println!(
        "The data has been successfully hidden and saved: {}",
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输出文件已存在且未指定 `--force`。
/// * 图像无法打开或不是 24 位无压缩 BMP。
/// * 图像中的长度字段超出容量 (通常说明图像中没有隐藏数据)。
/// * 读写过程中失败。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let dest = match args.text {
        Some(dest) => dest,
        None => default_recover_dest(&args.image)?,
    };
    ensure_writable(&dest, args.force)?;

    decode_to(&args.image, &dest, args.force).map_err(|e| report(e, &args.image))?;

    println!(
        "The data has been successfully recovered and saved: {}",
        dest.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Inspect' 命令：打印像素数据位置和可隐藏的最大字节数。
pub fn handle_inspect(args: InspectArgs) -> Result<()> {
    let info = inspect(&args.image).map_err(|e| report(e, &args.image))?;

    println!("Image: {}", args.image.to_string_lossy().green().bold());
    println!("  Pixel data offset: {}", info.pixel_data_offset);
    println!("  Pixel data bytes:  {}", info.available_bytes());
    println!(
        "  Max payload:       {} bytes",
        max_payload_len(&info).to_string().green().bold()
    );
    Ok(())
}
