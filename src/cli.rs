//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义。

use clap::Parser;
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位无压缩 BMP 图像中隐藏或恢复任意文件。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，用于在 24 位无压缩 BMP 图像中隐藏或恢复任意文件。"
)]
pub struct Cli {
    /// 输出调试日志 (也可通过 RUST_LOG 环境变量控制)。
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：hide (隐藏)、recover (恢复) 和 inspect (查看容量)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 在 24 位 BMP 图像中隐藏文件内容。
    #[command(alias = "encode")]
    Hide(HideArgs),

    /// 从经过隐写的 BMP 图像中恢复隐藏的内容。
    #[command(alias = "decode")]
    Recover(RecoverArgs),

    /// 查看 BMP 图像的像素数据大小及可隐藏的最大字节数。
    Inspect(InspectArgs),
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用于隐写的输入 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 要隐藏的文件路径，内容按原始字节处理。
    #[arg(short, long)]
    pub text: PathBuf,

    /// 结果图像的输出路径。默认为输入图像同目录下的 `doctored_<文件名>`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// 输出文件已存在时直接覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 已隐藏数据的图像文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    /// 恢复内容的输出路径。默认为输入图像同目录下的 `recovered_<文件名>.txt`。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 输出文件已存在时直接覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'inspect' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// 要查看的 BMP 图像路径。
    #[arg(short, long)]
    pub image: PathBuf,
}
