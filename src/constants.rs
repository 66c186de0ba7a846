/// BMP 文件头的签名字节 ("BM")。
pub const BMP_SIGNATURE: [u8; 2] = *b"BM";

/// 像素数据偏移量 (bfOffBits) 在文件中的位置，4 字节小端序。
pub const PIXEL_OFFSET_FIELD: u64 = 10;

/// 每像素位数 (biBitCount) 在文件中的位置，2 字节小端序。
pub const BITS_PER_PIXEL_FIELD: u64 = 28;

/// 压缩方式 (biCompression) 在文件中的位置，4 字节小端序。
pub const COMPRESSION_FIELD: u64 = 30;

/// 唯一支持的像素位深。
pub const SUPPORTED_BITS_PER_PIXEL: u16 = 24;

/// BI_RGB，即不压缩。
pub const COMPRESSION_NONE: u32 = 0;

/// 隐写载荷长度字段所占的字节数。
/// 长度以 `u32` 小端序存储，每个字节再展开为 8 个像素字节的最低位。
pub const LENGTH_FIELD_BYTES: u64 = 4;

/// 每个隐藏字节占用的像素字节数 (每个像素字节只携带 1 bit)。
pub const BITS_PER_BYTE: u64 = 8;

/// 未指定输出路径时，隐写图像文件名的前缀。
pub const DOCTORED_PREFIX: &str = "doctored_";

/// 未指定输出路径时，恢复文件名的前缀。
pub const RECOVERED_PREFIX: &str = "recovered_";
