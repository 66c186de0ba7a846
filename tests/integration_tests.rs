use bmp_lsb::{
    Status, decode, encode,
    cli::{HideArgs, InspectArgs, RecoverArgs},
    handler::{handle_hide, handle_inspect, handle_recover},
    header::read_carrier_info,
};
use image::{ImageBuffer, Rgb, Rgba};
use rand::RngCore;
use std::fs::{self, File};
use std::path::Path;
use tempfile::tempdir;

/// 一个辅助函数，用于创建一个带有随机像素的 24 位 BMP 测试图像
fn create_test_image(path: &Path, width: u32, height: u32) {
    let mut raw_pixels = vec![0u8; (width * height * 3) as usize];
    rand::rng().fill_bytes(&mut raw_pixels);

    let img_buf: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, raw_pixels).expect("Pixel buffer has the wrong size.");
    img_buf.save(path).expect("Failed to create test image.");
}

fn random_payload(len: usize) -> Vec<u8> {
    let mut payload = vec![0u8; len];
    rand::rng().fill_bytes(&mut payload);
    payload
}

/// 验证生成的测试图像确实是 24 位无压缩 BMP
#[test]
fn test_generated_image_is_supported_carrier() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.bmp");
    create_test_image(&image_path, 16, 16);

    let info = read_carrier_info(&mut File::open(&image_path)?)?;
    assert_eq!(info.bits_per_pixel, 24);
    assert_eq!(info.compression, 0);
    assert_eq!(info.available_bytes(), 16 * 16 * 3);
    Ok(())
}

/// 验证从隐藏到恢复的完整流程
#[test]
fn test_handle_hide_and_recover_integration() -> anyhow::Result<()> {
    // 1. 准备环境
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let hidden_image_path = dir.path().join("hidden.bmp");
    let source_path = dir.path().join("source.bin");
    let recovered_path = dir.path().join("recovered.bin");

    create_test_image(&original_image_path, 100, 100);
    let original_data = random_payload(2048);
    fs::write(&source_path, &original_data)?;

    // 2. 测试 handle_hide
    let hide_args = HideArgs {
        image: original_image_path.clone(),
        text: source_path.clone(),
        dest: Some(hidden_image_path.clone()),
        force: false,
    };
    handle_hide(hide_args)?;
    assert!(hidden_image_path.exists(), "Hidden image should be created.");

    // 3. 测试 handle_recover
    let recover_args = RecoverArgs {
        image: hidden_image_path.clone(),
        text: Some(recovered_path.clone()),
        force: false,
    };
    handle_recover(recover_args)?;

    // 4. 验证结果
    assert_eq!(
        fs::read(&recovered_path)?,
        original_data,
        "Recovered data must match the original."
    );

    // 5. 隐写后的图像仍可正常解码，且每个通道最多相差 1
    let original = image::open(&original_image_path)?.to_rgb8();
    let hidden = image::open(&hidden_image_path)?.to_rgb8();
    assert_eq!(original.dimensions(), hidden.dimensions());
    original
        .as_raw()
        .iter()
        .zip(hidden.as_raw())
        .for_each(|(a, b)| assert!(a.abs_diff(*b) <= 1));

    Ok(())
}

/// 验证头部和帧之外的像素字节保持不变
#[test]
fn test_header_and_tail_preserved() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("original.bmp");
    let hidden_path = dir.path().join("hidden.bmp");
    let payload_path = dir.path().join("payload.bin");

    create_test_image(&image_path, 20, 20);
    fs::write(&payload_path, b"hello")?;
    encode(&image_path, &hidden_path, &payload_path)?;

    let original = fs::read(&image_path)?;
    let hidden = fs::read(&hidden_path)?;
    let offset = read_carrier_info(&mut File::open(&image_path)?)?.pixel_data_offset as usize;
    let frame_end = offset + (4 + 5) * 8;

    assert_eq!(original.len(), hidden.len());
    assert_eq!(&original[..offset], &hidden[..offset]);
    assert_eq!(&original[frame_end..], &hidden[frame_end..]);
    original[offset..frame_end]
        .iter()
        .zip(&hidden[offset..frame_end])
        .for_each(|(a, b)| assert_eq!(a & 0xFE, b & 0xFE));
    Ok(())
}

/// 验证当用户不提供输出路径时，是否能正确生成默认路径并完成操作
#[test]
fn test_handle_hide_and_recover_with_defaults() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let original_image_path = dir.path().join("original.bmp");
    let source_text_path = dir.path().join("source.txt");

    create_test_image(&original_image_path, 100, 100);
    let original_text = "Testing default path generation. 测试默认路径生成。";
    fs::write(&source_text_path, original_text)?;

    handle_hide(HideArgs {
        image: original_image_path.clone(),
        text: source_text_path.clone(),
        dest: None,
        force: false,
    })?;

    let expected_hidden_path = dir.path().join("doctored_original.bmp");
    assert!(
        expected_hidden_path.exists(),
        "Default hidden image should be created at: {:?}",
        expected_hidden_path
    );

    handle_recover(RecoverArgs {
        image: expected_hidden_path,
        text: None,
        force: false,
    })?;

    let expected_recovered_path = dir.path().join("recovered_doctored_original.txt");
    assert_eq!(fs::read_to_string(&expected_recovered_path)?, original_text);
    Ok(())
}

/// 验证覆盖保护机制以及 `--force` 标志是否按预期工作
#[test]
fn test_overwrite_protection_and_force_flag() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("image.bmp");
    let text_path = dir.path().join("text.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 50, 50);
    fs::write(&text_path, "some text")?;
    fs::write(&dest_path, "this is a dummy file to be overwritten")?;

    let result = handle_hide(HideArgs {
        image: image_path.clone(),
        text: text_path.clone(),
        dest: Some(dest_path.clone()),
        force: false,
    });
    assert!(
        result.is_err(),
        "Execution should fail without --force when file exists."
    );
    if let Err(e) = result {
        assert!(e.to_string().contains("Output file already exists"));
    }
    assert_eq!(fs::read(&dest_path)?, b"this is a dummy file to be overwritten");

    handle_hide(HideArgs {
        image: image_path,
        text: text_path,
        dest: Some(dest_path.clone()),
        force: true,
    })?;
    assert_ne!(fs::read(&dest_path)?, b"this is a dummy file to be overwritten");
    Ok(())
}

/// 验证空间不足时的错误处理，且失败时不会留下输出文件
#[test]
fn test_handle_hide_not_enough_space() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("small.bmp");
    let text_path = dir.path().join("large.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 10, 10);
    fs::write(&text_path, "a".repeat(5000))?;

    let result = handle_hide(HideArgs {
        image: image_path.clone(),
        text: text_path.clone(),
        dest: Some(dest_path.clone()),
        force: false,
    });
    assert!(result.is_err());
    if let Err(e) = result {
        assert!(e.to_string().contains("Not enough capacity"));
    }
    assert!(!dest_path.exists(), "A failed encode must not leave an output file.");
    assert_eq!(
        Status::from(&encode(&image_path, &dest_path, &text_path)),
        Status::CapacityError
    );
    Ok(())
}

/// 验证失败的编码不会改动已存在的输出文件
#[test]
fn test_failed_encode_keeps_existing_output() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("small.bmp");
    let text_path = dir.path().join("large.txt");
    let dest_path = dir.path().join("dest.bmp");

    create_test_image(&image_path, 4, 4);
    fs::write(&text_path, [0u8; 64])?;
    fs::write(&dest_path, b"keep me")?;

    let result = encode(&image_path, &dest_path, &text_path);
    assert_eq!(Status::from(&result), Status::CapacityError);
    assert_eq!(fs::read(&dest_path)?, b"keep me");
    Ok(())
}

/// 验证容量恰好够用与差一个字节的边界
#[test]
fn test_capacity_boundary() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.bmp");
    let payload_path = dir.path().join("payload.bin");
    let dest_path = dir.path().join("dest.bmp");

    // 16x16x3 = 768 像素字节，(4 + 92) * 8 = 768
    create_test_image(&image_path, 16, 16);

    fs::write(&payload_path, random_payload(92))?;
    assert_eq!(
        Status::from(&encode(&image_path, &dest_path, &payload_path)),
        Status::Ok
    );

    fs::write(&payload_path, random_payload(93))?;
    fs::remove_file(&dest_path)?;
    assert_eq!(
        Status::from(&encode(&image_path, &dest_path, &payload_path)),
        Status::CapacityError
    );
    Ok(())
}

/// 验证非 BMP 文件以及 32 位 BMP 都会被拒绝
#[test]
fn test_format_rejection() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let text_path = dir.path().join("not_an_image.bmp");
    let rgba_path = dir.path().join("rgba.bmp");
    let payload_path = dir.path().join("payload.txt");
    let out_path = dir.path().join("out");

    fs::write(&text_path, "definitely not a bitmap, just some text padding it out")?;
    fs::write(&payload_path, "x")?;

    let rgba: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
    rgba.save(&rgba_path)?;

    for carrier in [&text_path, &rgba_path] {
        assert_eq!(
            Status::from(&encode(carrier, &out_path, &payload_path)),
            Status::FormatError
        );
        assert_eq!(
            Status::from(&decode(carrier, &out_path)),
            Status::FormatError
        );
    }
    assert!(!out_path.exists());
    Ok(())
}

/// 验证从未隐写过的图像不会被过度读取
#[test]
fn test_recover_from_clean_image_fails() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("white.bmp");
    let out_path = dir.path().join("out.txt");

    // 全白像素的最低位都为 1，长度字段被解析为 0xFFFFFFFF
    let white: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(16, 16, Rgb([255, 255, 255]));
    white.save(&image_path)?;

    assert_eq!(
        Status::from(&decode(&image_path, &out_path)),
        Status::CapacityError
    );
    assert!(!out_path.exists());

    let result = handle_recover(RecoverArgs {
        image: image_path,
        text: Some(out_path),
        force: false,
    });
    assert!(result.is_err());
    Ok(())
}

/// 验证缺失文件返回打开错误
#[test]
fn test_missing_files() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.bmp");
    let missing = dir.path().join("missing.bmp");
    let out_path = dir.path().join("out.bmp");
    create_test_image(&image_path, 8, 8);

    assert_eq!(
        Status::from(&encode(&missing, &out_path, &image_path)),
        Status::OpenError
    );
    assert_eq!(
        Status::from(&encode(&image_path, &out_path, &missing)),
        Status::OpenError
    );
    assert_eq!(Status::from(&decode(&missing, &out_path)), Status::OpenError);
    assert_eq!(
        Status::from(&decode(&image_path, &dir.path().join("no_such_dir").join("out.txt"))),
        Status::OpenError
    );
    Ok(())
}

/// 验证 inspect 命令
#[test]
fn test_handle_inspect() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let image_path = dir.path().join("carrier.bmp");
    create_test_image(&image_path, 16, 16);

    handle_inspect(InspectArgs { image: image_path })?;
    let missing = InspectArgs {
        image: dir.path().join("missing.bmp"),
    };
    assert!(handle_inspect(missing).is_err());
    Ok(())
}
