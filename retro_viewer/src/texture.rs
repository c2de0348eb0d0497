use std::borrow::Cow;

use anyhow::{Result, ensure};

/// RGBA rows padded to the copy alignment wgpu requires for texture writes.
pub struct TextureUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl<'a> TextureUpload<'a> {
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

pub fn prepare_rgba_upload<'a>(
    width: u32,
    height: u32,
    data: &'a [u8],
) -> Result<TextureUpload<'a>> {
    ensure!(width > 0 && height > 0, "texture has no dimensions");
    let row_bytes = 4usize * width as usize;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    ensure!(
        data.len() >= row_bytes * height as usize,
        "texture buffer ({}) smaller than {}x{} RGBA ({})",
        data.len(),
        width,
        height,
        row_bytes * height as usize
    );

    if row_bytes % alignment == 0 && data.len() == row_bytes * height as usize {
        return Ok(TextureUpload {
            data: Cow::Borrowed(data),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row_bytes * height as usize];
    for (row, src) in data.chunks_exact(row_bytes).take(height as usize).enumerate() {
        let dst_offset = row * padded_row_bytes;
        buffer[dst_offset..dst_offset + row_bytes].copy_from_slice(src);
    }

    Ok(TextureUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row_bytes as u32,
    })
}

pub fn write_rgba(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    data: &[u8],
) -> Result<()> {
    let upload = prepare_rgba_upload(width, height, data)?;
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        upload.pixels(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(upload.bytes_per_row()),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_rows_are_borrowed() {
        let data = vec![7u8; 64 * 4 * 2];
        let upload = prepare_rgba_upload(64, 2, &data).expect("upload");
        assert!(matches!(upload.data, Cow::Borrowed(_)));
        assert_eq!(upload.bytes_per_row(), 256);
    }

    #[test]
    fn unaligned_rows_are_padded() {
        let width = 3;
        let height = 2;
        let data: Vec<u8> = (0..(width * height * 4) as u8).collect();
        let upload = prepare_rgba_upload(width, height, &data).expect("upload");
        assert_eq!(upload.bytes_per_row(), 256);
        let pixels = upload.pixels();
        assert_eq!(pixels.len(), 512);
        assert_eq!(&pixels[..12], &data[..12]);
        assert_eq!(&pixels[256..268], &data[12..24]);
        assert!(pixels[12..256].iter().all(|byte| *byte == 0));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let data = vec![0u8; 10];
        assert!(prepare_rgba_upload(4, 4, &data).is_err());
    }
}
