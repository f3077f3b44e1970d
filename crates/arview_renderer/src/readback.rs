//! Copying the 3D layer back to the CPU.
//!
//! Rows in a texture-to-buffer copy are padded to
//! `COPY_BYTES_PER_ROW_ALIGNMENT`; the padding is stripped before the pixels
//! are handed out as an [`RgbaImage`].

use std::sync::mpsc;

use image::RgbaImage;

use crate::error::RenderError;

/// Bytes per row of a padded RGBA8 copy.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = 4 * width;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Removes the per-row padding from a mapped copy buffer.
pub fn strip_padding(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let row = 4 * width as usize;
    let mut out = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(padded_row as usize).take(height as usize) {
        out.extend_from_slice(&chunk[..row.min(chunk.len())]);
    }
    out
}

/// Synchronously reads an RGBA8 texture.
///
/// Blocks on `device.poll(Maintain::Wait)`.  On the web the map cannot
/// complete within the call and a `Readback` error is returned instead.
pub fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<RgbaImage, RenderError> {
    let padded_row = padded_bytes_per_row(width);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: u64::from(padded_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: None,
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);

    match rx.try_recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(RenderError::Readback(e.to_string())),
        Err(_) => return Err(RenderError::Readback("buffer map did not complete".into())),
    }

    let pixels = {
        let data = slice.get_mapped_range();
        strip_padding(&data, width, height, padded_row)
    };
    buffer.unmap();

    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| RenderError::Readback("short readback buffer".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_256_bytes() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }

    #[test]
    fn padding_is_stripped_per_row() {
        let (w, h) = (2u32, 3u32);
        let padded = padded_bytes_per_row(w);
        let mut data = vec![0xEEu8; (padded * h) as usize];
        for y in 0..h as usize {
            for i in 0..8 {
                data[y * padded as usize + i] = (y * 8 + i) as u8;
            }
        }
        let out = strip_padding(&data, w, h, padded);
        assert_eq!(out.len(), 24);
        assert_eq!(out, (0u8..24).collect::<Vec<_>>());
    }
}
