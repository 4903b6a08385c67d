//! Reading a rendered texture back into an image.

use std::sync::mpsc;

use image::RgbaImage;

use crate::error::SnapshotError;
use crate::gpu::GpuContext;

/// Order in which a readback delivers rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowOrder {
    /// Row 0 is the top of the image. wgpu texture copies always deliver this.
    TopDown,
    /// Row 0 is the bottom of the image.
    BottomUp,
}

/// Bytes per row of a texture copy, padded to wgpu's copy alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Converts raw 8-bit readback data into an RGBA image with row 0 at the top.
///
/// `data` holds `height` rows of `padded_row` bytes each. BGRA formats are
/// swizzled to RGBA.
pub fn pixels_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    padded_row: u32,
    format: wgpu::TextureFormat,
    order: RowOrder,
) -> Result<RgbaImage, SnapshotError> {
    let swap_red_blue = match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        other => return Err(SnapshotError::UnsupportedFormat(other)),
    };

    let row_bytes = width as usize * 4;
    let padded_row = padded_row as usize;
    if padded_row < row_bytes || data.len() < padded_row * height as usize {
        return Err(SnapshotError::Readback(format!(
            "expected {height} rows of {padded_row} bytes, got {} bytes",
            data.len()
        )));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        let source_row = match order {
            RowOrder::TopDown => y,
            RowOrder::BottomUp => height as usize - 1 - y,
        };
        let start = source_row * padded_row;
        let row = &data[start..start + row_bytes];

        if swap_red_blue {
            for px in row.chunks_exact(4) {
                pixels.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
        } else {
            pixels.extend_from_slice(row);
        }
    }

    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| SnapshotError::Readback("pixel buffer does not match the image size".into()))
}

/// Copies `texture` to the CPU and converts it with [`pixels_to_image`].
///
/// Blocks until the GPU has finished every submitted command.
pub fn read_texture(gpu: &GpuContext, texture: &wgpu::Texture) -> Result<RgbaImage, SnapshotError> {
    let (width, height) = (texture.width(), texture.height());
    let padded_row = padded_bytes_per_row(width);

    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Snapshot Readback"),
        size: padded_row as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Snapshot Copy"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    // Blocks until the copy above has executed and the map callback has run.
    gpu.device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|err| SnapshotError::Readback(err.to_string()))?;
    let mapped = receiver
        .recv()
        .map_err(|_| SnapshotError::Readback("map callback dropped".into()))?;
    mapped.map_err(|err| SnapshotError::Readback(err.to_string()))?;

    let image = {
        let data = slice.get_mapped_range();
        pixels_to_image(&data, width, height, padded_row, texture.format(), RowOrder::TopDown)
    };
    buffer.unmap();
    image
}
