//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
///
/// Positions are world pixels until the pipeline maps them to clip space.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Build an opaque color from a `0xRRGGBB` literal
pub const fn rgb(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Colors for game elements
pub mod colors {
    use super::rgb;

    pub const BACKGROUND: [f32; 4] = rgb(0xf0f0f0);
    pub const WALL: [f32; 4] = rgb(0x333333);

    pub const PEG_NORMAL: [f32; 4] = rgb(0x0000ff);
    pub const PEG_NORMAL_OUTLINE: [f32; 4] = rgb(0x00008b);
    pub const PEG_NORMAL_HIT: [f32; 4] = rgb(0xadd8e6);
    pub const PEG_SPECIAL: [f32; 4] = rgb(0xff0000);
    pub const PEG_SPECIAL_OUTLINE: [f32; 4] = rgb(0x8b0000);
    pub const PEG_SPECIAL_HIT: [f32; 4] = rgb(0xffa500);

    pub const BALL: [f32; 4] = rgb(0x808080);
    pub const BALL_OUTLINE: [f32; 4] = rgb(0x555555);
    pub const BUCKET: [f32; 4] = rgb(0x008000);
    pub const LAUNCHER: [f32; 4] = rgb(0x444444);
    pub const TRAJECTORY: [f32; 4] = rgb(0xff0000);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_channels() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rgb(0x00ff00), [0.0, 1.0, 0.0, 1.0]);
        let c = rgb(0x808080);
        assert!((c[2] - 128.0 / 255.0).abs() < 1e-6);
    }
}
