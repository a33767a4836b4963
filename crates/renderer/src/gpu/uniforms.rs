use bytemuck::{Pod, Zeroable};

use crate::host::UniformValue;

/// CPU mirror of the fragment stage's `BackdropParams` block (std140).
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct BackdropUniforms {
    pub u_resolution: [f32; 2],
    pub u_pointer: [f32; 2],
    pub u_time: f32,
    pub u_intensity: f32,
    pub u_layers: u32,
    pub u_padding0: f32,
}

unsafe impl Zeroable for BackdropUniforms {}
unsafe impl Pod for BackdropUniforms {}

impl BackdropUniforms {
    pub fn apply(&mut self, value: UniformValue) {
        match value {
            UniformValue::Time(seconds) => self.u_time = seconds,
            UniformValue::Resolution(resolution) => self.u_resolution = resolution,
            UniformValue::Pointer(pointer) => self.u_pointer = pointer,
            UniformValue::Intensity(intensity) => self.u_intensity = intensity,
            UniformValue::Layers(layers) => self.u_layers = layers,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
