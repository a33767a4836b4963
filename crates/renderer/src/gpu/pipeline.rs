use std::collections::BTreeMap;

use crate::types::BlendMode;

/// Shape of one vertex attribute fed from its own buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AttributeLayout {
    pub location: u32,
    pub components: u32,
}

impl AttributeLayout {
    fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            3 => wgpu::VertexFormat::Float32x3,
            4 => wgpu::VertexFormat::Float32x4,
            _ => wgpu::VertexFormat::Float32x2,
        }
    }

    fn stride(&self) -> wgpu::BufferAddress {
        self.format().size()
    }
}

pub(crate) fn blend_state(blend: Option<BlendMode>) -> Option<wgpu::BlendState> {
    blend.map(|mode| match mode {
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
    })
}

pub(crate) fn uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("uniform layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Everything a render pipeline is derived from.
pub(crate) struct PipelineInputs<'a> {
    pub vertex: &'a wgpu::ShaderModule,
    pub fragment: &'a wgpu::ShaderModule,
    pub uniform_layout: &'a wgpu::BindGroupLayout,
    /// Keyed by location; buffer slots follow key order.
    pub attributes: &'a BTreeMap<u32, AttributeLayout>,
    pub format: wgpu::TextureFormat,
    pub blend: Option<BlendMode>,
}

/// Bakes a triangle-list pipeline with one vertex buffer per attribute.
pub(crate) fn create_render_pipeline(
    device: &wgpu::Device,
    inputs: &PipelineInputs<'_>,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("backdrop pipeline layout"),
        bind_group_layouts: &[inputs.uniform_layout],
        push_constant_ranges: &[],
    });

    let attributes: Vec<[wgpu::VertexAttribute; 1]> = inputs
        .attributes
        .values()
        .map(|attribute| {
            [wgpu::VertexAttribute {
                format: attribute.format(),
                offset: 0,
                shader_location: attribute.location,
            }]
        })
        .collect();
    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = inputs
        .attributes
        .values()
        .zip(attributes.iter())
        .map(|(attribute, slot)| wgpu::VertexBufferLayout {
            array_stride: attribute.stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: slot,
        })
        .collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("backdrop pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: inputs.vertex,
            entry_point: Some("main"),
            buffers: &buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: inputs.fragment,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: inputs.format,
                blend: blend_state(inputs.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}
