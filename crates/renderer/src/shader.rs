use crate::types::ShaderStage;

/// One stage's source text together with the stage it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSource {
    pub stage: ShaderStage,
    pub text: &'static str,
}

/// Vertex/fragment pair compiled into one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource {
    pub vertex: StageSource,
    pub fragment: StageSource,
}

impl ShaderSource {
    pub const fn new(vertex: &'static str, fragment: &'static str) -> Self {
        Self {
            vertex: StageSource {
                stage: ShaderStage::Vertex,
                text: vertex,
            },
            fragment: StageSource {
                stage: ShaderStage::Fragment,
                text: fragment,
            },
        }
    }

    /// The procedural technical background.
    pub const fn backdrop() -> Self {
        Self::new(VERTEX_SHADER_GLSL, FRAGMENT_SHADER_GLSL)
    }

    pub fn stages(&self) -> [StageSource; 2] {
        [self.vertex, self.fragment]
    }
}

impl Default for ShaderSource {
    fn default() -> Self {
        Self::backdrop()
    }
}

/// Attribute location of the quad's clip-space position.
pub const POSITION_LOCATION: u32 = 0;
/// Attribute location of the quad's texture coordinate.
pub const TEXCOORD_LOCATION: u32 = 1;

/// Passes position and texcoord straight through.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_texcoord;
layout(location = 0) out vec2 v_texcoord;

void main() {
    v_texcoord = a_texcoord;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Procedural colour field composited under the page.
///
/// The uniform block layout must match `BackdropUniforms` in
/// `gpu/uniforms.rs`. Layer weights are hand-tuned blend constants;
/// `u_layers` switches each layer on or off.
pub const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 v_texcoord;
layout(location = 0) out vec4 out_color;

layout(std140, set = 0, binding = 0) uniform BackdropParams {
    vec2 _resolution;
    vec2 _pointer;
    float _time;
    float _intensity;
    uint _layers;
    float _padding0;
} params;

#define u_resolution params._resolution
#define u_pointer params._pointer
#define u_time params._time
#define u_intensity params._intensity
#define u_layers params._layers

const uint LAYER_GRID = 1u;
const uint LAYER_STREAMS = 2u;
const uint LAYER_NETWORK = 4u;
const uint LAYER_SCANS = 8u;
const uint LAYER_POINTER = 16u;

const float GRID_WEIGHT = 1.0;
const float STREAM_WEIGHT = 0.3;
const float NETWORK_WEIGHT = 0.2;
const float SCAN_WEIGHT = 0.5;
const float POINTER_WEIGHT = 0.3;
const float OVERLAY_ALPHA = 0.3;

bool layer_enabled(uint layer) {
    return (u_layers & layer) != 0u;
}

float hash(vec2 p) {
    return fract(sin(dot(p, vec2(127.1, 311.7))) * 43758.5453123);
}

vec2 hash22(vec2 p) {
    vec2 q = vec2(dot(p, vec2(127.1, 311.7)), dot(p, vec2(269.5, 183.3)));
    return vec2(-1.0) + 2.0 * fract(sin(q) * 43758.5453123);
}

float noise(vec2 p) {
    vec2 i = floor(p);
    vec2 f = fract(p);
    vec2 u = f * f * (vec2(3.0) - 2.0 * f);

    float a = dot(hash22(i), f);
    float b = dot(hash22(i + vec2(1.0, 0.0)), f - vec2(1.0, 0.0));
    float c = dot(hash22(i + vec2(0.0, 1.0)), f - vec2(0.0, 1.0));
    float d = dot(hash22(i + vec2(1.0, 1.0)), f - vec2(1.0, 1.0));
    return mix(mix(a, b, u.x), mix(c, d, u.x), u.y);
}

float tech_grid(vec2 uv) {
    float result = 0.0;

    vec2 grid1 = abs(fract(uv * 8.0) - vec2(0.5));
    float main_grid = smoothstep(0.02, 0.0, min(grid1.x, grid1.y));

    vec2 grid2 = abs(fract(uv * 32.0) - vec2(0.5));
    float fine_grid = smoothstep(0.005, 0.001, min(grid2.x, grid2.y)) * 0.4;

    float node_hash = hash(floor(uv * 8.0));
    if (node_hash > 0.92) {
        float node_dist = distance(fract(uv * 8.0), vec2(0.5));
        float pulse = sin(u_time * 3.0 + node_hash * 20.0) * 0.5 + 0.5;
        result += exp(-node_dist * 25.0) * pulse * 1.2;
        result += exp(-node_dist * 8.0) * 0.3;
    }

    vec2 flow_uv = uv * 8.0;
    float energy = sin(flow_uv.x * 2.0 + u_time * 2.0) * sin(flow_uv.y * 2.0 + u_time * 1.5);
    energy = smoothstep(0.3, 0.8, energy) * 0.2;

    result += main_grid * 0.6 + fine_grid + energy * main_grid;
    return result;
}

float data_streams(vec2 uv) {
    float pattern = 0.0;

    for (int i = 0; i < 8; i++) {
        float fi = float(i);
        float x = 0.1 + fi * 0.1 + sin(u_time * 0.5 + fi) * 0.02;

        float stream_y = uv.y - u_time * (1.2 + fi * 0.3);
        stream_y = fract(stream_y * 2.0) - 0.5;
        float falloff = exp(-abs(stream_y) * 8.0);

        float dist = abs(uv.x - x);
        if (dist < 0.005) {
            float width = smoothstep(0.005, 0.001, dist);
            float packet = sin(stream_y * 40.0 + u_time * 5.0) * 0.5 + 0.5;
            packet = smoothstep(0.7, 1.0, packet);
            pattern += width * falloff * (0.4 + packet * 0.6);
        }
    }

    return pattern;
}

float network_topology(vec2 uv) {
    float pattern = 0.0;
    vec2 center = vec2(0.5);
    float radius = 0.3;

    for (int i = 0; i < 6; i++) {
        float fi = float(i);
        float angle = fi * 1.047 + u_time * 0.1;
        float node_radius = radius + sin(u_time * 0.4 + fi) * 0.05;
        vec2 node_pos = center + vec2(cos(angle), sin(angle)) * node_radius;

        float dist = distance(uv, node_pos);
        float node = exp(-dist * 40.0);
        float glow = exp(-dist * 15.0) * 0.3;
        float pulse = sin(u_time * 2.5 + fi * 1.3) * 0.2 + 0.8;
        pattern += (node + glow) * pulse;

        vec2 line_dir = normalize(center - node_pos);
        float proj = clamp(dot(uv - node_pos, line_dir), 0.0, distance(node_pos, center));
        float line_dist = distance(uv, node_pos + line_dir * proj);
        float flow = sin(u_time * 3.0 - proj * 15.0) * 0.5 + 0.5;
        pattern += smoothstep(0.004, 0.001, line_dist) * 0.3 * flow;
    }

    float hub = exp(-distance(uv, center) * 30.0) * (sin(u_time * 2.0) * 0.3 + 0.7);
    pattern += hub * 1.5;
    return pattern;
}

float scan_lines(vec2 uv) {
    float h_sweep = smoothstep(0.9, 1.0, sin(uv.y * 80.0 + u_time * 3.0)) * 0.2;
    float v_sweep = smoothstep(0.95, 1.0, sin(uv.x * 60.0 + u_time * 2.0)) * 0.15;

    float angle = atan(uv.y - 0.5, uv.x - 0.5);
    float radial = smoothstep(0.7, 1.0, sin(angle * 3.0 - u_time * 1.5)) * 0.1;

    return h_sweep + v_sweep + radial;
}

float pointer_glow(vec2 uv) {
    vec2 pointer_uv = u_pointer / max(u_resolution, vec2(1.0));
    float dist = distance(uv, pointer_uv);

    float glow = exp(-dist * 4.0) * 0.8;
    float ripple1 = sin(dist * 25.0 - u_time * 6.0) * exp(-dist * 3.0);
    float ripple2 = sin(dist * 15.0 - u_time * 4.0) * exp(-dist * 2.0);
    float disruption = exp(-dist * 8.0) * sin(u_time * 10.0) * 0.2;

    return glow + abs(ripple1) * 0.4 + abs(ripple2) * 0.3 + disruption;
}

void main() {
    vec2 uv = v_texcoord;

    vec3 color = vec3(0.005, 0.01, 0.02);
    color *= 1.0 - distance(uv, vec2(0.5)) * 0.8;

    if (layer_enabled(LAYER_GRID)) {
        color += vec3(0.05, 0.15, 0.25) * tech_grid(uv) * u_intensity * GRID_WEIGHT;
    }
    if (layer_enabled(LAYER_STREAMS)) {
        color += vec3(0.0, 0.2, 0.3) * data_streams(uv) * u_intensity * STREAM_WEIGHT;
    }
    if (layer_enabled(LAYER_NETWORK)) {
        color += vec3(0.1, 0.2, 0.3) * network_topology(uv) * u_intensity * NETWORK_WEIGHT;
    }
    if (layer_enabled(LAYER_SCANS)) {
        color += vec3(0.05, 0.1, 0.15) * scan_lines(uv) * u_intensity * SCAN_WEIGHT;
    }
    if (layer_enabled(LAYER_POINTER)) {
        color += vec3(0.08, 0.15, 0.2) * pointer_glow(uv) * u_intensity * POINTER_WEIGHT;
    }

    float atmosphere = noise(uv * 30.0 + vec2(u_time * 0.05)) * 0.05;
    color += vec3(atmosphere * 0.5, atmosphere, atmosphere * 1.5);

    color *= smoothstep(0.0, 0.7, 1.0 - distance(uv, vec2(0.5)));
    color = mix(color, color * vec3(1.1, 1.0, 0.9), 0.1);

    out_color = vec4(color, u_intensity * OVERLAY_ALPHA);
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Layers;

    #[test]
    fn layer_bits_match_fragment_constants() {
        let expected = [
            ("LAYER_GRID", Layers::GRID),
            ("LAYER_STREAMS", Layers::STREAMS),
            ("LAYER_NETWORK", Layers::NETWORK),
            ("LAYER_SCANS", Layers::SCANS),
            ("LAYER_POINTER", Layers::POINTER_GLOW),
        ];
        for (name, layer) in expected {
            let declaration = format!("const uint {name} = {}u;", layer.bits());
            assert!(
                FRAGMENT_SHADER_GLSL.contains(&declaration),
                "missing `{declaration}`"
            );
        }
    }

    #[test]
    fn stages_carry_their_kind() {
        let source = ShaderSource::backdrop();
        let [vertex, fragment] = source.stages();
        assert_eq!(vertex.stage, ShaderStage::Vertex);
        assert_eq!(fragment.stage, ShaderStage::Fragment);
        assert!(vertex.text.contains("a_position"));
        assert!(fragment.text.contains("out_color"));
    }
}
