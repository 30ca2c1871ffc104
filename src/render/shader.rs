use crate::recolor::channel::MaskChannel;

pub const VERTEX_ENTRY: &str = "vs";
pub const FRAGMENT_ENTRY: &str = "fs";

pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_TEXTURE_COORDINATE: u32 = 1;

pub const BINDING_RECOLOR: u32 = 0;
pub const BINDING_FRAME: u32 = 1;
pub const BINDING_MASK: u32 = 2;
pub const BINDING_SAMPLER: u32 = 3;

pub const QUAD_VERTICES: [[f32; 4]; 4] = [
    [-1.0, -1.0, 0.0, 1.0], // bottom left
    [1.0, -1.0, 1.0, 1.0],  // bottom right
    [-1.0, 1.0, 0.0, 0.0],  // top left
    [1.0, 1.0, 1.0, 0.0],   // top right
];

pub const QUAD_VERTEX_STRIDE: u64 = 16;

pub fn quad_vertex_bytes() -> Vec<u8> {
    QUAD_VERTICES
        .iter()
        .flatten()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

pub fn recolor_uniform_bytes(rgb: [f32; 3]) -> [u8; 16] {
    let mut params = [0u8; 16];
    for (i, v) in rgb.iter().enumerate() {
        params[i * 4..i * 4 + 4].copy_from_slice(&v.to_le_bytes());
    }
    params
}

const SHADER_TEMPLATE: &str = r#"
struct VsIn {
  @location(0) position: vec2<f32>,
  @location(1) texture_coordinate: vec2<f32>,
};

struct VsOut {
  @builtin(position) pos: vec4<f32>,
  @location(0) sample_coordinate: vec2<f32>,
};

@vertex
fn vs(in: VsIn) -> VsOut {
  var o: VsOut;
  o.pos = vec4<f32>(in.position, 0.0, 1.0);
  o.sample_coordinate = in.texture_coordinate;
  return o;
}

struct Params {
  recolor: vec3<f32>,
  _pad: f32,
};

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var frame: texture_2d<f32>;
@group(0) @binding(2) var mask: texture_2d<f32>;
@group(0) @binding(3) var samp: sampler;

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  let weight = textureSample(mask, samp, in.sample_coordinate);
  let color1 = textureSample(frame, samp, in.sample_coordinate);
  let color2 = params.recolor;

  let luminance = dot(color1.rgb, vec3<f32>(0.299, 0.587, 0.114));
  let mix_value = clamp(weight.MASK_COMPONENT * luminance, 0.0, 1.0);

  return vec4<f32>(mix(color1.rgb, color2, vec3<f32>(mix_value)), color1.a);
}
"#;

pub fn recolor_shader_source(channel: MaskChannel) -> String {
    SHADER_TEMPLATE.replace("MASK_COMPONENT", &channel.shader_component().to_string())
}
