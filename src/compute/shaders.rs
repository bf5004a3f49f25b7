//! WGSL kernel sources
//!
//! Workgroup sizes here must match `SORT_WORKGROUP_SIZE` and
//! `BORDER_WORKGROUP_SIZE` in the configuration module.

/// Entry point shared by every kernel
pub const KERNEL_ENTRY_POINT: &str = "main";

/// One compare-and-swap pass of the bitonic network
///
/// Invocation `t` handles pair `t / channels` of channel `t % channels`.
/// Dispatches wider than the per-dimension workgroup limit fold rows into
/// `gid.y`, hence `row_stride`.
pub const BITONIC_SORT_SHADER: &str = r"
struct SortPass {
    k: u32,
    j: u32,
    invocations: u32,
    channels: u32,
    row_stride: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

@group(0) @binding(0) var<uniform> pass_params: SortPass;
@group(0) @binding(1) var<storage, read_write> keys: array<f32>;
@group(0) @binding(2) var<storage, read_write> payload: array<u32>;

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let t = gid.y * pass_params.row_stride + gid.x;
    if (t >= pass_params.invocations) {
        return;
    }

    let pair = t / pass_params.channels;
    let channel = t % pass_params.channels;
    let j = pass_params.j;
    let lower = (pair / j) * (2u * j) + pair % j;
    let upper = lower + j;

    let a = lower * pass_params.channels + channel;
    let b = upper * pass_params.channels + channel;
    let key_a = keys[a];
    let key_b = keys[b];

    let ascending = (lower & pass_params.k) == 0u;
    let out_of_order = select(key_a < key_b, key_a > key_b, ascending);
    if (out_of_order) {
        keys[a] = key_b;
        keys[b] = key_a;
        let index_a = payload[a];
        payload[a] = payload[b];
        payload[b] = index_a;
    }
}
";

/// Mirrored border band blend with energy-normalized weights
pub const BORDER_BLEND_SHADER: &str = r"
struct BorderParams {
    width: u32,
    height: u32,
    border: u32,
    _pad: u32,
}

@group(0) @binding(0) var<uniform> params: BorderParams;
@group(0) @binding(1) var<storage, read> input_pixels: array<vec4<f32>>;
@group(0) @binding(2) var<storage, read_write> output_pixels: array<vec4<f32>>;

fn band_weight(p: u32, size: u32, border: u32) -> f32 {
    let centre = f32(p) + 0.5;
    let dist = min(centre, f32(size) - centre);
    let band = f32(border);
    if (dist >= band) {
        return 1.0;
    }
    return 0.5 + 0.5 * dist / band;
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let x = gid.x;
    let y = gid.y;
    if (x >= params.width || y >= params.height) {
        return;
    }

    let wx = band_weight(x, params.width, params.border);
    let wy = band_weight(y, params.height, params.border);
    let mx = params.width - 1u - x;
    let my = params.height - 1u - y;

    let w00 = wx * wy;
    let w10 = (1.0 - wx) * wy;
    let w01 = wx * (1.0 - wy);
    let w11 = (1.0 - wx) * (1.0 - wy);
    let norm = sqrt(w00 * w00 + w10 * w10 + w01 * w01 + w11 * w11);

    let row = y * params.width;
    let mirror_row = my * params.width;
    let own = input_pixels[row + x];
    let rgb = (w00 * own.xyz
        + w10 * input_pixels[row + mx].xyz
        + w01 * input_pixels[mirror_row + x].xyz
        + w11 * input_pixels[mirror_row + mx].xyz) / norm;

    output_pixels[row + x] = vec4<f32>(rgb, own.w);
}
";
