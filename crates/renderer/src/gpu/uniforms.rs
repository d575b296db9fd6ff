use bytemuck::{Pod, Zeroable};
use effectconfig::EffectParameters;
use transition::{FrameSample, SurfaceSize};

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// CPU mirror of the std140 `TransitionParams` block declared by both
/// built-in shaders. Field order and padding must match the GLSL.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionUniforms {
    pub mvp_matrix: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub resolution: [i32; 2],
    pub tex_resolution: [i32; 2],
    pub progress: f32,
    pub count: f32,
    pub smoothness: f32,
    pub texture1: i32,
    pub texture2: i32,
    _padding: [i32; 3],
}

unsafe impl Zeroable for TransitionUniforms {}
unsafe impl Pod for TransitionUniforms {}

impl TransitionUniforms {
    pub fn new(surface: SurfaceSize) -> Self {
        let mut uniforms = Self {
            mvp_matrix: IDENTITY,
            normal_matrix: IDENTITY,
            resolution: [0, 0],
            tex_resolution: [0, 0],
            progress: 0.0,
            count: 0.0,
            smoothness: 0.0,
            texture1: 0,
            texture2: 1,
            _padding: [0; 3],
        };
        uniforms.set_resolution(surface);
        uniforms
    }

    pub fn set_resolution(&mut self, surface: SurfaceSize) {
        self.resolution = [clamp_i32(surface.width), clamp_i32(surface.height)];
    }

    pub fn set_tex_resolution(&mut self, width: u32, height: u32) {
        self.tex_resolution = [clamp_i32(width), clamp_i32(height)];
    }

    /// Copies per-frame transition state and the live effect parameters.
    pub fn apply_frame(&mut self, sample: &FrameSample, parameters: &EffectParameters) {
        self.progress = sample.progress;
        self.count = parameters.stripe_count;
        self.smoothness = parameters.smoothness;
        self.texture1 = sample.current.index() as i32;
        self.texture2 = sample.next.index() as i32;
    }
}

fn clamp_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use effectconfig::WrapMode;
    use transition::Slot;

    fn read_i32(bytes: &[u8], offset: usize) -> i32 {
        i32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn read_f32(bytes: &[u8], offset: usize) -> f32 {
        f32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn sample(progress: f32, current: Slot) -> FrameSample {
        FrameSample {
            progress,
            current,
            next: current.other(),
            complete: progress >= 1.0,
        }
    }

    #[test]
    fn block_matches_std140_layout() {
        assert_eq!(std::mem::size_of::<TransitionUniforms>(), 176);
        assert_eq!(std::mem::align_of::<TransitionUniforms>(), 16);

        let mut uniforms = TransitionUniforms::new(SurfaceSize::new(1920, 1080));
        uniforms.set_tex_resolution(640, 480);
        uniforms.apply_frame(
            &sample(0.25, Slot::Second),
            &EffectParameters {
                stripe_count: 12.0,
                smoothness: 0.5,
                wrap_mode: WrapMode::Repeat,
            },
        );
        let bytes = bytemuck::bytes_of(&uniforms);

        assert_eq!(read_f32(bytes, 0), 1.0);
        assert_eq!(read_f32(bytes, 64 + 20), 1.0);
        assert_eq!(read_i32(bytes, 128), 1920);
        assert_eq!(read_i32(bytes, 132), 1080);
        assert_eq!(read_i32(bytes, 136), 640);
        assert_eq!(read_i32(bytes, 140), 480);
        assert_eq!(read_f32(bytes, 144), 0.25);
        assert_eq!(read_f32(bytes, 148), 12.0);
        assert_eq!(read_f32(bytes, 152), 0.5);
        assert_eq!(read_i32(bytes, 156), 1);
        assert_eq!(read_i32(bytes, 160), 0);
    }

    #[test]
    fn transforms_stay_identity() {
        let mut uniforms = TransitionUniforms::new(SurfaceSize::new(10, 10));
        uniforms.apply_frame(&sample(0.7, Slot::First), &EffectParameters::default());
        assert_eq!(uniforms.mvp_matrix, IDENTITY);
        assert_eq!(uniforms.normal_matrix, IDENTITY);
    }

    #[test]
    fn panel_values_reach_uniforms_unchanged() {
        let mut uniforms = TransitionUniforms::new(SurfaceSize::new(800, 600));
        let parameters = EffectParameters {
            stripe_count: 10.0,
            smoothness: 0.3,
            wrap_mode: WrapMode::ClampToEdge,
        };
        uniforms.apply_frame(&sample(0.0, Slot::First), &parameters);
        assert_eq!(uniforms.count, 10.0);
        assert_eq!(uniforms.smoothness, 0.3);
        assert_eq!(uniforms.texture1, 0);
        assert_eq!(uniforms.texture2, 1);
    }

    #[test]
    fn oversized_extents_saturate() {
        let mut uniforms = TransitionUniforms::new(SurfaceSize::new(u32::MAX, 4));
        uniforms.set_tex_resolution(u32::MAX, 2);
        assert_eq!(uniforms.resolution, [i32::MAX, 4]);
        assert_eq!(uniforms.tex_resolution, [i32::MAX, 2]);
    }
}
