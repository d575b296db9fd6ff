use effectconfig::WrapMode;
use transition::Slot;
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::assets::DecodedImage;
use crate::error::SetupError;

/// One uploaded image together with its native size.
pub(crate) struct TextureSlot {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
}

impl TextureSlot {
    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
        slot: Slot,
        max_dimension: u32,
    ) -> Result<Self, SetupError> {
        if image.width > max_dimension || image.height > max_dimension {
            return Err(SetupError::TooLarge {
                what: format!("image {}", image.path.display()),
                width: image.width,
                height: image.height,
                max: max_dimension,
            });
        }

        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&format!("texture slot #{}", slot.index())),
                size: wgpu::Extent3d {
                    width: image.width.max(1),
                    height: image.height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &image.pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        tracing::debug!(
            slot = slot.index(),
            width = image.width,
            height = image.height,
            "uploaded texture slot"
        );

        Ok(Self {
            _texture: texture,
            view,
            width: image.width,
            height: image.height,
        })
    }
}

pub(crate) fn address_mode(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// Both slots, their samplers, and the bind group exposing them to the
/// fragment stage at bindings 0..=3.
pub(crate) struct SlotTextures {
    slots: [TextureSlot; 2],
    samplers: [wgpu::Sampler; 2],
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    wrap_mode: WrapMode,
}

impl SlotTextures {
    pub(crate) fn new(device: &wgpu::Device, slots: [TextureSlot; 2], wrap_mode: WrapMode) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture slot layout"),
            entries: &build_layout_entries(),
        });
        let samplers = create_samplers(device, wrap_mode);
        let bind_group = create_bind_group(device, &layout, &slots, &samplers);
        Self {
            slots,
            samplers,
            layout,
            bind_group,
            wrap_mode,
        }
    }

    pub(crate) fn slot(&self, slot: Slot) -> &TextureSlot {
        &self.slots[slot.index()]
    }

    /// Applies a new address mode to both slots.
    pub(crate) fn set_wrap_mode(&mut self, device: &wgpu::Device, wrap_mode: WrapMode) {
        if wrap_mode == self.wrap_mode {
            return;
        }
        self.samplers = create_samplers(device, wrap_mode);
        self.bind_group = create_bind_group(device, &self.layout, &self.slots, &self.samplers);
        self.wrap_mode = wrap_mode;
        tracing::debug!(wrapping = %wrap_mode, "rebuilt texture samplers");
    }
}

fn create_samplers(device: &wgpu::Device, wrap_mode: WrapMode) -> [wgpu::Sampler; 2] {
    Slot::ALL.map(|slot| {
        let mode = address_mode(wrap_mode);
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("texture slot #{} sampler", slot.index())),
            address_mode_u: mode,
            address_mode_v: mode,
            address_mode_w: mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    slots: &[TextureSlot; 2],
    samplers: &[wgpu::Sampler; 2],
) -> wgpu::BindGroup {
    let mut entries = Vec::with_capacity(4);
    for (index, (slot, sampler)) in slots.iter().zip(samplers.iter()).enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2,
            resource: wgpu::BindingResource::TextureView(&slot.view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2 + 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
    }
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("texture slot bind group"),
        layout,
        entries: &entries,
    })
}

fn build_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(4);
    for index in 0..2u32 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}
