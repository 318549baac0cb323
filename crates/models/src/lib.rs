//! Burn segmentation models for the microplastic detection stack.
//!
//! This crate defines the network architecture used for per-pixel
//! segmentation:
//! - `UNet`: encoder-decoder with skip connections producing raw logits.
//!
//! The model is a pure Burn Module with no awareness of checkpoints or
//! datasets. The `training` and `inference` crates wrap it for runtime use.
//! No activation is applied internally; callers apply sigmoid on the logits.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::PaddingConfig2d;
use burn::tensor::activation::relu;
use burn::tensor::{backend::Backend, Tensor};

/// Named encoder presets mapping the configured encoder name to channel
/// widths and downsampling depth. The names mirror the backbones the
/// original configs referenced; weights are always randomly initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderPreset {
    /// Base width 32, 3 downsampling stages.
    Resnet18,
    /// Base width 64, 4 downsampling stages.
    Resnet34,
    /// Base width 8, 2 downsampling stages. Intended for tests.
    Tiny,
}

impl EncoderPreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "resnet18" => Some(Self::Resnet18),
            "resnet34" => Some(Self::Resnet34),
            "tiny" => Some(Self::Tiny),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Resnet18 => "resnet18",
            Self::Resnet34 => "resnet34",
            Self::Tiny => "tiny",
        }
    }

    /// (base channel width, number of downsampling stages).
    fn dims(&self) -> (usize, usize) {
        match self {
            Self::Resnet18 => (32, 3),
            Self::Resnet34 => (64, 4),
            Self::Tiny => (8, 2),
        }
    }

    /// Input height/width must be divisible by this for the decoder to
    /// reassemble the original resolution.
    pub fn stride(&self) -> u32 {
        1 << self.dims().1 as u32
    }

    pub fn known_names() -> &'static [&'static str] {
        &["resnet18", "resnet34", "tiny"]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UNetConfig {
    pub encoder: EncoderPreset,
    pub classes: usize,
}

impl UNetConfig {
    pub fn new(encoder: EncoderPreset, classes: usize) -> Self {
        Self { encoder, classes }
    }
}

impl Default for UNetConfig {
    fn default() -> Self {
        Self {
            encoder: EncoderPreset::Resnet34,
            classes: 1,
        }
    }
}

/// Two 3x3 same-padded convolutions, each followed by ReLU.
#[derive(Module, Debug)]
struct DoubleConv<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
}

impl<B: Backend> DoubleConv<B> {
    fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv1 = Conv2dConfig::new([in_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let conv2 = Conv2dConfig::new([out_channels, out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        Self { conv1, conv2 }
    }

    fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.conv1.forward(input));
        relu(self.conv2.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct UNet<B: Backend> {
    encoder: Vec<DoubleConv<B>>,
    pools: Vec<MaxPool2d>,
    bottleneck: DoubleConv<B>,
    upsamples: Vec<ConvTranspose2d<B>>,
    decoder: Vec<DoubleConv<B>>,
    head: Conv2d<B>,
}

impl<B: Backend> UNet<B> {
    pub fn new(config: UNetConfig, device: &B::Device) -> Self {
        let (base, depth) = config.encoder.dims();

        let mut encoder = Vec::with_capacity(depth);
        let mut pools = Vec::with_capacity(depth);
        let mut in_ch = 3;
        let mut ch = base;
        for _ in 0..depth {
            encoder.push(DoubleConv::new(in_ch, ch, device));
            pools.push(MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init());
            in_ch = ch;
            ch *= 2;
        }

        let bottleneck = DoubleConv::new(in_ch, ch, device);

        // Decoder mirrors the encoder: upsample, concat skip, double conv.
        let mut upsamples = Vec::with_capacity(depth);
        let mut decoder = Vec::with_capacity(depth);
        let mut up_in = ch;
        for _ in 0..depth {
            let up_out = up_in / 2;
            upsamples.push(
                ConvTranspose2dConfig::new([up_in, up_out], [2, 2])
                    .with_stride([2, 2])
                    .init(device),
            );
            decoder.push(DoubleConv::new(up_out * 2, up_out, device));
            up_in = up_out;
        }

        let head = Conv2dConfig::new([base, config.classes], [1, 1]).init(device);

        Self {
            encoder,
            pools,
            bottleneck,
            upsamples,
            decoder,
            head,
        }
    }

    /// Forward pass: `[batch, 3, H, W]` image tensor to `[batch, classes, H, W]`
    /// logits. H and W must be divisible by the encoder stride.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut skips = Vec::with_capacity(self.encoder.len());
        let mut x = input;
        for (block, pool) in self.encoder.iter().zip(&self.pools) {
            let features = block.forward(x);
            skips.push(features.clone());
            x = pool.forward(features);
        }

        x = self.bottleneck.forward(x);

        for ((up, block), skip) in self
            .upsamples
            .iter()
            .zip(&self.decoder)
            .zip(skips.iter().rev())
        {
            x = up.forward(x);
            x = Tensor::cat(vec![skip.clone(), x], 1);
            x = block.forward(x);
        }

        self.head.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn_ndarray::NdArray<f32>;

    #[test]
    fn forward_preserves_spatial_shape() {
        let device = Default::default();
        let model = UNet::<TestBackend>::new(UNetConfig::new(EncoderPreset::Tiny, 1), &device);
        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 16, 16], &device);
        let logits = model.forward(input);
        assert_eq!(logits.dims(), [2, 1, 16, 16]);
    }

    #[test]
    fn preset_names_round_trip() {
        for name in EncoderPreset::known_names() {
            let preset = EncoderPreset::from_name(name).expect("known preset");
            assert_eq!(preset.name(), *name);
        }
        assert!(EncoderPreset::from_name("mobilenet").is_none());
    }

    #[test]
    fn tiny_stride_matches_depth() {
        assert_eq!(EncoderPreset::Tiny.stride(), 4);
        assert_eq!(EncoderPreset::Resnet34.stride(), 16);
    }
}
