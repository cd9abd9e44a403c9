//! Small CNN classifier with untrained weights.
//!
//! Layout (NHWC input, `valid` padding):
//! conv 3x3x16 + relu -> maxpool 2 -> conv 3x3x32 + relu -> maxpool 2 ->
//! global average pool -> dense 64 + relu -> dropout (identity at inference)
//! -> dense N + softmax.
//!
//! Kernels use Glorot-uniform init and biases start at zero, so the output is
//! a valid distribution with no predictive value.

use anyhow::Result;
use ndarray::{Array1, Array2, Array3, Array4, ArrayView3, Axis, s};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::{BackendKind, InferenceBackend};
use crate::analysis::preprocessing::MODEL_INPUT_SIZE;

const KERNEL_SIZE: usize = 3;
const CONV1_FILTERS: usize = 16;
const CONV2_FILTERS: usize = 32;
const DENSE_UNITS: usize = 64;

fn glorot_uniform(shape: (usize, usize), fan_in: usize, fan_out: usize, rng: &mut StdRng) -> Array2<f32> {
    let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
    Array2::from_shape_simple_fn(shape, || rng.random_range(-limit..limit))
}

/// 2D convolution stored as an im2col weight matrix `(k*k*c_in, c_out)`
struct Conv2d {
    weights: Array2<f32>,
    bias: Array1<f32>,
    kernel_size: usize,
    in_channels: usize,
}

impl Conv2d {
    fn new(in_channels: usize, out_channels: usize, kernel_size: usize, rng: &mut StdRng) -> Self {
        let receptive = kernel_size * kernel_size;
        Self {
            weights: glorot_uniform(
                (receptive * in_channels, out_channels),
                receptive * in_channels,
                receptive * out_channels,
                rng,
            ),
            bias: Array1::zeros(out_channels),
            kernel_size,
            in_channels,
        }
    }

    /// Valid convolution followed by relu
    fn forward(&self, input: ArrayView3<f32>) -> Result<Array3<f32>> {
        let (height, width, channels) = input.dim();
        let k = self.kernel_size;
        if channels != self.in_channels {
            anyhow::bail!("conv expects {} channels, got {}", self.in_channels, channels);
        }
        if height < k || width < k {
            anyhow::bail!("conv input {}x{} is smaller than the kernel", height, width);
        }

        let (out_h, out_w) = (height - k + 1, width - k + 1);
        let mut columns = Array2::<f32>::zeros((out_h * out_w, k * k * channels));

        for y in 0..out_h {
            for x in 0..out_w {
                let mut row = columns.row_mut(y * out_w + x);
                for ky in 0..k {
                    for kx in 0..k {
                        let offset = (ky * k + kx) * channels;
                        row.slice_mut(s![offset..offset + channels])
                            .assign(&input.slice(s![y + ky, x + kx, ..]));
                    }
                }
            }
        }

        let mut output = columns.dot(&self.weights) + &self.bias;
        output.mapv_inplace(|v| v.max(0.0));

        let out_channels = self.weights.ncols();
        Ok(output.into_shape_with_order((out_h, out_w, out_channels))?)
    }
}

struct Dense {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl Dense {
    fn new(inputs: usize, outputs: usize, rng: &mut StdRng) -> Self {
        Self {
            weights: glorot_uniform((inputs, outputs), inputs, outputs, rng),
            bias: Array1::zeros(outputs),
        }
    }

    fn forward(&self, input: &Array1<f32>) -> Array1<f32> {
        input.dot(&self.weights) + &self.bias
    }
}

/// 2x2 max pooling with stride 2; odd trailing rows/columns are dropped
fn max_pool2(input: ArrayView3<f32>) -> Array3<f32> {
    let (height, width, channels) = input.dim();
    let (out_h, out_w) = (height / 2, width / 2);

    Array3::from_shape_fn((out_h, out_w, channels), |(y, x, c)| {
        let (sy, sx) = (y * 2, x * 2);
        input[[sy, sx, c]]
            .max(input[[sy, sx + 1, c]])
            .max(input[[sy + 1, sx, c]])
            .max(input[[sy + 1, sx + 1, c]])
    })
}

fn global_average_pool(input: ArrayView3<f32>) -> Array1<f32> {
    let (height, width, _) = input.dim();
    input.sum_axis(Axis(0)).sum_axis(Axis(0)) / (height * width) as f32
}

fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let exp = logits.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

pub struct UntrainedCnn {
    conv1: Conv2d,
    conv2: Conv2d,
    hidden: Dense,
    output: Dense,
}

impl UntrainedCnn {
    /// Build the network with fresh random weights; `seed` makes them repeatable
    pub fn new(num_classes: usize, seed: Option<u64>) -> Result<Self> {
        if num_classes == 0 {
            anyhow::bail!("network needs at least one output class");
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let network = Self {
            conv1: Conv2d::new(3, CONV1_FILTERS, KERNEL_SIZE, &mut rng),
            conv2: Conv2d::new(CONV1_FILTERS, CONV2_FILTERS, KERNEL_SIZE, &mut rng),
            hidden: Dense::new(CONV2_FILTERS, DENSE_UNITS, &mut rng),
            output: Dense::new(DENSE_UNITS, num_classes, &mut rng),
        };

        debug!("Built untrained CNN with {} output classes", num_classes);
        Ok(network)
    }
}

impl InferenceBackend for UntrainedCnn {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>> {
        let (batch, height, width, channels) = input.dim();
        let (expected_h, expected_w) = MODEL_INPUT_SIZE;
        if batch != 1 || height != expected_h || width != expected_w || channels != 3 {
            anyhow::bail!(
                "expected input [1, {}, {}, 3], got [{}, {}, {}, {}]",
                expected_h,
                expected_w,
                batch,
                height,
                width,
                channels
            );
        }

        let image = input.index_axis(Axis(0), 0);
        let x = self.conv1.forward(image)?;
        let x = max_pool2(x.view());
        let x = self.conv2.forward(x.view())?;
        let x = max_pool2(x.view());
        let x = global_average_pool(x.view());
        let x = self.hidden.forward(&x).mapv(|v| v.max(0.0));
        let probabilities = softmax(&self.output.forward(&x));

        Ok(probabilities.to_vec())
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }
}
