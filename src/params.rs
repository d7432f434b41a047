//! Shape and hyperparameter records for the kernels.
//!
//! Buffers carry no shape metadata; these records are the only description of how a
//! flat slice is laid out. Layouts are NCHW for convolution data and output,
//! `(O, C/G, Kh, Kw)` for convolution weights with the output channels of each group
//! stored consecutively, and row-major `(B, I)` / `(O, I)` / `(B, O)` for dense.

use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::element::QuantElement;
use crate::errors::{KernelError, KernelResult};

/// Hyperparameters of a grouped, padded, strided 2-D convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conv2dParams {
    /// Batch size (N).
    pub batch: usize,
    /// Input channels (C).
    pub in_channels: usize,
    /// Input height (H).
    pub in_height: usize,
    /// Input width (W).
    pub in_width: usize,
    /// Output channels (O).
    pub out_channels: usize,
    /// Number of groups (G). Must divide both C and O.
    #[serde(default = "default_one")]
    pub groups: usize,
    #[serde(default)]
    pub pad_top: usize,
    #[serde(default)]
    pub pad_left: usize,
    #[serde(default)]
    pub pad_bottom: usize,
    #[serde(default)]
    pub pad_right: usize,
    /// Kernel height (Kh).
    pub kernel_height: usize,
    /// Kernel width (Kw).
    pub kernel_width: usize,
    #[serde(default = "default_one")]
    pub stride_height: usize,
    #[serde(default = "default_one")]
    pub stride_width: usize,
}

fn default_one() -> usize {
    1
}

/// Output extent along one axis: `floor((in + pad_before + pad_after - kernel) / stride) + 1`.
///
/// Returns 0 when the kernel does not fit in the padded input, or when the padded input
/// is not representable.
pub fn output_extent(
    in_size: usize,
    pad_before: usize,
    pad_after: usize,
    kernel: usize,
    stride: usize,
) -> usize {
    match padded_extent(in_size, pad_before, pad_after) {
        Some(padded) if padded >= kernel && stride != 0 => (padded - kernel) / stride + 1,
        _ => 0,
    }
}

fn padded_extent(in_size: usize, pad_before: usize, pad_after: usize) -> Option<usize> {
    in_size.checked_add(pad_before)?.checked_add(pad_after)
}

impl Conv2dParams {
    /// Creates a single-group, unpadded, unit-stride convolution.
    pub fn new(
        batch: usize,
        in_channels: usize,
        in_height: usize,
        in_width: usize,
        out_channels: usize,
        kernel_height: usize,
        kernel_width: usize,
    ) -> Self {
        Self {
            batch,
            in_channels,
            in_height,
            in_width,
            out_channels,
            groups: 1,
            pad_top: 0,
            pad_left: 0,
            pad_bottom: 0,
            pad_right: 0,
            kernel_height,
            kernel_width,
            stride_height: 1,
            stride_width: 1,
        }
    }

    pub fn with_groups(mut self, groups: usize) -> Self {
        self.groups = groups;
        self
    }

    /// Sets the implicit zero padding, in the order top, left, bottom, right.
    pub fn with_padding(mut self, top: usize, left: usize, bottom: usize, right: usize) -> Self {
        self.pad_top = top;
        self.pad_left = left;
        self.pad_bottom = bottom;
        self.pad_right = right;
        self
    }

    pub fn with_stride(mut self, stride_height: usize, stride_width: usize) -> Self {
        self.stride_height = stride_height;
        self.stride_width = stride_width;
        self
    }

    pub fn out_height(&self) -> usize {
        output_extent(
            self.in_height,
            self.pad_top,
            self.pad_bottom,
            self.kernel_height,
            self.stride_height,
        )
    }

    pub fn out_width(&self) -> usize {
        output_extent(
            self.in_width,
            self.pad_left,
            self.pad_right,
            self.kernel_width,
            self.stride_width,
        )
    }

    pub fn in_channels_per_group(&self) -> usize {
        self.in_channels / self.groups
    }

    pub fn out_channels_per_group(&self) -> usize {
        self.out_channels / self.groups
    }

    /// The group that output channel `out_channel` belongs to.
    pub fn group_of(&self, out_channel: usize) -> usize {
        out_channel / self.out_channels_per_group()
    }

    /// The input channels read by group `group`.
    pub fn group_channels(&self, group: usize) -> Range<usize> {
        let per_group = self.in_channels_per_group();
        group * per_group..(group + 1) * per_group
    }

    /// Number of products summed into each output element.
    pub fn reduction_len(&self) -> usize {
        self.in_channels_per_group() * self.kernel_height * self.kernel_width
    }

    pub fn input_len(&self) -> usize {
        self.batch * self.in_channels * self.in_height * self.in_width
    }

    pub fn weight_len(&self) -> usize {
        self.out_channels * self.reduction_len()
    }

    /// Elements in one `(n, o)` output plane.
    pub fn plane_len(&self) -> usize {
        self.out_height() * self.out_width()
    }

    pub fn output_len(&self) -> usize {
        self.batch * self.out_channels * self.plane_len()
    }

    /// Checks the hyperparameters for element type `T`.
    pub fn validate<T: QuantElement>(&self) -> KernelResult<()> {
        let dimensions = [
            ("batch", self.batch),
            ("in_channels", self.in_channels),
            ("in_height", self.in_height),
            ("in_width", self.in_width),
            ("out_channels", self.out_channels),
            ("groups", self.groups),
            ("kernel_height", self.kernel_height),
            ("kernel_width", self.kernel_width),
            ("stride_height", self.stride_height),
            ("stride_width", self.stride_width),
        ];
        for (name, value) in dimensions {
            if value == 0 {
                return Err(KernelError::ZeroDimension { name });
            }
        }

        for (name, channels) in [
            ("in_channels", self.in_channels),
            ("out_channels", self.out_channels),
        ] {
            if !channels.is_multiple_of(self.groups) {
                return Err(KernelError::GroupsNotDivisor {
                    name,
                    channels,
                    groups: self.groups,
                });
            }
        }

        let padded_height = padded_extent(self.in_height, self.pad_top, self.pad_bottom)
            .ok_or(KernelError::ExtentOverflow { axis: "vertical" })?;
        if padded_height < self.kernel_height {
            return Err(KernelError::EmptyOutput {
                axis: "vertical",
                padded: padded_height,
                kernel: self.kernel_height,
            });
        }
        let padded_width = padded_extent(self.in_width, self.pad_left, self.pad_right)
            .ok_or(KernelError::ExtentOverflow {
                axis: "horizontal",
            })?;
        if padded_width < self.kernel_width {
            return Err(KernelError::EmptyOutput {
                axis: "horizontal",
                padded: padded_width,
                kernel: self.kernel_width,
            });
        }

        let reduction_len = checked_element_count(&[
            self.in_channels_per_group(),
            self.kernel_height,
            self.kernel_width,
        ])?;
        check_reduction_len::<T>(reduction_len)?;

        // Every buffer length must be representable before it is compared.
        checked_element_count(&[self.batch, self.in_channels, self.in_height, self.in_width])?;
        checked_element_count(&[self.out_channels, reduction_len])?;
        checked_element_count(&[
            self.batch,
            self.out_channels,
            self.out_height(),
            self.out_width(),
        ])?;
        Ok(())
    }

    /// Checks the hyperparameters and every buffer length against them.
    pub fn validate_buffers<T: QuantElement>(
        &self,
        data_len: usize,
        weights_len: usize,
        bias_len: Option<usize>,
        out_len: usize,
    ) -> KernelResult<()> {
        self.validate::<T>()?;
        check_len("data", self.input_len(), data_len)?;
        check_len("weights", self.weight_len(), weights_len)?;
        if let Some(bias_len) = bias_len {
            check_len("bias", self.out_channels, bias_len)?;
        }
        check_len("output", self.output_len(), out_len)
    }
}

/// Parameters of a fully-connected layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DenseParams {
    /// Batch rows (B).
    pub batch: usize,
    /// Input features (I).
    pub in_features: usize,
    /// Output features (O).
    pub out_features: usize,
}

impl DenseParams {
    pub fn new(batch: usize, in_features: usize, out_features: usize) -> Self {
        Self {
            batch,
            in_features,
            out_features,
        }
    }

    pub fn reduction_len(&self) -> usize {
        self.in_features
    }

    pub fn input_len(&self) -> usize {
        self.batch * self.in_features
    }

    pub fn weight_len(&self) -> usize {
        self.out_features * self.in_features
    }

    pub fn output_len(&self) -> usize {
        self.batch * self.out_features
    }

    /// The 1x1 convolution over `(B, I, 1, 1)` that computes the same output.
    pub fn as_conv2d(&self) -> Conv2dParams {
        Conv2dParams::new(self.batch, self.in_features, 1, 1, self.out_features, 1, 1)
    }

    pub fn validate<T: QuantElement>(&self) -> KernelResult<()> {
        for (name, value) in [
            ("batch", self.batch),
            ("in_features", self.in_features),
            ("out_features", self.out_features),
        ] {
            if value == 0 {
                return Err(KernelError::ZeroDimension { name });
            }
        }
        check_reduction_len::<T>(self.reduction_len())?;

        checked_element_count(&[self.batch, self.in_features])?;
        checked_element_count(&[self.out_features, self.in_features])?;
        checked_element_count(&[self.batch, self.out_features])?;
        Ok(())
    }

    pub fn validate_buffers<T: QuantElement>(
        &self,
        data_len: usize,
        weight_len: usize,
        out_len: usize,
    ) -> KernelResult<()> {
        self.validate::<T>()?;
        check_len("data", self.input_len(), data_len)?;
        check_len("weight", self.weight_len(), weight_len)?;
        check_len("output", self.output_len(), out_len)
    }
}

/// Total number of elements described by `shape`. The empty shape is a scalar.
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Like [`element_count`], but reports overflow instead of wrapping.
pub fn checked_element_count(shape: &[usize]) -> KernelResult<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
        .ok_or_else(|| KernelError::ElementCountOverflow {
            shape: shape.to_vec(),
        })
}

fn check_reduction_len<T: QuantElement>(len: usize) -> KernelResult<()> {
    let max = T::max_reduction_len();
    if len > max {
        debug!("rejecting reduction of {} products (limit {})", len, max);
        return Err(KernelError::ReductionTooLong { len, max });
    }
    Ok(())
}

pub(crate) fn check_len(buffer: &'static str, expected: usize, actual: usize) -> KernelResult<()> {
    if expected != actual {
        debug!(
            "rejecting {} buffer: {} elements, expected {}",
            buffer, actual, expected
        );
        return Err(KernelError::BufferSizeMismatch {
            buffer,
            expected,
            actual,
        });
    }
    Ok(())
}
