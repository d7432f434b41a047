//! Activation functions and the post-accumulation epilogue.
//!
//! Activations operate in the `i32` accumulator domain so that a fused kernel can
//! apply them before narrowing. Applying an activation to an already narrowed
//! element gives the same result, which is what makes fusion safe.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::element::QuantElement;

/// Represents the type of activation function to be applied.
/// Note: A None value indicates that no activation function should be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Activation {
    /// Rectified Linear Unit activation function: f(x) = max(0, x).
    Relu,
}

impl Activation {
    /// Get activation by string name.
    pub fn get_by_name(type_name: &str) -> Option<Self> {
        let map: HashMap<&str, Activation> = [("RELU", Activation::Relu)].iter().cloned().collect();

        map.get(type_name).copied()
    }

    /// Apply the activation function to a single accumulator value.
    #[inline(always)]
    pub fn apply_single(self, x: i32) -> i32 {
        match self {
            Activation::Relu => x.max(0),
        }
    }

    /// Apply the activation function to a single 8-bit element.
    #[inline(always)]
    pub fn apply_element<T: QuantElement>(self, x: T) -> T {
        T::saturate(self.apply_single(x.widen()))
    }

    /// Apply the activation function to a slice of elements in place.
    pub fn apply_in_place<T: QuantElement>(self, values: &mut [T]) {
        for val in values.iter_mut() {
            *val = self.apply_element(*val);
        }
    }
}

/// Work done on an output accumulator between reduction and narrowing.
///
/// `BiasRelu` holds one bias value per output channel, broadcast over batch and
/// spatial positions. The bias is added to the accumulator after it has been narrowed
/// to the element range, so the fused result equals ReLU applied to the saturated
/// convolution output plus bias, for signed and unsigned elements alike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Epilogue<'a, T> {
    None,
    Relu,
    BiasRelu(&'a [T]),
}

impl<T: QuantElement> Epilogue<'_, T> {
    /// Finishes the accumulator of output channel `channel` and narrows it.
    #[inline(always)]
    pub fn finish(&self, channel: usize, acc: i32) -> T {
        match self {
            Epilogue::None => T::saturate(acc),
            Epilogue::Relu => T::saturate(Activation::Relu.apply_single(acc)),
            Epilogue::BiasRelu(bias) => {
                let narrowed = T::saturate(acc).widen();
                T::saturate(Activation::Relu.apply_single(narrowed + bias[channel].widen()))
            }
        }
    }

    /// The bias slice, if this epilogue carries one.
    pub fn bias(&self) -> Option<&[T]> {
        match self {
            Epilogue::BiasRelu(bias) => Some(bias),
            _ => None,
        }
    }

    /// The activation applied after the optional bias.
    pub fn activation(&self) -> Option<Activation> {
        match self {
            Epilogue::None => None,
            Epilogue::Relu | Epilogue::BiasRelu(_) => Some(Activation::Relu),
        }
    }
}
