// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element-wise arithmetic and comparisons.
//!
//! Tensor-tensor operators follow the single broadcasting rule described on
//! [`Shape::is_broadcast_compatible`]: the right operand's buffer repeats
//! with a period equal to its own size. Scalar operators are infallible and
//! are exposed through `std::ops` on `&Tensor` only, so the fallible
//! inherent `add`/`sub`/`mul`/`div` methods keep method-call priority.

use crate::{Shape, Tensor, TensorError};
use std::ops::{Add, Div, Mul, Neg, Sub};

impl Tensor {
    fn check_broadcast(&self, other: &Tensor, op: &'static str) -> Result<(), TensorError> {
        if self.shape().is_broadcast_compatible(other.shape()) {
            Ok(())
        } else {
            Err(TensorError::shape_mismatch(op, self.shape(), other.shape()))
        }
    }

    fn broadcast_with(
        &self,
        other: &Tensor,
        op: &'static str,
        f: impl Fn(f32, f32) -> f32,
    ) -> Result<Tensor, TensorError> {
        self.check_broadcast(other, op)?;
        let rhs = other.data();
        let period = rhs.len();
        let data = self
            .data()
            .iter()
            .enumerate()
            .map(|(i, &a)| f(a, rhs[i % period]))
            .collect();
        Ok(Tensor::from_parts(self.shape().clone(), data))
    }

    /// Element-wise sum with broadcasting.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Tensor;
    /// let x = Tensor::from_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    /// let bias = Tensor::from_vec([3], vec![10.0, 20.0, 30.0]).unwrap();
    /// let y = x.add(&bias).unwrap();
    /// assert_eq!(y.data(), &[11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    /// ```
    pub fn add(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.broadcast_with(other, "add", |a, b| a + b)
    }

    /// Element-wise difference with broadcasting.
    pub fn sub(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.broadcast_with(other, "sub", |a, b| a - b)
    }

    /// Element-wise product with broadcasting.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.broadcast_with(other, "mul", |a, b| a * b)
    }

    /// Element-wise quotient with broadcasting.
    pub fn div(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.broadcast_with(other, "div", |a, b| a / b)
    }

    /// `1.0` where `self > other`, `0.0` elsewhere.
    pub fn gt(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.broadcast_with(other, "gt", |a, b| if a > b { 1.0 } else { 0.0 })
    }

    /// `1.0` where `self < other`, `0.0` elsewhere.
    pub fn lt(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.broadcast_with(other, "lt", |a, b| if a < b { 1.0 } else { 0.0 })
    }

    /// `1.0` where an element exceeds `value`, `0.0` elsewhere.
    pub fn gt_scalar(&self, value: f32) -> Tensor {
        self.map(|a| if a > value { 1.0 } else { 0.0 })
    }

    /// `1.0` where an element is below `value`, `0.0` elsewhere.
    pub fn lt_scalar(&self, value: f32) -> Tensor {
        self.map(|a| if a < value { 1.0 } else { 0.0 })
    }

    /// In-place `self += other` with broadcasting.
    ///
    /// This is the only tensor-tensor operator that mutates its receiver; it
    /// backs gradient accumulation across the samples of a batch.
    pub fn accumulate(&mut self, other: &Tensor) -> Result<(), TensorError> {
        self.check_broadcast(other, "accumulate")?;
        let rhs = other.data();
        let period = rhs.len();
        for (i, a) in self.data_mut().iter_mut().enumerate() {
            *a += rhs[i % period];
        }
        Ok(())
    }

    /// Multiplies every element by `factor`.
    pub fn scale(&self, factor: f32) -> Tensor {
        self.map(|a| a * factor)
    }
}

macro_rules! scalar_ops {
    ($trait:ident, $method:ident, $tensor_scalar:expr, $scalar_tensor:expr) => {
        impl $trait<f32> for &Tensor {
            type Output = Tensor;

            fn $method(self, rhs: f32) -> Tensor {
                let f: fn(f32, f32) -> f32 = $tensor_scalar;
                self.map(|a| f(a, rhs))
            }
        }

        impl $trait<&Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, rhs: &Tensor) -> Tensor {
                let f: fn(f32, f32) -> f32 = $scalar_tensor;
                rhs.map(|a| f(self, a))
            }
        }

        impl $trait<Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, rhs: Tensor) -> Tensor {
                <f32 as $trait<&Tensor>>::$method(self, &rhs)
            }
        }
    };
}

scalar_ops!(Add, add, |a, s| a + s, |s, a| s + a);
scalar_ops!(Sub, sub, |a, s| a - s, |s, a| s - a);
scalar_ops!(Mul, mul, |a, s| a * s, |s, a| s * a);
scalar_ops!(Div, div, |a, s| a / s, |s, a| s / a);

impl Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        self.map(|a| -a)
    }
}

impl Neg for Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        -&self
    }
}

/// Convenience for building a one-element right operand.
impl From<f32> for Tensor {
    fn from(value: f32) -> Self {
        Tensor::from_parts(Shape::scalar(), vec![value])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(dims: &[usize], data: &[f32]) -> Tensor {
        Tensor::from_slice(dims, data).unwrap()
    }

    #[test]
    fn test_same_shape() {
        let a = t(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        let b = t(&[2, 2], &[4.0, 3.0, 2.0, 1.0]);
        assert_eq!(a.add(&b).unwrap().data(), &[5.0, 5.0, 5.0, 5.0]);
        assert_eq!(a.sub(&b).unwrap().data(), &[-3.0, -1.0, 1.0, 3.0]);
        assert_eq!(a.mul(&b).unwrap().data(), &[4.0, 6.0, 6.0, 4.0]);
        assert_eq!(a.div(&b).unwrap().data(), &[0.25, 2.0 / 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_scalar_operand() {
        let a = t(&[3], &[1.0, 2.0, 3.0]);
        let s = Tensor::scalar(2.0);
        assert_eq!(a.mul(&s).unwrap().data(), &[2.0, 4.0, 6.0]);
        assert_eq!(a.sub(&s).unwrap().data(), &[-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_trailing_broadcast_is_uniform_across_ops() {
        let a = t(&[2, 2, 2], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let b = t(&[2], &[1.0, 2.0]);
        assert_eq!(
            a.add(&b).unwrap().data(),
            &[2.0, 4.0, 4.0, 6.0, 6.0, 8.0, 8.0, 10.0]
        );
        assert_eq!(
            a.sub(&b).unwrap().data(),
            &[0.0, 0.0, 2.0, 2.0, 4.0, 4.0, 6.0, 6.0]
        );
        assert_eq!(
            a.mul(&b).unwrap().data(),
            &[1.0, 4.0, 3.0, 8.0, 5.0, 12.0, 7.0, 16.0]
        );
        assert_eq!(
            a.div(&b).unwrap().data(),
            &[1.0, 1.0, 3.0, 2.0, 5.0, 3.0, 7.0, 4.0]
        );
    }

    #[test]
    fn test_incompatible_shapes() {
        let a = t(&[2, 3], &[0.0; 6]);
        let b = t(&[2], &[0.0; 2]);
        for result in [a.add(&b), a.sub(&b), a.mul(&b), a.div(&b), a.gt(&b)] {
            assert!(matches!(result, Err(TensorError::ShapeMismatch { .. })));
        }
    }

    #[test]
    fn test_scalar_ops_both_orders() {
        let a = t(&[3], &[1.0, 2.0, 4.0]);
        assert_eq!((&a + 1.0).data(), &[2.0, 3.0, 5.0]);
        assert_eq!((&a - 1.0).data(), &[0.0, 1.0, 3.0]);
        assert_eq!((10.0 - &a).data(), &[9.0, 8.0, 6.0]);
        assert_eq!((&a * 2.0).data(), &[2.0, 4.0, 8.0]);
        assert_eq!((&a / 2.0).data(), &[0.5, 1.0, 2.0]);
        assert_eq!((4.0 / &a).data(), &[4.0, 2.0, 1.0]);
        assert_eq!((-&a).data(), &[-1.0, -2.0, -4.0]);
    }

    #[test]
    fn test_comparisons() {
        let a = t(&[2, 2], &[1.0, 5.0, 3.0, 0.0]);
        let b = t(&[2], &[2.0, 2.0]);
        assert_eq!(a.gt(&b).unwrap().data(), &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(a.lt(&b).unwrap().data(), &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(a.gt_scalar(1.0).data(), &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(a.lt_scalar(1.0).data(), &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(a.gt(&b).unwrap().dims(), a.dims());
    }

    #[test]
    fn test_accumulate() {
        let mut acc = Tensor::zeros([2, 2]).unwrap();
        let g = t(&[2, 2], &[1.0, 2.0, 3.0, 4.0]);
        acc.accumulate(&g).unwrap();
        acc.accumulate(&g).unwrap();
        assert_eq!(acc.data(), &[2.0, 4.0, 6.0, 8.0]);
        assert!(acc.accumulate(&Tensor::zeros([3]).unwrap()).is_err());
    }
}
