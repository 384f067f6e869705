// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sub-tensor extraction, write-back, and zero padding.
//!
//! Both selector forms walk the addressed region in odometer order: the last
//! kept axis advances fastest and carries into earlier kept axes. Extraction
//! and write-back share the same walk, so the `k`-th element visited in the
//! receiver always corresponds to flat element `k` of the smaller tensor.

use crate::{Shape, Tensor, TensorError};

/// Per-axis selector for [`Tensor::sub_tensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Fix the axis at one index, collapsing it.
    Index(usize),
    /// Keep the whole axis.
    All,
}

/// Per-axis selector for [`Tensor::sub_tensor_ranges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRange {
    /// Keep the whole axis.
    All,
    /// Fix the axis at one index, collapsing it.
    Index(usize),
    /// Keep the half-open range `[start, end)` of the axis.
    Range(usize, usize),
}

impl From<Selector> for AxisRange {
    fn from(selector: Selector) -> Self {
        match selector {
            Selector::Index(i) => AxisRange::Index(i),
            Selector::All => AxisRange::All,
        }
    }
}

/// Which side(s) of an axis [`Tensor::pad`] enlarges.
///
/// The discriminants are bit flags: `Both == Left | Right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PadSide {
    Left = 0b01,
    Right = 0b10,
    Both = 0b11,
}

impl PadSide {
    /// Returns `true` if padding is added before the data.
    pub fn pads_left(self) -> bool {
        self as u8 & PadSide::Left as u8 != 0
    }

    /// Returns `true` if padding is added after the data.
    pub fn pads_right(self) -> bool {
        self as u8 & PadSide::Right as u8 != 0
    }
}

/// A validated rectangular region of a tensor.
struct Region {
    starts: Vec<usize>,
    extents: Vec<usize>,
    shape: Shape,
}

impl Tensor {
    fn region(&self, op: &'static str, ranges: &[AxisRange]) -> Result<Region, TensorError> {
        let dims = self.dims();
        if ranges.len() != dims.len() {
            return Err(TensorError::IndexCountMismatch {
                op,
                expected: dims.len(),
                actual: ranges.len(),
            });
        }

        let mut starts = Vec::with_capacity(dims.len());
        let mut extents = Vec::with_capacity(dims.len());
        let mut kept = Vec::new();
        for (axis, (range, &dim)) in ranges.iter().zip(dims).enumerate() {
            match *range {
                AxisRange::All => {
                    starts.push(0);
                    extents.push(dim);
                    kept.push(dim);
                }
                AxisRange::Index(index) => {
                    if index >= dim {
                        return Err(TensorError::IndexOutOfBounds {
                            op,
                            axis,
                            index,
                            dim,
                        });
                    }
                    starts.push(index);
                    extents.push(1);
                }
                AxisRange::Range(start, end) => {
                    if start >= end || end > dim {
                        return Err(TensorError::InvalidRange {
                            op,
                            axis,
                            start,
                            end,
                            dim,
                        });
                    }
                    starts.push(start);
                    extents.push(end - start);
                    kept.push(end - start);
                }
            }
        }

        Ok(Region {
            starts,
            extents,
            shape: Shape::new(kept),
        })
    }

    /// Calls `f(k, offset)` for every element of `region`, where `k` counts
    /// visited elements and `offset` is the flat offset in `self`.
    fn walk_region(&self, region: &Region, mut f: impl FnMut(usize, usize)) {
        let strides = self.shape().strides();
        let rank = strides.len();
        let total: usize = region.extents.iter().product();
        let mut counter = vec![0usize; rank];
        let mut offset: usize = region
            .starts
            .iter()
            .zip(&strides)
            .map(|(start, stride)| start * stride)
            .sum();

        for k in 0..total {
            f(k, offset);
            for axis in (0..rank).rev() {
                counter[axis] += 1;
                offset += strides[axis];
                if counter[axis] < region.extents[axis] {
                    break;
                }
                offset -= strides[axis] * counter[axis];
                counter[axis] = 0;
            }
        }
    }

    /// Extracts a sub-tensor with one [`Selector`] per axis.
    ///
    /// The result keeps the axes marked [`Selector::All`] in order; when
    /// every axis is fixed the result is a single-element tensor.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Selector, Tensor};
    /// let t = Tensor::from_vec([2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    /// let row = t.sub_tensor(&[Selector::Index(1), Selector::All]).unwrap();
    /// assert_eq!(row.data(), &[4.0, 5.0, 6.0]);
    /// ```
    pub fn sub_tensor(&self, selectors: &[Selector]) -> Result<Tensor, TensorError> {
        let ranges: Vec<AxisRange> = selectors.iter().map(|&s| s.into()).collect();
        self.sub_tensor_ranges(&ranges)
    }

    /// Extracts a sub-tensor with one [`AxisRange`] per axis.
    ///
    /// `Range` axes are kept with reduced size, `Index` axes collapse.
    pub fn sub_tensor_ranges(&self, ranges: &[AxisRange]) -> Result<Tensor, TensorError> {
        let region = self.region("sub_tensor", ranges)?;
        let src = self.data();
        let mut data = vec![0.0; region.shape.num_elements()];
        self.walk_region(&region, |k, offset| data[k] = src[offset]);
        Ok(Tensor::from_parts(region.shape, data))
    }

    /// Writes `values` into the region addressed by `selectors`.
    ///
    /// This is the inverse of [`sub_tensor`](Tensor::sub_tensor); `values`
    /// must have exactly the shape that extraction would produce.
    pub fn set_sub_tensor(
        &mut self,
        selectors: &[Selector],
        values: &Tensor,
    ) -> Result<(), TensorError> {
        let ranges: Vec<AxisRange> = selectors.iter().map(|&s| s.into()).collect();
        self.set_sub_tensor_ranges(&ranges, values)
    }

    /// Writes `values` into the region addressed by `ranges`.
    pub fn set_sub_tensor_ranges(
        &mut self,
        ranges: &[AxisRange],
        values: &Tensor,
    ) -> Result<(), TensorError> {
        let region = self.region("set_sub_tensor", ranges)?;
        if &region.shape != values.shape() {
            return Err(TensorError::shape_mismatch(
                "set_sub_tensor",
                &region.shape,
                values.shape(),
            ));
        }
        let mut offsets = Vec::with_capacity(values.size());
        self.walk_region(&region, |_, offset| offsets.push(offset));
        let dst = self.data_mut();
        for (&offset, &value) in offsets.iter().zip(values.data()) {
            dst[offset] = value;
        }
        Ok(())
    }

    /// Returns a zero-padded copy.
    ///
    /// For each listed axis, `counts[i]` zeros are added on the side(s)
    /// selected by `sides[i]`. The original data sits at the offset implied
    /// by the left padding.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{PadSide, Tensor};
    /// let t = Tensor::from_vec([2], vec![1.0, 2.0]).unwrap();
    /// let p = t.pad(&[0], &[PadSide::Both], &[1]).unwrap();
    /// assert_eq!(p.data(), &[0.0, 1.0, 2.0, 0.0]);
    /// ```
    pub fn pad(
        &self,
        axes: &[usize],
        sides: &[PadSide],
        counts: &[usize],
    ) -> Result<Tensor, TensorError> {
        if sides.len() != axes.len() || counts.len() != axes.len() {
            return Err(TensorError::IndexCountMismatch {
                op: "pad",
                expected: axes.len(),
                actual: sides.len().min(counts.len()),
            });
        }
        let dims = self.dims();
        let mut left = vec![0usize; dims.len()];
        let mut right = vec![0usize; dims.len()];
        for ((&axis, &side), &count) in axes.iter().zip(sides).zip(counts) {
            if axis >= dims.len() {
                return Err(TensorError::IndexOutOfBounds {
                    op: "pad",
                    axis,
                    index: axis,
                    dim: dims.len(),
                });
            }
            if side.pads_left() {
                left[axis] += count;
            }
            if side.pads_right() {
                right[axis] += count;
            }
        }

        let padded_dims: Vec<usize> = dims
            .iter()
            .zip(left.iter().zip(&right))
            .map(|(&d, (&l, &r))| d + l + r)
            .collect();
        let ranges: Vec<AxisRange> = dims
            .iter()
            .zip(&left)
            .map(|(&d, &l)| AxisRange::Range(l, l + d))
            .collect();

        let mut result = Tensor::zeros(padded_dims)?;
        result.set_sub_tensor_ranges(&ranges, self)?;
        Ok(result)
    }
}
