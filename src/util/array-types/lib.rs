/* ************************************************************************ **
** This file is part of swfit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of swfit is provided under this permissive         **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! A small fixed-size vector type for the three-dimensional quantities
//! that appear in neighbor lists and force accumulators.
//!
//! Only the operations actually needed by a force field are provided.
//! Everything is specialized to `f64`.

use std::fmt;
use std::ops::{Add, Sub, Neg, Mul, Div, AddAssign, SubAssign, MulAssign};
use std::ops::{Deref, DerefMut};

/// A 3-dimensional vector with operations for linear algebra.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct V3<X=f64>(pub [X; 3]);

impl<X> Deref for V3<X> {
    type Target = [X; 3];

    #[inline(always)]
    fn deref(&self) -> &Self::Target
    { &self.0 }
}

impl<X> DerefMut for V3<X> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target
    { &mut self.0 }
}

// forward the debug impl without a surrounding "V3(...)", so that debug output
// of vectors and nested arrays is valid JSON
impl<X: fmt::Debug> fmt::Debug for V3<X> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    { fmt::Debug::fmt(&self.0, f) }
}

impl V3 {
    #[inline(always)]
    pub fn zero() -> Self { V3([0.0; 3]) }

    #[inline(always)]
    pub fn from_fn(mut f: impl FnMut(usize) -> f64) -> Self
    { V3([f(0), f(1), f(2)]) }

    #[inline(always)]
    pub fn map(&self, mut f: impl FnMut(f64) -> f64) -> Self
    { V3([f(self[0]), f(self[1]), f(self[2])]) }

    /// Get the inner product of two vectors.
    ///
    /// It is recommended you write this as `V3::dot(a, b)`, rather than `a.dot(b)`.
    #[inline(always)]
    pub fn dot(&self, other: &V3) -> f64
    { self[0] * other[0] + self[1] * other[1] + self[2] * other[2] }

    /// Get the vector's squared magnitude.
    #[inline(always)]
    pub fn sqnorm(&self) -> f64 { self.dot(self) }

    /// Get the vector's magnitude.
    #[inline(always)]
    pub fn norm(&self) -> f64 { self.sqnorm().sqrt() }

    /// Normalize the vector.
    ///
    /// The output for a zero vector is unspecified (it will contain NaNs).
    #[inline(always)]
    pub fn unit(&self) -> V3 { *self / self.norm() }
}

/// Free-function form of `V3::dot`.
#[inline(always)]
pub fn dot(a: &V3, b: &V3) -> f64 { a.dot(b) }

//------------------------------------------------------------------------

impl Add for V3 {
    type Output = V3;

    #[inline]
    fn add(self, other: V3) -> V3 { V3::from_fn(|k| self[k] + other[k]) }
}

impl Sub for V3 {
    type Output = V3;

    #[inline]
    fn sub(self, other: V3) -> V3 { V3::from_fn(|k| self[k] - other[k]) }
}

impl Neg for V3 {
    type Output = V3;

    #[inline]
    fn neg(self) -> V3 { self.map(|x| -x) }
}

impl Mul<f64> for V3 {
    type Output = V3;

    #[inline]
    fn mul(self, scale: f64) -> V3 { self.map(|x| x * scale) }
}

impl Mul<V3> for f64 {
    type Output = V3;

    #[inline]
    fn mul(self, v: V3) -> V3 { v * self }
}

impl Div<f64> for V3 {
    type Output = V3;

    #[inline]
    fn div(self, scale: f64) -> V3 { self.map(|x| x / scale) }
}

impl AddAssign for V3 {
    #[inline]
    fn add_assign(&mut self, other: V3) { *self = *self + other; }
}

impl SubAssign for V3 {
    #[inline]
    fn sub_assign(&mut self, other: V3) { *self = *self - other; }
}

impl MulAssign<f64> for V3 {
    #[inline]
    fn mul_assign(&mut self, scale: f64) { *self = *self * scale; }
}

impl std::iter::Sum for V3 {
    fn sum<I: Iterator<Item=V3>>(iter: I) -> V3
    { iter.fold(V3::zero(), |acc, v| acc + v) }
}

//------------------------------------------------------------------------

/// Zero-cost transformations from sequences of `[f64; 3]` into sequences of `V3`.
///
/// This is how flat force buffers (viewed as `[[f64; 3]]` through `slice_of_array`)
/// get borrowed as vectors.
///
/// # Safety
///
/// Implementations must only be provided for types where a pointer cast between
/// `Self` and `Self::En` is valid.
pub unsafe trait Envee {
    type En: ?Sized;

    /// Borrow a sequence of arrays as `V3`s.
    fn envee_ref(&self) -> &Self::En;

    /// Mutably borrow a sequence of arrays as `V3`s.
    fn envee_mut(&mut self) -> &mut Self::En;
}

/// Zero-cost transformations from sequences of `V3` into sequences of `[f64; 3]`.
///
/// # Safety
///
/// See `Envee`.
pub unsafe trait Unvee {
    type Un: ?Sized;

    /// Borrow a sequence of `V3`s as arrays.
    fn unvee_ref(&self) -> &Self::Un;
}

// `V3` is `repr(transparent)` over `[X; 3]`, so these casts preserve layout.
unsafe impl<X> Envee for [[X; 3]] {
    type En = [V3<X>];

    #[inline(always)]
    fn envee_ref(&self) -> &[V3<X>]
    { unsafe { &*(self as *const [[X; 3]] as *const [V3<X>]) } }

    #[inline(always)]
    fn envee_mut(&mut self) -> &mut [V3<X>]
    { unsafe { &mut *(self as *mut [[X; 3]] as *mut [V3<X>]) } }
}

unsafe impl<X> Unvee for [V3<X>] {
    type Un = [[X; 3]];

    #[inline(always)]
    fn unvee_ref(&self) -> &[[X; 3]]
    { unsafe { &*(self as *const [V3<X>] as *const [[X; 3]]) } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = V3([1.0, 2.0, 3.0]);
        let b = V3([-1.0, 0.5, 2.0]);
        assert_eq!(a + b, V3([0.0, 2.5, 5.0]));
        assert_eq!(a - b, V3([2.0, 1.5, 1.0]));
        assert_eq!(2.0 * a, a * 2.0);
        assert_eq!(-a, V3([-1.0, -2.0, -3.0]));
        assert_eq!(V3::dot(&a, &b), -1.0 + 1.0 + 6.0);
        assert_eq!(V3([3.0, 4.0, 0.0]).norm(), 5.0);
        assert_eq!(vec![a, b, -a].into_iter().sum::<V3>(), b);
    }

    #[test]
    fn envee_roundtrip_in_place() {
        let mut arrays = vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        arrays.envee_mut()[1] += V3([1.0, 1.0, 1.0]);
        assert_eq!(arrays[1], [5.0, 6.0, 7.0]);
        assert_eq!(arrays.envee_ref().unvee_ref(), &arrays[..]);
    }
}
