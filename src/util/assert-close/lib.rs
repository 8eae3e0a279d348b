//! Approximate floating point comparisons for tests.
//!
//! ```
//! # #[macro_use] extern crate swfit_assert_close;
//! # fn main() {
//! assert_close!(1.0, 1.0 + 1e-12);
//! assert_close!(rel=1e-6, abs=1e-9, [1.0, 0.0], [1.0 + 1e-8, 1e-10]);
//! # }
//! ```

#[macro_use]
extern crate failure;

use std::fmt;

/// Relative tolerance used when none is given.
pub const DEFAULT_REL_TOL: f64 = 1e-9;

/// Panic unless two values (floats, or arrays/slices/Vecs of them) are close.
///
/// Leading `rel=` and `abs=` arguments (in either order) override the tolerances,
/// which default to `rel=DEFAULT_REL_TOL, abs=0`. Trailing arguments are a format
/// string for the panic message.
#[macro_export]
macro_rules! assert_close {
    (rel=$rel:expr, abs=$abs:expr, $($rest:tt)+) => {
        $crate::__assert_close_with!{[$rel, $abs] $($rest)+}
    };
    (abs=$abs:expr, rel=$rel:expr, $($rest:tt)+) => {
        $crate::__assert_close_with!{[$rel, $abs] $($rest)+}
    };
    (rel=$rel:expr, $($rest:tt)+) => {
        $crate::__assert_close_with!{[$rel, 0.0] $($rest)+}
    };
    (abs=$abs:expr, $($rest:tt)+) => {
        $crate::__assert_close_with!{[$crate::DEFAULT_REL_TOL, $abs] $($rest)+}
    };
    ($($rest:tt)+) => {
        $crate::__assert_close_with!{[$crate::DEFAULT_REL_TOL, 0.0] $($rest)+}
    };
}

/// `assert_close!` that is only checked in debug builds.
#[macro_export]
macro_rules! debug_assert_close {
    ($($t:tt)*) => {{
        #[cfg(debug_assertions)] {
            $crate::assert_close!{$($t)*}
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __assert_close_with {
    ([$rel:expr, $abs:expr] $a:expr, $b:expr $(,)?) => {
        $crate::__assert_close_with!{[$rel, $abs] $a, $b, "not nearly equal!"}
    };
    ([$rel:expr, $abs:expr] $a:expr, $b:expr, $($fmt:tt)+) => {{
        let tol = $crate::Tolerances { rel: $rel, abs: $abs };
        if let Err(e) = $crate::CheckClose::check_close(&$a, &$b, tol) {
            panic!("{} ({})\n{}", format!($($fmt)+), tol, e);
        }
    }};
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tolerances {
    pub rel: f64,
    pub abs: f64,
}

impl fmt::Display for Tolerances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    { write!(f, "tolerances: rel={}, abs={}", self.rel, self.abs) }
}

impl Tolerances {
    /// Symmetric closeness test in the style of Python's `math.isclose`.
    #[inline]
    pub fn accepts(&self, a: f64, b: f64) -> bool {
        assert!(self.rel >= 0.0 && self.abs >= 0.0, "negative tolerance");

        // equal infinities, and exact matches in general
        if a == b { return true; }
        if a.is_infinite() || b.is_infinite() { return false; }

        // (NaN falls through to a false comparison)
        (a - b).abs() <= self.abs.max(self.rel * a.abs().max(b.abs()))
    }
}

/// The first mismatched element found by a `CheckClose` impl.
#[derive(Debug, Fail)]
pub struct NotCloseError {
    /// Position of the element within flattened nested sequences.
    pub index: Option<usize>,
    pub left: f64,
    pub right: f64,
}

impl fmt::Display for NotCloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = self.index {
            write!(f, "first mismatch at element {}:\n", index)?;
        }
        write!(f, "  left: {:?}\n right: {:?}", self.left, self.right)
    }
}

pub trait CheckClose<Rhs: ?Sized = Self> {
    /// Test that all values of self and other are close.
    fn check_close(&self, other: &Rhs, tol: Tolerances) -> Result<(), NotCloseError>;
}

impl CheckClose for f64 {
    fn check_close(&self, other: &f64, tol: Tolerances) -> Result<(), NotCloseError> {
        match tol.accepts(*self, *other) {
            true => Ok(()),
            false => Err(NotCloseError { index: None, left: *self, right: *other }),
        }
    }
}

impl<'a, T: ?Sized + CheckClose> CheckClose for &'a T {
    fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), NotCloseError>
    { (**self).check_close(*other, tol) }
}

impl<T: CheckClose> CheckClose for [T] {
    fn check_close(&self, other: &[T], tol: Tolerances) -> Result<(), NotCloseError> {
        assert_eq!(self.len(), other.len(), "length mismatch in assert_close");
        for (index, (a, b)) in self.iter().zip(other).enumerate() {
            a.check_close(b, tol).map_err(|e| NotCloseError {
                index: Some(index), ..e
            })?;
        }
        Ok(())
    }
}

impl<T: CheckClose> CheckClose for Vec<T> {
    fn check_close(&self, other: &Vec<T>, tol: Tolerances) -> Result<(), NotCloseError>
    { self[..].check_close(&other[..], tol) }
}

macro_rules! impl_check_close_for_arrays {
    ($($n:tt)*) => {$(
        impl<T: CheckClose> CheckClose for [T; $n] {
            fn check_close(&self, other: &Self, tol: Tolerances) -> Result<(), NotCloseError>
            { self[..].check_close(&other[..], tol) }
        }
    )*};
}

impl_check_close_for_arrays!{ 1 2 3 4 5 6 7 8 9 }

#[cfg(test)]
mod tests {
    #[test]
    fn macro_forms() {
        assert_close!(1.0, 1.0);
        assert_close!(1.0, 1.0,);
        assert_close!(abs=1e-8, 0.0, 1e-9);
        assert_close!(rel=1e-8, 1e8, 1e8 + 0.5);
        assert_close!(rel=1e-8, abs=1e-8, 1.0, 1.0);
        assert_close!(abs=1e-8, rel=1e-8, 1.0, 1.0, "{} message", "custom");
        assert_close!(vec![[1.0, 2.0, 3.0]], vec![[1.0, 2.0, 3.0]]);
        debug_assert_close!(rel=1e-3, 1.0, 1.0001);
    }

    #[test]
    fn nan_is_never_close() {
        let tol = crate::Tolerances { rel: 1.0, abs: 1.0 };
        assert!(!tol.accepts(std::f64::NAN, std::f64::NAN));
        assert!(tol.accepts(std::f64::INFINITY, std::f64::INFINITY));
        assert!(!tol.accepts(std::f64::INFINITY, -std::f64::INFINITY));
    }

    #[test]
    #[should_panic(expected = "first mismatch at element 2")]
    fn reports_index() {
        assert_close!(abs=0.0, rel=0.0, [1.0, 2.0, 3.0], [1.0, 2.0, 3.5]);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic)]
    fn debug_not_close() {
        debug_assert_close!(abs=0.0, rel=0.0, 1.0, 1.1);
    }
}
