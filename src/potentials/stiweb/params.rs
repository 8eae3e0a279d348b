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

//! Interpretation of the flat parameter vector.
//!
//! The optimizer only ever sees a `&[f64]`.  The layout, for `N` pair-type columns
//! and `T` atom types, is:
//!
//! ```text
//! [A B p q delta a1 _ _] x N      two-body parameters   (offset 8*col)
//! [gamma a2 _ _]         x N      three-body cutoffs    (offset 8*N + 4*col)
//! [lambda]               x T^3    three-body strengths  (offset 12*N + (i*T + j)*T + k)
//! ```
//!
//! where `_` slots are reserved and never read.

#![allow(non_snake_case)]

/// Number of slots per column in the two-body block.
pub const PAIR_STRIDE: usize = 8;
/// Number of slots per column in the three-body cutoff block.
pub const CUTOFF_STRIDE: usize = 4;

/// Number of unordered pairs of atom types.
pub fn num_pair_cols(ntypes: usize) -> usize { ntypes * (ntypes + 1) / 2 }

/// Pair-type column for an unordered pair of atom types.
///
/// Columns enumerate `(0,0), (0,1), ..., (0,T-1), (1,1), (1,2), ...`.
pub fn pair_col(ntypes: usize, a: usize, b: usize) -> usize {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    debug_assert!(hi < ntypes);
    lo * ntypes + hi - lo * (lo + 1) / 2
}

/// One of the named two-body parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PairParam { A, B, P, Q, Delta, A1 }

impl PairParam {
    pub const ALL: [PairParam; 6] = [
        PairParam::A, PairParam::B, PairParam::P,
        PairParam::Q, PairParam::Delta, PairParam::A1,
    ];

    fn offset(self) -> usize {
        match self {
            PairParam::A => 0,
            PairParam::B => 1,
            PairParam::P => 2,
            PairParam::Q => 3,
            PairParam::Delta => 4,
            PairParam::A1 => 5,
        }
    }
}

/// One of the named three-body cutoff parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CutoffParam { Gamma, A2 }

impl CutoffParam {
    fn offset(self) -> usize {
        match self {
            CutoffParam::Gamma => 0,
            CutoffParam::A2 => 1,
        }
    }
}

/// What lives at a given index of the parameter vector.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    Pair { col: usize, param: PairParam },
    Cutoff { col: usize, param: CutoffParam },
    Lambda { types: [usize; 3] },
    Reserved,
}

/// The dimensions that determine the parameter layout.  Fixed for a run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ParamShape {
    pub ntypes: usize,
    pub ncols: usize,
}

impl ParamShape {
    /// Shape with one column for every unordered pair of types.
    pub fn new(ntypes: usize) -> Self {
        ParamShape { ntypes, ncols: num_pair_cols(ntypes) }
    }

    pub fn pair_index(&self, col: usize, param: PairParam) -> usize {
        debug_assert!(col < self.ncols);
        PAIR_STRIDE * col + param.offset()
    }

    pub fn cutoff_index(&self, col: usize, param: CutoffParam) -> usize {
        debug_assert!(col < self.ncols);
        PAIR_STRIDE * self.ncols + CUTOFF_STRIDE * col + param.offset()
    }

    pub fn lambda_index(&self, i: usize, j: usize, k: usize) -> usize {
        let t = self.ntypes;
        debug_assert!(i < t && j < t && k < t);
        (PAIR_STRIDE + CUTOFF_STRIDE) * self.ncols + (i * t + j) * t + k
    }

    /// Expected length of the parameter vector.
    pub fn len(&self) -> usize {
        let t = self.ntypes;
        (PAIR_STRIDE + CUTOFF_STRIDE) * self.ncols + t * t * t
    }

    /// Describe the slot at an index.  Panics if `index >= self.len()`.
    pub fn slot(&self, index: usize) -> Slot {
        assert!(index < self.len(), "parameter index {} out of range", index);

        let pair_end = PAIR_STRIDE * self.ncols;
        let cutoff_end = pair_end + CUTOFF_STRIDE * self.ncols;
        if index < pair_end {
            let (col, offset) = (index / PAIR_STRIDE, index % PAIR_STRIDE);
            match PairParam::ALL.get(offset) {
                Some(&param) => Slot::Pair { col, param },
                None => Slot::Reserved,
            }
        } else if index < cutoff_end {
            let rel = index - pair_end;
            let (col, offset) = (rel / CUTOFF_STRIDE, rel % CUTOFF_STRIDE);
            match offset {
                0 => Slot::Cutoff { col, param: CutoffParam::Gamma },
                1 => Slot::Cutoff { col, param: CutoffParam::A2 },
                _ => Slot::Reserved,
            }
        } else {
            let t = self.ntypes;
            let rel = index - cutoff_end;
            Slot::Lambda { types: [rel / (t * t), (rel / t) % t, rel % t] }
        }
    }
}

//------------------------------------------------------------------------

/// Offset tables into the parameter vector.
///
/// These are derived once for every distinct parameter vector that the layout is
/// synchronized with, and reused as long as the optimizer keeps handing us the same
/// buffer.  Use [`ParamLayout::sync`] to obtain a [`ParamView`].
#[derive(Debug, Clone)]
pub struct ParamLayout {
    shape: ParamShape,
    // allocated on first sync; never resized afterwards
    tables: Option<Tables>,
    // base address and length of the vector the tables were last derived for
    identity: Option<(usize, usize)>,
    num_rebuilds: usize,
}

#[derive(Debug, Clone)]
struct Tables {
    ntypes: usize,
    pair: Vec<[usize; 6]>,
    cutoff: Vec<[usize; 2]>,
    lambda: Vec<usize>,
}

impl ParamLayout {
    pub fn new(shape: ParamShape) -> Self {
        ParamLayout { shape, tables: None, identity: None, num_rebuilds: 0 }
    }

    pub fn shape(&self) -> ParamShape { self.shape }

    /// How many times the offset tables have been (re)derived.
    pub fn num_rebuilds(&self) -> usize { self.num_rebuilds }

    /// Forget which vector the tables belong to, so that the next `sync` rebuilds them.
    ///
    /// Used when something about the parameters changed beyond their values.
    pub fn forget(&mut self) { self.identity = None; }

    /// Borrow the parameter vector through this layout.
    ///
    /// This is a no-op apart from constructing the view if `params` is the same buffer
    /// (same address and length) as in the previous call.
    ///
    /// The length of `params` must match `self.shape().len()`.  This is only checked
    /// in debug builds.
    pub fn sync<'a>(&'a mut self, params: &'a [f64]) -> ParamView<'a> {
        debug_assert_eq!(params.len(), self.shape.len(), "parameter vector has wrong length");

        let identity = (params.as_ptr() as usize, params.len());
        if self.identity != Some(identity) {
            self.rebuild();
            self.identity = Some(identity);
        }

        let tables = match &self.tables {
            Some(tables) => tables,
            None => unreachable!("tables are allocated by rebuild"),
        };
        ParamView { tables, params }
    }

    fn rebuild(&mut self) {
        let shape = self.shape;
        let ParamShape { ntypes, ncols } = shape;
        debug!("Deriving parameter offsets ({} columns, {} types)", ncols, ntypes);

        let tables = self.tables.get_or_insert_with(|| Tables {
            ntypes,
            pair: vec![[0; 6]; ncols],
            cutoff: vec![[0; 2]; ncols],
            lambda: vec![0; ntypes * ntypes * ntypes],
        });

        for col in 0..ncols {
            for (slot, &param) in tables.pair[col].iter_mut().zip(&PairParam::ALL) {
                *slot = shape.pair_index(col, param);
            }
            tables.cutoff[col] = [
                shape.cutoff_index(col, CutoffParam::Gamma),
                shape.cutoff_index(col, CutoffParam::A2),
            ];
        }
        for i in 0..ntypes {
            for j in 0..ntypes {
                for k in 0..ntypes {
                    tables.lambda[(i * ntypes + j) * ntypes + k] = shape.lambda_index(i, j, k);
                }
            }
        }
        self.num_rebuilds += 1;
    }
}

/// Typed accessors into a borrowed parameter vector.
#[derive(Debug, Copy, Clone)]
pub struct ParamView<'a> {
    tables: &'a Tables,
    params: &'a [f64],
}

macro_rules! pair_accessors {
    ($($name:ident => $i:expr,)*) => {$(
        #[inline(always)]
        pub fn $name(&self, col: usize) -> f64 { self.params[self.tables.pair[col][$i]] }
    )*};
}

impl<'a> ParamView<'a> {
    pair_accessors! {
        A => 0,
        B => 1,
        p => 2,
        q => 3,
        delta => 4,
        a1 => 5,
    }

    /// Smoothing length of the three-body cutoff.
    #[inline(always)]
    pub fn gamma(&self, col: usize) -> f64 { self.params[self.tables.cutoff[col][0]] }

    /// Three-body cutoff radius.
    #[inline(always)]
    pub fn a2(&self, col: usize) -> f64 { self.params[self.tables.cutoff[col][1]] }

    /// Three-body coupling for a center atom of type `i` with neighbors of types `j` and `k`.
    #[inline(always)]
    pub fn lambda(&self, i: usize, j: usize, k: usize) -> f64 {
        let t = self.ntypes();
        self.params[self.tables.lambda[(i * t + j) * t + k]]
    }

    #[inline(always)]
    pub fn ntypes(&self) -> usize { self.tables.ntypes }

    pub fn params(&self) -> &'a [f64] { self.params }
}

//------------------------------------------------------------------------

/// Stillinger-Weber parameters for one pair-type column, in the form used by the
/// parameter vector.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PairParams {
    pub A: f64,
    pub B: f64,
    pub p: f64,
    pub q: f64,
    pub delta: f64,
    pub a1: f64,
    pub gamma: f64,
    pub a2: f64,
}

impl PairParams {
    /// Convert from the conventional reduced form
    ///
    /// ```text
    /// v2(r) = eps * A * (B * (sigma/r)^p - (sigma/r)^q) * exp(sigma / (r - a*sigma))
    /// ```
    ///
    /// with three-body factor `exp(gamma*sigma / (r - a*sigma))`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_reduced(
        epsilon: f64, sigma: f64, a: f64, gamma: f64,
        A: f64, B: f64, p: f64, q: f64,
    ) -> Self {
        PairParams {
            A: epsilon * A * B * sigma.powf(p),
            B: epsilon * A * sigma.powf(q),
            p, q,
            delta: sigma,
            a1: a * sigma,
            gamma: gamma * sigma,
            a2: a * sigma,
        }
    }

    /// The original Stillinger-Weber parametrization for silicon (eV, Angstrom).
    pub fn silicon() -> Self {
        PairParams::from_reduced(2.1683, 2.0951, 1.80, 1.20, 7.049556277, 0.6022245584, 4.0, 0.0)
    }

    /// Three-body strength that accompanies `silicon`.
    pub const SILICON_LAMBDA: f64 = 21.0 * 2.1683;
}

/// A complete, typed parameter set.  Mostly useful for constructing parameter vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSet {
    pub ntypes: usize,
    /// One entry per pair-type column.
    pub pairs: Vec<PairParams>,
    /// `ntypes^3` entries, indexed by `(i * ntypes + j) * ntypes + k`.
    pub lambda: Vec<f64>,
}

impl ParamSet {
    /// Every column gets the same parameters, and every triple the same lambda.
    pub fn uniform(ntypes: usize, pair: PairParams, lambda: f64) -> Self {
        ParamSet {
            ntypes,
            pairs: vec![pair; num_pair_cols(ntypes)],
            lambda: vec![lambda; ntypes * ntypes * ntypes],
        }
    }

    pub fn shape(&self) -> ParamShape { ParamShape::new(self.ntypes) }

    pub fn set_lambda(&mut self, [i, j, k]: [usize; 3], value: f64) {
        let t = self.ntypes;
        self.lambda[(i * t + j) * t + k] = value;
    }

    /// Produce the flat parameter vector.  Reserved slots are zero.
    pub fn to_flat(&self) -> Vec<f64> {
        let shape = self.shape();
        assert_eq!(self.pairs.len(), shape.ncols);
        assert_eq!(self.lambda.len(), self.ntypes.pow(3));

        let mut out = vec![0.0; shape.len()];
        for (col, pair) in self.pairs.iter().enumerate() {
            let values = [pair.A, pair.B, pair.p, pair.q, pair.delta, pair.a1];
            for (&param, &value) in PairParam::ALL.iter().zip(&values) {
                out[shape.pair_index(col, param)] = value;
            }
            out[shape.cutoff_index(col, CutoffParam::Gamma)] = pair.gamma;
            out[shape.cutoff_index(col, CutoffParam::A2)] = pair.a2;
        }
        let t = self.ntypes;
        for i in 0..t {
            for j in 0..t {
                for k in 0..t {
                    out[shape.lambda_index(i, j, k)] = self.lambda[(i * t + j) * t + k];
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_cols_are_dense_and_symmetric() {
        for ntypes in 1..5 {
            let mut cols = vec![];
            for a in 0..ntypes {
                for b in a..ntypes {
                    assert_eq!(pair_col(ntypes, a, b), pair_col(ntypes, b, a));
                    cols.push(pair_col(ntypes, a, b));
                }
            }
            assert_eq!(cols, (0..num_pair_cols(ntypes)).collect::<Vec<_>>());
        }
    }

    #[test]
    fn layout_offsets() {
        let shape = ParamShape::new(2);
        assert_eq!(shape.ncols, 3);
        assert_eq!(shape.len(), 12 * 3 + 8);
        assert_eq!(shape.pair_index(1, PairParam::A1), 13);
        assert_eq!(shape.cutoff_index(0, CutoffParam::Gamma), 24);
        assert_eq!(shape.cutoff_index(2, CutoffParam::A2), 33);
        assert_eq!(shape.lambda_index(0, 0, 0), 36);
        assert_eq!(shape.lambda_index(1, 0, 1), 41);

        assert_eq!(shape.slot(13), Slot::Pair { col: 1, param: PairParam::A1 });
        assert_eq!(shape.slot(14), Slot::Reserved);
        assert_eq!(shape.slot(33), Slot::Cutoff { col: 2, param: CutoffParam::A2 });
        assert_eq!(shape.slot(34), Slot::Reserved);
        assert_eq!(shape.slot(41), Slot::Lambda { types: [1, 0, 1] });
    }

    #[test]
    fn view_reads_flat_vector() {
        let mut set = ParamSet::uniform(2, PairParams::silicon(), 0.0);
        set.pairs[2].a1 = 4.5;
        set.pairs[1].gamma = 7.0;
        set.set_lambda([1, 1, 0], 3.0);
        let flat = set.to_flat();

        let mut layout = ParamLayout::new(set.shape());
        let view = layout.sync(&flat);
        assert_eq!(view.a1(2), 4.5);
        assert_eq!(view.gamma(1), 7.0);
        assert_eq!(view.A(0), PairParams::silicon().A);
        assert_eq!(view.lambda(1, 1, 0), 3.0);
        assert_eq!(view.lambda(0, 1, 1), 0.0);
        assert_eq!(view.ntypes(), 2);
    }

    #[test]
    fn view_is_reused_until_buffer_changes() {
        let set = ParamSet::uniform(1, PairParams::silicon(), 1.0);
        let mut flat = set.to_flat();
        let mut layout = ParamLayout::new(set.shape());

        layout.sync(&flat);
        assert_eq!(layout.num_rebuilds(), 1);

        // changing values in place keeps the identity
        flat[0] += 1.0;
        assert_eq!(layout.sync(&flat).A(0), set.pairs[0].A + 1.0);
        assert_eq!(layout.num_rebuilds(), 1);

        // a different buffer forces a rebuild
        let other = flat.clone();
        layout.sync(&other);
        assert_eq!(layout.num_rebuilds(), 2);

        layout.forget();
        layout.sync(&other);
        assert_eq!(layout.num_rebuilds(), 3);
    }
}
