use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::traits::{FromRng, ProductStrategy};

/// Storage rows are padded to a multiple of this many columns.
const LANES: usize = 4;

#[derive(Default, Clone, Copy, Debug)]
pub struct Serial;
#[derive(Default, Clone, Copy, Debug)]
pub struct Parallel;
#[cfg(feature = "blas")]
#[derive(Default, Clone, Copy, Debug)]
pub struct Blas;

pub type DenseMatrix = DenseMatrixRef<Serial>;
pub type DenseMatrixPar = DenseMatrixRef<Parallel>;
#[cfg(feature = "blas")]
pub type DenseMatrixBlas = DenseMatrixRef<Blas>;

/// Accumulates one output row: `c_row += a_row · b`.
/// Zero entries of `a_row` are skipped; incidence rows are mostly zeros.
#[inline]
fn row_kernel(a_row: &[f64], b: &[f64], width: usize, c_row: &mut [f64]) {
    for (k, &a) in a_row.iter().enumerate() {
        if a == 0.0 {
            continue;
        }
        let b_row = &b[k * width..(k + 1) * width];
        for (c, &b) in c_row.iter_mut().zip(b_row) {
            *c += a * b;
        }
    }
}

impl ProductStrategy for Serial {
    fn gemm(a: &[f64], lda: usize, inner: usize, b: &[f64], width: usize, c: &mut [f64]) {
        if width == 0 {
            return;
        }
        for (i, c_row) in c.chunks_exact_mut(width).enumerate() {
            row_kernel(&a[i * lda..i * lda + inner], b, width, c_row);
        }
    }
}

impl ProductStrategy for Parallel {
    fn gemm(a: &[f64], lda: usize, inner: usize, b: &[f64], width: usize, c: &mut [f64]) {
        if width == 0 {
            return;
        }
        c.par_chunks_exact_mut(width)
            .enumerate()
            .for_each(|(i, c_row)| row_kernel(&a[i * lda..i * lda + inner], b, width, c_row));
    }
}

#[cfg(feature = "blas")]
unsafe extern "C" {
    fn cblas_dgemm(
        order: i32,      // CblasRowMajor=101, CblasColMajor=102
        trans_a: i32,    // CblasNoTrans=111, CblasTrans=112
        trans_b: i32,
        m: i32, n: i32, k: i32,
        alpha: f64,
        a: *const f64, lda: i32,
        b: *const f64, ldb: i32,
        beta: f64,
        c: *mut f64, ldc: i32,
    );
}

#[cfg(feature = "blas")]
impl ProductStrategy for Blas {
    fn gemm(a: &[f64], lda: usize, inner: usize, b: &[f64], width: usize, c: &mut [f64]) {
        const CBLAS_ROW_MAJOR: i32 = 101;
        const CBLAS_NO_TRANS: i32 = 111;

        if width == 0 || inner == 0 || c.is_empty() {
            return;
        }
        let rows = c.len() / width;
        unsafe {
            cblas_dgemm(
                CBLAS_ROW_MAJOR,
                CBLAS_NO_TRANS,
                CBLAS_NO_TRANS,
                rows as i32,
                width as i32,
                inner as i32,
                1.0,
                a.as_ptr(), lda as i32,
                b.as_ptr(), width as i32,
                0.0,
                c.as_mut_ptr(), width as i32,
            );
        }
    }
}

/// Row-major `f64` matrix with logical shape `rows × cols`.
///
/// Each storage row is padded to a multiple of [`LANES`] so the product kernel
/// runs over whole lanes. Padding entries are always zero and never observable.
#[derive(Debug)]
pub struct DenseMatrixRef<S: ProductStrategy = Serial> {
    m: Vec<f64>,
    rows: usize,
    cols: usize,
    stride: usize,
    _strategy: S,
}

impl<S: ProductStrategy> DenseMatrixRef<S> {
    /// Allocates a zeroed matrix, reporting allocation failure instead of aborting.
    pub fn try_zeros(rows: usize, cols: usize) -> Result<Self> {
        let stride = cols.checked_next_multiple_of(LANES).ok_or(Error::Allocation { rows, cols })?;
        let len = rows.checked_mul(stride).ok_or(Error::Allocation { rows, cols })?;
        let mut m = Vec::new();
        m.try_reserve_exact(len).map_err(|_| Error::Allocation { rows, cols })?;
        m.resize(len, 0.0);
        Ok(Self { m, rows, cols, stride, _strategy: S::default() })
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Result<Self> {
        let mut t = Self::try_zeros(rows, cols)?;
        for r in 0..rows {
            for c in 0..cols {
                t.m[r * t.stride + c] = f(r, c);
            }
        }
        Ok(t)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
    pub fn estimate_memory_usage(&self) -> usize {
        self.m.len() * core::mem::size_of::<f64>()
    }
    pub fn to_strategy<S2: ProductStrategy>(self, strategy: S2) -> DenseMatrixRef<S2> {
        DenseMatrixRef { m: self.m, rows: self.rows, cols: self.cols, stride: self.stride, _strategy: strategy }
    }

    #[inline]
    fn index(&self, r: usize, c: usize) -> usize {
        assert!(r < self.rows && c < self.cols, "index out of bounds");
        r * self.stride + c
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.m[self.index(r, c)]
    }

    pub fn set(&mut self, r: usize, c: usize, v: f64) {
        let i = self.index(r, c);
        self.m[i] = v;
    }

    /// Logical row `r`, without padding.
    pub fn row(&self, r: usize) -> &[f64] {
        assert!(r < self.rows, "index out of bounds");
        &self.m[r * self.stride..r * self.stride + self.cols]
    }

    pub fn try_clone(&self) -> Result<Self> {
        let mut t = Self::try_zeros(self.rows, self.cols)?;
        t.m.copy_from_slice(&self.m);
        Ok(t)
    }

    pub fn transpose(&self) -> Result<Self> {
        let mut t = Self::try_zeros(self.cols, self.rows)?;
        for r in 0..self.rows {
            for (c, &v) in self.row(r).iter().enumerate() {
                t.m[c * t.stride + r] = v;
            }
        }
        Ok(t)
    }

    /// Full product `self · rhs`.
    pub fn multiply(&self, rhs: &Self) -> Result<Self> {
        assert_eq!(self.cols, rhs.rows, "shape mismatch");
        let mut out = Self::try_zeros(self.rows, rhs.cols)?;
        S::gemm(&self.m, self.stride, self.cols, &rhs.m, rhs.stride, &mut out.m);
        Ok(out)
    }

    /// Only the diagonal of `self · rhs`; every off-diagonal entry is zero.
    pub fn diagonal_product(&self, rhs: &Self) -> Result<Self> {
        assert_eq!(self.cols, rhs.rows, "shape mismatch");
        assert_eq!(self.rows, rhs.cols, "diagonal product of a non-square result");
        let mut out = Self::try_zeros(self.rows, self.rows)?;
        for i in 0..self.rows {
            let acc: f64 = self
                .row(i)
                .iter()
                .enumerate()
                .filter(|&(_, &a)| a != 0.0)
                .map(|(k, &a)| a * rhs.m[k * rhs.stride + i])
                .sum();
            out.m[i * out.stride + i] = acc;
        }
        Ok(out)
    }

    /// `self · rhs` with the diagonal forced to zero.
    pub fn zero_diagonal_product(&self, rhs: &Self) -> Result<Self> {
        let mut out = self.multiply(rhs)?;
        for i in 0..out.rows.min(out.cols) {
            out.m[i * out.stride + i] = 0.0;
        }
        Ok(out)
    }

    pub fn hadamard_assign(&mut self, rhs: &Self) {
        assert_eq!(self.shape(), rhs.shape(), "shape mismatch");
        for (a, &b) in self.m.iter_mut().zip(rhs.m.iter()) {
            *a *= b;
        }
    }

    /// Elementwise product.
    pub fn hadamard(&self, rhs: &Self) -> Result<Self> {
        let mut out = self.try_clone()?;
        out.hadamard_assign(rhs);
        Ok(out)
    }

    pub fn scale(&mut self, f: f64) {
        self.m.iter_mut().for_each(|v| *v *= f);
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Result<Self> {
        let mut out = Self::try_zeros(self.rows, self.cols)?;
        for (o, &v) in out.m.iter_mut().zip(self.m.iter()) {
            *o = f(v);
        }
        Ok(out)
    }

    /// `scale · C(v, 2)` per entry; entries below 2 give 0.
    pub fn choose2(&self, scale: f64) -> Result<Self> {
        self.map(|v| if v > 1.0 { scale * v * (v - 1.0) / 2.0 } else { 0.0 })
    }

    /// `scale · C(v, 3)` per entry; entries below 3 give 0.
    pub fn choose3(&self, scale: f64) -> Result<Self> {
        self.map(|v| if v > 2.0 { scale * v * (v - 1.0) * (v - 2.0) / 6.0 } else { 0.0 })
    }

    pub fn trace(&self) -> f64 {
        assert_eq!(self.rows, self.cols, "trace of a non-square matrix");
        (0..self.rows).map(|i| self.m[i * self.stride + i]).sum()
    }

    pub fn diagonal(&self) -> Vec<f64> {
        assert_eq!(self.rows, self.cols, "diagonal of a non-square matrix");
        (0..self.rows).map(|i| self.m[i * self.stride + i]).collect()
    }
}

impl<S: ProductStrategy> PartialEq for DenseMatrixRef<S> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.m == other.m
    }
}

impl<S: ProductStrategy> AddAssign<&DenseMatrixRef<S>> for DenseMatrixRef<S> {
    fn add_assign(&mut self, rhs: &Self) {
        assert_eq!(self.shape(), rhs.shape(), "shape mismatch");
        for (a, &b) in self.m.iter_mut().zip(rhs.m.iter()) {
            *a += b;
        }
    }
}

impl<S: ProductStrategy> SubAssign<&DenseMatrixRef<S>> for DenseMatrixRef<S> {
    fn sub_assign(&mut self, rhs: &Self) {
        assert_eq!(self.shape(), rhs.shape(), "shape mismatch");
        for (a, &b) in self.m.iter_mut().zip(rhs.m.iter()) {
            *a -= b;
        }
    }
}

impl<S: ProductStrategy> Add<&DenseMatrixRef<S>> for DenseMatrixRef<S> {
    type Output = Self;
    fn add(mut self, rhs: &Self) -> Self {
        self += rhs;
        self
    }
}

impl<S: ProductStrategy> Sub<&DenseMatrixRef<S>> for DenseMatrixRef<S> {
    type Output = Self;
    fn sub(mut self, rhs: &Self) -> Self {
        self -= rhs;
        self
    }
}

impl<S: ProductStrategy> Add for DenseMatrixRef<S> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self + &rhs
    }
}

impl<S: ProductStrategy> Sub for DenseMatrixRef<S> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self - &rhs
    }
}

impl<S: ProductStrategy> Mul<f64> for DenseMatrixRef<S> {
    type Output = Self;
    fn mul(mut self, f: f64) -> Self {
        self.scale(f);
        self
    }
}

impl<S: ProductStrategy> FromRng for DenseMatrixRef<S> {
    fn with_density(rng: &mut impl rand::Rng, dimensions: &[usize], mut density: f32) -> Self {
        assert_eq!(dimensions.len(), 2, "rank mismatch");
        density = density.clamp(0.0, 1.0);
        let (rows, cols) = (dimensions[0], dimensions[1]);
        let stride = cols.next_multiple_of(LANES);
        let mut t = Self { m: vec![0.0; rows * stride], rows, cols, stride, _strategy: S::default() };
        let mut visit_idx = (0..rows * cols).collect::<Vec<usize>>();
        let mut to_fill = (density * visit_idx.len() as f32) as usize;
        while to_fill > 0 {
            let ii = rng.random_range(0..visit_idx.len());
            let i = visit_idx.swap_remove(ii);
            t.m[(i / cols) * stride + i % cols] = 1.0;
            to_fill -= 1;
        }
        t
    }
}
