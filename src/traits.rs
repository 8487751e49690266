/// Kernel behind every dense matrix product.
///
/// Implementations compute `c = a · b` where `a` is row-major with row stride `lda`
/// and `inner` logical columns, and `b` and `c` share the row stride `width`.
/// The number of output rows is `c.len() / width`. `c` is zero on entry.
///
/// Every operand the cycle recursion feeds in is integer-valued, so any
/// summation order yields the same exact result; implementations must still
/// not depend on thread scheduling.
pub trait ProductStrategy: Default + Copy + Send + Sync {
    fn gemm(a: &[f64], lda: usize, inner: usize, b: &[f64], width: usize, c: &mut [f64]);
}

pub trait FromRng {
    /// Random 0/1 matrix where roughly `density` of the entries are set.
    fn with_density(rng: &mut impl rand::Rng, dimensions: &[usize], density: f32) -> Self;
}
