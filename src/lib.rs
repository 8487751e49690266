#[cfg(feature = "blas")]
extern crate blas_src;  // Force linker to include BLAS implementation

pub mod traits;
pub mod dense;
pub mod error;
pub mod stats;
pub mod incidence;
pub mod counter;

#[cfg(test)]
mod brute;

pub use traits::*;
pub use dense::*;
pub use error::{Error, Result};
pub use stats::*;
pub use counter::*;
