//! Incidence matrix construction: the two on-disk formats and a few
//! synthetic graph families.
//!
//! Rows index the U vertex class, columns the W class. Entries are edge
//! multiplicities stored as `f64`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::dense::DenseMatrixRef;
use crate::error::{Error, Result};
use crate::traits::ProductStrategy;

/// Whitespace-separated tokens tagged with their 1-based line number.
struct Tokens<'a> {
    inner: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
    last_line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let inner = text
            .lines()
            .enumerate()
            .flat_map(|(i, l)| l.split_whitespace().map(move |t| (i + 1, t)));
        Self { inner: Box::new(inner), last_line: 0 }
    }

    /// Next token as a non-negative integer; `what` names it in error messages.
    fn next_u64(&mut self, what: &str) -> Result<u64> {
        match self.inner.next() {
            Some((line, tok)) => {
                self.last_line = line;
                tok.parse::<u64>()
                    .map_err(|_| Error::parse(line, format!("expected {what}, found {tok:?}")))
            }
            None => Err(Error::parse(self.last_line + 1, format!("unexpected end of input, expected {what}"))),
        }
    }

    fn next_usize(&mut self, what: &str) -> Result<usize> {
        self.next_u64(what).map(|v| v as usize)
    }

    fn next_raw(&mut self) -> Option<(usize, &'a str)> {
        self.inner.next()
    }
}

fn read_text(mut reader: impl Read) -> Result<String> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}

/// Plain row-major dump of `rows × columns` integers. Dimensions come from the caller.
pub fn read_dense<S: ProductStrategy>(reader: impl Read, columns: usize, rows: usize) -> Result<DenseMatrixRef<S>> {
    let text = read_text(reader)?;
    let mut tokens = Tokens::new(&text);
    let mut e = DenseMatrixRef::try_zeros(rows, columns)?;
    for r in 0..rows {
        for c in 0..columns {
            let v = tokens.next_u64("a matrix entry")?;
            e.set(r, c, v as f64);
        }
    }
    if let Some((line, tok)) = tokens.next_raw() {
        return Err(Error::parse(line, format!("trailing token {tok:?} after {rows}x{columns} entries")));
    }
    Ok(e)
}

/// MacKay-style alist file.
///
/// Header `U W max_u_degree max_w_degree`, then the U row weights, the W
/// column weights, then for each row its 1-based column indices. Zero tokens
/// are padding and are skipped. Anything after the last row list is ignored.
pub fn read_alist<S: ProductStrategy>(reader: impl Read) -> Result<DenseMatrixRef<S>> {
    let text = read_text(reader)?;
    let mut tokens = Tokens::new(&text);
    let rows = tokens.next_usize("the row count")?;
    let cols = tokens.next_usize("the column count")?;
    tokens.next_usize("the maximum row degree")?;
    tokens.next_usize("the maximum column degree")?;

    let weights = (0..rows)
        .map(|_| tokens.next_usize("a row weight"))
        .collect::<Result<Vec<_>>>()?;
    for _ in 0..cols {
        tokens.next_usize("a column weight")?;
    }

    let mut e = DenseMatrixRef::try_zeros(rows, cols)?;
    for (r, &weight) in weights.iter().enumerate() {
        if weight > cols {
            return Err(Error::DimensionMismatch { expected: cols, got: weight });
        }
        for _ in 0..weight {
            let mut idx = tokens.next_usize("a column index")?;
            while idx == 0 {
                idx = tokens.next_usize("a column index")?;
            }
            if idx > cols {
                return Err(Error::DimensionMismatch { expected: cols, got: idx });
            }
            e.set(r, idx - 1, 1.0);
        }
    }
    Ok(e)
}

pub fn open_dense<S: ProductStrategy>(path: impl AsRef<Path>, columns: usize, rows: usize) -> Result<DenseMatrixRef<S>> {
    read_dense(BufReader::new(File::open(path)?), columns, rows)
}

pub fn open_alist<S: ProductStrategy>(path: impl AsRef<Path>) -> Result<DenseMatrixRef<S>> {
    read_alist(BufReader::new(File::open(path)?))
}

/// Each `(u, w)` pair adds one edge; repeated pairs raise the multiplicity.
pub fn from_edges<S: ProductStrategy>(rows: usize, cols: usize, edges: &[(usize, usize)]) -> Result<DenseMatrixRef<S>> {
    let mut e = DenseMatrixRef::try_zeros(rows, cols)?;
    for &(u, w) in edges {
        if u >= rows {
            return Err(Error::DimensionMismatch { expected: rows, got: u });
        }
        if w >= cols {
            return Err(Error::DimensionMismatch { expected: cols, got: w });
        }
        e.set(u, w, e.get(u, w) + 1.0);
    }
    Ok(e)
}

/// The cycle of length `2k` as a `k × k` incidence matrix.
pub fn cycle<S: ProductStrategy>(k: usize) -> Result<DenseMatrixRef<S>> {
    let edges = (0..k).flat_map(|i| [(i, i), (i, (i + 1) % k)]).collect::<Vec<_>>();
    if k == 1 {
        // a single U and W vertex carry one edge, not a 2-cycle
        return from_edges(1, 1, &edges[..1]);
    }
    from_edges(k, k, &edges)
}

/// The complete bipartite graph K_{m,n}.
pub fn complete<S: ProductStrategy>(m: usize, n: usize) -> Result<DenseMatrixRef<S>> {
    DenseMatrixRef::from_fn(m, n, |_, _| 1.0)
}
