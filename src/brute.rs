//! Exhaustive simple-cycle enumeration over the bipartite adjacency.
//! Exponential; only for cross-checking the recursion on small graphs.

use std::collections::BTreeMap;

use crate::dense::DenseMatrixRef;
use crate::traits::ProductStrategy;

pub struct BruteCensus {
    vertices: usize,
    /// length -> number of simple cycles
    counts: BTreeMap<usize, u64>,
    /// (length, u) -> number of simple cycles of that length through u
    per_u: BTreeMap<(usize, usize), u64>,
}

impl BruteCensus {
    pub fn girth(&self) -> Option<usize> {
        self.counts.iter().find(|&(_, &n)| n > 0).map(|(&l, _)| l)
    }

    pub fn count(&self, length: usize) -> u64 {
        self.counts.get(&length).copied().unwrap_or(0)
    }

    pub fn per_vertex(&self, length: usize) -> Vec<u64> {
        (0..self.vertices)
            .map(|u| self.per_u.get(&(length, u)).copied().unwrap_or(0))
            .collect()
    }
}

/// Every cycle is found once per direction from its smallest vertex; counts are halved at the end.
pub fn enumerate<S: ProductStrategy>(e: &DenseMatrixRef<S>) -> BruteCensus {
    let (nu, nw) = e.shape();
    let n = nu + nw;
    let mut adj = vec![vec![0u64; n]; n];
    for u in 0..nu {
        for w in 0..nw {
            let m = e.get(u, w) as u64;
            adj[u][nu + w] = m;
            adj[nu + w][u] = m;
        }
    }

    struct Walk<'a> {
        adj: &'a [Vec<u64>],
        nu: usize,
        start: usize,
        path: Vec<usize>,
        visited: Vec<bool>,
        counts: BTreeMap<usize, u64>,
        per_u: BTreeMap<(usize, usize), u64>,
    }

    impl Walk<'_> {
        fn dfs(&mut self, cur: usize, mult: u64) {
            for next in 0..self.adj.len() {
                let m = self.adj[cur][next];
                if m == 0 {
                    continue;
                }
                if next == self.start && self.path.len() >= 3 {
                    let len = self.path.len();
                    let c = mult * m;
                    *self.counts.entry(len).or_insert(0) += c;
                    for &v in self.path.iter().filter(|&&v| v < self.nu) {
                        *self.per_u.entry((len, v)).or_insert(0) += c;
                    }
                } else if next > self.start && !self.visited[next] {
                    self.visited[next] = true;
                    self.path.push(next);
                    self.dfs(next, mult * m);
                    self.path.pop();
                    self.visited[next] = false;
                }
            }
        }
    }

    let mut walk = Walk {
        adj: &adj,
        nu,
        start: 0,
        path: Vec::new(),
        visited: vec![false; n],
        counts: BTreeMap::new(),
        per_u: BTreeMap::new(),
    };
    for s in 0..n {
        walk.start = s;
        walk.path = vec![s];
        walk.visited[s] = true;
        walk.dfs(s, 1);
        walk.visited[s] = false;
    }

    BruteCensus {
        vertices: nu,
        counts: walk.counts.into_iter().map(|(l, c)| (l, c / 2)).collect(),
        per_u: walk.per_u.into_iter().map(|(k, c)| (k, c / 2)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::DenseMatrix;
    use crate::incidence;

    #[test]
    fn test_single_cycle() {
        let e: DenseMatrix = incidence::cycle(4).unwrap();
        let b = enumerate(&e);
        assert_eq!(b.girth(), Some(8));
        assert_eq!(b.count(8), 1);
        assert_eq!(b.per_vertex(8), vec![1; 4]);
    }

    #[test]
    fn test_k33() {
        let e: DenseMatrix = incidence::complete(3, 3).unwrap();
        let b = enumerate(&e);
        assert_eq!((b.count(4), b.count(6), b.count(8)), (9, 6, 0));
    }
}
