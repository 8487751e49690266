//! Girth and short-cycle counts of a bipartite graph.
//!
//! The counter tracks non-backtracking walk counts `P_k` between vertices of
//! the same class (even `k`) or of opposite classes (odd `k`), together with
//! correction terms `L_(i,j)` that remove walks revisiting a vertex. The
//! diagonal of the closed-walk matrix `L_(0,k)` then counts simple `k`-cycles,
//! each cycle contributing `k` to its trace.
//!
//! Lengths 4, 6 and 8 are handled with explicit formulas, which carry extra
//! terms when the girth is 4. Past that a fixed window of registers is shifted
//! forward two lengths at a time.

use std::fmt;
use std::ops::Index;

use serde::Serialize;
use tracing::{debug, trace};

use crate::dense::{DenseMatrixRef, Serial};
use crate::error::{Error, Result};
use crate::stats::{distribution, Distribution};
use crate::traits::ProductStrategy;

type Matrix<S> = DenseMatrixRef<S>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Girth {
    Cycle(usize),
    /// The graph is a forest.
    Acyclic,
}

impl Girth {
    pub fn length(self) -> Option<usize> {
        match self {
            Girth::Cycle(g) => Some(g),
            Girth::Acyclic => None,
        }
    }
}

impl fmt::Display for Girth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Girth::Cycle(g) => write!(f, "{g}"),
            Girth::Acyclic => f.write_str("inf"),
        }
    }
}

/// Cycles of one length.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleTally {
    /// `None` when the graph has no cycles at all.
    pub length: Option<usize>,
    pub count: u64,
    /// Raw diagonal of the closed-walk matrix for each U vertex. A cycle
    /// through `u` is walked in both directions, so it contributes 2 here,
    /// and the entries sum to `length · count`.
    pub per_vertex: Vec<u64>,
}

impl CycleTally {
    fn zero(length: Option<usize>, vertices: usize) -> Self {
        Self { length, count: 0, per_vertex: vec![0; vertices] }
    }

    fn from_closed_walks<S: ProductStrategy>(length: usize, closed: &Matrix<S>) -> Self {
        let trace = closed.trace() as u64;
        Self {
            length: Some(length),
            count: trace / length as u64,
            per_vertex: closed.diagonal().into_iter().map(|v| v as u64).collect(),
        }
    }

    pub fn distribution(&self) -> Distribution {
        distribution(&self.per_vertex)
    }
}

/// Girth plus the tallies at girth, girth + 2 and girth + 4.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleCensus {
    pub girth: Girth,
    pub tallies: [CycleTally; 3],
}

impl CycleCensus {
    fn acyclic(vertices: usize) -> Self {
        let zero = CycleTally::zero(None, vertices);
        Self { girth: Girth::Acyclic, tallies: [zero.clone(), zero.clone(), zero] }
    }

    pub fn ng(&self) -> &CycleTally {
        &self.tallies[0]
    }
    pub fn ng2(&self) -> &CycleTally {
        &self.tallies[1]
    }
    pub fn ng4(&self) -> &CycleTally {
        &self.tallies[2]
    }
    pub fn counts(&self) -> [u64; 3] {
        [self.ng().count, self.ng2().count, self.ng4().count]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    U,
    W,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::U => Side::W,
            Side::W => Side::U,
        }
    }
}

/// One register per vertex class.
struct Sided<T> {
    u: T,
    w: T,
}

impl<T> Sided<T> {
    fn try_build(mut f: impl FnMut(Side) -> Result<T>) -> Result<Self> {
        Ok(Sided { u: f(Side::U)?, w: f(Side::W)? })
    }
}

impl<S: ProductStrategy> Sided<Matrix<S>> {
    /// Odd-length walk counts on the W side are the transpose of the U side.
    fn odd(u: Matrix<S>) -> Result<Self> {
        let w = u.transpose()?;
        Ok(Sided { u, w })
    }

    fn bytes(&self) -> usize {
        self.u.estimate_memory_usage() + self.w.estimate_memory_usage()
    }
}

impl<T> Index<Side> for Sided<T> {
    type Output = T;
    fn index(&self, s: Side) -> &T {
        match s {
            Side::U => &self.u,
            Side::W => &self.w,
        }
    }
}

/// Registers fixed after the first two lengths.
struct Anchors<S: ProductStrategy> {
    /// `P_2` with its diagonal cleared.
    p2: Sided<Matrix<S>>,
    /// `diag(max(deg − 1, 0))`
    m1: Sided<Matrix<S>>,
    /// `diag(max(deg − 2, 0))`
    m2: Sided<Matrix<S>>,
    /// `L_(1,2)`
    l12: Sided<Matrix<S>>,
}

struct FourCycle<S: ProductStrategy> {
    p3: Sided<Matrix<S>>,
    l04: Sided<Matrix<S>>,
}

/// Rolling registers positioned at cycle length `g`.
struct Window<S: ProductStrategy> {
    g: usize,
    p_gm2: Sided<Matrix<S>>,
    p_gm1: Sided<Matrix<S>>,
    p_g: Sided<Matrix<S>>,
    p_g1: Sided<Matrix<S>>,
    /// `L_(0,g)`: closed walks of length g
    l0_g: Sided<Matrix<S>>,
    /// `L_(0,g+2)`
    l0_g2: Sided<Matrix<S>>,
    l1_g: Sided<Matrix<S>>,
    lgm2_2: Sided<Matrix<S>>,
    lgm1_2: Sided<Matrix<S>>,
}

impl<S: ProductStrategy> Window<S> {
    fn bytes(&self) -> usize {
        [&self.p_gm2, &self.p_gm1, &self.p_g, &self.p_g1, &self.l0_g, &self.l0_g2, &self.l1_g, &self.lgm2_2, &self.lgm1_2]
            .iter()
            .map(|r| r.bytes())
            .sum()
    }
}

/// Registers while searching for the girth, when no shorter cycle exists and
/// most corrections vanish.
struct SearchWindow<S: ProductStrategy> {
    /// Length of the next closed-walk test.
    g: usize,
    /// `L_(g−4,2)` once stepped to `g`, two lengths behind before that.
    la: Sided<Matrix<S>>,
    /// `L_(g−3,2)`, likewise.
    lb: Sided<Matrix<S>>,
    p_even: Sided<Matrix<S>>,
    p_odd: Sided<Matrix<S>>,
}

/// One side of a window shift from `g` to `g + 2`.
struct Advance<S: ProductStrategy> {
    p_g2: Matrix<S>,
    p_g3: Matrix<S>,
    l0_g4: Matrix<S>,
    l1_g2: Matrix<S>,
    lg1_2: Matrix<S>,
}

enum SixEight<S: ProductStrategy> {
    Girth4 { closed6: Matrix<S>, closed8: Matrix<S> },
    Longer(Window<S>),
}

pub struct CycleCounter<S: ProductStrategy = Serial> {
    e: Matrix<S>,
    et: Matrix<S>,
}

impl<S: ProductStrategy> CycleCounter<S> {
    /// Takes a simple incidence matrix: every entry 0 or 1, both dimensions non-zero.
    pub fn new(e: Matrix<S>) -> Result<Self> {
        let (rows, cols) = e.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyGraph { rows, cols });
        }
        for row in 0..rows {
            for (col, &value) in e.row(row).iter().enumerate() {
                if value == 0.0 || value == 1.0 {
                    continue;
                }
                if value > 1.0 && value.fract() == 0.0 {
                    return Err(Error::ParallelEdge { row, col, multiplicity: value as u64 });
                }
                return Err(Error::InvalidEntry { row, col, value });
            }
        }
        let et = e.transpose()?;
        Ok(Self { e, et })
    }

    pub fn incidence(&self) -> &Matrix<S> {
        &self.e
    }

    /// Upper bound on the length of any simple cycle, `2·max(U, W)`.
    pub fn max_girth(&self) -> usize {
        2 * self.e.rows().max(self.e.cols())
    }

    /// Incidence from side `s` to the other side.
    fn inc(&self, s: Side) -> &Matrix<S> {
        match s {
            Side::U => &self.e,
            Side::W => &self.et,
        }
    }

    /// Incidence from the other side back to `s`.
    fn back(&self, s: Side) -> &Matrix<S> {
        self.inc(s.other())
    }

    /// Restricts `m` to the edges leaving side `s`.
    fn on_edges(&self, s: Side, mut m: Matrix<S>) -> Matrix<S> {
        m.hadamard_assign(self.inc(s));
        m
    }

    pub fn count(&self) -> Result<CycleCensus> {
        let vertices = self.e.rows();
        let (p2, m1, m2) = self.degree_two()?;
        let c2 = Sided::try_build(|s| p2[s].choose2(1.0))?;
        let l12 = Sided::try_build(|s| self.inc(s).multiply(&m1[s.other()]))?;
        let anchors = Anchors { p2, m1, m2, l12 };

        let four = self.four_cycles(&anchors)?;
        let girth4 = four.l04.u.trace() > 0.0;
        debug!(girth4, "length 4 tested");

        let stage = self.six_eight(&anchors, &c2, &four, girth4)?;
        drop(c2);
        let FourCycle { p3, l04 } = four;
        match stage {
            SixEight::Girth4 { closed6, closed8 } => Ok(CycleCensus {
                girth: Girth::Cycle(4),
                tallies: [
                    CycleTally::from_closed_walks(4, &l04.u),
                    CycleTally::from_closed_walks(6, &closed6),
                    CycleTally::from_closed_walks(8, &closed8),
                ],
            }),
            SixEight::Longer(window) => {
                drop(l04);
                debug!(bytes = window.bytes(), "lengths 6 and 8 tested");
                if window.l0_g.u.trace() > 0.0 {
                    self.finish(window, &anchors, Some(&p3))
                } else if window.l0_g2.u.trace() > 0.0 {
                    let window = self.shift(window, &anchors, Some(&p3))?;
                    drop(p3);
                    self.finish(window, &anchors, None)
                } else {
                    drop(p3);
                    self.search(window, &anchors, vertices)
                }
            }
        }
    }

    /// Off-diagonal `P_2` and the clamped degree diagonals for both sides.
    #[allow(clippy::type_complexity)]
    fn degree_two(&self) -> Result<(Sided<Matrix<S>>, Sided<Matrix<S>>, Sided<Matrix<S>>)> {
        let (p2_u, m1_u, m2_u) = self.degree_two_side(Side::U)?;
        let (p2_w, m1_w, m2_w) = self.degree_two_side(Side::W)?;
        Ok((Sided { u: p2_u, w: p2_w }, Sided { u: m1_u, w: m1_w }, Sided { u: m2_u, w: m2_w }))
    }

    fn degree_two_side(&self, s: Side) -> Result<(Matrix<S>, Matrix<S>, Matrix<S>)> {
        let mut p2 = self.inc(s).multiply(self.back(s))?;
        let n = p2.rows();
        let mut m1 = Matrix::<S>::try_zeros(n, n)?;
        let mut m2 = Matrix::<S>::try_zeros(n, n)?;
        for i in 0..n {
            let deg = p2.get(i, i);
            m1.set(i, i, (deg - 1.0).max(0.0));
            m2.set(i, i, (deg - 2.0).max(0.0));
            p2.set(i, i, 0.0);
        }
        Ok((p2, m1, m2))
    }

    fn four_cycles(&self, a: &Anchors<S>) -> Result<FourCycle<S>> {
        let p3 = Sided::odd(a.p2.u.multiply(&self.e)? - &a.l12.u)?;
        let l04 = Sided::try_build(|s| p3[s].diagonal_product(self.back(s)))?;
        Ok(FourCycle { p3, l04 })
    }

    /// Lengths 6 and 8. With girth 4 only the U side is carried past `P_6`.
    fn six_eight(&self, a: &Anchors<S>, c2: &Sided<Matrix<S>>, four: &FourCycle<S>, girth4: bool) -> Result<SixEight<S>> {
        let FourCycle { p3, l04 } = four;

        let l22 = Sided::try_build(|s| self.inc(s).zero_diagonal_product(&a.l12[s.other()]))?;
        let p4 = Sided::try_build(|s| Ok(p3[s].multiply(self.back(s))? - &l04[s] - &l22[s]))?;
        let t = Sided::try_build(|s| p3[s].hadamard(self.inc(s)))?;
        let l14 = Sided::try_build(|s| Ok(self.inc(s).multiply(&l04[s.other()])? - &t[s] - &t[s]))?;
        let l32 = Sided::try_build(|s| Ok(p3[s].multiply(&a.m1[s.other()])? - &t[s]))?;
        drop(t);

        let p5 = Sided::odd(p4.u.multiply(&self.e)? - &l14.u - &l32.u)?;
        let l06 = Sided::try_build(|s| p5[s].diagonal_product(self.back(s)))?;

        let l24 = Sided::try_build(|s| {
            let l = self.inc(s).zero_diagonal_product(&l14[s.other()])?;
            Ok(if girth4 { l - &a.p2[s].choose3(6.0)? } else { l })
        })?;
        let l42 = Sided::try_build(|s| {
            let l = self.inc(s).zero_diagonal_product(&l32[s.other()])? - &a.m1[s].multiply(&l22[s])?;
            Ok(if girth4 { l + &c2[s] + &c2[s] } else { l })
        })?;
        drop(l22);

        let p6_side = |s: Side| -> Result<Matrix<S>> {
            Ok(p5[s].multiply(self.back(s))? - &l06[s] - &l24[s] - &l42[s])
        };
        let l16_side = |s: Side| -> Result<Matrix<S>> {
            let edges = self.on_edges(s, p5[s].try_clone()?);
            Ok(self.inc(s).multiply(&l06[s.other()])? - &edges - &edges)
        };
        let l52_side = |s: Side| -> Result<Matrix<S>> {
            let edges = self.on_edges(s, p5[s].try_clone()?);
            Ok(self.inc(s).multiply(&l42[s.other()])? - &a.m1[s].multiply(&l32[s])? - &edges)
        };

        if girth4 {
            let s = Side::U;
            let e = &self.e;
            // pairs of 2-paths closing on an edge, from either end
            let y = self.on_edges(s, c2.u.multiply(e)? - &p3.u);
            let z = self.on_edges(s, e.multiply(&c2.w)? - &p3.u);
            let p6 = p6_side(s)?;
            let l16 = l16_side(s)? - &self.on_edges(s, p3.u.choose2(2.0)?) + &y + &y + &z + &z;
            let l34 = e.multiply(&l24.w)?
                - &a.m1.u.multiply(&l14.u)?
                - &self.on_edges(s, p3.u.choose2(4.0)?)
                + &(y.try_clone()? * 4.0)
                + &(z.try_clone()? * 6.0);
            let p3_edges = self.on_edges(s, p3.u.try_clone()?);
            let l52 = l52_side(s)? + &p3_edges + &p3_edges - &l04.u.multiply(&a.l12.u)?
                + &self.on_edges(s, l32.u.try_clone()?)
                + &(self.on_edges(s, p3.u.multiply(&a.m2.w)?) * 2.0)
                + &y
                + &y;
            drop((y, z, p3_edges, p4, l14, l24, l32, l42));
            let p7 = p6.multiply(e)? - &l16 - &l34 - &l52;
            let closed8 = p7.diagonal_product(&self.et)?;
            return Ok(SixEight::Girth4 { closed6: l06.u, closed8 });
        }

        // girth > 4: L_(3,4) vanishes
        let p6 = Sided::try_build(p6_side)?;
        let l16 = Sided::try_build(l16_side)?;
        let l52 = Sided::try_build(l52_side)?;
        drop((l14, l24, l32));
        let p7 = Sided::odd(p6.u.multiply(&self.e)? - &l16.u - &l52.u)?;
        let l08 = Sided::try_build(|s| p7[s].diagonal_product(self.back(s)))?;
        Ok(SixEight::Longer(Window {
            g: 6,
            p_gm2: p4,
            p_gm1: p5,
            p_g: p6,
            p_g1: p7,
            l0_g: l06,
            l0_g2: l08,
            l1_g: l16,
            lgm2_2: l42,
            lgm1_2: l52,
        }))
    }

    /// `L_(2,g)` and `L_(g,2)`, needed on both sides by either side of a shift.
    fn shift_prelude(&self, w: &Window<S>, a: &Anchors<S>) -> Result<(Sided<Matrix<S>>, Sided<Matrix<S>>)> {
        let l2_g = Sided::try_build(|s| self.inc(s).zero_diagonal_product(&w.l1_g[s.other()]))?;
        let lg_2 = Sided::try_build(|s| {
            Ok(self.inc(s).zero_diagonal_product(&w.lgm1_2[s.other()])? - &a.m1[s].multiply(&w.lgm2_2[s])?
                + &w.p_gm2[s].hadamard(&a.p2[s])?)
        })?;
        Ok((l2_g, lg_2))
    }

    /// Walks of lengths g+2 and g+3 on side `s`. `p3` adds the triple-path
    /// correction that only survives at girth 6.
    fn shift_side(
        &self,
        s: Side,
        w: &Window<S>,
        a: &Anchors<S>,
        l2_g: &Sided<Matrix<S>>,
        lg_2: &Sided<Matrix<S>>,
        p3: Option<&Sided<Matrix<S>>>,
    ) -> Result<Advance<S>> {
        let o = s.other();
        let inc = self.inc(s);
        let p_g2 = w.p_g1[s].multiply(self.back(s))? - &w.l0_g2[s] - &l2_g[s] - &lg_2[s];
        let edges = self.on_edges(s, w.p_g1[s].try_clone()?);
        let l1_g2 = inc.multiply(&w.l0_g2[o])? - &edges - &edges;
        let mut l3_g = inc.multiply(&l2_g[o])? - &a.m1[s].multiply(&w.l1_g[s])?;
        if let Some(p3) = p3 {
            l3_g -= &p3[s].choose3(6.0)?;
        }
        let prev_edges = self.on_edges(s, w.p_gm1[s].try_clone()?);
        let lg1_2 = inc.multiply(&lg_2[o])? - &edges
            + &self.on_edges(s, w.lgm1_2[s].try_clone()?)
            - &a.m1[s].multiply(&w.lgm1_2[s])?
            - &w.l0_g[s].multiply(&a.l12[s])?
            + &prev_edges
            + &prev_edges
            + &(self.on_edges(s, w.p_gm1[s].multiply(&a.m2[o])?) * 2.0);
        drop((edges, prev_edges));
        let p_g3 = p_g2.multiply(inc)? - &l1_g2 - &l3_g - &lg1_2;
        let l0_g4 = p_g3.diagonal_product(self.back(s))?;
        Ok(Advance { p_g2, p_g3, l0_g4, l1_g2, lg1_2 })
    }

    /// Moves the window from `g` to `g + 2`.
    fn shift(&self, w: Window<S>, a: &Anchors<S>, p3: Option<&Sided<Matrix<S>>>) -> Result<Window<S>> {
        let (l2_g, lg_2) = self.shift_prelude(&w, a)?;
        let u = self.shift_side(Side::U, &w, a, &l2_g, &lg_2, p3)?;
        let v = self.shift_side(Side::W, &w, a, &l2_g, &lg_2, p3)?;
        trace!(g = w.g + 2, bytes = w.bytes(), "window shifted");
        Ok(Window {
            g: w.g + 2,
            p_gm2: w.p_g,
            p_gm1: w.p_g1,
            p_g: Sided { u: u.p_g2, w: v.p_g2 },
            p_g1: Sided { u: u.p_g3, w: v.p_g3 },
            l0_g: w.l0_g2,
            l0_g2: Sided { u: u.l0_g4, w: v.l0_g4 },
            l1_g: Sided { u: u.l1_g2, w: v.l1_g2 },
            lgm2_2: lg_2,
            lgm1_2: Sided { u: u.lg1_2, w: v.lg1_2 },
        })
    }

    /// Tallies for a window sitting at the girth, truncated at the longest possible cycle.
    fn finish(&self, w: Window<S>, a: &Anchors<S>, p3: Option<&Sided<Matrix<S>>>) -> Result<CycleCensus> {
        let g = w.g;
        let max = self.max_girth();
        let vertices = self.e.rows();
        debug!(girth = g, max, "girth resolved");
        let ng = CycleTally::from_closed_walks(g, &w.l0_g.u);
        if g >= max {
            return Ok(CycleCensus {
                girth: Girth::Cycle(g),
                tallies: [ng, CycleTally::zero(Some(g + 2), vertices), CycleTally::zero(Some(g + 4), vertices)],
            });
        }
        let ng2 = CycleTally::from_closed_walks(g + 2, &w.l0_g2.u);
        let ng4 = if g + 2 >= max {
            CycleTally::zero(Some(g + 4), vertices)
        } else {
            let (l2_g, lg_2) = self.shift_prelude(&w, a)?;
            let adv = self.shift_side(Side::U, &w, a, &l2_g, &lg_2, p3)?;
            CycleTally::from_closed_walks(g + 4, &adv.l0_g4)
        };
        Ok(CycleCensus { girth: Girth::Cycle(g), tallies: [ng, ng2, ng4] })
    }

    /// Girth above 8: advance two lengths at a time until a closed walk appears.
    fn search(&self, w: Window<S>, a: &Anchors<S>, vertices: usize) -> Result<CycleCensus> {
        let max = self.max_girth();
        let Window { p_g, p_g1, lgm2_2, lgm1_2, .. } = w;
        let mut sw = SearchWindow { g: 10, la: lgm2_2, lb: lgm1_2, p_even: p_g, p_odd: p_g1 };
        while sw.g <= max {
            sw = self.search_step(sw, a)?;
            let closed = sw.p_odd.u.diagonal_product(&self.et)?;
            trace!(g = sw.g, bytes = sw.la.bytes() + sw.lb.bytes() + sw.p_even.bytes() + sw.p_odd.bytes(), "search step");
            if closed.trace() > 0.0 {
                let g = sw.g;
                if g >= max {
                    debug!(girth = g, max, "girth resolved");
                    return Ok(CycleCensus {
                        girth: Girth::Cycle(g),
                        tallies: [
                            CycleTally::from_closed_walks(g, &closed),
                            CycleTally::zero(Some(g + 2), vertices),
                            CycleTally::zero(Some(g + 4), vertices),
                        ],
                    });
                }
                let closed = Sided { w: sw.p_odd.w.diagonal_product(&self.e)?, u: closed };
                let window = self.girth_step(sw, closed, a)?;
                return self.finish(window, a, None);
            }
            sw.g += 2;
        }
        debug!(max, "no cycle found");
        Ok(CycleCensus::acyclic(vertices))
    }

    /// Brings `P_{g−2}`, `P_{g−1}` and the two `L_(·,2)` registers up to the current test length.
    fn search_step(&self, sw: SearchWindow<S>, a: &Anchors<S>) -> Result<SearchWindow<S>> {
        let SearchWindow { g, la, lb, p_even, p_odd } = sw;
        drop(p_even);
        let la2 = Sided::try_build(|s| Ok(self.inc(s).multiply(&lb[s.other()])? - &a.m1[s].multiply(&la[s])?))?;
        drop(la);
        let p_even = Sided::try_build(|s| Ok(p_odd[s].multiply(self.back(s))? - &la2[s]))?;
        drop(p_odd);
        let lb2 = Sided::try_build(|s| Ok(self.inc(s).multiply(&la2[s.other()])? - &a.m1[s].multiply(&lb[s])?))?;
        drop(lb);
        let p_odd = Sided::odd(p_even.u.multiply(&self.e)? - &lb2.u)?;
        Ok(SearchWindow { g, la: la2, lb: lb2, p_even, p_odd })
    }

    /// Builds the full window at the girth from the search registers and the closed walks found.
    fn girth_step(&self, sw: SearchWindow<S>, l0_g: Sided<Matrix<S>>, a: &Anchors<S>) -> Result<Window<S>> {
        let SearchWindow { g, la, lb, p_even, p_odd } = sw;
        let lgm2_2 = Sided::try_build(|s| Ok(self.inc(s).multiply(&lb[s.other()])? - &a.m1[s].multiply(&la[s])?))?;
        drop(la);
        let p_g = Sided::try_build(|s| Ok(p_odd[s].multiply(self.back(s))? - &l0_g[s] - &lgm2_2[s]))?;
        let edges = Sided::try_build(|s| p_odd[s].hadamard(self.inc(s)))?;
        let l1_g = Sided::try_build(|s| Ok(self.inc(s).multiply(&l0_g[s.other()])? - &edges[s] - &edges[s]))?;
        let lgm1_2 = Sided::try_build(|s| {
            Ok(self.inc(s).multiply(&lgm2_2[s.other()])? - &edges[s] - &a.m1[s].multiply(&lb[s])?)
        })?;
        drop((edges, lb));
        let p_g1 = Sided::odd(p_g.u.multiply(&self.e)? - &l1_g.u - &lgm1_2.u)?;
        let l0_g2 = Sided::try_build(|s| p_g1[s].diagonal_product(self.back(s)))?;
        Ok(Window { g, p_gm2: p_even, p_gm1: p_odd, p_g, p_g1, l0_g, l0_g2, l1_g, lgm2_2, lgm1_2 })
    }
}
