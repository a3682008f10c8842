//! Row echelon form, rank, image and kernel.
//!
//! Elimination runs over the first `w` columns only. Pivots are searched
//! at or below the current rank, never across columns, so a column with
//! no usable entry is simply skipped and the image keeps the column
//! positions of the input. The multipliers used to clear each column are
//! kept so that the left kernel can be rebuilt afterwards.

use super::{
    Elimination, ImageMode, assemble_image, assemble_kernel, check_width, trivial_elim,
};
use crate::dispatch::{self, GaussPlan};
use crate::error::{Result, checked_area};
use crate::field::Field;
use crate::kernels::panel::{offset, reduce_slice, transpose_square};
use crate::kernels::{Accumulator, BLK, BLK_SQ, Backend, Block, Panel, checked_trigger, muladd};
use crate::matrix::{Mat, MatRef, Permutation};
use crate::threaded::{self, for_each_mut, map_range};
use tracing::trace;

/// Scalar elimination.
///
/// Each cleared entry is overwritten with its multiplier, which is what the
/// kernel pass reads back.
pub fn elim_basic(
    field: &Field,
    a: MatRef<'_>,
    w: usize,
    mode: ImageMode,
    want_kernel: bool,
) -> Result<Elimination> {
    let (n, m) = (a.rows(), a.cols());
    check_width(w, m)?;
    if want_kernel {
        checked_area(n, n)?;
    }
    if let Some(e) = trivial_elim(a, w, mode, want_kernel) {
        return Ok(e);
    }

    let mut rows = Mat::from(a).to_row_vecs();
    let mut perm = Permutation::identity(n);
    let mut pcol = Vec::with_capacity(n.min(w));
    let mut r = 0;

    for k in 0..w {
        let Some(pos) = (r..n).find(|&i| rows[i][k] != 0) else {
            continue;
        };
        let pivot_inv = field.inv(rows[pos][k])?;

        if pos != r {
            rows.swap(pos, r);
            perm.record(r, pos);
        }

        let y = rows[r].clone();
        let below = &mut rows[r + 1..];
        let work = threaded::work(&[below.len(), m - k]);
        for_each_mut(below, work, |_, x| {
            let t = field.neg(field.mul(x[k], pivot_inv));
            x[k] = t;
            if t == 0 {
                return;
            }
            let pre = field.precon(t);
            for (xj, &yj) in x[k + 1..].iter_mut().zip(&y[k + 1..]) {
                *xj = field.add(*xj, field.mul_precon(yj, &pre));
            }
        });

        pcol.push(k);
        r += 1;
    }

    let image = assemble_image((n, m), w, &pcol, mode, |i, j| rows[i][j]);

    let kernel = want_kernel.then(|| {
        // colbuf[k][i]: multiplier that cleared row i at pivot k
        let colbuf: Vec<Vec<u64>> = pcol
            .iter()
            .map(|&pc| rows.iter().map(|row| row[pc]).collect())
            .collect();

        let work = threaded::work(&[n - r, r, r]) / 2;
        let x: Vec<Vec<u64>> = map_range(n - r, work, |i| {
            let mut xi = vec![0u64; r];
            for k in (0..r).rev() {
                let cv = &colbuf[k];
                let mut acc = cv[i + r];
                for j in k + 1..r {
                    acc = field.add(acc, field.mul(xi[j], cv[j]));
                }
                xi[k] = acc;
            }
            xi
        });
        assemble_kernel(n, r, &perm, |i, j| x[i][j])
    });

    Ok(Elimination {
        rank: r,
        image,
        kernel,
    })
}

/// Blocked elimination over 32-wide column panels.
///
/// Pivots are gathered 32 at a time into a row panel. The row operations
/// of a row panel are composed in `aux`, an `n × 32` panel whose column
/// `j` holds the multipliers of the row panel's `j`-th pivot row; once the
/// row panel is full, `aux` is applied to every panel on the right with
/// the panel kernel. Column panels entered halfway through a row panel
/// catch up on the operations gathered so far the same way.
///
/// For the kernel, each finished `aux` is parked in the column panel whose
/// index matches the row panel: by then that panel is behind the current
/// column and its rows past the rank are dead.
pub fn elim_blk<A: Accumulator>(
    field: &Field,
    a: MatRef<'_>,
    w: usize,
    mode: ImageMode,
    want_kernel: bool,
) -> Result<Elimination> {
    let (n, m) = (a.rows(), a.cols());
    check_width(w, m)?;
    if want_kernel {
        checked_area(n, n)?;
    }
    if let Some(e) = trivial_elim(a, w, mode, want_kernel) {
        return Ok(e);
    }
    checked_area(n, BLK)?;
    checked_area(m, BLK)?;
    let trigger = checked_trigger::<A>(field, BLK)?;

    let mut panels = Panel::<A>::split_columns(a);
    let mut aux = Panel::<A>::zeros(n);
    let mut bt = Block::<A>::zeros();
    let mut perm = Permutation::identity(n);
    let mut pcol = Vec::with_capacity(n.min(w));
    let mut red_count = trigger;

    let (mut r, mut rr, mut k, mut kk) = (0, 0, 0, 0);
    let (mut rpanel, mut kpanel) = (0, 0);

    while k < w {
        if r > rr && want_kernel {
            // r == rr + BLK here
            panels[rpanel].copy_rows_from(&aux, r..n);
            rpanel += 1;
        }
        rr = r;
        aux.clear();

        let cleanup = red_count < BLK;
        if cleanup {
            trace!(r, k, "panel reduction sweep");
            red_count = trigger;
        }
        red_count -= BLK;

        // a column panel picked up mid-way still carries products from the
        // previous row panel
        if cleanup && k > kk && k < kk + BLK {
            panels[kpanel].reduce_all(field);
        }

        while r < rr + BLK && k < w {
            if k == kk + BLK {
                kk = k;
                kpanel += 1;
            }
            let c = k - kk;
            let kp = &mut panels[kpanel];

            if k == kk {
                if cleanup {
                    kp.reduce_all(field);
                }
                if r > rr {
                    kp.apply_swaps(&perm, rr..r);
                    aux.reduce_all(field);
                    kp.transpose_rows_into(field, rr..r, &mut bt);
                    muladd::muladd_panel_rows(kp, &aux, &bt, rr..n, r - rr);
                }
            }

            let mut found = None;
            for i in r..n {
                let v = kp.get(i, c).reduce(field);
                kp.set(i, c, A::lift(v));
                if v != 0 {
                    found = Some((i, v));
                    break;
                }
            }
            let Some((pos, pivot)) = found else {
                k += 1;
                continue;
            };
            let pivot_inv = field.inv(pivot)?;
            let ar = r - rr;

            if pos != r {
                kp.swap_row_range(pos, r, c..BLK);
                aux.swap_row_range(pos, r, 0..ar);
                perm.record(r, pos);
            }

            for v in &mut kp.row_mut(r)[c..] {
                *v = v.reduced(field);
            }
            for v in &mut aux.row_mut(r)[..ar] {
                *v = v.reduced(field);
            }
            let mut y = [A::default(); BLK];
            y.copy_from_slice(kp.row(r));
            let mut y1 = [A::default(); BLK];
            y1.copy_from_slice(aux.row(r));

            for i in r + 1..n {
                let x = kp.row_mut(i);
                let t = field.neg(field.mul(x[c].reduce(field), pivot_inv));
                x[c] = A::default();
                aux.set(i, ar, A::lift(t));
                if t == 0 {
                    continue;
                }
                let ut = A::lift(t);
                A::muladd_interval(&mut x[c + 1..], &y[c + 1..], ut);
                A::muladd_interval(&mut aux.row_mut(i)[..ar], &y1[..ar], ut);
            }

            pcol.push(k);
            r += 1;
            k += 1;
        }

        if r > rr {
            aux.reduce_all(field);

            let right = &mut panels[kpanel + 1..];
            let work = threaded::work(&[right.len(), n - rr, r - rr, BLK]);
            let (aux_ref, perm_ref) = (&aux, &perm);
            for_each_mut(right, work, |_, jpanel| {
                if cleanup {
                    jpanel.reduce_all(field);
                }
                jpanel.apply_swaps(perm_ref, rr..r);

                let mut buf = Block::<A>::zeros();
                jpanel.transpose_rows_into(field, rr..r, &mut buf);
                muladd::muladd_panel_rows(jpanel, aux_ref, &buf, rr..n, r - rr);
            });
        }
    }

    let image = assemble_image((n, m), w, &pcol, mode, |i, j| {
        panels[j / BLK].get(i, j % BLK).reduce(field)
    });

    let kernel = if want_kernel {
        let last = if r > rr { Some(&aux) } else { None };
        Some(blk_kernel(field, &mut panels, last, r, &perm, trigger))
    } else {
        None
    };

    Ok(Elimination {
        rank: r,
        image,
        kernel,
    })
}

/// Rebuilds the left kernel from the parked row-panel multipliers.
///
/// Kernel rows are handled 32 at a time. For each of those row blocks,
/// `kerbuf` holds one `32 × 32` tile per row panel, filled from the last
/// row panel backwards: tile `hb` starts as the multipliers of row panel
/// `hb` and picks up the contributions of all later tiles through the
/// block kernel.
fn blk_kernel<A: Accumulator>(
    field: &Field,
    panels: &mut [Panel<A>],
    last: Option<&Panel<A>>,
    r: usize,
    perm: &Permutation,
    trigger: usize,
) -> Mat {
    let n = perm.len();
    if r == n {
        return Mat::zeros(0, n);
    }
    if r == 0 {
        return Mat::identity(n);
    }

    let start_block = r / BLK;
    let end_block = n.div_ceil(BLK);
    let hblocks = r.div_ceil(BLK);

    // the last row panel is either still in aux or already parked
    let initial = last.unwrap_or(&panels[hblocks - 1]);
    let mut kerbuf: Vec<Vec<A>> = (start_block..end_block)
        .map(|vb| {
            let mut kb = vec![A::default(); hblocks * BLK_SQ];
            initial.copy_block_out(vb, &mut kb[(hblocks - 1) * BLK_SQ..]);
            kb
        })
        .collect();

    // bring earlier row panels in line with later swaps, then lay their
    // row blocks out transposed, one slot earlier
    for hb in (0..hblocks - 1).rev() {
        let colbuf = &mut panels[hb];
        colbuf.apply_swaps(perm, (hb + 1) * BLK..r);
        for b in hb + 1..end_block {
            colbuf.shift_block_transposed(b, b - 1);
        }
    }

    let panels = &*panels;
    let work = threaded::work(&[n - r, r, r]) / 2;
    for_each_mut(&mut kerbuf, work, |idx, kb| {
        let vb = start_block + idx;
        for hb in (0..hblocks - 1).rev() {
            let colbuf = &panels[hb];
            let (head, tail) = kb.split_at_mut((hb + 1) * BLK_SQ);
            let acc = &mut head[hb * BLK_SQ..];
            acc.copy_from_slice(colbuf.block_slot(vb - 1));
            transpose_square(acc);

            let mut red_count = trigger;
            for b in hb + 1..hblocks {
                if red_count < BLK {
                    red_count = trigger;
                    reduce_slice(field, acc);
                }
                red_count -= BLK;
                let later = &tail[(b - hb - 1) * BLK_SQ..(b - hb) * BLK_SQ];
                muladd::muladd_block(acc, later, colbuf.block_slot(b - 1));
            }
            reduce_slice(field, acc);
        }
    });

    assemble_kernel(n, r, perm, |i, j| {
        let src = r + i;
        let kb = &kerbuf[src / BLK - start_block];
        kb[(j / BLK) * BLK_SQ + offset(src % BLK, j % BLK)].reduce(field)
    })
}

/// Elimination over the first `w` columns, choosing the variant by shape
/// and modulus.
pub fn elim(
    field: &Field,
    a: MatRef<'_>,
    w: usize,
    mode: ImageMode,
    want_kernel: bool,
) -> Result<Elimination> {
    check_width(w, a.cols())?;
    match dispatch::elim_plan(field, a.rows(), w) {
        GaussPlan::Basic | GaussPlan::Alt(_) => elim_basic(field, a, w, mode, want_kernel),
        GaussPlan::Blocked(Backend::Float) => elim_blk::<f64>(field, a, w, mode, want_kernel),
        GaussPlan::Blocked(Backend::Integer) => elim_blk::<u64>(field, a, w, mode, want_kernel),
        GaussPlan::Blocked(Backend::WideInteger) => {
            elim_blk::<u128>(field, a, w, mode, want_kernel)
        }
    }
}
