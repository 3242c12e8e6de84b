use anyhow::{bail, Result};
use ndarray::{concatenate, stack, Array1, Array2, Array3, ArrayView1, Axis};
use rand::{rngs::StdRng, Rng};

/// Region × product × month figures.
pub type SalesCube = Array3<f64>;

/// Uniform integer cube in `low..high`.
pub fn random_cube(shape: (usize, usize, usize), low: i64, high: i64, rng: &mut StdRng) -> SalesCube {
    Array3::from_shape_fn(shape, |_| rng.random_range(low..high) as f64)
}

/// Sum over every axis except `keep`.
pub fn totals_along(cube: &SalesCube, keep: usize) -> Result<Array1<f64>> {
    match keep {
        0 => Ok(cube.sum_axis(Axis(2)).sum_axis(Axis(1))),
        1 => Ok(cube.sum_axis(Axis(2)).sum_axis(Axis(0))),
        2 => Ok(cube.sum_axis(Axis(1)).sum_axis(Axis(0))),
        _ => bail!("a 3-D cube has no axis {}", keep),
    }
}

/// Mean over the last axis (months).
pub fn mean_last_axis(cube: &SalesCube) -> Option<Array2<f64>> {
    cube.mean_axis(Axis(2))
}

/// Growth in percent between the first and last slice of the last axis.
/// Zero bases give NaN.
pub fn first_last_growth(cube: &SalesCube) -> Option<Array2<f64>> {
    let months = cube.len_of(Axis(2));
    if months == 0 {
        return None;
    }
    let first = cube.index_axis(Axis(2), 0);
    let last = cube.index_axis(Axis(2), months - 1);
    Some(ndarray::Zip::from(&first).and(&last).map_collect(|&a, &b| {
        if a == 0.0 {
            f64::NAN
        } else {
            (b - a) / a * 100.0
        }
    }))
}

/// Flat index → coordinates for a row-major `shape`.
pub fn unravel_index(mut flat: usize, shape: &[usize]) -> Option<Vec<usize>> {
    if flat >= shape.iter().product::<usize>() {
        return None;
    }
    let mut coords = vec![0; shape.len()];
    for (i, dim) in shape.iter().enumerate().rev() {
        coords[i] = flat % dim;
        flat /= dim;
    }
    Some(coords)
}

/// Position and value of the largest cell; first occurrence wins.
pub fn argmax_cell(cube: &SalesCube) -> Option<(Vec<usize>, f64)> {
    let (flat, value) = cube
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })?;
    Some((unravel_index(flat, cube.shape())?, value))
}

/// `1..=n` as floats.
pub fn arange(n: usize) -> Array1<f64> {
    Array1::from_iter((1..=n).map(|v| v as f64))
}

/// Reshape a vector into `rows × cols`.
pub fn reshape(values: Array1<f64>, rows: usize, cols: usize) -> Result<Array2<f64>> {
    Ok(values.into_shape((rows, cols))?)
}

/// Monthly figures folded into quarters (rows of three months).
pub fn monthly_to_quarterly(monthly: &[f64]) -> Result<Array2<f64>> {
    if monthly.len() % 3 != 0 {
        bail!("{} months do not fill whole quarters", monthly.len());
    }
    reshape(Array1::from(monthly.to_vec()), monthly.len() / 3, 3)
}

/// Each input becomes a row.
pub fn vstack(rows: &[ArrayView1<f64>]) -> Result<Array2<f64>> {
    Ok(stack(Axis(0), rows)?)
}

/// Each input becomes a column.
pub fn column_stack(cols: &[ArrayView1<f64>]) -> Result<Array2<f64>> {
    Ok(stack(Axis(1), cols)?)
}

/// Inputs joined end to end.
pub fn hstack(parts: &[ArrayView1<f64>]) -> Result<Array1<f64>> {
    Ok(concatenate(Axis(0), parts)?)
}

/// Add one adjustment per column (row-vector broadcast).
pub fn adjust_columns(m: &Array2<f64>, adjustments: &Array1<f64>) -> Array2<f64> {
    m + adjustments
}

/// Add one adjustment per row (column-vector broadcast).
pub fn adjust_rows(m: &Array2<f64>, adjustments: &Array1<f64>) -> Array2<f64> {
    m + &adjustments.view().insert_axis(Axis(1))
}

/// Rows picked by index, in the given order.
pub fn select_rows(m: &Array2<f64>, rows: &[usize]) -> Array2<f64> {
    m.select(Axis(0), rows)
}

/// Cells at paired `(rows[i], cols[i])` coordinates.
pub fn pick_cells(m: &Array2<f64>, rows: &[usize], cols: &[usize]) -> Option<Vec<f64>> {
    rows.iter()
        .zip(cols)
        .map(|(&r, &c)| m.get((r, c)).copied())
        .collect()
}

/// Cells satisfying `pred`, row-major.
pub fn mask_values<F: Fn(f64) -> bool>(m: &Array2<f64>, pred: F) -> Vec<f64> {
    m.iter().copied().filter(|&v| pred(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};
    use rand::SeedableRng;

    #[test]
    fn cube_reductions() -> Result<()> {
        let cube = Array::from_shape_vec(
            (2, 3, 3),
            vec![
                100., 150., 200., 120., 140., 160., 90., 110., 130., //
                110., 160., 210., 130., 150., 170., 95., 115., 135.,
            ],
        )?;
        assert_eq!(totals_along(&cube, 0)?.to_vec(), vec![1200.0, 1275.0]);
        assert_eq!(totals_along(&cube, 1)?.to_vec(), vec![930.0, 870.0, 675.0]);
        assert_eq!(totals_along(&cube, 2)?.to_vec(), vec![645.0, 825.0, 1005.0]);
        assert!(totals_along(&cube, 3).is_err());
        assert_eq!(cube[[0, 0, 1]], 150.0);
        let (pos, value) = argmax_cell(&cube).unwrap();
        assert_eq!((pos, value), (vec![1, 0, 2], 210.0));
        assert_eq!(first_last_growth(&cube).unwrap()[[0, 0]], 100.0);
        Ok(())
    }

    #[test]
    fn unravel() {
        assert_eq!(unravel_index(5, &[2, 3]), Some(vec![1, 2]));
        assert_eq!(unravel_index(6, &[2, 3]), None);
    }

    #[test]
    fn reshape_and_stack() -> Result<()> {
        let m = reshape(arange(12), 3, 4)?;
        assert_eq!(m.row(2).to_vec(), vec![9.0, 10.0, 11.0, 12.0]);
        let q = monthly_to_quarterly(&[
            100., 120., 110., 150., 140., 160., 170., 180., 175., 200., 190., 210.,
        ])?;
        assert_eq!(q.row(0).sum(), 330.0);
        assert!(monthly_to_quarterly(&[1.0, 2.0]).is_err());

        let jan = array![100., 120., 90.];
        let feb = array![150., 140., 110.];
        assert_eq!(vstack(&[jan.view(), feb.view()])?.shape(), &[2, 3]);
        assert_eq!(column_stack(&[jan.view(), feb.view()])?.row(0).to_vec(), vec![100.0, 150.0]);
        assert_eq!(hstack(&[jan.view(), feb.view()])?.len(), 6);
        Ok(())
    }

    #[test]
    fn broadcasting_and_indexing() {
        let sales = array![[100., 150., 200.], [120., 140., 160.], [90., 110., 130.]];
        let cols = adjust_columns(&sales, &array![5., 10., 15.]);
        assert_eq!(cols.row(0).to_vec(), vec![105.0, 160.0, 215.0]);
        let rows = adjust_rows(&sales, &array![10., 20., 30.]);
        assert_eq!(rows.column(0).to_vec(), vec![110.0, 140.0, 120.0]);
        assert_eq!(select_rows(&sales, &[0, 2]).nrows(), 2);
        assert_eq!(pick_cells(&sales, &[0, 1, 2], &[0, 1, 2]), Some(vec![100.0, 140.0, 130.0]));
        assert_eq!(mask_values(&sales, |v| (120.0..=160.0).contains(&v)).len(), 5);
    }

    #[test]
    fn seeded_cube_is_reproducible() {
        let a = random_cube((3, 4, 6), 80, 200, &mut StdRng::seed_from_u64(42));
        let b = random_cube((3, 4, 6), 80, 200, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert!(a.iter().all(|&v| (80.0..200.0).contains(&v)));
    }
}
