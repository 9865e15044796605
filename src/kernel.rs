//! Matrix-vector kernels over row blocks
//!
//! Products use 32 bit wrapping arithmetic so results match a native
//! fixed width accumulation bit for bit.
use crate::error::TaskError;
use ndarray::prelude::*;
use ndarray::Zip;

/// wrapping dot product of a matrix row with the vector
fn row_dot(row: ArrayView1<i32>, vector: &ArrayView1<i32>) -> i32 {
    row.iter()
        .zip(vector.iter())
        .fold(0i32, |acc, (&a, &b)| acc.wrapping_add(a.wrapping_mul(b)))
}

/// Views a flattened row block of `result.len()` rows as a matrix
fn block_view<'a>(
    block: &'a [i32],
    vector: &[i32],
    result: &[i32],
) -> Result<ArrayView2<'a, i32>, TaskError> {
    Ok(ArrayView2::from_shape((result.len(), vector.len()), block)?)
}

/// Multiplies a row block by `vector` on the calling thread
///
/// # Arguments
/// * `block` flattened rows, `result.len() * vector.len()` elements
/// * `vector` the full vector
/// * `result` one entry per row, overwritten
pub fn mat_vec(block: &[i32], vector: &[i32], result: &mut [i32]) -> Result<(), TaskError> {
    let matrix = block_view(block, vector, result)?;
    let vector = ArrayView1::from(vector);
    Zip::from(ArrayViewMut1::from(result))
        .and(matrix.rows())
        .for_each(|out, row| *out = row_dot(row, &vector));
    Ok(())
}

/// Same as `mat_vec`, with rows spread over the rayon thread pool
pub fn par_mat_vec(block: &[i32], vector: &[i32], result: &mut [i32]) -> Result<(), TaskError> {
    let matrix = block_view(block, vector, result)?;
    let vector = ArrayView1::from(vector);
    Zip::from(ArrayViewMut1::from(result))
        .and(matrix.rows())
        .par_for_each(|out, row| *out = row_dot(row, &vector));
    Ok(())
}
