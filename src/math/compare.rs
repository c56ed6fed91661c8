/// Tolerance used when checking the parallel kernel against the reference.
pub const DEFAULT_TOLERANCE: f32 = 1e-3;

/// First element at which two arrays disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub index: usize,
    pub expected: f32,
    pub actual: f32,
}

/// An element passes when it is within `tol` absolutely or relatively.
fn close(expected: f32, actual: f32, tol: f32) -> bool {
    let diff = (expected - actual).abs();
    diff <= tol || diff <= tol * expected.abs().max(actual.abs())
}

/// Returns the first disagreeing element, or `None` when every pair is within
/// `tol`. A length difference is reported at the first missing index with the
/// absent side as NaN.
pub fn first_mismatch(expected: &[f32], actual: &[f32], tol: f32) -> Option<Mismatch> {
    if let Some((index, (&e, &a))) = expected
        .iter()
        .zip(actual.iter())
        .enumerate()
        .find(|(_, (e, a))| !close(**e, **a, tol))
    {
        return Some(Mismatch { index, expected: e, actual: a });
    }

    if expected.len() != actual.len() {
        let index = expected.len().min(actual.len());
        return Some(Mismatch {
            index,
            expected: expected.get(index).copied().unwrap_or(f32::NAN),
            actual: actual.get(index).copied().unwrap_or(f32::NAN),
        });
    }

    None
}

pub fn approx_equal(expected: &[f32], actual: &[f32], tol: f32) -> bool {
    first_mismatch(expected, actual, tol).is_none()
}
