/// Raw label values below this are "ignore this slot".
pub const IGNORE_THRESHOLD: f32 = -0.5;

/// Decoded label slot.
///
/// Labels are stored as floats (`-1` ignore, `0` negative, `1` positive) so a
/// batch stays one dense buffer. The tag only decides masking: the kernel
/// keeps using the raw float in its arithmetic, so off-domain values such
/// as `0.3` are not snapped to a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Valid(bool),
    Ignored,
}

impl Label {
    /// Values `>= 0.5` are positive, values in `[-0.5, 0.5)` negative.
    #[inline]
    pub fn from_raw(y: f32) -> Label {
        if y < IGNORE_THRESHOLD {
            Label::Ignored
        } else {
            Label::Valid(y >= 0.5)
        }
    }
}
