use vidkeep_core::Orientation;

const LANDSCAPE_MIN: f64 = 1.75;
const LANDSCAPE_MAX: f64 = 1.80;
const PORTRAIT_MIN: f64 = 0.55;
const PORTRAIT_MAX: f64 = 0.57;

/// Classify a frame by its aspect ratio.
///
/// Landscape covers 16:9 (ratio 1.777..) and portrait covers 9:16 (0.5625), each
/// with a small tolerance for encoders that round dimensions. Anything else,
/// including a zero height, is `Other`.
pub fn classify_orientation(width: u32, height: u32) -> Orientation {
    if height == 0 {
        return Orientation::Other;
    }

    let ratio = f64::from(width) / f64::from(height);
    if (LANDSCAPE_MIN..=LANDSCAPE_MAX).contains(&ratio) {
        Orientation::Landscape
    } else if (PORTRAIT_MIN..=PORTRAIT_MAX).contains(&ratio) {
        Orientation::Portrait
    } else {
        Orientation::Other
    }
}
