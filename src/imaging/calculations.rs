//! Pure calculation functions for rendition dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate primary rendition dimensions: cap the width, keep the aspect ratio.
///
/// Images already narrower than `max_width` keep their size (never upscaled).
/// Height is rounded and never drops below 1px.
///
/// # Examples
/// ```
/// # use assetstore::imaging::calculate_fit_width;
/// assert_eq!(calculate_fit_width((4000, 3000), 2000), (2000, 1500));
/// assert_eq!(calculate_fit_width((800, 600), 2000), (800, 600));
/// ```
pub fn calculate_fit_width(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w <= max_width || src_w == 0 {
        return source;
    }
    let ratio = max_width as f64 / src_w as f64;
    let h = ((src_h as f64 * ratio).round() as u32).max(1);
    (max_width, h)
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while keeping
/// the source aspect ratio. One dimension matches exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height matches, width overflows
        let w = (tgt_h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), tgt_h)
    } else {
        // Source is taller: width matches, height overflows
        let h = (tgt_w as f64 / src_aspect).round() as u32;
        (tgt_w, h.max(tgt_h))
    }
}
