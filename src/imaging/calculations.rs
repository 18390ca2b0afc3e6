//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output size for a source image bounded by optional hints.
///
/// Each hint caps its edge (rounded to the nearest pixel). When at least one
/// hint is smaller than the matching original edge, the result is fitted
/// inside the bounding box while keeping the source aspect ratio. The source
/// is never upscaled, and neither edge drops below one pixel.
///
/// # Arguments
/// * `original` - Source dimensions (width, height)
/// * `max_width` - Optional upper bound on the width
/// * `max_height` - Optional upper bound on the height
///
/// # Examples
/// ```
/// # use picker_resize::imaging::calculate_target_size;
/// // 1000x500 bounded to 500 wide → 500x250
/// assert_eq!(calculate_target_size((1000, 500), Some(500.0), None), (500, 250));
///
/// // Hints larger than the source leave it alone
/// assert_eq!(calculate_target_size((1000, 500), Some(4000.0), None), (1000, 500));
/// ```
pub fn calculate_target_size(
    original: (u32, u32),
    max_width: Option<f64>,
    max_height: Option<f64>,
) -> (u32, u32) {
    let orig_w = original.0 as f64;
    let orig_h = original.1 as f64;
    let aspect = orig_w / orig_h;

    let mut width = max_width.map_or(orig_w, |m| orig_w.min(m.round()));
    let mut height = max_height.map_or(orig_h, |m| orig_h.min(m.round()));

    let downscale_width = max_width.is_some_and(|m| m < orig_w);
    let downscale_height = max_height.is_some_and(|m| m < orig_h);

    if downscale_width || downscale_height {
        let width_for_height = height * aspect;
        let height_for_width = width / aspect;
        if height_for_width > height {
            // Height is the binding edge
            width = width_for_height.round();
        } else {
            height = height_for_width.round();
        }
    }

    ((width as u32).max(1), (height as u32).max(1))
}

/// Calculate the power-of-two subsample factor for decoding.
///
/// Picks the largest factor that keeps both decoded edges at or above the
/// target, so the final exact resize only ever shrinks. Returns 1 when the
/// source already fits.
///
/// # Examples
/// ```
/// # use picker_resize::imaging::calculate_sample_size;
/// assert_eq!(calculate_sample_size((1000, 500), (500, 250)), 2);
/// assert_eq!(calculate_sample_size((100, 100), (100, 100)), 1);
/// ```
pub fn calculate_sample_size(original: (u32, u32), target: (u32, u32)) -> u32 {
    let (width, height) = original;
    let (target_w, target_h) = (target.0.max(1), target.1.max(1));

    let mut sample_size = 1;
    if height > target_h || width > target_w {
        let half_h = height / 2;
        let half_w = width / 2;
        while half_h / sample_size >= target_h && half_w / sample_size >= target_w {
            sample_size *= 2;
        }
    }
    sample_size
}
