/// Scale `(width, height)` down so neither side exceeds `max_dimension`.
///
/// The scale factor is `min(max / width, max / height)` and is applied only when a side
/// is over the bound; smaller images keep their exact size. Aspect ratio is preserved
/// up to rounding and each side is at least 1px.
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let scale_w = max_dimension as f64 / width as f64;
    let scale_h = max_dimension as f64 / height as f64;
    apply_scale(width, height, scale_w.min(scale_h), max_dimension)
}

fn apply_scale(width: u32, height: u32, scale: f64, max_dimension: u32) -> (u32, u32) {
    let new_w = (width as f64 * scale).round() as u32;
    let new_h = (height as f64 * scale).round() as u32;

    (new_w.clamp(1, max_dimension), new_h.clamp(1, max_dimension))
}
