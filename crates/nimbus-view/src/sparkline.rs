//! Sparkline geometry in a 0..100 viewBox.

/// Point in viewBox coordinates; y grows downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Map a series onto the viewBox. Non-finite values are skipped; a flat
/// series sits on the bottom edge.
pub fn points(values: &[f64]) -> Vec<Point> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Vec::new();
    }

    let width = finite.len().saturating_sub(1).max(1) as f64;
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max - min == 0.0 { 1.0 } else { max - min };

    finite
        .iter()
        .enumerate()
        .map(|(i, v)| Point {
            x: i as f64 / width * 100.0,
            y: 100.0 - (v - min) / span * 100.0,
        })
        .collect()
}

/// `points` attribute for an SVG polyline
pub fn polyline(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", trim(p.x), trim(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Closed outline for the filled area under the line
pub fn area(points: &[Point]) -> String {
    if points.is_empty() {
        return String::new();
    }
    format!("0,100 {} 100,100", polyline(points))
}

fn trim(v: f64) -> String {
    let s = format!("{:.2}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_nothing() {
        assert!(points(&[]).is_empty());
        assert!(points(&[f64::NAN]).is_empty());
        assert_eq!(area(&[]), "");
    }

    #[test]
    fn maps_to_viewbox() {
        let pts = points(&[0.0, 5.0, 10.0]);
        assert_eq!(pts[0], Point { x: 0.0, y: 100.0 });
        assert_eq!(pts[1], Point { x: 50.0, y: 50.0 });
        assert_eq!(pts[2], Point { x: 100.0, y: 0.0 });
        assert_eq!(polyline(&pts), "0,100 50,50 100,0");
    }

    #[test]
    fn flat_series_uses_unit_span() {
        let pts = points(&[3.0, 3.0]);
        assert!(pts.iter().all(|p| p.y == 100.0));
    }

    #[test]
    fn single_point_at_origin() {
        assert_eq!(points(&[7.0]), vec![Point { x: 0.0, y: 100.0 }]);
    }

    #[test]
    fn skips_non_finite() {
        let pts = points(&[1.0, f64::NAN, 3.0]);
        assert_eq!(pts.len(), 2);
        assert_eq!(area(&pts), "0,100 0,100 100,0 100,100");
    }
}
