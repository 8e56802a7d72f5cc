//! Planar geometry used by the territory updater and the containment force.

use eframe::egui::{Vec2, vec2};

/// Below this absolute signed area a polygon is treated as flat.
const MIN_POLYGON_AREA: f32 = 1e-6;

/// A convex hull corner together with the node it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HullVertex {
    pub position: Vec2,
    pub node: usize,
}

fn cross(origin: Vec2, a: Vec2, b: Vec2) -> f32 {
    let oa = a - origin;
    let ob = b - origin;
    (oa.x * ob.y) - (oa.y * ob.x)
}

/// Convex hull by Andrew's monotone chain, counter-clockwise in a y-up frame.
///
/// Duplicate positions collapse onto the first node that produced them and
/// collinear points are dropped, so a flat input yields fewer than three
/// vertices.
pub fn convex_hull(points: &[HullVertex]) -> Vec<HullVertex> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| {
        a.position
            .x
            .total_cmp(&b.position.x)
            .then_with(|| a.position.y.total_cmp(&b.position.y))
            .then_with(|| a.node.cmp(&b.node))
    });
    sorted.dedup_by(|next, kept| next.position == kept.position);

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<HullVertex> = Vec::with_capacity(sorted.len());
    for vertex in &sorted {
        while lower.len() >= 2
            && cross(
                lower[lower.len() - 2].position,
                lower[lower.len() - 1].position,
                vertex.position,
            ) <= 0.0
        {
            lower.pop();
        }
        lower.push(*vertex);
    }

    let mut upper: Vec<HullVertex> = Vec::with_capacity(sorted.len());
    for vertex in sorted.iter().rev() {
        while upper.len() >= 2
            && cross(
                upper[upper.len() - 2].position,
                upper[upper.len() - 1].position,
                vertex.position,
            ) <= 0.0
        {
            upper.pop();
        }
        upper.push(*vertex);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Shoelace area. Positive for counter-clockwise order in a y-up frame.
pub fn signed_area(polygon: &[Vec2]) -> f32 {
    if polygon.len() < 3 {
        return 0.0;
    }

    let mut twice_area = 0.0;
    let mut previous = polygon[polygon.len() - 1];
    for &current in polygon {
        twice_area += (previous.x * current.y) - (current.x * previous.y);
        previous = current;
    }
    twice_area * 0.5
}

/// Area-weighted centroid; `None` for polygons without area.
pub fn area_centroid(polygon: &[Vec2]) -> Option<Vec2> {
    let area = signed_area(polygon);
    if !area.is_finite() || area.abs() < MIN_POLYGON_AREA {
        return None;
    }

    let mut sum = Vec2::ZERO;
    let mut previous = polygon[polygon.len() - 1];
    for &current in polygon {
        let weight = (previous.x * current.y) - (current.x * previous.y);
        sum += (previous + current) * weight;
        previous = current;
    }

    let centroid = sum / (6.0 * area);
    (centroid.x.is_finite() && centroid.y.is_finite()).then_some(centroid)
}

/// Even-odd ray casting. Points exactly on an edge may land on either side.
pub fn polygon_contains(polygon: &[Vec2], point: Vec2) -> bool {
    let Some(&last) = polygon.last() else {
        return false;
    };

    let mut inside = false;
    let mut previous = last;
    for &current in polygon {
        if (current.y > point.y) != (previous.y > point.y)
            && point.x
                < (previous.x - current.x) * (point.y - current.y) / (previous.y - current.y)
                    + current.x
        {
            inside = !inside;
        }
        previous = current;
    }
    inside
}

/// Moves `vertex` away from `center` by `distance` along the ray through it.
///
/// A vertex sitting on the center is pushed along +x.
pub fn push_outward(center: Vec2, vertex: Vec2, distance: f32) -> Vec2 {
    let delta = vertex - center;
    let angle = delta.y.atan2(delta.x);
    vertex + vec2(angle.cos(), angle.sin()) * distance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    fn vertices(points: &[(f32, f32)]) -> Vec<HullVertex> {
        points
            .iter()
            .enumerate()
            .map(|(node, &(x, y))| HullVertex {
                position: vec2(x, y),
                node,
            })
            .collect()
    }

    #[test]
    fn hull_drops_interior_points_and_keeps_sources() {
        let hull = convex_hull(&vertices(&[
            (0.0, 0.0),
            (4.0, 0.0),
            (2.0, 1.0),
            (4.0, 4.0),
            (0.0, 4.0),
        ]));

        assert_eq!(hull.len(), 4);
        let mut nodes = hull.iter().map(|vertex| vertex.node).collect::<Vec<_>>();
        nodes.sort_unstable();
        assert_eq!(nodes, vec![0, 1, 3, 4]);
        for vertex in &hull {
            assert!(vertex.position != vec2(2.0, 1.0));
        }
    }

    #[test]
    fn collinear_points_have_no_hull_polygon() {
        let hull = convex_hull(&vertices(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]));
        assert!(hull.len() < 3);
    }

    #[test]
    fn duplicates_collapse_before_hulling() {
        let hull = convex_hull(&vertices(&[(1.0, 1.0), (1.0, 1.0), (5.0, 5.0)]));
        assert_eq!(hull.len(), 2);
    }

    #[test]
    fn centroid_is_area_weighted_not_vertex_mean() {
        // Vertex mean is (1.5, 1.0); the area centroid sits lower and further left.
        let quad = [vec2(0.0, 0.0), vec2(4.0, 0.0), vec2(2.0, 2.0), vec2(0.0, 2.0)];
        let centroid = area_centroid(&quad).unwrap();

        let mean = quad.iter().fold(Vec2::ZERO, |sum, point| sum + *point) / 4.0;
        assert!(!approx(centroid, mean));
        assert!(approx(centroid, vec2(14.0 / 9.0, 8.0 / 9.0)));
    }

    #[test]
    fn square_centroid_and_area() {
        let square = [vec2(0.0, 0.0), vec2(2.0, 0.0), vec2(2.0, 2.0), vec2(0.0, 2.0)];
        assert_eq!(signed_area(&square), 4.0);
        assert!(approx(area_centroid(&square).unwrap(), vec2(1.0, 1.0)));
    }

    #[test]
    fn flat_polygon_has_no_centroid() {
        let flat = [vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(2.0, 0.0)];
        assert!(area_centroid(&flat).is_none());
    }

    #[test]
    fn containment_by_ray_casting() {
        let square = [vec2(0.0, 0.0), vec2(10.0, 0.0), vec2(10.0, 10.0), vec2(0.0, 10.0)];
        assert!(polygon_contains(&square, vec2(5.0, 5.0)));
        assert!(!polygon_contains(&square, vec2(15.0, 5.0)));
        assert!(!polygon_contains(&square, vec2(-1.0, 5.0)));
        assert!(!polygon_contains(&[], vec2(0.0, 0.0)));
    }

    #[test]
    fn outward_push_follows_center_ray() {
        let pushed = push_outward(vec2(0.0, 0.0), vec2(3.0, 4.0), 5.0);
        assert!(approx(pushed, vec2(6.0, 8.0)));
    }
}
