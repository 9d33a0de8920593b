//! Small geometric primitives for mesh validation and reporting.
//!
//! Node orderings follow the right-hand convention: the returned normals
//! point to the side a counter-clockwise ordering winds around.

use nalgebra::{Point3, Vector3};

pub type Scalar = f64;
pub type Point = Point3<Scalar>;
pub type Vector = Vector3<Scalar>;

/// Euclidean distance between two nodes.
#[inline]
pub fn line_length(a: &Point, b: &Point) -> Scalar {
    (b - a).norm()
}

/// Midpoint of a segment.
#[inline]
pub fn line_center(a: &Point, b: &Point) -> Point {
    Point::from((a.coords + b.coords) * 0.5)
}

/// Area of the triangle `(a, b, c)`.
pub fn triangle_area(a: &Point, b: &Point, c: &Point) -> Scalar {
    0.5 * (b - a).cross(&(c - a)).norm()
}

/// Barycenter of the triangle `(a, b, c)`.
pub fn triangle_center(a: &Point, b: &Point, c: &Point) -> Point {
    Point::from((a.coords + b.coords + c.coords) / 3.0)
}

/// Unit normal of the triangle `(a, b, c)`.
///
/// Zero-area triangles yield a zero vector instead of NaNs.
pub fn triangle_normal(a: &Point, b: &Point, c: &Point) -> Vector {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    if len > 0.0 {
        n / len
    } else {
        Vector::zeros()
    }
}

/// Area of the quadrilateral `(n1, n2, n3, n4)` via its diagonals.
pub fn quadrilateral_area(n1: &Point, n2: &Point, n3: &Point, n4: &Point) -> Scalar {
    0.5 * (n3 - n1).cross(&(n4 - n2)).norm()
}

/// Area-weighted center of the quadrilateral `(n1, n2, n3, n4)`.
pub fn quadrilateral_center(n1: &Point, n2: &Point, n3: &Point, n4: &Point) -> Point {
    let a1 = triangle_area(n1, n2, n3);
    let a2 = triangle_area(n1, n3, n4);
    let total = a1 + a2;
    if total > 0.0 {
        let c1 = triangle_center(n1, n2, n3);
        let c2 = triangle_center(n1, n3, n4);
        Point::from((c1.coords * a1 + c2.coords * a2) / total)
    } else {
        Point::from((n1.coords + n2.coords + n3.coords + n4.coords) * 0.25)
    }
}

/// Unit normal of the quadrilateral `(n1, n2, n3, n4)`.
pub fn quadrilateral_normal(n1: &Point, n2: &Point, n3: &Point, n4: &Point) -> Vector {
    let n = (n3 - n1).cross(&(n4 - n2));
    let len = n.norm();
    if len > 0.0 {
        n / len
    } else {
        Vector::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_square_area_and_normal() {
        let n1 = Point::new(0.0, 0.0, 0.0);
        let n2 = Point::new(1.0, 0.0, 0.0);
        let n3 = Point::new(1.0, 1.0, 0.0);
        let n4 = Point::new(0.0, 1.0, 0.0);
        assert!((quadrilateral_area(&n1, &n2, &n3, &n4) - 1.0).abs() < 1e-12);
        let n = quadrilateral_normal(&n1, &n2, &n3, &n4);
        assert!((n - Vector::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        let c = quadrilateral_center(&n1, &n2, &n3, &n4);
        assert!((c - Point::new(0.5, 0.5, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn degenerate_quad_has_zero_normal() {
        let p = Point::new(1.0, 2.0, 3.0);
        assert_eq!(quadrilateral_normal(&p, &p, &p, &p), Vector::zeros());
    }
}
