//! Collision detection for circles and axis-aligned rectangles
//!
//! Every check here is a pure function of two shapes: nothing is mutated and
//! the result only says whether the shapes touch. Games pick whichever model
//! fits their sprites (round rocks vs. boxy invaders).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// A circle given by center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

/// Axis-aligned rectangle: top-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Rectangle of the given size centered on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size * 0.5,
            size,
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Closest point inside the rectangle to `p`
    #[inline]
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max())
    }
}

/// Bounding shape an entity exposes for collision checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle(Circle),
    Rect(Aabb),
}

impl Shape {
    /// Whether two shapes touch, dispatching to the matching model
    pub fn overlaps(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Circle(a), Shape::Circle(b)) => circles_overlap(a, b),
            (Shape::Rect(a), Shape::Rect(b)) => rects_overlap(a, b),
            (Shape::Circle(c), Shape::Rect(r)) | (Shape::Rect(r), Shape::Circle(c)) => {
                circle_rect_overlap(c, r)
            }
        }
    }
}

/// Circle model: hit when center distance is strictly less than the radius sum.
#[inline]
pub fn circles_overlap(a: &Circle, b: &Circle) -> bool {
    let reach = a.radius + b.radius;
    a.center.distance_squared(b.center) < reach * reach
}

/// Rectangle model: projections overlap on both axes. Ranges are closed, so
/// rectangles that only share an edge still count as touching.
#[inline]
pub fn rects_overlap(a: &Aabb, b: &Aabb) -> bool {
    let (a_max, b_max) = (a.max(), b.max());
    a.min.x <= b_max.x && b.min.x <= a_max.x && a.min.y <= b_max.y && b.min.y <= a_max.y
}

/// Mixed model: the circle reaches strictly inside the rectangle's closest point
#[inline]
pub fn circle_rect_overlap(c: &Circle, r: &Aabb) -> bool {
    let closest = r.clamp_point(c.center);
    c.center.distance_squared(closest) < c.radius * c.radius
}

/// Something with bounds that can take part in a collision sweep
pub trait Collidable {
    /// Current bounds, or `None` while the entity has no physical extent
    fn shape(&self) -> Option<Shape>;
}

/// Check two collidables; entities without bounds never collide
pub fn collide<A: Collidable + ?Sized, B: Collidable + ?Sized>(a: &A, b: &B) -> bool {
    match (a.shape(), b.shape()) {
        (Some(sa), Some(sb)) => sa.overlaps(&sb),
        _ => false,
    }
}

/// Sweep every live projectile against every target, both in reverse order.
///
/// The first target a projectile touches consumes it, so one shot never
/// scores twice in a frame. Targets already flagged dead this frame are still
/// tested: a second shot landing on the same wreck is absorbed too. `on_hit`
/// receives the pair and decides scoring; it must flag what should die.
///
/// Returns the number of hits.
pub fn sweep<A, B, F>(projectiles: &mut [A], targets: &mut [B], mut on_hit: F) -> usize
where
    A: Entity + Collidable,
    B: Entity + Collidable,
    F: FnMut(&mut A, &mut B),
{
    let mut hits = 0;
    for i in (0..projectiles.len()).rev() {
        let shot = &mut projectiles[i];
        if !shot.is_alive() {
            continue;
        }
        for j in (0..targets.len()).rev() {
            let target = &mut targets[j];
            if collide(&*shot, &*target) {
                on_hit(&mut *shot, &mut *target);
                hits += 1;
                break;
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_circles_touching_is_a_miss() {
        let a = Circle::new(Vec2::ZERO, 5.0);
        let b = Circle::new(Vec2::new(10.0, 0.0), 5.0);
        assert!(!circles_overlap(&a, &b));

        let b = Circle::new(Vec2::new(9.99, 0.0), 5.0);
        assert!(circles_overlap(&a, &b));
    }

    #[test]
    fn test_rects_sharing_edge_overlap() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        assert!(rects_overlap(&a, &b));

        let c = Aabb::new(10.01, 0.0, 10.0, 10.0);
        assert!(!rects_overlap(&a, &c));
    }

    #[test]
    fn test_rect_contained_in_other() {
        let outer = Aabb::new(0.0, 0.0, 100.0, 100.0);
        let inner = Aabb::new(40.0, 40.0, 5.0, 5.0);
        assert!(rects_overlap(&outer, &inner));
        assert!(rects_overlap(&inner, &outer));
    }

    #[test]
    fn test_circle_rect_overlap() {
        let r = Aabb::new(0.0, 0.0, 10.0, 10.0);
        assert!(circle_rect_overlap(&Circle::new(Vec2::new(12.0, 5.0), 3.0), &r));
        assert!(!circle_rect_overlap(&Circle::new(Vec2::new(13.0, 5.0), 3.0), &r));
        // Center inside the rectangle
        assert!(circle_rect_overlap(&Circle::new(Vec2::new(5.0, 5.0), 1.0), &r));
    }

    #[test]
    fn test_shape_dispatch_is_order_independent() {
        let c = Shape::Circle(Circle::new(Vec2::new(12.0, 5.0), 3.0));
        let r = Shape::Rect(Aabb::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(c.overlaps(&r), r.overlaps(&c));
    }

    /// Something that may or may not have bounds yet
    struct Marker(Option<Shape>);

    impl Collidable for Marker {
        fn shape(&self) -> Option<Shape> {
            self.0
        }
    }

    #[test]
    fn test_boundless_entities_never_collide() {
        let solid = Marker(Some(Shape::Circle(Circle::new(Vec2::ZERO, 10.0))));
        let ghost = Marker(None);
        assert!(collide(&solid, &solid));
        assert!(!collide(&solid, &ghost));
        assert!(!collide(&ghost, &solid));
        assert!(!collide(&ghost, &ghost));
    }

    fn circle() -> impl Strategy<Value = Circle> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..100.0)
            .prop_map(|(x, y, r)| Circle::new(Vec2::new(x, y), r))
    }

    fn rect() -> impl Strategy<Value = Aabb> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..200.0, 0.0f32..200.0)
            .prop_map(|(x, y, w, h)| Aabb::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_circle_collision_symmetric(a in circle(), b in circle()) {
            prop_assert_eq!(circles_overlap(&a, &b), circles_overlap(&b, &a));
        }

        #[test]
        fn prop_circle_collision_matches_distance(a in circle(), b in circle()) {
            let d = a.center.distance(b.center) as f64;
            let reach = (a.radius + b.radius) as f64;
            // Stay clear of the rounding band right at the boundary
            prop_assume!((d - reach).abs() > 1e-3);
            prop_assert_eq!(circles_overlap(&a, &b), d < reach);
        }

        #[test]
        fn prop_rect_overlap_symmetric(a in rect(), b in rect()) {
            prop_assert_eq!(rects_overlap(&a, &b), rects_overlap(&b, &a));
        }

        #[test]
        fn prop_rect_overlap_reflexive(a in rect()) {
            prop_assert!(rects_overlap(&a, &a));
        }
    }
}
