use glam::{Mat4, Quat, Vec3};
use super::*;

fn make_aabb(min: Vec3, max: Vec3) -> AABB {
    AABB { min, max }
}

// ============================================================================
// Construction / emptiness
// ============================================================================

#[test]
fn test_empty_is_empty_and_union_identity() {
    assert!(AABB::EMPTY.is_empty());

    let b = make_aabb(Vec3::ZERO, Vec3::ONE);
    assert!(!b.is_empty());
    assert_eq!(AABB::EMPTY.union(&b), b);
    assert_eq!(b.union(&AABB::EMPTY), b);
}

#[test]
fn test_degenerate_box_is_not_empty() {
    let point = make_aabb(Vec3::splat(2.0), Vec3::splat(2.0));
    assert!(!point.is_empty());
    assert_eq!(point.extent(), Vec3::ZERO);
    assert_eq!(point.surface_area(), 0.0);
}

#[test]
fn test_from_center_half_extents() {
    let b = AABB::from_center_half_extents(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, -1.0, 0.5));
    assert_eq!(b.min, Vec3::new(0.0, 1.0, 2.5));
    assert_eq!(b.max, Vec3::new(2.0, 3.0, 3.5));
}

// ============================================================================
// Longest axis
// ============================================================================

#[test]
fn test_longest_axis() {
    assert_eq!(make_aabb(Vec3::ZERO, Vec3::new(5.0, 1.0, 1.0)).longest_axis(), AXIS_X);
    assert_eq!(make_aabb(Vec3::ZERO, Vec3::new(1.0, 5.0, 1.0)).longest_axis(), AXIS_Y);
    assert_eq!(make_aabb(Vec3::ZERO, Vec3::new(1.0, 1.0, 5.0)).longest_axis(), AXIS_Z);
}

#[test]
fn test_longest_axis_ties_prefer_later_axis() {
    assert_eq!(make_aabb(Vec3::ZERO, Vec3::ONE).longest_axis(), AXIS_Z);
    assert_eq!(make_aabb(Vec3::ZERO, Vec3::new(2.0, 2.0, 1.0)).longest_axis(), AXIS_Y);
    assert_eq!(make_aabb(Vec3::ZERO, Vec3::new(2.0, 1.0, 2.0)).longest_axis(), AXIS_Z);
}

// ============================================================================
// Expansion / union
// ============================================================================

#[test]
fn test_expand_and_expand_point() {
    let mut b = AABB::EMPTY;
    b.expand_point(Vec3::new(1.0, -1.0, 0.0));
    b.expand_point(Vec3::new(-2.0, 3.0, 0.5));
    assert_eq!(b.min, Vec3::new(-2.0, -1.0, 0.0));
    assert_eq!(b.max, Vec3::new(1.0, 3.0, 0.5));

    b.expand(&make_aabb(Vec3::splat(10.0), Vec3::splat(11.0)));
    assert_eq!(b.max, Vec3::splat(11.0));
}

#[test]
fn test_surface_area() {
    let b = make_aabb(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(b.surface_area(), 2.0 * (2.0 + 6.0 + 3.0));
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn test_transformed_by_translation_and_scale() {
    let local = make_aabb(Vec3::splat(-1.0), Vec3::splat(1.0));
    let m = Mat4::from_scale_rotation_translation(
        Vec3::new(2.0, 1.0, 1.0),
        Quat::IDENTITY,
        Vec3::new(10.0, 0.0, 0.0),
    );
    let world = local.transformed(&m);
    assert_eq!(world.min, Vec3::new(8.0, -1.0, -1.0));
    assert_eq!(world.max, Vec3::new(12.0, 1.0, 1.0));
}

#[test]
fn test_transformed_by_rotation_stays_tight() {
    let local = make_aabb(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
    let m = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let world = local.transformed(&m);
    // X extent maps onto Y
    assert!((world.min - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    assert!((world.max - Vec3::new(0.0, 2.0, 1.0)).length() < 1e-5);
}

// ============================================================================
// Contains / intersects
// ============================================================================

#[test]
fn test_aabb_contains() {
    let big = make_aabb(Vec3::splat(-10.0), Vec3::splat(10.0));
    let small = make_aabb(Vec3::splat(-1.0), Vec3::splat(1.0));
    let straddling = make_aabb(Vec3::splat(5.0), Vec3::splat(15.0));

    assert!(big.contains(&small));
    assert!(!small.contains(&big));
    assert!(!big.contains(&straddling));
}

#[test]
fn test_aabb_intersects() {
    let a = make_aabb(Vec3::splat(-2.0), Vec3::splat(2.0));
    let b = make_aabb(Vec3::splat(1.0), Vec3::splat(3.0));
    let c = make_aabb(Vec3::splat(5.0), Vec3::splat(7.0));

    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
}
