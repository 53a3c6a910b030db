use glam::{Mat4, Quat, Vec3};
use std::f32::consts::FRAC_PI_2;
use super::*;

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-5
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_new_instance_defaults() {
    let instance = Instance::new(InstanceId(3));
    assert_eq!(instance.id(), InstanceId(3));
    assert_eq!(instance.position, Vec3::ZERO);
    assert_eq!(instance.rotation, Quat::IDENTITY);
    assert_eq!(instance.scale, Vec3::ONE);
    assert!(instance.is_visible());
    assert!(instance.is_in_frustum());
    assert!(!instance.matrix_needs_update());
}

#[test]
fn test_instance_id_display_and_index() {
    assert_eq!(InstanceId(12).to_string(), "#12");
    assert_eq!(InstanceId(12).index(), 12);
}

#[test]
fn test_set_flag() {
    let mut instance = Instance::new(InstanceId(0));
    instance.set_flag(InstanceFlags::VISIBLE, false);
    instance.set_flag(InstanceFlags::MATRIX_NEEDS_UPDATE, true);
    assert!(!instance.is_visible());
    assert!(instance.matrix_needs_update());
    assert_eq!(instance.flags(), InstanceFlags::IN_FRUSTUM | InstanceFlags::MATRIX_NEEDS_UPDATE);
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn test_matrix_composes_trs() {
    let mut instance = Instance::new(InstanceId(0));
    instance.position = Vec3::new(1.0, 2.0, 3.0);
    instance.scale = Vec3::splat(2.0);
    let m = instance.matrix();
    assert!(approx(m.transform_point3(Vec3::X), Vec3::new(3.0, 2.0, 3.0)));
}

#[test]
fn test_rotate_on_axis() {
    let mut instance = Instance::new(InstanceId(0));
    instance.rotate_on_axis(Vec3::Y, FRAC_PI_2);
    assert!(approx(instance.rotation * Vec3::X, -Vec3::Z));
}

#[test]
fn test_rotate_on_world_axis_premultiplies() {
    let mut instance = Instance::new(InstanceId(0));
    instance.rotate_on_axis(Vec3::Z, FRAC_PI_2); // X -> Y
    instance.rotate_on_world_axis(Vec3::X, FRAC_PI_2); // then world Y -> Z
    assert!(approx(instance.rotation * Vec3::X, Vec3::Z));
}

#[test]
fn test_apply_matrix() {
    let mut instance = Instance::new(InstanceId(0));
    instance.position = Vec3::new(1.0, 0.0, 0.0);
    instance.apply_matrix(&Mat4::from_translation(Vec3::new(0.0, 5.0, 0.0)));
    assert!(approx(instance.position, Vec3::new(1.0, 5.0, 0.0)));
    assert!(approx(instance.scale, Vec3::ONE));
}
