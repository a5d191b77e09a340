use asphalt_geom::{Aabb, Vec2, Vec3};

#[test]
fn vec3_add_assign_and_with_z() {
    let mut a = Vec3::new(1.0, 2.0, 3.0);
    a += Vec3::new(-4.0, 5.0, -6.0);
    assert_eq!(a, Vec3::new(-3.0, 7.0, -3.0));
    assert_eq!(a.with_z(-1.0), Vec3::new(-3.0, 7.0, -1.0));
}

#[test]
fn vec2_scale_mirrors() {
    let v = Vec2::new(0.25, -0.5);
    assert_eq!(v.scale(-1.0, -1.0), Vec2::new(-0.25, 0.5));
    assert_eq!(v.scale(1.0, -1.0) + Vec2::new(1.0, 1.0) - v, Vec2::new(1.0, 2.0));
}

#[test]
fn quarter_turns_are_exact() {
    let v = Vec2::new(0.25, -0.5);
    assert_eq!(v.rotate_cw_quarters(0), v);
    assert_eq!(v.rotate_cw_quarters(1), Vec2::new(-0.5, -0.25));
    assert_eq!(v.rotate_cw_quarters(2), Vec2::new(-0.25, 0.5));
    assert_eq!(v.rotate_cw_quarters(3), Vec2::new(0.5, 0.25));
    assert_eq!(v.rotate_cw_quarters(4), v);
}

#[test]
fn aabb_grows_from_empty() {
    let mut bb = Aabb::EMPTY;
    assert!(bb.min.x > bb.max.x);
    bb.include(Vec3::new(1.0, 2.0, -1.0));
    bb.include(Vec3::new(3.0, 0.0, 0.5));
    assert_eq!(bb.min, Vec3::new(1.0, 0.0, -1.0));
    assert_eq!(bb.max, Vec3::new(3.0, 2.0, 0.5));
}
