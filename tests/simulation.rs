//! End-to-end simulation scenarios.

use approx::assert_relative_eq;
use geomsim::mesh::{primitives, HalfEdgeMesh};
use geomsim::prelude::*;
use geomsim::sim::{step, GroundParams, MassModel, SimulationState, SimulatorStatus};
use nalgebra::{Point3, Vector3};

fn single_tetra() -> TetrahedralBody {
    TetrahedralBody::new(
        vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(0.0, 0.0, 2.0),
        ],
        vec![[0, 1, 2, 3]],
        4,
    )
    .unwrap()
}

#[test]
fn free_vertex_settles_on_ground() {
    let body = TetrahedralBody::new(vec![Point3::new(0.0, 0.0, -1.0)], vec![], 1).unwrap();
    let params = SimulationParams::default()
        .with_mass(MassModel::Uniform(1.0))
        .with_ground(GroundParams {
            stiffness: 10_000.0,
            ..GroundParams::default()
        });
    let mut state = SimulationState::new(&body, &params).unwrap();

    let dt = 0.0002;
    for i in 0..1000 {
        step(&mut state, dt, (i + 1) as f64 * dt).unwrap();
    }

    let p = state.positions()[0];
    let v = state.velocities()[0];
    assert!(p.coords.iter().chain(v.iter()).all(|c| c.is_finite()));
    assert!(p.z.abs() < 0.01, "z = {}", p.z);
    assert_eq!(p.x, 0.0);
}

fn oscillation_energy(model: PhysicsModel) -> (f64, f64) {
    let params = SimulationParams::for_model(model)
        .with_gravity(Vector3::zeros())
        .with_mass(MassModel::Uniform(1.0))
        .with_spring_stiffness(200_000.0)
        .without_ground();
    let mut state = SimulationState::new(&single_tetra(), &params).unwrap();

    let mut positions = state.positions().to_vec();
    positions[3].z += 0.01;
    state.set_positions(&positions).unwrap();
    let initial = state.spring_energy(state.positions());

    let dt = 0.0002;
    for i in 0..5000 {
        step(&mut state, dt, (i + 1) as f64 * dt).unwrap();
    }
    let energy = state.kinetic_energy() + state.spring_energy(state.positions());
    (initial, energy)
}

#[test]
fn midpoint_drifts_less_than_euler() {
    let (initial, euler) = oscillation_energy(PhysicsModel::Spring);
    let (_, midpoint) = oscillation_energy(PhysicsModel::MidpointSpring);

    assert!(initial > 0.0);
    // Euler keeps oscillating at roughly the initial energy, the midpoint scheme settles.
    assert!(euler > 0.5 * initial, "euler {euler} vs initial {initial}");
    assert!(midpoint < 0.1 * euler, "midpoint {midpoint} vs euler {euler}");
}

#[test]
fn fed_rest_shape_stays_put_without_gravity() {
    for scale in [1.0, 3.0] {
        let points = single_tetra().points().iter().map(|p| *p * scale).collect();
        let body = TetrahedralBody::new(points, vec![[0, 1, 2, 3]], 4).unwrap();
        let params = SimulationParams::for_model(PhysicsModel::Fed)
            .with_gravity(Vector3::zeros())
            .without_ground();
        let mut state = SimulationState::new(&body, &params).unwrap();

        let forces = PhysicsModel::Fed.compute_forces(&state, state.positions(), state.velocities());
        for f in &forces {
            assert!(f.norm() < 1e-3, "force {f}");
        }

        step(&mut state, 1e-4, 1e-4).unwrap();
        for (p, q) in state.positions().iter().zip(body.points()) {
            assert_relative_eq!(*p, *q, epsilon = 1e-9);
        }
    }
}

#[test]
fn volumes_are_shared_between_vertices() {
    let mesh = primitives::octahedron();
    let mut points = mesh.positions();
    points.push(Point3::origin());
    // Octahedron faces fanned to the center.
    let tetras: Vec<[usize; 4]> = mesh
        .face_ids()
        .map(|f| {
            let [a, b, c] = mesh.face_triangle(f);
            [a.index(), b.index(), c.index(), 6]
        })
        .collect();
    let body = TetrahedralBody::new(points, tetras, 6).unwrap();
    body.check_boundary_matches(&mesh, 1e-12).unwrap();

    let state = SimulationState::new(&body, &SimulationParams::default()).unwrap();
    let total: f64 = state.tetra_volumes().iter().sum();
    assert!(total > 0.0);
    assert_relative_eq!(total, 4.0 / 3.0, epsilon = 1e-12);
    assert_relative_eq!(state.vertex_volumes().iter().sum::<f64>(), total, epsilon = 1e-12);
    assert_relative_eq!(state.vertex_volumes()[6], total / 4.0, epsilon = 1e-12);
}

fn ball_scene() -> Scene {
    let surface = primitives::octahedron();
    let mut points = surface.positions();
    points.push(Point3::origin());
    let tetras = surface
        .face_ids()
        .map(|f| {
            let [a, b, c] = surface.face_triangle(f);
            [a.index(), b.index(), c.index(), 6]
        })
        .collect();
    let body = TetrahedralBody::new(points, tetras, 6).unwrap();

    let mut scene = Scene::new();
    scene.insert(Model::new("Ball", surface).with_tetra(body));
    scene.insert(Model::new("Ground", primitives::ground_plane(5.0, -2.0)));
    scene
}

#[test]
fn simulator_drives_scene_model() {
    for model in PhysicsModel::ALL {
        let mut scene = ball_scene();
        let mut params = SimulationParams::for_model(model);
        params.ground.height = -2.0;
        params.youngs_modulus = 1.0e5;
        params.spring_stiffness = 1.0e4;

        let mut simulator = Simulator::new(params);
        simulator.init(&scene, 0.0).unwrap();
        assert_eq!(simulator.run(&mut scene, 200, 1e-4).unwrap(), 200);
        assert_eq!(simulator.status(), SimulatorStatus::Stepping);
        assert_relative_eq!(simulator.elapsed(), 0.02, epsilon = 1e-9);

        let ball = scene.get("Ball").unwrap();
        assert!(ball.is_dirty());
        let state = simulator.state().unwrap();
        // Falling freely and nearly undeformed.
        assert!(state.center_of_mass().z < 0.0);
        assert_relative_eq!(state.center_of_mass().z, -0.5 * 9.8 * 0.02 * 0.02, epsilon = 1e-3);
        let top = ball.mesh().position(geomsim::mesh::VertexId::new(4));
        assert_relative_eq!(*top, state.positions()[4]);
    }
}

#[test]
fn simulator_requires_named_bodies() {
    let mut scene = ball_scene();
    scene.remove("Ground");
    let mut simulator = Simulator::new(SimulationParams::default());
    let err = simulator.init(&scene, 0.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!simulator.simulate(&mut scene, 0.1).unwrap());

    let mut empty = Scene::new();
    empty.insert(Model::new("Ball", HalfEdgeMesh::new()));
    assert!(matches!(
        simulator.init(&empty, 0.0),
        Err(Error::MissingBody { .. })
    ));
}
