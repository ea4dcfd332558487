#![allow(dead_code)]

use frame_elements::prelude::*;

pub const E: f64 = 200_000.0;
pub const G: f64 = 80_000.0;
pub const AREA: f64 = 0.01;
pub const IZ: f64 = 8e-5;
pub const IY: f64 = 6e-5;
pub const J: f64 = 1e-4;

pub fn section() -> ElasticShearSection {
    ElasticShearSection::new(1, E, AREA, IZ, IY, G, J)
}

/// Two nodes, node 2 at `xj`
pub fn domain(xj: [f64; 3]) -> Domain {
    let mut domain = Domain::new();
    domain.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
    domain.add_node(Node::new(2, xj[0], xj[1], xj[2])).unwrap();
    domain
}

pub fn transform() -> Box<dyn FrameTransform> {
    Box::new(LinearTransform::new(Vec3::new(0.0, 0.0, 1.0)))
}

pub fn distributed(num_points: usize) -> DistributedFrame {
    let s = section();
    let sections = (0..num_points).map(|_| s.clone_box()).collect();
    DistributedFrame::new(
        1,
        [1, 2],
        sections,
        Box::new(LegendreRule::new()),
        transform(),
        FrameOptions::default(),
    )
    .unwrap()
}

pub fn prismatic(geometry: GeometryLevel) -> PrismaticFrame {
    PrismaticFrame::from_section(2, [1, 2], &section(), geometry, transform(), FrameOptions::default())
}

/// A general trial state at node 2 with node 1 fixed
pub fn load_step(domain: &mut Domain, scale: f64) {
    domain
        .set_trial_displacement(
            2,
            Vec6::new(0.001, -0.002, 0.0015, 0.003, -0.001, 0.002) * scale,
        )
        .unwrap();
}
