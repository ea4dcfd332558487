//! Benchmarks for frame element state determination

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use frame_elements::prelude::*;

fn create_domain() -> Domain {
    let mut domain = Domain::new();
    domain.add_node(Node::new(1, 0.0, 0.0, 0.0)).unwrap();
    domain.add_node(Node::new(2, 3.0, 4.0, 0.0)).unwrap();
    domain
        .set_trial_displacement(2, Vec6::new(0.001, -0.002, 0.0005, 0.001, 0.0, 0.002))
        .unwrap();
    domain
}

fn create_distributed(num_points: usize) -> DistributedFrame {
    let section = ElasticShearSection::new(1, 200000.0, 0.01, 8e-5, 6e-5, 80000.0, 1e-4);
    let sections = (0..num_points).map(|_| section.clone_box()).collect();
    DistributedFrame::new(
        1,
        [1, 2],
        sections,
        Box::new(LegendreRule::new()),
        Box::new(LinearTransform::new(Vec3::new(0.0, 0.0, 1.0))),
        FrameOptions::default(),
    )
    .unwrap()
}

fn create_prismatic(geometry: GeometryLevel) -> PrismaticFrame {
    PrismaticFrame::new(
        2,
        [1, 2],
        PrismaticProperties::new(0.01, 200000.0, 80000.0, 1e-4, 6e-5, 8e-5),
        geometry,
        Box::new(LinearTransform::new(Vec3::new(0.0, 0.0, 1.0))),
        FrameOptions::default(),
    )
}

fn bench_distributed_update(c: &mut Criterion) {
    let domain = create_domain();
    let mut group = c.benchmark_group("distributed_update");

    for n in [3, 5, 10] {
        let mut element = create_distributed(n);
        element.set_nodes(&domain).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                element.update(black_box(&domain)).unwrap();
                black_box(element.tangent_stiff().unwrap())
            })
        });
    }

    group.finish();
}

fn bench_prismatic_update(c: &mut Criterion) {
    let domain = create_domain();
    let mut group = c.benchmark_group("prismatic_update");

    for geometry in [GeometryLevel::Linear, GeometryLevel::PDelta, GeometryLevel::Exact] {
        let mut element = create_prismatic(geometry);
        element.set_nodes(&domain).unwrap();
        group.bench_function(format!("{:?}", geometry), |b| {
            b.iter(|| {
                element.update(black_box(&domain)).unwrap();
                black_box(element.tangent_stiff().unwrap())
            })
        });
    }

    group.finish();
}

fn bench_checkpoint(c: &mut Criterion) {
    let domain = create_domain();
    let mut element = create_distributed(5);
    element.set_nodes(&domain).unwrap();
    element.update(&domain).unwrap();
    element.commit_state().unwrap();
    let mut elements: Vec<Box<dyn FrameElement>> = vec![Box::new(element)];
    let broker = ObjectBroker::default();

    c.bench_function("checkpoint_round_trip", |b| {
        b.iter(|| {
            let mut channel = DatabaseChannel::new();
            send_elements(&mut elements, 1, &mut channel).unwrap();
            black_box(recv_elements(1, &mut channel, &broker).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_distributed_update,
    bench_prismatic_update,
    bench_checkpoint
);
criterion_main!(benches);
