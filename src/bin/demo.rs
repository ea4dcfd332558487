//! Frame Elements Demo - Single Member in Antisymmetric Bending

use anyhow::{Context, Result};
use frame_elements::prelude::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== Frame Elements Demo: Antisymmetric Bending ===\n");

    // Member along global X
    //
    //   N1 ------------------ N2
    //   θz = 0.01             θz = -0.01
    //
    let length = 4.0;
    let e = 200_000.0;
    let area = 0.01;
    let inertia = 8e-5;

    let mut domain = Domain::new();
    domain.add_node(Node::new(1, 0.0, 0.0, 0.0))?;
    domain.add_node(Node::new(2, length, 0.0, 0.0))?;

    let mut builder = FrameBuilder::new();
    builder.add_section(
        "Rect",
        Box::new(ElasticShearSection::new(1, e, area, inertia, inertia, 80_000.0, 1e-4)),
    )?;

    let mut elements = vec![
        builder.build(&element_spec(1, ElementKind::Distributed))?,
        builder.build(&element_spec(2, ElementKind::Prismatic))?,
    ];

    domain.set_trial_displacement(1, Vec6::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.01))?;
    domain.set_trial_displacement(2, Vec6::new(0.0, 0.0, 0.0, 0.0, 0.0, -0.01))?;

    for element in elements.iter_mut() {
        element.set_nodes(&domain)?;
        element.update(&domain)?;
        element.commit_state()?;
    }
    domain.commit();

    println!("Expected: M1 = 0.08, M2 = -0.08, N = T = 0\n");
    for element in &elements {
        let q = element.basic_force()?;
        println!("{}", element.describe());
        println!(
            "  N = {:.6}  M1 = {:.6}  M2 = {:.6}  T = {:.6}",
            q[0], q[1], q[2], q[5]
        );
    }

    // Checkpoint to disk and restore
    let path = std::env::temp_dir().join("frame-demo-checkpoint.json");
    let mut channel = DatabaseChannel::new();
    send_elements(&mut elements, 1, &mut channel)?;
    channel
        .save(&path)
        .with_context(|| format!("writing checkpoint {}", path.display()))?;

    let mut restored_channel = DatabaseChannel::load(&path)?;
    let mut restored = recv_elements(1, &mut restored_channel, &ObjectBroker::default())?;

    println!("\nRestored from {}:", path.display());
    for (original, copy) in elements.iter().zip(restored.iter_mut()) {
        copy.set_nodes(&domain)?;
        copy.update(&domain)?;
        let diff = (copy.basic_force()? - original.basic_force()?).norm();
        println!("  element {}: |Δq| = {:.3e}", copy.tag(), diff);
    }

    std::fs::remove_file(&path).ok();
    Ok(())
}

fn element_spec(tag: usize, kind: ElementKind) -> ElementSpec {
    ElementSpec {
        kind,
        tag,
        nodes: [1, 2],
        section: "Rect".to_string(),
        num_points: 5,
        rule: RuleSpec::Legendre,
        vecxz: [0.0, 0.0, 1.0],
        options: FrameOptions::default(),
        geometry: GeometryLevel::Linear,
    }
}
