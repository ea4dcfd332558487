mod common;

use approx::assert_relative_eq;
use common::*;
use frame_elements::prelude::*;
use frame_elements::serialization::class_tags;

fn committed_elements(domain: &mut Domain) -> Vec<Box<dyn FrameElement>> {
    let user_rule = UserDefinedRule::new(vec![0.1, 0.5, 0.9], vec![0.25, 0.5, 0.25]).unwrap();
    let tube = ElasticTubeSection::new(7, E, 0.2, 0.01, G);
    let mixed = DistributedFrame::new(
        3,
        [1, 2],
        vec![section().clone_box(), tube.clone_box(), section().clone_box()],
        Box::new(user_rule),
        transform(),
        FrameOptions::default().with_density(1.5).with_consistent_mass(),
    )
    .unwrap();

    let mut elements: Vec<Box<dyn FrameElement>> = vec![
        Box::new(distributed(5)),
        Box::new(prismatic(GeometryLevel::Exact)),
        Box::new(mixed),
    ];
    for element in elements.iter_mut() {
        element.set_nodes(domain).unwrap();
    }
    load_step(domain, 1.0);
    for element in elements.iter_mut() {
        element.update(domain).unwrap();
        element.commit_state().unwrap();
    }
    domain.commit();
    elements
}

fn assert_same_output(original: &[Box<dyn FrameElement>], restored: &mut [Box<dyn FrameElement>], domain: &Domain) {
    assert_eq!(original.len(), restored.len());
    for (a, b) in original.iter().zip(restored.iter_mut()) {
        assert_eq!(a.class_tag(), b.class_tag());
        assert_eq!(a.tag(), b.tag());
        assert_eq!(a.external_nodes(), b.external_nodes());
        b.set_nodes(domain).unwrap();
        b.update(domain).unwrap();
        assert_relative_eq!(a.resisting_force().unwrap(), b.resisting_force().unwrap(), epsilon = 1e-12);
        assert_relative_eq!(a.tangent_stiff().unwrap(), b.tangent_stiff().unwrap(), epsilon = 1e-9);
        assert_relative_eq!(a.mass().unwrap(), b.mass().unwrap(), epsilon = 1e-12);
    }
}

#[test]
fn test_database_round_trip() {
    let mut domain = domain([3.0, 4.0, 0.0]);
    let mut elements = committed_elements(&mut domain);

    let mut channel = DatabaseChannel::new();
    send_elements(&mut elements, 1, &mut channel).unwrap();
    let mut restored = recv_elements(1, &mut channel, &ObjectBroker::default()).unwrap();
    assert_same_output(&elements, &mut restored, &domain);

    // Restored state follows the sender on later steps
    load_step(&mut domain, 2.0);
    for (a, b) in elements.iter_mut().zip(restored.iter_mut()) {
        a.update(&domain).unwrap();
        b.update(&domain).unwrap();
        assert_relative_eq!(a.basic_force().unwrap(), b.basic_force().unwrap(), epsilon = 1e-12);
    }
}

#[test]
fn test_checkpoint_file() {
    let mut domain = domain([3.0, 4.0, 0.0]);
    let mut elements = committed_elements(&mut domain);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkpoint.json");
    let mut channel = DatabaseChannel::new();
    send_elements(&mut elements, 4, &mut channel).unwrap();
    channel.save(&path).unwrap();

    let mut loaded = DatabaseChannel::load(&path).unwrap();
    assert_eq!(loaded.len(), channel.len());
    let mut restored = recv_elements(4, &mut loaded, &ObjectBroker::default()).unwrap();
    assert_same_output(&elements, &mut restored, &domain);

    assert!(recv_elements(5, &mut loaded, &ObjectBroker::default()).is_err());
}

#[test]
fn test_stream_round_trip() {
    let mut domain = domain([3.0, 4.0, 0.0]);
    let mut elements = committed_elements(&mut domain);

    let mut channel = StreamChannel::new();
    send_elements(&mut elements, 1, &mut channel).unwrap();
    let mut restored = recv_elements(1, &mut channel, &ObjectBroker::default()).unwrap();
    assert_eq!(channel.pending(), 0);
    assert_same_output(&elements, &mut restored, &domain);
}

#[test]
fn test_receiver_resizes_sections() {
    let mut domain = domain([3.0, 4.0, 0.0]);
    let mut sender = distributed(5);
    sender.set_nodes(&domain).unwrap();
    load_step(&mut domain, 1.0);
    sender.update(&domain).unwrap();
    sender.commit_state().unwrap();

    let mut channel = DatabaseChannel::new();
    sender.send_self(1, &mut channel).unwrap();

    let mut receiver = distributed(2);
    receiver.base_mut().set_db_tag(sender.base().db_tag());
    receiver.recv_self(1, &mut channel, &ObjectBroker::default()).unwrap();
    assert_eq!(receiver.num_sections(), 5);

    receiver.set_nodes(&domain).unwrap();
    receiver.update(&domain).unwrap();
    assert_relative_eq!(
        receiver.basic_force().unwrap(),
        sender.basic_force().unwrap(),
        epsilon = 1e-12
    );
}

#[test]
fn test_receiver_replaces_section_class() {
    let mut domain = domain([3.0, 4.0, 0.0]);
    let mut elements = committed_elements(&mut domain);
    let mut mixed = elements.pop().unwrap();

    let mut channel = DatabaseChannel::new();
    mixed.send_self(1, &mut channel).unwrap();

    // Same section count, middle section of another class
    let mut receiver = distributed(3);
    receiver.base_mut().set_db_tag(mixed.base().db_tag());
    receiver.recv_self(1, &mut channel, &ObjectBroker::default()).unwrap();

    assert_eq!(receiver.num_sections(), 3);
    let classes: Vec<usize> = receiver.sections().iter().map(|s| s.class_tag()).collect();
    assert_eq!(
        classes,
        [
            class_tags::SECTION_ELASTIC_SHEAR,
            class_tags::SECTION_ELASTIC_TUBE,
            class_tags::SECTION_ELASTIC_SHEAR
        ]
    );
    assert_eq!(receiver.rule().class_tag(), class_tags::RULE_USER_DEFINED);

    let mut restored: Vec<Box<dyn FrameElement>> = vec![Box::new(receiver)];
    assert_same_output(&[mixed], &mut restored, &domain);
}

#[test]
fn test_round_trip_before_set_nodes() {
    let mut unbound: Vec<Box<dyn FrameElement>> = vec![
        Box::new(distributed(3)),
        Box::new(prismatic(GeometryLevel::Exact)),
    ];
    let mut channel = StreamChannel::new();
    send_elements(&mut unbound, 1, &mut channel).unwrap();
    let mut restored = recv_elements(1, &mut channel, &ObjectBroker::default()).unwrap();

    let mut domain = domain([3.0, 4.0, 0.0]);
    load_step(&mut domain, 1.0);
    let mut bound: Vec<Box<dyn FrameElement>> = vec![
        Box::new(distributed(3)),
        Box::new(prismatic(GeometryLevel::Exact)),
    ];
    for element in bound.iter_mut() {
        element.set_nodes(&domain).unwrap();
        element.update(&domain).unwrap();
    }
    assert_same_output(&bound, &mut restored, &domain);
}

#[test]
fn test_unknown_class_tag() {
    let mut domain = domain([3.0, 4.0, 0.0]);
    let mut elements = committed_elements(&mut domain);
    let mut channel = DatabaseChannel::new();
    send_elements(&mut elements, 1, &mut channel).unwrap();

    let mut broker = ObjectBroker::default();
    broker.register_element(class_tags::ELEMENT_DISTRIBUTED_FRAME, || {
        Box::new(DistributedFrame::blank())
    });
    assert!(recv_elements(1, &mut channel, &broker).is_ok());

    let empty = ObjectBroker::empty();
    assert!(matches!(
        recv_elements(1, &mut channel, &empty),
        Err(FrameError::UnknownClassTag { .. })
    ));
}

#[test]
fn test_truncated_stream() {
    let mut channel = StreamChannel::new();
    channel.send_vector(0, 1, &[1.0]).unwrap();
    assert!(recv_elements(1, &mut channel, &ObjectBroker::default()).is_err());
}
