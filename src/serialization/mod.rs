//! Serialization of elements and their sub-objects through numeric channels
//!
//! Every object writes a fixed-length header keyed by its database tag,
//! followed by the data of the objects it owns. Receivers rebuild owned
//! objects of a different class through an [`ObjectBroker`].

mod broker;
mod channel;

pub use broker::ObjectBroker;
pub use channel::{Channel, DatabaseChannel, StreamChannel};

use crate::elements::FrameElement;
use crate::error::{FrameError, FrameResult};

/// Class tags identifying concrete types on the wire
pub mod class_tags {
    pub const SECTION_ELASTIC_SHEAR: usize = 1;
    pub const SECTION_ELASTIC_TUBE: usize = 2;

    pub const RULE_LEGENDRE: usize = 11;
    pub const RULE_MIDPOINT: usize = 12;
    pub const RULE_USER_DEFINED: usize = 13;

    pub const TRANSFORM_LINEAR: usize = 21;

    pub const ELEMENT_DISTRIBUTED_FRAME: usize = 31;
    pub const ELEMENT_PRISMATIC_FRAME: usize = 32;
}

/// Database tag of the element directory
const DIRECTORY_DB_TAG: usize = 0;

/// Send a set of elements with a directory of their class and database tags
pub fn send_elements(
    elements: &mut [Box<dyn FrameElement>],
    commit_tag: usize,
    channel: &mut dyn Channel,
) -> FrameResult<()> {
    let mut directory = Vec::with_capacity(2 * elements.len());
    for element in elements.iter_mut() {
        if element.base().db_tag == 0 {
            element.base_mut().db_tag = channel.next_db_tag();
        }
        directory.push(element.class_tag() as i64);
        directory.push(element.base().db_tag as i64);
    }

    channel.send_vector(DIRECTORY_DB_TAG, commit_tag, &[elements.len() as f64])?;
    channel.send_id(DIRECTORY_DB_TAG, commit_tag, &directory)?;
    for element in elements.iter_mut() {
        element.send_self(commit_tag, channel)?;
    }
    log::info!("sent {} elements at commit {}", elements.len(), commit_tag);
    Ok(())
}

/// Rebuild the elements written by [`send_elements`]
///
/// Received elements still have to be connected with
/// [`FrameElement::set_nodes`].
pub fn recv_elements(
    commit_tag: usize,
    channel: &mut dyn Channel,
    broker: &ObjectBroker,
) -> FrameResult<Vec<Box<dyn FrameElement>>> {
    let count = channel.recv_vector(DIRECTORY_DB_TAG, commit_tag, 1)?[0];
    if count < 0.0 || count.fract() != 0.0 {
        return Err(FrameError::SerializationMismatch(format!(
            "invalid element count {}",
            count
        )));
    }
    let count = count as usize;
    let directory = channel.recv_id(DIRECTORY_DB_TAG, commit_tag, 2 * count)?;

    let mut elements = Vec::with_capacity(count);
    for pair in directory.chunks_exact(2) {
        let mut element = broker.new_element(pair[0] as usize)?;
        element.base_mut().db_tag = pair[1] as usize;
        element.recv_self(commit_tag, channel, broker)?;
        elements.push(element);
    }
    log::info!("received {} elements at commit {}", elements.len(), commit_tag);
    Ok(elements)
}
