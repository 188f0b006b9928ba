//! Square colliders and the pairwise overlap pass.

use crate::actor::{ActorId, TeamBits};
use crate::component::{Component, Registry};
use crate::geometry::Rect;
use crate::scene::Cores;

/// The other side of an overlap found this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub actor: ActorId,
    pub team: TeamBits,
}

/// A `size`×`size` box anchored at the owner's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collider {
    pub size: i32,
    /// Last overlap found by the most recent [`update`].
    pub contact: Option<Contact>,
}

impl Collider {
    #[must_use]
    pub fn new(size: i32) -> Self {
        Self {
            size,
            contact: None,
        }
    }
}

impl Component for Collider {
    const KIND: &'static str = "collider";
}

/// Reset every contact, then test every ordered pair of live colliders.
///
/// When a collider overlaps several others, the pair visited last wins.
/// Colliders of the same actor never collide with each other.
pub fn update(colliders: &mut Registry<Collider>, cores: &Cores<'_>) {
    let probes: Vec<Option<(Rect, Contact)>> = colliders
        .iter()
        .map(|(owner, collider)| {
            cores.get(owner).filter(|core| core.is_active()).map(|core| {
                let p = core.position;
                (
                    Rect::new(p.x, p.y, collider.size, collider.size),
                    Contact {
                        actor: owner,
                        team: core.team,
                    },
                )
            })
        })
        .collect();

    let mut contacts: Vec<Option<Contact>> = vec![None; probes.len()];
    for (i, a) in probes.iter().enumerate() {
        let Some((rect_a, contact_a)) = a else { continue };
        for (j, b) in probes.iter().enumerate() {
            let Some((rect_b, contact_b)) = b else { continue };
            if i == j || contact_a.actor == contact_b.actor {
                continue;
            }
            if rect_a.overlaps(rect_b) {
                contacts[i] = Some(*contact_b);
                contacts[j] = Some(*contact_a);
            }
        }
    }

    for ((_, collider), contact) in colliders.iter_mut().zip(contacts) {
        collider.contact = contact;
    }
}
