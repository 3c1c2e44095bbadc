//! Shared-canvas state and the ownership rules that keep it convergent.
//!
//! Every participant runs the exact same [`CanvasState::apply`] over both
//! its own intents and the events arriving from peers. Ownership is
//! claim-on-interact: a drag begins with a claim, updates only land while
//! the claim is held, and a release frees the sticker for the next hand.
//! There is no coordinator; convergence is eventual, last broadcast wins.

use crate::model::{Frame, PeerId, StickerEntity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One mutation request against the shared canvas, local or remote.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CanvasEvent {
    Create { sticker: StickerEntity },
    Claim { id: Uuid },
    Mutate { id: Uuid, frame: Frame },
    Release { id: Uuid },
    Delete { id: Uuid },
}

/// Outcome of applying an event. `Ignored` is not an error: losing a claim
/// race or mutating after losing ownership are expected outcomes, silently
/// dropped on every participant that rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Applied,
    Ignored,
}

impl Decision {
    pub fn is_applied(&self) -> bool {
        matches!(self, Decision::Applied)
    }
}

/// The locally-held copy of the room's canvas.
///
/// Guard-then-mutate runs under one `&mut self` borrow, so a given entity
/// is only ever touched by one code path at a time inside a process. Across
/// the network two participants can still both see `owner == None` and both
/// claim within a round trip; each side's broadcast then overwrites the
/// other's view and the swarm converges on whichever arrived last.
#[derive(Debug, Default, Clone)]
pub struct CanvasState {
    stickers: HashMap<Uuid, StickerEntity>,
}

impl CanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event on behalf of participant `from`.
    ///
    /// Re-applying an event that already took effect is a no-op: the owner
    /// guards re-check the same conditions and come out `Ignored`.
    pub fn apply(&mut self, from: &PeerId, event: &CanvasEvent) -> Decision {
        match event {
            CanvasEvent::Create { sticker } => {
                if self.stickers.contains_key(&sticker.id) {
                    return Decision::Ignored;
                }
                self.stickers.insert(sticker.id, sticker.clone());
                Decision::Applied
            }
            CanvasEvent::Claim { id } => {
                let Some(sticker) = self.stickers.get_mut(id) else {
                    return Decision::Ignored;
                };
                match &sticker.owner {
                    None => {
                        sticker.owner = Some(from.clone());
                        Decision::Applied
                    }
                    Some(holder) if holder == from => Decision::Ignored,
                    Some(_) => Decision::Ignored,
                }
            }
            CanvasEvent::Mutate { id, frame } => {
                let Some(sticker) = self.stickers.get_mut(id) else {
                    return Decision::Ignored;
                };
                if sticker.owner.as_ref() != Some(from) {
                    return Decision::Ignored;
                }
                sticker.frame = *frame;
                Decision::Applied
            }
            CanvasEvent::Release { id } => {
                let Some(sticker) = self.stickers.get_mut(id) else {
                    return Decision::Ignored;
                };
                if sticker.owner.as_ref() != Some(from) {
                    return Decision::Ignored;
                }
                sticker.owner = None;
                Decision::Applied
            }
            CanvasEvent::Delete { id } => {
                let Some(sticker) = self.stickers.get(id) else {
                    return Decision::Ignored;
                };
                match &sticker.owner {
                    None => {
                        self.stickers.remove(id);
                        Decision::Applied
                    }
                    Some(holder) if holder == from => {
                        self.stickers.remove(id);
                        Decision::Applied
                    }
                    Some(_) => Decision::Ignored,
                }
            }
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&StickerEntity> {
        self.stickers.get(id)
    }

    /// Current contents, for a full-canvas snapshot answer.
    pub fn snapshot(&self) -> Vec<StickerEntity> {
        self.stickers.values().cloned().collect()
    }

    /// Fold a peer's snapshot into our view. Only ids we have never seen
    /// are taken; anything we already track keeps our copy, which later
    /// event traffic will reconcile.
    pub fn merge_snapshot(&mut self, stickers: Vec<StickerEntity>) -> usize {
        let mut added = 0;
        for sticker in stickers {
            if let std::collections::hash_map::Entry::Vacant(slot) =
                self.stickers.entry(sticker.id)
            {
                slot.insert(sticker);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }
}
