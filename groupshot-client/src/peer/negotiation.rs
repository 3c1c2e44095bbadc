//! Offer/answer/ICE bookkeeping for one peer connection, kept separate
//! from the transport so the transitions can be exercised without a
//! network. The driver feeds remote inputs in and performs whatever step
//! comes back.

use groupshot_core::model::{IceCandidatePayload, PeerId};
use std::mem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    New,
    OfferSent,
    OfferReceived,
    AnswerSent,
    AnswerReceived,
    IceExchanging,
    Connected,
    Failed,
    Closed,
}

impl NegotiationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NegotiationState::Failed | NegotiationState::Closed)
    }
}

/// What the transport driver must do in response to a remote input.
#[derive(Debug, PartialEq)]
pub enum NegotiationStep {
    /// Apply the remote offer, then these buffered candidates, then answer.
    AnswerOffer { flush: Vec<IceCandidatePayload> },
    /// Simultaneous offers and ours wins the tie-break: theirs is dropped,
    /// they will answer ours.
    HoldOffer,
    /// Simultaneous offers and ours loses: abandon our attempt, take the
    /// answerer role against their offer.
    YieldAndAnswer { flush: Vec<IceCandidatePayload> },
    /// Apply the remote answer, then these buffered candidates.
    ApplyAnswer { flush: Vec<IceCandidatePayload> },
    /// The remote description is already in place; apply immediately.
    ApplyCandidate(IceCandidatePayload),
    /// Parked until the remote description lands.
    Buffered,
    /// Stale, duplicate, or arriving in a terminal state.
    Drop,
}

pub struct Negotiation {
    local_id: PeerId,
    remote_id: PeerId,
    state: NegotiationState,
    /// Candidates waiting for the remote description, in arrival order.
    pending: Vec<IceCandidatePayload>,
    /// Everything ever accepted, for exact-duplicate suppression.
    seen: Vec<IceCandidatePayload>,
    remote_description_set: bool,
    transport_connected: bool,
    channel_open: bool,
}

impl Negotiation {
    pub fn new(local_id: PeerId, remote_id: PeerId) -> Self {
        Self {
            local_id,
            remote_id,
            state: NegotiationState::New,
            pending: Vec::new(),
            seen: Vec::new(),
            remote_description_set: false,
            transport_connected: false,
            channel_open: false,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == NegotiationState::Connected
    }

    pub fn remote_id(&self) -> &PeerId {
        &self.remote_id
    }

    /// Our offer went out on the wire.
    pub fn offer_sent(&mut self) {
        if self.state == NegotiationState::New {
            self.state = NegotiationState::OfferSent;
        }
    }

    /// Our answer to their offer went out.
    pub fn answer_sent(&mut self) {
        if self.state == NegotiationState::OfferReceived {
            self.state = NegotiationState::AnswerSent;
        }
    }

    pub fn remote_offer(&mut self) -> NegotiationStep {
        match self.state {
            NegotiationState::New => {
                self.state = NegotiationState::OfferReceived;
                self.remote_description_set = true;
                NegotiationStep::AnswerOffer {
                    flush: mem::take(&mut self.pending),
                }
            }
            NegotiationState::OfferSent => {
                // Glare. Deterministic tie-break: the smaller id keeps the
                // offerer role, the larger one answers instead.
                if self.local_id < self.remote_id {
                    NegotiationStep::HoldOffer
                } else {
                    self.state = NegotiationState::OfferReceived;
                    self.remote_description_set = true;
                    NegotiationStep::YieldAndAnswer {
                        flush: mem::take(&mut self.pending),
                    }
                }
            }
            _ => NegotiationStep::Drop,
        }
    }

    pub fn remote_answer(&mut self) -> NegotiationStep {
        match self.state {
            NegotiationState::OfferSent => {
                self.state = NegotiationState::AnswerReceived;
                self.remote_description_set = true;
                NegotiationStep::ApplyAnswer {
                    flush: mem::take(&mut self.pending),
                }
            }
            _ => NegotiationStep::Drop,
        }
    }

    pub fn remote_candidate(&mut self, candidate: IceCandidatePayload) -> NegotiationStep {
        if self.state.is_terminal() {
            return NegotiationStep::Drop;
        }
        if self.seen.contains(&candidate) {
            return NegotiationStep::Drop;
        }
        self.seen.push(candidate.clone());

        if self.remote_description_set {
            self.note_ice_activity();
            NegotiationStep::ApplyCandidate(candidate)
        } else {
            self.pending.push(candidate);
            NegotiationStep::Buffered
        }
    }

    fn note_ice_activity(&mut self) {
        if matches!(
            self.state,
            NegotiationState::AnswerSent | NegotiationState::AnswerReceived
        ) {
            self.state = NegotiationState::IceExchanging;
        }
    }

    /// The transport reported connected. Returns whether this completed
    /// the handshake.
    pub fn transport_connected(&mut self) -> bool {
        self.transport_connected = true;
        self.try_connected()
    }

    /// The canvas data channel opened. Returns whether this completed the
    /// handshake.
    pub fn channel_open(&mut self) -> bool {
        self.channel_open = true;
        self.try_connected()
    }

    fn try_connected(&mut self) -> bool {
        if self.state.is_terminal() || self.state == NegotiationState::Connected {
            return false;
        }
        // Connected needs both the transport up and the channel open; a
        // transport that connects before the channel is not enough.
        if self.remote_description_set && self.transport_connected && self.channel_open {
            self.state = NegotiationState::Connected;
            return true;
        }
        false
    }

    /// Returns whether this call performed the transition to Failed.
    pub fn transport_failed(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = NegotiationState::Failed;
        true
    }

    /// Returns whether this call performed the transition to Closed.
    pub fn closed(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = NegotiationState::Closed;
        true
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
