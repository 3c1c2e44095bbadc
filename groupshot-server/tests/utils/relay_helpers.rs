use anyhow::{Context, Result, bail};
use groupshot_core::model::{PeerId, RoomControl, RoomId, SignalingEnvelope};
use groupshot_server::{RoomCommand, RoomRegistry};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::mock_signaling::MockSignalingOutput;

/// Timeout for forwarded-envelope assertions (ms).
pub const FORWARD_TIMEOUT_MS: u64 = 2000;

pub struct TestRelay {
    pub registry: RoomRegistry,
    pub signaling: MockSignalingOutput,
}

pub fn create_test_relay() -> TestRelay {
    let (signaling, _rx) = MockSignalingOutput::new();
    let registry = RoomRegistry::new(Arc::new(signaling.clone()));
    TestRelay {
        registry,
        signaling,
    }
}

impl TestRelay {
    pub fn create_room(&self) -> (RoomId, mpsc::Sender<RoomCommand>) {
        let room_id = self.registry.create_room();
        let tx = self
            .registry
            .sender(&room_id)
            .expect("freshly created room is registered");
        (room_id, tx)
    }

    /// Join a peer and wait until the relay has answered with
    /// `JoinAccepted`. Returns the member list the joiner was handed.
    pub async fn join(
        &self,
        room_tx: &mpsc::Sender<RoomCommand>,
        peer_id: &PeerId,
    ) -> Result<Vec<PeerId>> {
        room_tx
            .send(RoomCommand::Join {
                peer_id: peer_id.clone(),
            })
            .await
            .context("room actor gone")?;

        let start = std::time::Instant::now();
        loop {
            for control in self.signaling.controls_for(peer_id).await {
                if let RoomControl::JoinAccepted { members, .. } = control {
                    return Ok(members);
                }
            }
            if start.elapsed().as_millis() as u64 > FORWARD_TIMEOUT_MS {
                bail!("timed out waiting for JoinAccepted for {}", peer_id);
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    pub async fn relay(
        &self,
        room_tx: &mpsc::Sender<RoomCommand>,
        envelope: SignalingEnvelope,
    ) -> Result<()> {
        room_tx
            .send(RoomCommand::Relay { envelope })
            .await
            .context("room actor gone")?;
        Ok(())
    }

    pub async fn leave(
        &self,
        room_tx: &mpsc::Sender<RoomCommand>,
        peer_id: &PeerId,
    ) -> Result<()> {
        room_tx
            .send(RoomCommand::Leave {
                peer_id: peer_id.clone(),
            })
            .await
            .context("room actor gone")?;
        Ok(())
    }
}
