// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use async_trait::async_trait;
use cfc_core::{Endpoint, HandoffError, HandoffExit, SessionHandoff};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Hand-off fake that records the endpoints it was asked to connect to
#[derive(Debug, Default)]
pub struct RecordingHandoff {
    connected: Mutex<Vec<Endpoint>>,
    hold_until_cancelled: bool,
}

impl RecordingHandoff {
    /// Returns as soon as it is called, like a user leaving the session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the session open until the token is cancelled.
    pub fn holding() -> Self {
        Self {
            hold_until_cancelled: true,
            ..Self::default()
        }
    }

    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.connected.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl SessionHandoff for RecordingHandoff {
    async fn connect(&self, endpoint: &Endpoint, cancel: &CancellationToken) -> Result<HandoffExit, HandoffError> {
        self.connected
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(endpoint.clone());
        if self.hold_until_cancelled {
            cancel.cancelled().await;
            return Ok(HandoffExit::Cancelled);
        }
        Ok(HandoffExit::Finished)
    }
}
