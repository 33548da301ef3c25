//! Delete Confirmation
//!
//! A delete dialog that stays locked until the user types the required
//! literal. Replaces the inline confirm/cancel button pair with a typed
//! acknowledgment.

use crate::error::ControllerError;
use crate::mutation::MutationState;
use crate::schema::EntityId;

pub const DEFAULT_CONFIRM_LITERAL: &str = "delete";

/// Pure precondition for destructive mutations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationGate {
    literal: String,
}

impl ConfirmationGate {
    pub fn new(literal: impl Into<String>) -> Self {
        Self { literal: literal.into() }
    }

    /// Case-sensitive exact match
    pub fn is_unlocked(&self, token: &str) -> bool {
        token == self.literal
    }
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_LITERAL)
    }
}

/// Open delete dialog for one entity
///
/// The token lives only while the dialog is open.
#[derive(Debug)]
pub struct DeleteDialog {
    target: EntityId,
    gate: ConfirmationGate,
    token: Option<String>,
    state: MutationState,
}

impl DeleteDialog {
    pub fn open(target: EntityId, gate: ConfirmationGate) -> Self {
        Self {
            target,
            gate,
            token: Some(String::new()),
            state: MutationState::Idle,
        }
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.token.is_some()
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    /// Typed confirmation text. Ignored once the dialog is closed.
    pub fn input(&mut self, token: impl Into<String>) {
        if let Some(current) = self.token.as_mut() {
            *current = token.into();
        }
    }

    /// Whether the confirm control should be enabled
    pub fn can_confirm(&self) -> bool {
        self.token.as_deref().is_some_and(|token| self.gate.is_unlocked(token))
    }

    /// Cancel or finish: the token is discarded either way
    pub fn close(&mut self) {
        self.token = None;
    }

    /// Enter `Submitting` if the gate is unlocked and nothing is in flight
    pub(crate) fn begin(&mut self) -> Result<EntityId, ControllerError> {
        if !self.is_open() {
            return Err(ControllerError::Closed);
        }
        if self.state == MutationState::Submitting {
            return Err(ControllerError::Busy);
        }
        if !self.can_confirm() {
            return Err(ControllerError::Locked);
        }
        self.state = MutationState::Submitting;
        Ok(self.target)
    }

    pub(crate) fn finish(&mut self, succeeded: bool) {
        if succeeded {
            self.state = MutationState::Succeeded;
            self.close();
        } else {
            self.state = MutationState::Failed;
        }
    }
}
