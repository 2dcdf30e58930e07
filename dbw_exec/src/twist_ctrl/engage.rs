//! # Engage state machine
//!
//! Tracks whether the twist controller has authority over the vehicle. The
//! only transition action is resetting the speed controller, which the
//! `Controller` performs whenever the machine reports that control has been
//! (or still is) handed to the driver, and on re-engagement.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Who is driving the vehicle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum EngageState {
    /// The controller's outputs are being actuated.
    Engaged,

    /// A human has control, the controller's outputs are not actuated.
    Disengaged,
}

/// The transition taken by one update of the state machine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum EngageTransition {
    /// Disengaged to engaged.
    Engage,

    /// Engaged to disengaged.
    Disengage,

    /// Remained engaged.
    StayEngaged,

    /// Remained disengaged.
    StayDisengaged,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for EngageState {
    fn default() -> Self {
        EngageState::Disengaged
    }
}

impl EngageState {
    /// Advance the machine with this cycle's DBW enable flag.
    pub fn update(&mut self, dbw_enabled: bool) -> EngageTransition {
        let transition = match (*self, dbw_enabled) {
            (EngageState::Disengaged, true) => EngageTransition::Engage,
            (EngageState::Engaged, true) => EngageTransition::StayEngaged,
            (EngageState::Engaged, false) => EngageTransition::Disengage,
            (EngageState::Disengaged, false) => EngageTransition::StayDisengaged,
        };

        *self = if dbw_enabled {
            EngageState::Engaged
        } else {
            EngageState::Disengaged
        };

        transition
    }

    pub fn is_engaged(&self) -> bool {
        *self == EngageState::Engaged
    }
}

impl EngageTransition {
    /// True if the speed controller must be reset on this transition.
    ///
    /// Reset happens on every disengaged cycle and on re-engagement, so that
    /// error seen while the driver was in control is never acted on.
    pub fn resets_controller(&self) -> bool {
        !matches!(self, EngageTransition::StayEngaged)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut state = EngageState::default();
        assert_eq!(state, EngageState::Disengaged);

        assert_eq!(state.update(false), EngageTransition::StayDisengaged);
        assert_eq!(state.update(true), EngageTransition::Engage);
        assert!(state.is_engaged());
        assert_eq!(state.update(true), EngageTransition::StayEngaged);
        assert_eq!(state.update(false), EngageTransition::Disengage);
        assert!(!state.is_engaged());
    }

    #[test]
    fn test_reset_actions() {
        assert!(EngageTransition::Engage.resets_controller());
        assert!(EngageTransition::Disengage.resets_controller());
        assert!(EngageTransition::StayDisengaged.resets_controller());
        assert!(!EngageTransition::StayEngaged.resets_controller());
    }
}
