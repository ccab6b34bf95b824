//! The session state machine.
//!
//! Four states, one per value of the published session status. Inputs are
//! the lifecycle events the manager feeds in; anything not listed is an
//! impossible transition and is rejected by `consume`.

use rust_fsm::state_machine;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unauthenticated)

    Unauthenticated => {
        Restore => Authenticating,
        Authenticate => Authenticating,
    },
    Authenticating => {
        Authenticate => Authenticating,
        RestoredSession => Authenticated,
        RestoreFailed => Unauthenticated,
        Succeeded => Authenticated,
        Failed => Failed,
    },
    Authenticated => {
        Authenticate => Authenticating,
        ProfileUpdated => Authenticated,
        Failed => Failed,
        Logout => Unauthenticated,
    },
    Failed => {
        Authenticate => Authenticating,
        ClearToAuthenticated => Authenticated,
        ClearToUnauthenticated => Unauthenticated,
    },
}
