//! Cyclic module interface
//!
//! Modules which are processed once per tick of the executable's main loop
//! (e.g. `race_lib::traj_ctrl::TrajCtrl`) implement [`State`], so that the
//! executable can drive them all in the same way.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// A module processed once per tick.
pub trait State: Sized {
    /// Everything needed to construct the module.
    type InitData;
    /// Error raised if the module cannot be constructed.
    type InitError;

    /// Per-tick input.
    type InputData;
    /// Per-tick output, e.g. a command for the vehicle.
    type OutputData;
    /// Per-tick monitoring quantities, suitable for archiving.
    type StatusReport;
    /// Error raised if a tick cannot be processed.
    type ProcError;

    /// Construct the module.
    ///
    /// Any products of initialisation worth keeping (e.g. precomputed
    /// geometry) should be saved into `session`.
    fn init(init_data: Self::InitData, session: &Session)
        -> Result<Self, Self::InitError>;

    /// Process one tick, returning the output and the status report.
    ///
    /// An error leaves the module usable for the next tick.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
