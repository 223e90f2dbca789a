//! Node lifecycle flags.
//!
//! Mirrors the `NodeState` bitfield in
//! `examples/original_source/src/MayaFlux/Kriya/Node.hpp`, expressed with
//! `bitflags!` the same way [`mayaflux_core::token`] models
//! `ProcessingToken`.

use bitflags::bitflags;

bitflags! {
    #[derive(Default)]
    pub struct NodeState: u32 {
        /// Set once `process_sample`/`compute_frame` has run this cycle;
        /// cleared by the root at cycle end once the modulator count drops
        /// to zero.
        const PROCESSED = 0x1;
        /// Evaluate but discard the committed output — used to probe a
        /// node's behavior without perturbing downstream consumers.
        const MOCK_PROCESS = 0x2;
        /// Set when the node's last evaluation raised an error; cleared on
        /// the next successful evaluation.
        const ERROR = 0x4;
    }
}
