pub mod fees;
pub mod impermanent_loss;
pub mod pnl;

pub use pnl::{ExitEstimate, ExitInputs, estimate_exit};
