pub mod decision;
pub mod market;
pub mod persona;
pub mod signal;
pub mod trade;

pub use decision::{Decision, DecisionAction};
pub use market::{ChainFlow, PairSnapshot, SafetyReport};
pub use persona::Persona;
pub use signal::{Signal, SignalDirection, Technicals};
pub use trade::Trade;
