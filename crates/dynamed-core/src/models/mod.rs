//! Domain models for the DynaMed core.

mod consultation;
mod interaction;
mod molecule;
mod prescription;
mod reference;
mod scoring;

pub use consultation::*;
pub use interaction::*;
pub use molecule::*;
pub use prescription::*;
pub use reference::*;
pub use scoring::*;
