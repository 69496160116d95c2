//! The client-side half: prediction, reconciliation, and remote-entity
//! interpolation (spec.md §4.9–§4.12), plus the networking and
//! out-of-scope collaborator surfaces (§4.8, §1/§6).

pub mod client_loop;
pub mod collab;
pub mod error;
pub mod interpolator;
pub mod net_client;
pub mod predictor;
pub mod reconciler;

pub use client_loop::ClientLoop;
pub use collab::{BoardSource, Input, Renderer};
pub use error::ClientError;
pub use interpolator::{Interpolator, SnapshotEntry};
pub use net_client::{NetClient, NetClientEvents};
pub use predictor::Predictor;
pub use reconciler::Reconciler;
