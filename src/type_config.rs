use std::fmt::Debug;

use crate::Document;
use crate::GeometryProvider;
use crate::SignalSource;

/// Binds the engine to one host implementation.
///
/// **This coding style learned from OpenRaft project type config.**
pub trait TypeConfig: Sync + Send + Sized + Debug + Clone + Copy + Default + 'static {
    /// Element handle of the host document
    type E: Clone + PartialEq + Debug + Send + Sync + 'static;

    type D: Document<Self::E>;

    type G: GeometryProvider<Self::E>;

    type S: SignalSource;
}

pub mod alias {
    use super::TypeConfig;

    pub type EOF<T> = <T as TypeConfig>::E;

    pub type DOF<T> = <T as TypeConfig>::D;

    pub type GOF<T> = <T as TypeConfig>::G;

    pub type SOF<T> = <T as TypeConfig>::S;
}
