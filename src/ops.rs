//! Stream operators.
//!
//! The operator surface is deliberately small: flattening a stream of
//! streams is the one composition this engine is about, and everything
//! else is the subscribe family on [`ObservableExt`].
//!
//! [`ObservableExt`]: crate::observable::ObservableExt

pub mod flat_map;
