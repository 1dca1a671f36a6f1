#![forbid(unsafe_code)]

//! Observable values for bindery.
//!
//! - [`Data`]: a shared value that may not be available yet, with ordered,
//!   identity-compared [`Subscriber`]s and lazy upstream activation.
//! - [`Data::map`]: derived observables that subscribe upstream only while
//!   they are observed themselves.
//! - [`Data::lazy`] / [`Data::from_future`]: observables resolved by a future
//!   that is started on first subscription, driven by a host [`Spawner`].
//!
//! # Architecture
//!
//! `Data<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Specialized observables attach an internal upstream source whose
//! `create`/`destroy` hooks run on the 0→1 and 1→0 subscriber transitions.
//! No borrow is held while subscriber callbacks run, so callbacks may read or
//! write the observable that is notifying them.

pub mod observable;
pub mod promise;

pub use futures::task::SpawnError;
pub use observable::{Data, Subscriber};
pub use promise::Spawner;
