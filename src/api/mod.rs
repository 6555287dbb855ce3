//! Run lifecycle surface.
//!
//! [`Application`] collects module declarations, takes the global parameters,
//! and on [`run`](Application::run) builds the graph once and executes it for
//! every trajectory.

mod application;

pub use application::Application;
