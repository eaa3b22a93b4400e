//! Live list controllers and their observers.

mod list_controller;

pub use list_controller::{ListController, ListObserver};
