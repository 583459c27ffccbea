//! TCP listener for the HTTP front end.

pub mod listener;
