//! Screen content rendered inside the main area.

pub mod dashboard;
pub mod form;
pub mod profile;
pub mod table;
