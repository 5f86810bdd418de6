//! Display formatting helpers shared by the front end.

pub mod format;

pub use format::{
    contains_ignore_case, format_date, format_money, format_optional, format_optional_money,
    format_phone, format_timestamp, truncate, EMPTY,
};
