//! Reusable UI component descriptions for admin templates.

pub mod data_table;
