pub mod classify;
pub mod config;
pub mod doctor;
pub mod run;
pub mod taxonomy;
