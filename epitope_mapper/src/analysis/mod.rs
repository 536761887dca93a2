pub mod profile_plot;
pub mod epitope_export;
pub mod conservancy;
