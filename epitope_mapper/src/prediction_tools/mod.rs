pub mod scales;
pub mod hydrophilicity;
pub mod bcell_regions;
pub mod mhc_mock;
