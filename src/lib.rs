//! Terminal dashboard for district food-security clusters: boundary polygons
//! joined with clustering results, drawn as a braille choropleth.

pub mod app;
pub mod braille;
pub mod cache;
pub mod category;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod logging;
pub mod map;
pub mod report;
pub mod ui;
