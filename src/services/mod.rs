pub mod chart_service;
pub mod pipeline_service;
pub mod series_service;
