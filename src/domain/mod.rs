// Domain layer - Snapshots, view state and chart rendering
pub mod chart;
pub mod project;
pub mod snapshot;
pub mod view_state;
