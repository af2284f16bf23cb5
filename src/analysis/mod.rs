pub mod champion_stats;
pub mod global;
pub mod matches;
pub mod ranking;
