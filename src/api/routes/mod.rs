pub mod health;
pub mod tags;
pub mod targets;
