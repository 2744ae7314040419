pub mod ai;
pub mod car;
pub mod incident;
pub mod lap;
pub mod race;
pub mod standings;
pub mod track;
pub mod weather;
