pub mod classification;
pub mod intent;
pub mod property;
pub mod task;
pub mod turn;
