pub mod assessment;
pub mod health;
pub mod integration;
pub mod submissions;
