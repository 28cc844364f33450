mod executor;

pub use executor::replay_steps;
