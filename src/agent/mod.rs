mod agent;

pub use agent::{WriteAgent, MAX_ITERATIONS};

#[cfg(test)]
mod tests;
