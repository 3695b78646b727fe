pub mod config;
pub mod error;
pub mod throttle;

#[cfg(test)]
pub mod test_utils;
