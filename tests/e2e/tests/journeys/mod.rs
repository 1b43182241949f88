//! Combined entry point running every journey test in one binary.
//! Each journey is also registered as its own standalone `[[test]]`
//! target in `Cargo.toml` for isolated runs; this file mirrors that
//! list so `cargo test -p recsys-e2e-tests --test journey_tests` runs
//! the full set at once.

#[path = "../support/mod.rs"]
mod support;

#[path = "cold_start.rs"]
mod cold_start;
#[path = "social_lift.rs"]
mod social_lift;
#[path = "friends_only_filter.rs"]
mod friends_only_filter;
#[path = "corruption_fallback.rs"]
mod corruption_fallback;
#[path = "exclusion.rs"]
mod exclusion;
#[path = "model_swap.rs"]
mod model_swap;
