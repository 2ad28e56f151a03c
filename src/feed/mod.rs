pub mod spot_price;

// Re-export the client and poll loop for convenient access from main.
pub use spot_price::{run_poll_loop, PriceUpdate, SpotPriceClient};
