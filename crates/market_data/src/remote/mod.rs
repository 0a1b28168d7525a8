pub mod cointelegraph_client;
pub mod defillama_client;
pub mod defillama_response;
pub mod dexscreener_client;
pub mod dexscreener_response;
pub mod rugcheck_client;
pub mod rugcheck_response;

pub use cointelegraph_client::CointelegraphClient;
pub use defillama_client::DefiLlamaClient;
pub use dexscreener_client::DexScreenerClient;
pub use rugcheck_client::RugCheckClient;

pub const USER_AGENT: &str = "persona_bot/0.1.0";
