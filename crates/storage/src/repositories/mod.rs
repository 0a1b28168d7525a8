pub mod personas_repo;
pub mod portfolio_repo;
pub mod trades_repo;

pub use personas_repo::PersonasRepository;
pub use portfolio_repo::PortfolioRepository;
pub use trades_repo::TradesRepository;
