pub mod config;
pub mod config_loader;
pub mod errors;
pub mod hash;
pub mod portfolio;
pub mod signal;
pub mod sizing;
pub mod ticket;
pub mod traits;

pub use config::{EdgeConfig, EdgeWeights, EngineConfig, GateLimits, SizingConfig, StrategyConfig};
pub use config_loader::ConfigLoader;
pub use errors::EngineError;
pub use hash::ticket_hash;
pub use portfolio::{GreeksExposure, OpenPosition, PortfolioState};
pub use signal::{
    CorrelationRegime, EdgeComponent, EdgeInputs, EdgeScore, MarketSnapshot, RegimeSnapshot,
    RiskAppetite, VolRegime,
};
pub use sizing::{edge_confidence, liquidity_score, recommend_size, SizeRecommendation};
pub use ticket::{
    AuditAction, AuditEntry, Bias, ExitRules, GateReport, Leg, OptionType, RiskGateReport,
    ScoreBreakdown, Side, StrategyKind, TicketState, TradeConstraints, TradeTicket,
};
pub use traits::{PortfolioSource, SignalAggregator};
