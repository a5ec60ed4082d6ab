pub mod loader;
pub mod synthetic;
pub mod types;

pub use loader::{
    load_chain, load_history_file, load_snapshot, DataLoader, HistoryProvider, InMemoryHistory,
    LoaderError,
};
pub use synthetic::{ChainLayout, SyntheticChainBuilder};
pub use types::{DailyBar, Greeks, MarketSnapshot, OptionContract, OptionKind};
