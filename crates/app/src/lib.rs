pub mod config;
pub mod figures;
pub mod plots;

pub use config::{AnalysisConfig, ConfigError, KPH2MPS, MPS2KPH, SimulationConfig};
pub use figures::FigureDirectory;
