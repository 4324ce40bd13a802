pub mod args;
pub mod inspect;
pub mod params;
pub mod run;

pub use args::{CommandArgs, InputArgs};
pub use inspect::run_inspect;
pub use params::run_params;
pub use run::run_aggregation;
