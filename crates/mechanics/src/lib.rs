pub mod canonical;
pub mod error;
pub mod model;
pub mod parameters;

pub use canonical::{CanonicalMatrices, ab_matrix};
pub use error::ParameterSetError;
pub use model::{CanonicalModel, Meijaard2007Model};
pub use parameters::{Meijaard2007ParameterSet, PARAMETER_NAMES, is_parameter_name, is_structural};
