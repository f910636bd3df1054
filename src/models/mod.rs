pub mod prediction;
pub mod request;
pub mod seed;
pub mod size;
pub mod tensor;

pub use prediction::*;
pub use request::*;
pub use seed::*;
pub use size::*;
pub use tensor::*;
