pub mod clock;
pub mod gpu_context;
pub mod sphere;
pub mod surface_renderer;
pub mod timer;

pub use clock::*;
pub use gpu_context::*;
pub use sphere::*;
pub use surface_renderer::*;
pub use timer::*;
