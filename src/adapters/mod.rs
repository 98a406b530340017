// Adapters layer: concrete collaborators behind the domain ports.

pub mod http;
pub mod prompt;
