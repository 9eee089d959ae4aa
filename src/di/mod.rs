mod inject;
mod provider;
mod resolver;

pub use inject::Inject;
pub use provider::ExternalModuleProvider;
pub use resolver::{Injectable, Resolver};
