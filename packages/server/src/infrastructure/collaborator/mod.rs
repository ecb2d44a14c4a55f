//! Stand-in collaborators for a standalone deployment.

pub mod classifier;
pub mod notifier;

pub use classifier::KeywordClassifier;
pub use notifier::LoggingNotifier;
