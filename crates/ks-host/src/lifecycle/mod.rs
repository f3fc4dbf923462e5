mod manager;

pub use manager::ServerLifecycleManager;
