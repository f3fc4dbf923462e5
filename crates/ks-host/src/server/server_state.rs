/// Current state of an embedded server handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerState {
    /// Server is not running
    Stopped,
    /// Server is starting up
    Starting,
    /// Server is running and ready
    Running { server_url: String },
}
