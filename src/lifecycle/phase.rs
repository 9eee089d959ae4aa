/// The lifecycle hook being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Initialize,
    Load,
    Unload,
}

/// Where a [`ModulesHandler`](super::ModulesHandler) is in its own lifecycle.
///
/// ```text
/// Created --start--> Started --stop--> Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum HandlerState {
    Created,
    Started,
    Stopped,
}
